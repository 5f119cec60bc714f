use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Seconds allowed for a question of the given difficulty.
pub fn question_duration(difficulty: u8, floor_secs: u32) -> u32 {
    floor_secs.max(u32::from(difficulty) / 2)
}

/// Per-question countdown. Driven by explicit ticks so the state machine
/// stays the only owner of time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    armed: bool,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, secs: u32) {
        self.remaining = secs;
        self.armed = true;
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
        self.armed = false;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Advance by one second. Returns true exactly once, on the tick that
    /// reaches zero; the countdown is disarmed afterwards.
    pub fn tick(&mut self) -> bool {
        if !self.armed {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.armed = false;
            return true;
        }
        false
    }
}

/// One tick per period for the event loop.
pub struct ClockDriver {
    interval: Interval,
}

impl ClockDriver {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}
