use anyhow::anyhow;
use std::io::{self, BufRead};
use std::sync::mpsc as std_mpsc;
use tokio::sync::mpsc;

/// Stdin lines read on a dedicated thread, one read per request.
///
/// A blocking read cannot be cancelled, so a read abandoned by `select!`
/// stays pending here and is handed to the next caller instead of racing
/// whatever prompt comes after it.
pub struct LineReader {
    requests: std_mpsc::Sender<()>,
    lines: mpsc::UnboundedReceiver<io::Result<Option<String>>>,
    pending: bool,
}

impl LineReader {
    pub fn spawn() -> Self {
        Self::from_reader(io::BufReader::new(io::stdin()))
    }

    fn from_reader<R: BufRead + Send + 'static>(mut reader: R) -> Self {
        let (requests, request_rx) = std_mpsc::channel::<()>();
        let (line_tx, lines) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            while request_rx.recv().is_ok() {
                let mut line = String::new();
                let result = match reader.read_line(&mut line) {
                    Ok(0) => Ok(None),
                    Ok(_) => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
                    Err(e) => Err(e),
                };
                if line_tx.send(result).is_err() {
                    break;
                }
            }
        });

        Self {
            requests,
            lines,
            pending: false,
        }
    }

    /// Next line, or `None` at end of input. Cancel safe.
    pub async fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        if !self.pending {
            self.requests
                .send(())
                .map_err(|_| anyhow!("stdin reader stopped"))?;
            self.pending = true;
        }

        let line = self
            .lines
            .recv()
            .await
            .ok_or_else(|| anyhow!("stdin reader stopped"))??;
        self.pending = false;
        Ok(line)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Let a read left pending by a cancelled `next_line` complete, so the
    /// next prompt owns the terminal.
    pub async fn release(&mut self) -> anyhow::Result<()> {
        if self.pending {
            println!("Press Enter to continue");
            self.next_line().await?;
        }
        Ok(())
    }
}
