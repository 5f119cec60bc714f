use super::{base_price_from_args, AppContext};
use crate::input::LineReader;
use anyhow::bail;
use chrono::{DateTime, Utc};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::{Confirm, Input, Select};
use quizonaire_core::{GameOutcome, GameRecord, HistoryStore, Storage};
use quizonaire_game::game::question_duration;
use quizonaire_game::{
    create_game, ClockDriver, GameError, GameEvent, GameSession, GameState, PriceTier, QuizGame,
};

#[derive(Args)]
pub struct PlayArgs {
    /// Quiz topic (prompted if omitted)
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Price tier: novice, acolyte, adept or master
    #[arg(long)]
    pub tier: Option<String>,

    /// Custom base price per difficulty point
    #[arg(short, long)]
    pub price: Option<f64>,
}

pub async fn handle_play(args: PlayArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let storage = ctx.storage().await?;
    let model = ctx.text_model()?;
    let gateway = ctx.gateway().await?;
    let mut game = create_game(&ctx.quiz, model, gateway);
    let mut lines = LineReader::spawn();

    let preset_price = base_price_from_args(args.price, args.tier.as_deref())?;
    let mut topic = args.topic;

    game.dispatch(GameEvent::Open).await?;

    loop {
        let quiz_topic = match topic.take() {
            Some(t) => t,
            None => Input::<String>::new()
                .with_prompt("Quiz topic")
                .interact_text()?,
        };
        let base_price = match preset_price {
            Some(price) => price,
            None => choose_base_price(ctx)?,
        };

        println!("Generating quiz about \"{}\"...", quiz_topic);
        if let Err(e) = game
            .dispatch(GameEvent::Generate {
                topic: quiz_topic.clone(),
                base_price,
            })
            .await
        {
            println!("Could not generate the quiz: {}", e);
            if ask("Try again?", true)? {
                topic = Some(quiz_topic);
                continue;
            }
            return Ok(());
        }

        let Some(session) = game.session() else {
            bail!("quiz generated but no session available");
        };
        print_quiz_summary(session, ctx);

        let prompt = format!(
            "Stake {} {} and start?",
            session.total_cost(),
            ctx.currency()
        );
        if !ask(&prompt, true)? {
            game.dispatch(GameEvent::Reset).await?;
            if ask("Generate another quiz?", true)? {
                continue;
            }
            return Ok(());
        }

        if !start_game(&mut game).await? {
            game.dispatch(GameEvent::Reset).await?;
            if ask("Generate another quiz?", false)? {
                continue;
            }
            return Ok(());
        }

        let finished = answer_questions(&mut game, &mut lines).await?;
        lines.release().await?;
        if finished && settle_game(&mut game).await? {
            print_review(&game, ctx);
            save_record(&storage, &game, GameOutcome::Settled).await;
        } else {
            println!("Game abandoned before settlement. The stake stays in the contract.");
            save_record(&storage, &game, GameOutcome::Abandoned).await;
        }

        game.dispatch(GameEvent::Reset).await?;
        if !ask("Play again?", true)? {
            return Ok(());
        }
    }
}

fn ask(prompt: &str, default: bool) -> anyhow::Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

fn choose_base_price(ctx: &AppContext) -> anyhow::Result<f64> {
    let mut items: Vec<String> = PriceTier::ALL
        .iter()
        .map(|tier| {
            format!(
                "{:<8} {} {} per point - {}",
                tier.label(),
                tier.base_price(),
                ctx.currency(),
                tier.description()
            )
        })
        .collect();
    items.push("Custom".to_string());

    let selection = Select::new()
        .with_prompt("Choose your trial")
        .items(&items)
        .default(0)
        .interact()?;

    match PriceTier::ALL.get(selection) {
        Some(tier) => Ok(tier.base_price()),
        None => {
            let price: f64 = Input::new()
                .with_prompt("Base price per difficulty point")
                .validate_with(|value: &f64| {
                    if value.is_finite() && *value > 0.0 {
                        Ok(())
                    } else {
                        Err("must be a positive number")
                    }
                })
                .interact_text()?;
            Ok(price)
        }
    }
}

fn print_quiz_summary(session: &GameSession, ctx: &AppContext) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Difficulty", "Cost", "Time (s)"]);

    for question in session.questions() {
        table.add_row(vec![
            (question.index + 1).to_string(),
            question.difficulty.to_string(),
            format!("{} {}", question.cost, ctx.currency()),
            question_duration(question.difficulty, ctx.quiz.min_question_secs).to_string(),
        ]);
    }

    println!();
    println!("Quiz about \"{}\" is ready", session.topic());
    println!("{}", table);
    println!("Total stake: {} {}", session.total_cost(), ctx.currency());
    println!(
        "Each correct answer pays its cost x{}",
        ctx.quiz.win_multiplier
    );
    println!();
}

/// Returns false when the player gave up after a failed start.
async fn start_game(game: &mut QuizGame) -> anyhow::Result<bool> {
    loop {
        println!("Waiting for the stake transaction to confirm...");
        match game.dispatch(GameEvent::Start).await {
            Ok(_) => {
                if let Some(receipt) = game.start_receipt() {
                    println!("Stake locked in tx {}", receipt.tx_hash);
                }
                return Ok(true);
            }
            Err(e) => {
                println!("Start game failed: {}", e);
                warn_if_sent(&e);
                if !ask("Retry the start transaction?", true)? {
                    return Ok(false);
                }
            }
        }
    }
}

fn warn_if_sent(error: &GameError) {
    if let Some(hash) = error.transaction().and_then(|e| e.tx_hash()) {
        println!(
            "Transaction {} reached the node. Check whether it was mined before retrying.",
            hash
        );
    }
}

/// Map "1".."4" to the option text.
fn parse_choice<'a>(input: &str, options: &'a [String; 4]) -> Option<&'a str> {
    let n: usize = input.trim().parse().ok()?;
    options.get(n.checked_sub(1)?).map(String::as_str)
}

fn show_question(game: &QuizGame) {
    let Some(question) = game.current_question() else {
        return;
    };
    let total = game.session().map_or(0, |s| s.len());

    println!();
    println!(
        "Question {}/{} (difficulty {}, {}s)",
        question.index + 1,
        total,
        question.difficulty,
        game.remaining_secs()
    );
    println!("{}", question.prompt);
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}) {}", i + 1, option);
    }
    println!("Type 1-4 and press Enter (q to quit):");
}

/// Returns true when every question was answered or timed out, false when
/// the player quit.
async fn answer_questions(game: &mut QuizGame, lines: &mut LineReader) -> anyhow::Result<bool> {
    let mut clock = ClockDriver::every_second();
    show_question(game);

    loop {
        match game.state() {
            GameState::GameInProgress => {}
            GameState::GameWaitNextQuestion => {
                println!("Press Enter for the next question");
                if lines.next_line().await?.is_none() {
                    return Ok(false);
                }
                game.dispatch(GameEvent::Next).await?;
                clock = ClockDriver::every_second();
                show_question(game);
                continue;
            }
            GameState::GameFinished => return Ok(true),
            other => bail!("unexpected state {} while answering", other),
        }

        tokio::select! {
            _ = clock.tick() => {
                game.dispatch(GameEvent::Tick).await?;
                let remaining = game.remaining_secs();
                if game.state() != GameState::GameInProgress {
                    println!("Time is up!");
                } else if remaining <= 5 || remaining % 10 == 0 {
                    println!("{}s left", remaining);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(false);
                };
                if line.trim().eq_ignore_ascii_case("q") {
                    return Ok(false);
                }

                let choice = game
                    .current_question()
                    .and_then(|q| parse_choice(&line, &q.options))
                    .map(str::to_string);
                match choice {
                    Some(answer) => {
                        game.dispatch(GameEvent::Answer(answer)).await?;
                        println!("Answer committed");
                    }
                    None => println!("Please type a number from 1 to 4"),
                }
            }
        }
    }
}

/// Returns false when the player gave up after a failed settlement.
async fn settle_game(game: &mut QuizGame) -> anyhow::Result<bool> {
    loop {
        println!("Revealing answers and claiming the prize...");
        match game.dispatch(GameEvent::End).await {
            Ok(_) => return Ok(true),
            Err(e) => {
                println!("End game failed: {}", e);
                warn_if_sent(&e);
                if !ask("Retry the settlement transaction?", true)? {
                    return Ok(false);
                }
            }
        }
    }
}

fn print_review(game: &QuizGame, ctx: &AppContext) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Question", "Your answer", "Correct answer", ""]);

    for (i, entry) in game.review().iter().enumerate() {
        let mark = if entry.is_correct() { "✅" } else { "❌" };
        table.add_row(vec![
            (i + 1).to_string(),
            entry.question.clone(),
            entry
                .player_answer
                .clone()
                .unwrap_or_else(|| "(timed out)".to_string()),
            entry.correct_answer.clone().unwrap_or_default(),
            mark.to_string(),
        ]);
    }

    println!("{}", table);

    if let Some(settlement) = game.settlement() {
        println!(
            "{} of {} correct",
            settlement.correct,
            settlement.review.len()
        );
        println!("Prize: {} {}", settlement.prize, ctx.currency());
    }
    if let Some(receipt) = game.end_receipt() {
        println!("Settled in tx {}", receipt.tx_hash);
    }
}

fn build_record(game: &QuizGame, outcome: GameOutcome) -> Option<GameRecord> {
    let session = game.session()?;
    let settlement = game.settlement();

    Some(GameRecord {
        session_id: session.id(),
        topic: session.topic().to_string(),
        base_price: session.base_price(),
        question_count: session.len() as u32,
        total_cost: session.total_cost(),
        correct_answers: settlement.map_or(0, |s| s.correct as u32),
        prize: match outcome {
            GameOutcome::Settled => settlement.map(|s| s.prize),
            GameOutcome::Abandoned => None,
        },
        outcome,
        start_tx: game.start_receipt().map(|r| r.tx_hash.clone()),
        end_tx: game.end_receipt().map(|r| r.tx_hash.clone()),
        created_at: DateTime::from_timestamp_millis(session.id() as i64).unwrap_or_else(Utc::now),
        finished_at: Utc::now(),
    })
}

async fn save_record(storage: &Storage, game: &QuizGame, outcome: GameOutcome) {
    let Some(record) = build_record(game, outcome) else {
        return;
    };
    if let Err(e) = HistoryStore::new(storage).save_record(&record).await {
        tracing::warn!("Failed to save game {} to history: {}", record.session_id, e);
    }
}
