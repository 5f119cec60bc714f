use super::AppContext;
use comfy_table::{presets::UTF8_FULL, Table};
use quizonaire_core::{GameOutcome, HistoryStore};

pub async fn handle_history(limit: usize, ctx: &AppContext) -> anyhow::Result<()> {
    let storage = ctx.storage().await?;
    let store = HistoryStore::new(&storage);

    let records = store.list_records(limit).await?;
    if records.is_empty() {
        println!("No games played yet. Start one with 'quizonaire play'.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Date", "Topic", "Correct", "Stake", "Prize", "Outcome"]);

    for record in &records {
        let outcome = match record.outcome {
            GameOutcome::Settled => "Settled",
            GameOutcome::Abandoned => "Abandoned",
        };
        table.add_row(vec![
            record.created_at.format("%Y-%m-%d %H:%M").to_string(),
            record.topic.clone(),
            format!("{}/{}", record.correct_answers, record.question_count),
            record.total_cost.to_string(),
            record.prize.map_or("-".to_string(), |p| p.to_string()),
            outcome.to_string(),
        ]);
    }

    println!("{}", table);

    let summary = store.summary().await?;
    println!("Games played: {}", summary.games_played);
    println!("Total staked: {} {}", summary.total_staked, ctx.currency());
    println!("Total won: {} {}", summary.total_won, ctx.currency());
    println!("Net: {} {}", summary.net(), ctx.currency());

    Ok(())
}
