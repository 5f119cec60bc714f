use super::AppContext;
use comfy_table::{presets::UTF8_FULL, Table};
use quizonaire_game::PriceTier;

pub fn handle_rules(ctx: &AppContext) -> anyhow::Result<()> {
    let quiz = &ctx.quiz;

    println!("How Quizonaire works");
    println!();
    println!(
        "1. Pick a topic. A language model writes {} questions, each with a random difficulty from 0 to 100.",
        quiz.question_count
    );
    println!("2. Every question costs difficulty x base price. Your stake is the sum of all costs.");
    println!("3. The stake is locked in the quiz contract when the game starts.");
    println!(
        "4. Each question has max({}, difficulty / 2) seconds. Running out of time counts as a wrong answer.",
        quiz.min_question_secs
    );
    println!("5. Your answers are committed as hashes and only revealed when the game ends.");
    println!(
        "6. Every correct answer pays back its cost x{}.",
        quiz.win_multiplier
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Tier", "Base price", "Max stake", ""]);

    for tier in PriceTier::ALL {
        let max_stake = 100.0 * tier.base_price() * quiz.question_count as f64;
        table.add_row(vec![
            tier.label().to_string(),
            format!("{} {}", tier.base_price(), ctx.currency()),
            format!("{} {}", max_stake, ctx.currency()),
            tier.description().to_string(),
        ]);
    }

    println!("{}", table);
    println!("A custom base price can be set with --price.");

    Ok(())
}
