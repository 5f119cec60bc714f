use super::{base_price_from_args, AppContext};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Table};
use quizonaire_game::game::question_duration;
use quizonaire_game::QuizGenerator;

#[derive(Args)]
pub struct PreviewArgs {
    /// Quiz topic
    #[arg(short, long, default_value = "Rust programming")]
    pub topic: String,

    /// Price tier: novice, acolyte, adept or master
    #[arg(long)]
    pub tier: Option<String>,

    /// Custom base price per difficulty point
    #[arg(short, long)]
    pub price: Option<f64>,
}

/// Generate a quiz and print it. Nothing is staked and no answers are shown.
pub async fn handle_preview(args: PreviewArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let base_price =
        base_price_from_args(args.price, args.tier.as_deref())?.unwrap_or(ctx.quiz.base_price);
    let generator = QuizGenerator::from_config(ctx.text_model()?, &ctx.quiz);

    println!(
        "Generating quiz about \"{}\" with {}...",
        args.topic,
        generator.model_name()
    );
    let session = generator.generate(&args.topic, base_price).await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Question", "Options", "Difficulty", "Cost", "Time (s)"]);

    for question in session.questions() {
        table.add_row(vec![
            (question.index + 1).to_string(),
            question.prompt.clone(),
            question.options.join("\n"),
            question.difficulty.to_string(),
            question.cost.to_string(),
            question_duration(question.difficulty, ctx.quiz.min_question_secs).to_string(),
        ]);
    }

    println!("{}", table);
    println!(
        "Total stake: {} {} (base price {})",
        session.total_cost(),
        ctx.currency(),
        base_price
    );
    println!(
        "Maximum prize: {} {}",
        session.total_cost() * ctx.quiz.win_multiplier,
        ctx.currency()
    );

    Ok(())
}
