use super::AppContext;
use clap::Subcommand;
use dialoguer::Confirm;
use quizonaire_game::OwnerConsole;

#[derive(Subcommand)]
pub enum OwnerCommands {
    /// Show contract owner and balance
    Status,
    /// Withdraw the whole contract balance to the owner
    Withdraw {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Close games that expired without settlement
    Finalize,
}

pub async fn handle_owner_command(cmd: OwnerCommands, ctx: &AppContext) -> anyhow::Result<()> {
    let console = OwnerConsole::new(ctx.gateway().await?);

    match cmd {
        OwnerCommands::Status => {
            let status = console.status().await?;

            println!("Contract: {}", display_contract(ctx));
            println!("  Owner: {}", status.owner);
            println!(
                "  Account: {}",
                status.account.as_deref().unwrap_or("(not connected)")
            );
            println!("  Balance: {} {}", status.balance, ctx.currency());
            if status.is_owner() {
                println!("  You are the owner");
            }
        }

        OwnerCommands::Withdraw { force } => {
            let status = console.status().await?;
            println!("Contract balance: {} {}", status.balance, ctx.currency());

            if !force {
                let confirm = Confirm::new()
                    .with_prompt("Withdraw the whole balance?")
                    .default(false)
                    .interact()?;
                if !confirm {
                    println!("Withdrawal cancelled.");
                    return Ok(());
                }
            }

            match console.withdraw_all().await? {
                Some((amount, receipt)) => {
                    println!("Withdrew {} {}", amount, ctx.currency());
                    println!("Transaction: {}", receipt.tx_hash);
                }
                None => println!("Nothing to withdraw."),
            }
        }

        OwnerCommands::Finalize => {
            println!("Finalizing expired games...");
            let receipt = console.finalize_expired().await?;
            println!("Done. Transaction: {}", receipt.tx_hash);
        }
    }

    Ok(())
}

fn display_contract(ctx: &AppContext) -> String {
    if ctx.cli.offline {
        "in-process (offline)".to_string()
    } else {
        ctx.quiz.contract_address.clone()
    }
}
