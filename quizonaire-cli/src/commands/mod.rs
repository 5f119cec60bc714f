pub mod history;
pub mod owner;
pub mod play;
pub mod preview;
pub mod rules;

pub use history::handle_history;
pub use owner::{handle_owner_command, OwnerCommands};
pub use play::{handle_play, PlayArgs};
pub use preview::{handle_preview, PreviewArgs};
pub use rules::handle_rules;

use crate::config::CliConfig;
use anyhow::{bail, Context};
use quizonaire_core::{
    CannedModel, ContractGateway, MemoryGateway, ModelChain, QuizConfig, RpcGateway, Storage,
    TextModel, Wei,
};
use quizonaire_game::PriceTier;
use std::sync::Arc;

/// Account used by `--offline`; it also owns the simulated contract.
pub const OFFLINE_ACCOUNT: &str = "0x000000000000000000000000000000000000dEaD";

/// House balance the simulated contract starts with.
const OFFLINE_HOUSE_BALANCE: &str = "1000";

pub struct AppContext {
    pub cli: CliConfig,
    pub quiz: QuizConfig,
}

impl AppContext {
    pub fn new(cli: CliConfig, quiz: QuizConfig) -> Self {
        Self { cli, quiz }
    }

    pub async fn storage(&self) -> anyhow::Result<Storage> {
        let path = self.cli.db_path();
        Storage::new(&path)
            .await
            .with_context(|| format!("opening history at {}", path.display()))
    }

    pub async fn gateway(&self) -> anyhow::Result<Arc<dyn ContractGateway>> {
        if self.cli.offline {
            let house = Wei::parse_coins(OFFLINE_HOUSE_BALANCE)?;
            tracing::info!("Offline mode: using the in-process contract");
            return Ok(Arc::new(
                MemoryGateway::new(OFFLINE_ACCOUNT).with_house_balance(house),
            ));
        }

        self.quiz.validate_ledger()?;
        let gateway = RpcGateway::new(&self.quiz);
        println!("Connecting to {}...", self.quiz.network.chain_name);
        let account = gateway.connect().await?;
        println!("Connected as {}", account);
        Ok(Arc::new(gateway))
    }

    pub fn text_model(&self) -> anyhow::Result<Arc<dyn TextModel>> {
        if self.cli.offline {
            return Ok(Arc::new(CannedModel::sample_deck()));
        }
        Ok(Arc::new(ModelChain::from_config(&self.quiz.llm)?))
    }

    pub fn currency(&self) -> &str {
        &self.quiz.network.currency_symbol
    }
}

/// Explicit price wins over a named tier.
pub fn base_price_from_args(price: Option<f64>, tier: Option<&str>) -> anyhow::Result<Option<f64>> {
    if let Some(price) = price {
        if !(price.is_finite() && price > 0.0) {
            bail!("Base price must be a positive number, got {}", price);
        }
        return Ok(Some(price));
    }

    match tier {
        Some(name) => match PriceTier::parse(name) {
            Some(tier) => Ok(Some(tier.base_price())),
            None => bail!(
                "Unknown tier '{}'. Choose one of: novice, acolyte, adept, master",
                name
            ),
        },
        None => Ok(None),
    }
}
