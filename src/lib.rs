pub mod cli;
pub mod config;
pub mod converter;
pub mod core;
pub mod expression;
pub mod providers;

pub use crate::core::vocabulary::normalize_currency_name;

use crate::converter::Converter;
use crate::core::RateCache;
use crate::providers::coingecko::CoinGeckoProvider;
use crate::providers::openexchange::OpenExchangeRatesProvider;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        base: String,
        quote: String,
        amount: f64,
        commission: Option<f64>,
    },
    Eval {
        expression: String,
    },
    Currencies,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("cambio starting...");

    if let AppCommand::Currencies = command {
        return cli::currencies::run();
    }

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let coingecko_url = config
        .providers
        .coingecko
        .as_ref()
        .map_or("https://api.coingecko.com/api/v3", |p| &p.base_url);
    let crypto_provider = CoinGeckoProvider::new(coingecko_url);

    let (oxr_url, oxr_app_id) = config
        .providers
        .openexchangerates
        .as_ref()
        .map_or(("https://openexchangerates.org", ""), |p| {
            (p.base_url.as_str(), p.app_id.as_str())
        });
    let fiat_provider = OpenExchangeRatesProvider::new(oxr_url, oxr_app_id);

    let converter = Converter::new(crypto_provider, fiat_provider, RateCache::new());

    match command {
        AppCommand::Convert {
            base,
            quote,
            amount,
            commission,
        } => {
            let commission = commission.unwrap_or(config.commission);
            cli::convert::run(&converter, &base, &quote, amount, commission).await
        }
        AppCommand::Eval { expression } => cli::eval::run(&converter, &expression).await,
        AppCommand::Currencies => unreachable!("handled above"),
    }
}
