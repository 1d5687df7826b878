use anyhow::Result;
use cambio::core::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for cambio::AppCommand {
    fn from(cmd: Commands) -> cambio::AppCommand {
        match cmd {
            Commands::Convert {
                base,
                quote,
                amount,
                commission,
            } => cambio::AppCommand::Convert {
                base,
                quote,
                amount,
                commission,
            },
            Commands::Eval { expression } => cambio::AppCommand::Eval {
                expression: expression.join(" "),
            },
            Commands::Currencies => cambio::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Source currency (name, ticker code, or alias)
        base: String,
        /// Target currency (name, ticker code, or alias)
        quote: String,
        /// Amount to convert
        amount: f64,
        /// Commission percent applied on top of the rate
        #[arg(short = 'm', long)]
        commission: Option<f64>,
    },
    /// Evaluate a compound currency expression, e.g. "100 usd + 50 eur to rub"
    Eval {
        /// Expression tokens; quoting is optional
        #[arg(required = true)]
        expression: Vec<String>,
    },
    /// List supported currencies
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => cambio::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = cambio::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
providers:
  coingecko:
    base_url: "https://api.coingecko.com/api/v3"
  openexchangerates:
    base_url: "https://openexchangerates.org"
    app_id: ""

commission: 0.0
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
