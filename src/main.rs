//! lasereyes CLI
//!
//! Offline helpers around the wallet adapter: network translation, PSBT
//! re-encoding and the published package version.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use clap::{Parser, Subcommand};
    use lasereyes::providers::{get_binance_network, get_network_for_binance};
    use lasereyes::{psbt, Config, Network, Result};
    use std::path::PathBuf;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    #[derive(Parser)]
    #[command(name = "lasereyes")]
    #[command(about = "Binance Web3 Wallet adapter tools")]
    struct Cli {
        #[command(subcommand)]
        command: Commands,

        /// Path to config file
        #[arg(short, long, global = true)]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(short, long, global = true)]
        verbose: bool,
    }

    #[derive(Subcommand)]
    enum Commands {
        /// Fetch the published package version
        Version,

        /// Show how networks map to the extension's names
        Networks {
            /// Translate a network name reported by the extension
            #[arg(long)]
            binance: Option<String>,
        },

        /// Re-encode a PSBT as hex and base64
        Psbt {
            /// PSBT as hex (with or without 0x prefix)
            #[arg(long)]
            hex: String,
        },

        /// Show current configuration
        Config,
    }

    pub async fn run() -> Result<()> {
        // Load .env file if present (ignore if not found)
        dotenvy::dotenv().ok();

        let cli = Cli::parse();

        let filter = if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();

        let config = match cli.config {
            Some(path) => Config::from_file(path)?,
            None => Config::from_env(),
        };

        match cli.command {
            Commands::Version => {
                let url = config.version_source.url()?;
                tracing::debug!(url = %url, "Fetching package version");
                match lasereyes::fetch_package_version(&config.version_source).await {
                    Some(version) => println!("{}", version),
                    None => println!("unknown"),
                }
            }
            Commands::Networks { binance } => match binance {
                Some(name) => println!("{} -> {}", name, get_network_for_binance(&name)),
                None => print_network_table(config.network),
            },
            Commands::Psbt { hex } => {
                let encoded = psbt::reencode_hex(&hex)?;
                println!("{}", serde_json::to_string_pretty(&encoded)?);
            }
            Commands::Config => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }

        Ok(())
    }

    fn print_network_table(selected: Network) {
        for network in Network::ALL {
            let marker = if network == selected { "*" } else { " " };
            println!(
                "{} {:<16} {}",
                marker,
                network.name(),
                get_binance_network(network).as_str()
            );
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> lasereyes::Result<()> {
    cli::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
