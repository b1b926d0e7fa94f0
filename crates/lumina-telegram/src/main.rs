//! Lumina Telegram Bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx LUMINA_CHANNEL_ID=-100123 cargo run -p lumina-telegram
//! ```

use std::path::PathBuf;

use clap::Parser;
use lumina_core::{config, BotSettings};
use lumina_persistence::DataStore;
use lumina_telegram::{create_shared_state, LuminaBot, Services};
use tracing_subscriber::EnvFilter;

/// Lumina - community bot with weather alerts, quotes and a sales leaderboard
#[derive(Parser, Debug)]
#[command(name = "lumina-telegram")]
#[command(about = "Telegram bot for the Lumina community")]
struct Args {
    /// Data file (default: ~/.lumina/state/lumina_data.json)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Serve GET /health on this port
    #[arg(long)]
    health_port: Option<u16>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    config::load_env_files();

    // Initialize logging based on verbosity
    let filter = match args.verbose {
        0 => "lumina_telegram=info,lumina_core=info,lumina_persistence=info,teloxide=warn",
        1 => "lumina_telegram=debug,lumina_core=debug,lumina_persistence=debug,teloxide=info",
        2 => "lumina_telegram=trace,lumina_core=trace,lumina_persistence=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = config::ensure_all_dirs() {
        tracing::warn!(error = %e, "Failed to create all directories");
    }

    let settings = BotSettings::from_env()?;
    let services = Services::live(&settings)?;
    let store = DataStore::new(args.data_file.unwrap_or_else(config::data_file));
    let state = create_shared_state(settings, store, services)?;

    let bot = LuminaBot::new(state)?.with_health_port(args.health_port);

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[bot] Lumina");
            println!("   Bot: @{}", username);
            if let Some(port) = args.health_port {
                println!("   Health: http://0.0.0.0:{}/health", port);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("   Press Ctrl+C to stop\n");

    bot.start_polling().await?;

    Ok(())
}
