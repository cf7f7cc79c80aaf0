mod console;
mod settings;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use parley_store::Database;

use crate::settings::ParleySettings;

#[derive(Parser)]
#[command(name = "parley", version, about = "Status updates, follows and direct messages")]
struct Cli {
    /// Settings file (defaults to ~/.parley/settings.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP views.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// SQLite database file.
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Run the console demo against a local database file.
    Demo {
        #[arg(long, default_value = "messaging_app.db")]
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = settings::load_settings(cli.config.as_deref())
        .context("loading settings")?;
    parley_telemetry::init_telemetry(&settings.telemetry_config())?;

    match cli.command {
        Command::Serve { host, port, db } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            if let Some(db) = db {
                settings.database.path = db;
            }
            serve(&settings).await
        }
        Command::Demo { db } => {
            let db = Database::open(&db)
                .with_context(|| format!("opening {}", db.display()))?;
            console::run_demo(db, std::io::stdout().lock())?;
            Ok(())
        }
    }
}

async fn serve(settings: &ParleySettings) -> anyhow::Result<()> {
    tracing::info!("Starting parley server");

    let db = Database::open(&settings.database.path)
        .with_context(|| format!("opening {}", settings.database.path.display()))?;

    let handle = parley_server::start(settings.server_config(), db).await?;
    tracing::info!(port = handle.port(), "parley server ready");

    tokio::signal::ctrl_c()
        .await
        .context("listening for ctrl+c")?;

    tracing::info!("Shutting down");
    handle.shutdown().await;
    Ok(())
}
