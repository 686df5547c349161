use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use allocsync::api::{self, AppState};
use allocsync::config::SyncConfig;
use allocsync::coordinator::Coordinator;
use allocsync::db::Database;

#[derive(Parser)]
#[command(name = "allocsync")]
#[command(about = "Manifest-driven reconciliation for cluster resource management")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the AllocSync server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "8090")]
        port: u16,

        /// Directory holding the persisted manifest, hash, and ingest lock
        #[arg(long, default_value = "/var/run/allocsync")]
        run_dir: PathBuf,

        /// Path to the store database (defaults to the platform data dir)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "allocsync=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(port: u16, run_dir: PathBuf, db_path: Option<PathBuf>) -> anyhow::Result<()> {
    tracing::info!("Starting AllocSync server on port {}", port);

    let db = match db_path {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;

    // Clears any lock a crashed run left behind
    let coordinator = Arc::new(Coordinator::new(run_dir)?);
    let config = SyncConfig::from_env();

    let app = api::create_router(AppState {
        db,
        coordinator,
        config,
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("AllocSync server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve {
            port,
            run_dir,
            db_path,
        }) => serve(port, run_dir, db_path).await?,
        None => {
            // Default: start server with stock settings
            serve(8090, PathBuf::from("/var/run/allocsync"), None).await?;
        }
    }

    Ok(())
}
