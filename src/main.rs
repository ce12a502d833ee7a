use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use gatekeeper::logging::init_tracing;
use gatekeeper::metrics::{init_metrics, metrics_app};
use gatekeeper::router::init_router;
use gatekeeper::state::init_app_state;
use gatekeeper_config::ServerConfig;
use gatekeeper_core::hash_password;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(about = "Gatekeeper - authentication gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway (default)
    Serve,
    /// Print a bcrypt hash for seeding the identity store
    HashPassword {
        /// Password to hash
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await,
        Commands::HashPassword { password } => {
            let hash = hash_password(&password).map_err(|e| e.error)?;
            println!("{hash}");
            Ok(())
        }
    }
}

async fn serve() -> anyhow::Result<()> {
    init_tracing()?;

    let server_config = ServerConfig::from_env();

    if let Some(handle) = init_metrics()? {
        let metrics_address = server_config.metrics_address();
        let listener = tokio::net::TcpListener::bind(&metrics_address)
            .await
            .with_context(|| format!("failed to bind metrics listener on {metrics_address}"))?;
        info!(address = %metrics_address, "Metrics available at /metrics");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let state = init_app_state().await?;
    let app = init_router(state);

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(address = %address, "Gatekeeper listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
