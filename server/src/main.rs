use clap::Parser;
use log::{error, info};
use server::config::Config;
use server::network::GameServer;

/// Main-method of the application.
/// Parses command-line arguments, binds the listener and runs the server until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = Config::parse();
    info!(
        "Starting server on {} with a {}x{} grid",
        config.address(),
        config.grid_size,
        config.grid_size
    );

    let server = GameServer::bind(config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
