//! Chat Hub Server - Entry Point
//!
//! Spawns the configured participants, runs the session and prints
//! join/chat/leave announcements on stdout.

use std::process::ExitCode;

use tokio::sync::mpsc;
use tracing::{error, info};

use chat_hub::config::USAGE;
use chat_hub::{load_participants, logging, AppError, ChatServer, Registry, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::Usage(_) | AppError::ConfigRead { .. }) => {
            eprintln!("{}", USAGE);
            ExitCode::from(1)
        }
        Err(e) => {
            error!("Server failed: {}", e);
            eprintln!("{}", e);
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = ServerConfig::from_env()?;
    let specs = load_participants(&config.config_path).await?;
    info!(
        "Loaded {} participants from {}",
        specs.len(),
        config.config_path.display()
    );

    let registry = Registry::spawn_all(&specs)?;

    // Announcements are printed by a dedicated task, in order
    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(announcement) = rx.recv().await {
            println!("{}", announcement);
        }
    });

    let mut server = ChatServer::new(registry, tx)
        .with_reply_timeout(config.reply_timeout)
        .with_shutdown_grace(config.shutdown_grace);
    server.run().await;
    server.shutdown().await;

    // All senders are gone once the server is dropped
    if let Err(e) = printer.await {
        error!("Announcement printer failed: {}", e);
    }

    info!("Chat finished");
    Ok(())
}
