//! finable-daemon: voice dialogue controller for the Finable finance tracker
//!
//! This daemon runs next to the Finable client and provides:
//! - Command classification for recognized utterances
//! - A voice form dialogue that files income and expense records
//! - A JSON ledger of records with running totals
//! - IPC server for client requests and controller notifications
//!
//! Speech capture and synthesis stay in the client; the daemon only
//! receives transcripts and emits speak/recognition directives.

mod config;
mod events;
mod ipc;
mod lifecycle;
mod state;
mod store;
mod voice;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::events::ControllerEvent;
use crate::ipc::{DaemonStatus, Server, ServerContext};
use crate::lifecycle::ShutdownSignal;
use crate::state::Controller;
use crate::store::{JsonStore, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "finable-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        ?config.socket_path,
        ?config.store_path,
        form_interrupt = ?config.form_interrupt,
        "configuration loaded"
    );

    let json_store = JsonStore::open(&config.store_path).await?;
    info!(path = ?json_store.path(), "record store opened");
    let store: Arc<dyn RecordStore> = Arc::new(json_store);

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // IPC server -> controller
    let (input_tx, input_rx) = mpsc::channel(32);
    // Controller -> IPC server and subscribed clients
    let (event_tx, _event_rx) = broadcast::channel::<ControllerEvent>(64);

    let mut controller = Controller::new(Arc::clone(&store), event_tx.clone())
        .with_interrupt_policy(config.form_interrupt)
        .with_speech_enabled(config.speech_enabled)
        .with_welcome(config.welcome);

    let status = DaemonStatus {
        speech_enabled: config.speech_enabled,
        speech: config.speech.clone(),
        recognition: config.recognition.clone(),
        ..DaemonStatus::default()
    };
    let context = ServerContext {
        input_tx,
        store,
        event_tx: event_tx.clone(),
    };
    let server = Server::new(&config.socket_path, context, status)?;

    // Subscribe before the controller runs so the welcome is reflected in status
    let mut ipc_event_rx = event_tx.subscribe();
    let server_for_events = &server;

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the controller (processes queued voice input)
        _ = controller.run(input_rx) => {
            info!("voice controller exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Keep the status snapshot in step with the controller
        _ = async {
            loop {
                match ipc_event_rx.recv().await {
                    Ok(event) => {
                        debug!(%event, "controller event received");
                        server_for_events.apply_event(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "controller event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("controller event handler exited");
        }

        // Wait for shutdown signal
        result = shutdown.wait() => {
            match result {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!(?e, "failed to register signal handlers"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    server.shutdown().await;

    info!("finable-daemon stopped");

    Ok(())
}
