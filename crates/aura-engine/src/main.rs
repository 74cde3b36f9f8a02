//! Engine binary for the Aura cognitive mirror.
//!
//! Wires the session loop to persistence, the completion service and the
//! operator API, then runs until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `aura-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Connect the record store
//! 4. Hydrate the session from persisted history and observations
//! 5. Create the completion-service client
//! 6. Start the operator API server
//! 7. Run the engine loop
//! 8. Flush pending writes, close the store, log the result

mod callback;
mod dispatcher;
mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use aura_core::commands::EngineHandle;
use aura_core::config::{AuraConfig, LoggingConfig, StorageBackend, StorageConfig};
use aura_core::runner::{LoopConfig, SystemClock, run_session};
use aura_core::session::{MirrorSession, SessionSettings};
use aura_db::{DragonflyStore, MemoryStore, PostgresConfig, PostgresStore, RecordStore};
use aura_observer::{AppState, ServerConfig};
use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::callback::ObserverCallback;
use crate::dispatcher::StoreDispatcher;
use crate::error::EngineError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "aura-config.yaml";

/// Pending commands the queue holds before senders wait.
const COMMAND_QUEUE_CAPACITY: usize = 256;

/// How long shutdown waits for queued writes to reach the store.
const WRITE_FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// How long shutdown waits for open operator connections to close.
const SERVER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging depends on it, so it comes first.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("aura-engine starting");
    info!(
        from_file,
        backend = ?config.storage.backend,
        tick_interval_ms = config.timeline.tick_interval_ms,
        refresh_interval_ms = config.timeline.refresh_interval_ms,
        "Configuration loaded"
    );

    // 3. Connect the record store.
    let store = connect_store(&config.storage).await?;
    info!(backend = store.backend_name(), "Record store connected");

    // 4. Hydrate the session.
    let particles = store.load_particles().await?;
    let messages = store.load_messages().await?;
    let audit = store.load_audit().await?;
    let mut session = MirrorSession::new(SessionSettings::from_config(&config), Utc::now());
    let report = session.hydrate(particles, messages, Utc::now());
    let observations = session.restore_observations(&audit);
    let genesis = session.record_genesis(Utc::now());
    info!(
        particles = report.particles,
        messages = report.messages,
        observations,
        greeted = report.greeted,
        genesis = %genesis.id,
        "Session ready"
    );

    // 5. Create the completion-service client.
    let oracle = aura_oracle::create_oracle(&config.oracle)?;
    info!(oracle = oracle.name(), "Completion service ready");

    // 6. Start the operator API server.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (engine, commands) = EngineHandle::channel(COMMAND_QUEUE_CAPACITY);
    let app_state = Arc::new(AppState::new(engine, oracle));
    let server_config = ServerConfig {
        host: config.observer.host.clone(),
        port: config.observer.port,
    };
    let observer_handle = aura_observer::spawn_observer(
        &server_config,
        Arc::clone(&app_state),
        wait_for_shutdown(shutdown_rx.clone()),
    )
    .await
    .map_err(|e| EngineError::Observer {
        message: format!("{e}"),
    })?;
    info!(
        host = %server_config.host,
        port = server_config.port,
        "Operator API server started"
    );

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Dropping the sender would read as a shutdown request.
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    });

    // 7. Run the engine loop.
    let mut callback = ObserverCallback::new(app_state);
    let mut dispatcher = StoreDispatcher::new(store.clone());
    let summary = run_session(
        &mut session,
        commands,
        LoopConfig::from_config(&config.timeline),
        &SystemClock,
        &mut callback,
        &mut dispatcher,
        wait_for_shutdown(shutdown_rx),
    )
    .await;

    // 8. Flush writes, stop the server, log the result.
    dispatcher.flush(WRITE_FLUSH_TIMEOUT).await;
    if let Err(e) = store.close().await {
        warn!(error = %e, "Record store did not close cleanly");
    }
    match tokio::time::timeout(SERVER_DRAIN_TIMEOUT, observer_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Operator server task did not finish cleanly"),
        Err(_) => warn!("Operator server still draining connections, exiting anyway"),
    }
    info!(
        end_reason = ?summary.end_reason,
        ticks = summary.ticks,
        frames = summary.frames,
        commands = summary.commands,
        "aura-engine shutdown complete"
    );

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load `aura-config.yaml` from the working directory, or defaults when
/// it is absent. Environment overrides apply either way. The flag reports
/// whether the file was found.
fn load_config() -> Result<(AuraConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((AuraConfig::from_file(config_path)?, true))
    } else {
        let mut config = AuraConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}

/// Connect the configured backend.
async fn connect_store(storage: &StorageConfig) -> Result<RecordStore, EngineError> {
    let store = match storage.backend {
        StorageBackend::Memory => RecordStore::from(MemoryStore::new()),
        StorageBackend::Dragonfly => {
            info!(url = %storage.dragonfly_url, "Connecting to Dragonfly");
            RecordStore::from(
                DragonflyStore::connect(&storage.dragonfly_url, &storage.key_prefix).await?,
            )
        }
        StorageBackend::Postgres => {
            info!("Connecting to PostgreSQL");
            RecordStore::from(
                PostgresStore::connect(&PostgresConfig::new(&storage.postgres_url)).await?,
            )
        }
    };
    Ok(store)
}

/// Resolves once the shutdown flag flips (or its sender is gone).
async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
