mod error;
mod persistence;
mod server_config;
mod transactions;
mod web_server;
mod ws_handler;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use common::engine::{IntervalTickSource, SimulationSession};
use common::games::SystemClock;
use common::{log, log_error, logger};

use persistence::StateFileStore;
use server_config::{DEFAULT_CONFIG_PATH, get_config_manager};
use transactions::{ExplorerClient, TransactionFeed, run_poller, run_timer};
use web_server::{WebServerState, run_web_server};

#[derive(Parser)]
#[command(name = "token_snake_server")]
struct Args {
    /// YAML configuration file; defaults apply when it does not exist.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[arg(long)]
    use_log_prefix: bool,

    /// Overrides `listen_address` from the configuration.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let prefix = if args.use_log_prefix {
        Some("Server".to_string())
    } else {
        None
    };
    logger::init_logger(prefix);

    let mut config = get_config_manager(&args.config).get_config().inspect_err(|e| {
        log_error!("Failed to load {}: {}", args.config.display(), e);
    })?;
    if let Some(listen) = args.listen {
        config.listen_address = listen;
    }

    let session = SimulationSession::new(config.engine.clone(), Arc::new(SystemClock))?;

    let store = config.persistence.state_file.as_ref().map(StateFileStore::new);
    if config.persistence.restore_on_start
        && let Some(store) = &store
    {
        store.restore_into(&session).await;
    }

    let ticks = IntervalTickSource::new(Duration::from_millis(config.engine.poll_interval_ms));
    tokio::spawn({
        let session = session.clone();
        async move { session.run(ticks).await }
    });

    let client = ExplorerClient::new(&config.trigger)?;
    let feed = TransactionFeed::new(
        client,
        session.clone(),
        config.trigger.known_signature_capacity,
    );

    match config.trigger.token_address.clone() {
        Some(address) => {
            tokio::spawn(run_poller(
                feed.clone(),
                address,
                Duration::from_millis(config.trigger.poll_interval_ms),
            ));
        }
        None => log!("No token address configured, transfer poller disabled"),
    }

    if let Some((interval_ms, moves)) = config.trigger.timer() {
        tokio::spawn(run_timer(
            session.clone(),
            Duration::from_millis(interval_ms),
            moves,
        ));
    }

    if let Some(store) = store.clone() {
        tokio::spawn(store.run_autosave(
            session.clone(),
            Duration::from_millis(config.persistence.save_interval_ms),
        ));
    }

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        log!("Shutdown signal received");
    };

    let state = WebServerState {
        session: session.clone(),
        feed,
    };
    run_web_server(
        state,
        &config.listen_address,
        config.static_dir.as_deref(),
        shutdown_signal,
    )
    .await?;

    if let Some(store) = &store {
        match store.save_session(&session).await {
            Ok(()) => log!("State saved to {}", store.path().display()),
            Err(e) => log_error!("Failed to save state on shutdown: {}", e),
        }
    }

    log!("Server shut down gracefully");

    Ok(())
}
