//! Serve command: runs the expansion daemon in the foreground.

use tracing::{info, warn};

use gathercal_server::{Daemon, SignalHandler};

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Runs scheduled expansions until SIGTERM or Ctrl-C.
pub async fn run(config: &ClientConfig) -> ClientResult<()> {
    config.validate()?;

    let store = super::open_store(config).await?;
    info!(path = %store.path().display(), "Using store");

    let signal_handler = SignalHandler::new();
    signal_handler.spawn_listener()?;

    let daemon = Daemon::new(config.to_server_config(), super::as_dyn(store));
    let state = daemon.run(signal_handler.shutdown()).await?;

    if state.gave_up {
        warn!(
            failures = state.consecutive_failures,
            last_error = state.last_error.as_deref().unwrap_or("unknown"),
            "Scheduler gave up"
        );
    }
    info!(runs = state.runs, "Daemon stopped");
    Ok(())
}
