use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::error::AppError;

/// Reusable CLI application runner that handles:
/// - Signal handling (SIGINT, SIGTERM, SIGHUP)
/// - Bridging signals into a cancellation token
/// - Exit codes (0 = clean stop, 1 = error)
///
/// A termination signal cancels the token handed to the entry point;
/// the work is expected to observe it, drain and return on its own.
pub struct CliApp {
    name: String,
}

impl CliApp {
    /// Create a new CLI application runner
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Run the application entry point to completion.
    ///
    /// This function never returns - it calls std::process::exit with
    /// the appropriate code once `main_fn` resolves.
    pub async fn run<F, Fut>(self, main_fn: F) -> !
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<(), AppError>>,
    {
        let cancel = CancellationToken::new();

        let signal_cancel = cancel.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("shutdown signal received, draining");
            signal_cancel.cancel();
        });

        match main_fn(cancel).await {
            Ok(()) => std::process::exit(0),
            Err(error) => {
                eprintln!("{}: {error}", self.name);
                std::process::exit(1);
            }
        }
    }
}

/// Wait for any Unix termination signal (SIGINT, SIGTERM, SIGHUP), or
/// Ctrl+C elsewhere
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to setup SIGINT handler");
        let mut sighup = signal(SignalKind::hangup()).expect("Failed to setup SIGHUP handler");

        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
            _ = sighup.recv() => info!("received SIGHUP"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to setup Ctrl+C handler");
        info!("received Ctrl+C");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_app_new() {
        let app = CliApp::new("test-app");
        assert_eq!(app.name, "test-app");
    }
}
