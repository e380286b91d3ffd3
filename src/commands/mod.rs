mod relabel;
mod targets;

use std::path::Path;

use argh::FromArgs;
use exitcode::ExitCode;
use promeval::config::{self, Config};
use promeval::eval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Exit code of a run interrupted by SIGINT or SIGTERM.
pub const INTERRUPTED: ExitCode = 130;

#[derive(FromArgs)]
#[argh(subcommand)]
pub enum SubCommands {
    Targets(targets::Targets),
    Relabel(relabel::Relabel),
}

impl SubCommands {
    pub async fn run(&self) -> Result<(), ExitCode> {
        match self {
            SubCommands::Targets(targets) => targets.run().await,
            SubCommands::Relabel(relabel) => relabel.run(),
        }
    }
}

fn load_config(path: &Path, configmap_item: Option<&str>) -> Result<Config, ExitCode> {
    config::load(path, configmap_item).map_err(|err| {
        error!(message = "Load configuration failed", ?path, %err);
        exitcode::CONFIG
    })
}

fn handle_eval_error(err: eval::Error) -> ExitCode {
    match err {
        eval::Error::Cancelled(_) => {
            warn!(message = "Evaluation interrupted");
            INTERRUPTED
        }
        eval::Error::JobNotFound(_) | eval::Error::NoRelabelRules(_) => {
            error!(message = "Configuration error", %err);
            exitcode::CONFIG
        }
        eval::Error::Target { .. } => {
            error!(message = "Malformed target", %err);
            exitcode::DATAERR
        }
    }
}

/// Returns a token which is cancelled once SIGINT or SIGTERM is received.
fn shutdown_on_signal() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;

        info!(message = "Signal received, shutting down");
        trigger.cancel();
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut sigint, mut sigterm) =
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
            (Err(err), _) | (_, Err(err)) => {
                warn!(message = "Failed to set up signal handlers", %err);
                return std::future::pending().await;
            }
        };

    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(message = "Failed to set up signal handlers", %err);
        std::future::pending::<()>().await;
    }
}
