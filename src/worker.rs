use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use tracing::{error, info};

use crate::config::AppConfig;
use crate::export;
use crate::forecaster::Forecaster;
use crate::loader::TableCache;
use crate::state::{Command, Delta, Job};

/// Runs forecaster calls and data loads off the render thread. Exits when the
/// command channel closes or the UI stops listening.
pub fn spawn_worker(
    tx: Sender<Delta>,
    cmd_rx: Receiver<Command>,
    forecaster: Arc<dyn Forecaster>,
    cache: Arc<TableCache>,
    cfg: AppConfig,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        info!(forecaster = forecaster.name(), "worker started");
        while let Ok(cmd) = cmd_rx.recv() {
            let delta = handle_command(cmd, forecaster.as_ref(), &cache, &cfg);
            if tx.send(delta).is_err() {
                break;
            }
        }
        info!("worker stopped");
    })
}

pub fn handle_command(
    cmd: Command,
    forecaster: &dyn Forecaster,
    cache: &TableCache,
    cfg: &AppConfig,
) -> Delta {
    let (job, result) = match cmd {
        Command::LoadLocation(location) => (
            Job::Load,
            cache
                .load_location(&location, cfg.http_timeout_secs)
                .map(Delta::SetData),
        ),
        Command::LoadDefault => (
            Job::Load,
            Ok(Delta::SetData(cache.load_default(
                cfg.data_url.as_deref(),
                &cfg.sample_path,
                cfg.http_timeout_secs,
            ))),
        ),
        Command::Predict(table) => (
            Job::Predict,
            forecaster.predict(&table).map(Delta::SetPrediction),
        ),
        Command::Evaluate { table, number } => (
            Job::Evaluate,
            forecaster
                .evaluate(&table, number)
                .map(Delta::SetEvaluation),
        ),
        Command::SignTheory => (
            Job::SignTheory,
            forecaster.sign_theory(None).map(Delta::SetSignTheory),
        ),
        Command::Export {
            path,
            prediction,
            evaluation,
            sign,
        } => (
            Job::Export,
            export::export_report(&path, &prediction, evaluation.as_ref(), &sign)
                .map(|_| Delta::Exported(path.clone())),
        ),
    };

    result.unwrap_or_else(|err| {
        error!(?job, error = %format!("{err:#}"), "job failed");
        Delta::Failed {
            job,
            message: format!("{err:#}"),
        }
    })
}
