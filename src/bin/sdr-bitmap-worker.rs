use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sdr_bitmap::experiment::ExperimentRunner;
use sdr_bitmap::queue::{DirQueue, QueueListener, ShutdownSignal};
use sdr_bitmap::storage::FsStorageGateway;
use sdr_bitmap::WorkerConfig;

fn cli() -> Command {
    Command::new("sdr-bitmap-worker")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Queue worker that encodes SDRs and uploads bitmap renders")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(value_parser!(PathBuf))
                .help("JSON configuration file (defaults apply when omitted)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .default_value("info")
                .help("Log filter used when RUST_LOG is not set"),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .action(ArgAction::SetTrue)
                .help("Run a single poll iteration and exit"),
        )
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    init_tracing(level);

    let config = WorkerConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("loading worker configuration")?;

    let storage = Arc::new(FsStorageGateway::new(
        &config.storage_root,
        &config.input_dir,
        &config.result_dir,
        &config.result_table,
    ));
    let runner = ExperimentRunner::new(storage).with_settings(config.runner_settings());
    let queue = DirQueue::new(&config.queue_dir, config.visibility_timeout());
    let listener = QueueListener::new(queue, runner, config.poll_backoff());

    info!(
        storage_root = %config.storage_root.display(),
        queue_dir = %config.queue_dir.display(),
        "Worker configured"
    );

    if matches.get_flag("once") {
        let outcome = listener.poll_once().await;
        info!(?outcome, "Single poll finished");
        return Ok(());
    }

    let shutdown = ShutdownSignal::new();
    let on_ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Cancel pressed, finishing the current message");
            on_ctrl_c.cancel();
        }
    });

    let stats = listener.run(&shutdown).await;
    info!(
        polls = stats.polls,
        processed = stats.processed,
        failed = stats.failed,
        empty_polls = stats.empty_polls,
        "Worker stopped"
    );
    Ok(())
}
