use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use topwatch::config::{self, Config};
use topwatch::error::SinkError;
use topwatch::logging;
use topwatch::sampler::{Sampler, StopHandle};
use topwatch::sink::{self, ChannelSink, DiscardSink, EventSink, JsonLinesSink};
use topwatch::system::collector::Collector;

#[derive(Parser)]
#[command(
    name = "topwatch",
    version,
    about = "Samples system and per-process CPU/memory usage and prints JSON events"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between samples
    #[arg(long)]
    period: Option<u64>,

    /// Process name pattern (regex); repeat for several
    #[arg(long = "procs")]
    procs: Vec<String>,

    /// Log level or tracing filter directive
    #[arg(long)]
    log_level: Option<String>,

    /// Validate the configuration and exit
    #[arg(long, default_value_t = false)]
    check_config: bool,

    /// Sample as usual but drop events instead of printing them
    #[arg(long, default_value_t = false)]
    no_publish: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli)?;
    config.validate()?;
    logging::init(&config.logging.level, config.log_format()?)?;

    if cli.check_config {
        info!("configuration ok");
        return Ok(());
    }

    let collector = Collector::new();
    let mode = config.cpu_percent_mode(collector.logical_cores())?;
    let matcher = config.matcher()?;

    if cli.no_publish {
        let sampler = Sampler::new(collector, DiscardSink, matcher)
            .with_period(config.period())
            .with_cpu_mode(mode)
            .with_gc_every(config.input.gc_every);
        return run_sampler(sampler).await;
    }

    let (channel, rx) = ChannelSink::channel(config.output.queue_capacity);
    let publisher: JoinHandle<std::result::Result<u64, SinkError>> = tokio::spawn(
        sink::forward(rx, JsonLinesSink::new(std::io::stdout(), config.output.pretty)),
    );

    let sampler = Sampler::new(collector, channel, matcher)
        .with_period(config.period())
        .with_cpu_mode(mode)
        .with_gc_every(config.input.gc_every);
    let sampled = run_sampler(sampler).await;

    // The sampler (and its sender) is gone by now, so the publisher drains and ends.
    match publisher.await {
        Ok(Ok(forwarded)) => debug!(forwarded, "publisher finished"),
        Ok(Err(e)) => error!(error = %e, "publisher failed"),
        Err(e) => error!(error = %e, "publisher task panicked"),
    }
    sampled
}

async fn run_sampler<S: EventSink>(mut sampler: Sampler<Collector, S>) -> Result<()> {
    spawn_signal_listener(sampler.stop_handle());
    sampler
        .run()
        .await
        .map_err(|e| eyre!("sampler loop failed: {e}"))
}

fn spawn_signal_listener(stop: StopHandle) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown requested");
        stop.stop();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            error!(error = %e, "cannot listen for SIGTERM");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn load_config_for_cli(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => config::load_config_from_path(path)?,
        None => config::load_config()?,
    };

    if let Some(period) = cli.period {
        config.input.period = period;
    }
    if !cli.procs.is_empty() {
        config.input.procs = cli.procs.clone();
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    Ok(config)
}
