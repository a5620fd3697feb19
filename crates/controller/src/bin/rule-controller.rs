//! rule-controller: run rule sets against a device at a fixed rate.
//!
//! Loads rule sets from a YAML file or directory, polls the device's
//! parameters, and fires the actions of matching rules. Prints a run
//! summary on exit; the process exit code identifies what stopped it.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use liverule_controller::config::{
    self, DEFAULT_LATENCY_TARGET_MS, DEFAULT_PARAM_COUNT, DEFAULT_RATE_HZ, DEFAULT_STATS_INTERVAL,
};
use liverule_controller::error::EXIT_UNEXPECTED;
use liverule_controller::{Controller, ControllerConfig, ControllerError, SimulatedDevice};

// ── CLI ─────────────────────────────────────────────────────────────

/// Real-time rule automation controller.
#[derive(Parser, Debug)]
#[command(name = "rule-controller", version, about)]
struct Cli {
    /// Rule set YAML file, or a directory scanned for *.yml / *.yaml.
    #[arg(long, env = "LIVERULE_RULES")]
    rules: PathBuf,

    /// Track index of the controlled device.
    #[arg(long, env = "LIVERULE_TRACK", default_value_t = 0)]
    track: u32,

    /// Device index on the track.
    #[arg(long, env = "LIVERULE_DEVICE", default_value_t = 0)]
    device: u32,

    /// Polling rate in Hz (5 to 30).
    #[arg(long, env = "LIVERULE_RATE", default_value_t = DEFAULT_RATE_HZ)]
    rate: f64,

    /// Run time in seconds; 0 runs until interrupted.
    #[arg(long, env = "LIVERULE_DURATION", default_value_t = 0.0)]
    duration: f64,

    /// Evaluate rules and log what would fire without sending any action.
    #[arg(long, env = "LIVERULE_DRY_RUN")]
    dry_run: bool,

    /// Debug-level logging (RUST_LOG takes precedence).
    #[arg(short, long, env = "LIVERULE_VERBOSE")]
    verbose: bool,

    /// Reload rule files when they change on disk.
    #[arg(long, env = "LIVERULE_WATCH")]
    watch: bool,

    /// Cycles between periodic statistics lines.
    #[arg(long, env = "LIVERULE_STATS_INTERVAL", default_value_t = DEFAULT_STATS_INTERVAL)]
    stats_interval: u64,

    /// Average cycle latency the run must stay within to pass.
    #[arg(long, env = "LIVERULE_LATENCY_TARGET_MS", default_value_t = DEFAULT_LATENCY_TARGET_MS)]
    latency_target_ms: f64,

    /// Minimum seconds between two fires of the same rule name, on top of
    /// each rule's own cooldown.
    #[arg(long, env = "LIVERULE_COOLDOWN", default_value_t = 0.0)]
    cooldown: f64,

    /// Stop after this many cycles.
    #[arg(long, env = "LIVERULE_MAX_CYCLES")]
    max_cycles: Option<u64>,

    /// Parameters exposed by the simulated device.
    #[arg(long, env = "LIVERULE_PARAMS", default_value_t = DEFAULT_PARAM_COUNT)]
    params: u32,

    /// Sweep parameter 0 of the simulated device with this period in seconds.
    #[arg(long, env = "LIVERULE_MODULATE")]
    modulate: Option<f64>,
}

impl Cli {
    fn to_config(&self) -> Result<ControllerConfig, ControllerError> {
        ControllerConfig {
            track: self.track,
            device: self.device,
            rate_hz: self.rate,
            dry_run: self.dry_run,
            watch: self.watch,
            stats_interval: self.stats_interval,
            latency_target_ms: self.latency_target_ms,
            max_cycles: self.max_cycles,
            param_count: self.params,
            ..ControllerConfig::new(&self.rules)
        }
        .with_seconds(self.duration, self.cooldown)
    }

    fn modulation(&self) -> Result<Option<Duration>, ControllerError> {
        self.modulate
            .map(|secs| config::seconds("modulate", secs))
            .transpose()
    }
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %format!("{e:#}"), "unexpected error");
            ExitCode::from(EXIT_UNEXPECTED)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let setup = cli
        .to_config()
        .and_then(|config| config.validate().map(|()| config))
        .and_then(|config| {
            let device = SimulatedDevice::connect(config.track, config.device, config.param_count)?;
            let device = match cli.modulation()? {
                Some(period) => device.with_modulation(0, period),
                None => device,
            };
            Ok((config, Arc::new(device)))
        });
    let (config, device) = match setup {
        Ok(setup) => setup,
        Err(e) => {
            error!(error = %e, "controller setup failed");
            return Ok(e.exit_code());
        }
    };

    let mut controller = Controller::new(config, device.clone(), device);

    let shutdown = controller.shutdown_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after the current cycle");
            shutdown.cancel();
        }
    });

    let report = tokio::spawn(async move { controller.run().await })
        .await
        .context("controller task failed")?;

    println!("{}", report.summary);
    Ok(report.exit_code())
}
