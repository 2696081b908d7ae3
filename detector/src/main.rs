//! tap-detector: headless replay driver for the fingertip tap detector.
//!
//! Loads a classifier, feeds it a synthetic 60 Hz fingertip trajectory, and
//! logs every tap pulse.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use tap_detector::replay::{LoggingIndicator, SyntheticTrajectory};
use tap_detector::{BackendKind, DetectorConfig, ModelSource, OnnxRuntime, TapDetector};

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Replay tick rate (Hz).
const REPLAY_RATE_HZ: f64 = 60.0;

#[derive(Parser, Debug)]
#[command(name = "tap-detector", about = "Fingertip tap detection replay")]
struct Cli {
    /// ONNX classifier with input (1, window, 3) and one scalar output.
    /// Requires a build with `--features onnx`; otherwise loading always fails
    #[arg(long)]
    model: PathBuf,

    /// TOML detector config (defaults used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend to prefer: accelerated or cpu
    #[arg(long)]
    backend: Option<String>,

    /// Override the detection threshold
    #[arg(long)]
    threshold: Option<f32>,

    /// Number of ticks to replay
    #[arg(long, default_value_t = 240)]
    ticks: usize,

    /// Tick at which the fingertip jumps forward
    #[arg(long, default_value_t = 99)]
    tap_at: usize,

    /// Pace ticks at the replay rate instead of running flat out
    #[arg(long)]
    realtime: bool,
}

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tap_detector=info".into()),
        )
        .init();

    info!("tap-detector v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => DetectorConfig::load(path)
            .with_context(|| format!("failed to load config {:?}", path))?,
        None => DetectorConfig::default(),
    };

    if let Some(backend) = &cli.backend {
        config.backend = match backend.as_str() {
            "accelerated" => BackendKind::Accelerated,
            "cpu" => BackendKind::Cpu,
            other => {
                eprintln!("Unknown backend: {other}. Use: accelerated or cpu");
                std::process::exit(1);
            }
        };
    }
    if let Some(threshold) = cli.threshold {
        config.detection_threshold = threshold;
    }

    let runtime = OnnxRuntime::new();
    let mut detector = TapDetector::start(config, &runtime, &ModelSource::Path(cli.model.clone()))
        .with_context(|| format!("failed to start detector with model {:?}", cli.model))?;

    install_signal_handlers();

    let trajectory = SyntheticTrajectory::new(REPLAY_RATE_HZ).with_tap_at(cli.tap_at);
    let mut indicator = LoggingIndicator::default();
    let tick_interval = Duration::from_secs_f64(1.0 / REPLAY_RATE_HZ);

    for index in 0..cli.ticks {
        if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            info!("Shutdown signal received, stopping replay at tick {}", index);
            break;
        }

        detector.tick(&trajectory.frame(index), &mut indicator);

        if cli.realtime {
            std::thread::sleep(tick_interval);
        }
    }

    detector.shutdown(&mut indicator);
    info!("{}", detector.status_sexp());
    info!("Indicator pulses shown: {}", indicator.shows);
    Ok(())
}
