mod capture;
mod config;
mod detection;
mod error;
mod host;
mod ocr;
mod record;
mod state;
mod utils;
mod vision;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use capture::FrameSource;
use detection::backend::VisionBackend;
use config::Config;
use error::AppResult;
use host::FileHostBridge;
use ocr::OcrManager;
use state::MatchTracker;
use vision::SvVisionBackend;

fn main() {
    println!("===========================================");
    println!("  SV Match Tracker");
    println!("===========================================\n");

    // Load configuration
    let cfg = match Config::load() {
        Ok(cfg) => {
            println!("✓ Configuration loaded");
            println!("  Stream path: {}", cfg.output.stream_path.display());
            println!("  Log path:    {}", cfg.output.log_path.display());
            println!("  Countdown:   {}\n", cfg.countdown_file.display());
            cfg
        }
        Err(e) => {
            eprintln!("✗ Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(&cfg);

    if let Err(e) = run(&cfg) {
        eprintln!("✗ Fatal: {:#}", e);
        std::process::exit(1);
    }
}

/// Console plus a daily-rotating file log next to the match log
fn init_logging(cfg: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::fs::create_dir_all(&cfg.output.log_path).is_ok() {
        let file_appender =
            tracing_appender::rolling::daily(&cfg.output.log_path, "sv-match-tracker.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(non_blocking.and(std::io::stdout))
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        None
    }
}

/// Main tick loop: capture a frame, feed it to the vision backend, advance
/// the state machine, repeat until Ctrl+C.
fn run(cfg: &Config) -> AppResult<()> {
    let ocr = OcrManager::new().context(
        "Failed to initialize OCR.\n  \
         Install Tesseract:\n  \
         macOS: brew install tesseract\n  \
         Linux: sudo apt-get install tesseract-ocr",
    )?;
    println!("✓ OCR engine initialized");

    let frame_source = FrameSource::new()
        .context("Failed to initialize capture (on macOS, grant Screen Recording permission)")?;
    println!("✓ Screen capture initialized");

    let mut vision = SvVisionBackend::new(ocr);
    let mut bridge = FileHostBridge::new(cfg.countdown_file.clone(), cfg.screenshot_dir());
    let mut tracker = MatchTracker::new(
        cfg.output.clone(),
        cfg.match_log_file(),
        cfg.match_duration_secs,
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_handler = running.clone();
    ctrlc::set_handler(move || {
        println!("\nShutting down...");
        running_handler.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    println!("\n===========================================");
    println!("  Watching for matches. Ctrl+C to quit.");
    println!("===========================================\n");

    let start = Instant::now();
    let tick_interval = Duration::from_millis(cfg.tick_interval_ms);

    while running.load(Ordering::SeqCst) {
        let now_ns = start.elapsed().as_nanos() as u64;

        match frame_source.capture_frame() {
            Ok(frame) => {
                bridge.set_current_frame(frame.clone());
                vision.load_frame(frame);
                tracker.tick(&mut vision, &mut bridge, true, now_ns);
            }
            Err(e) => {
                // No frame this tick: state is preserved for the next one.
                warn!("Capture failed, skipping tick: {}", e);
                tracker.tick(&mut vision, &mut bridge, false, now_ns);
            }
        }

        thread::sleep(tick_interval);
    }

    info!("Stopped in phase {}", tracker.phase().as_str());
    Ok(())
}
