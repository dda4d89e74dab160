//! Application entry point — read4me.
//!
//! # Startup sequence
//!
//! 1. Parse the command line and initialise logging.
//! 2. Load [`AppConfig`] (defaults on first run), apply CLI overrides and
//!    validate.
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the capturer, speech controller and notifier.
//! 5. Spawn the orchestrator on the runtime.
//! 6. Register the global hotkeys.
//! 7. Wait for Ctrl+C, then unregister, drain and stop speech.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use read4me::{
    capture::{EnigoKeystroke, SelectionCapturer, SystemClipboard},
    config::AppConfig,
    hotkey::{parse_combo, HotkeyAction, HotkeyBinding, HotkeyDispatcher},
    notify::DesktopNotifier,
    pipeline::{new_shared_state, Orchestrator},
    speech::{CommandEngine, SpeechController, SpeechEngine},
};

#[derive(Parser, Debug)]
#[command(name = "read4me", version, about = "Speak the selected text with a global hotkey")]
struct Args {
    /// Path to settings.toml (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Speaking rate in words per minute
    #[arg(short, long)]
    rate: Option<u32>,

    /// Voice passed to the speech engine
    #[arg(long)]
    voice: Option<String>,

    /// Seconds to wait for the foreground app to copy the selection
    #[arg(long)]
    copy_delay: Option<f64>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    /// Write the effective configuration to the settings file and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    // ── Configuration ────────────────────────────────────────────────────
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .context("failed to load settings")?;

    if let Some(rate) = args.rate {
        config.speech.rate_wpm = rate;
    }
    if let Some(voice) = args.voice {
        config.speech.voice = Some(voice);
    }
    if let Some(delay) = args.copy_delay {
        config.capture.copy_delay_secs = delay;
    }
    config.validate().context("invalid configuration")?;

    if args.write_config {
        match &args.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        log::info!("configuration written");
        return Ok(());
    }

    // ── Runtime ──────────────────────────────────────────────────────────
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // ── Components ───────────────────────────────────────────────────────
    let capturer = Arc::new(SelectionCapturer::new(
        Arc::new(SystemClipboard),
        Arc::new(EnigoKeystroke),
        &config.capture,
    ));
    let engine = CommandEngine::from_config(&config.speech);
    log::info!("speech engine: {}", engine.name());
    let speech = Arc::new(SpeechController::new(
        Arc::new(engine),
        config.speech.grace(),
    ));
    let notifier = Arc::new(DesktopNotifier::new(config.notifications.enabled));

    let (action_tx, action_rx) = mpsc::channel::<HotkeyAction>(16);
    let orchestrator = Orchestrator::new(
        new_shared_state(),
        capturer,
        Arc::clone(&speech),
        notifier,
        &config.speech,
    );
    let pipeline = rt.spawn(orchestrator.run(action_rx));

    // ── Hotkeys ──────────────────────────────────────────────────────────
    let bindings = vec![
        HotkeyBinding::new(
            parse_combo(&config.hotkey.speak).context("invalid speak hotkey")?,
            HotkeyAction::Speak,
        ),
        HotkeyBinding::new(
            parse_combo(&config.hotkey.stop).context("invalid stop hotkey")?,
            HotkeyAction::Stop,
        ),
    ];
    let dispatcher = HotkeyDispatcher::start(
        bindings,
        Duration::from_millis(config.hotkey.debounce_ms),
        move |action| {
            if let Err(e) = action_tx.try_send(action) {
                log::warn!("hotkey: dropped {action:?}: {e}");
            }
        },
    )
    .context("cannot register global hotkeys (check Accessibility / Input Monitoring permissions)")?;

    println!("read4me is running.");
    println!("  {:<14} speak the selected text", config.hotkey.speak);
    println!("  {:<14} stop speaking", config.hotkey.stop);
    println!("  {:<14} quit", "Ctrl+C");

    // ── Shutdown ─────────────────────────────────────────────────────────
    rt.block_on(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("cannot listen for Ctrl+C: {e}");
        }
    });
    log::info!("shutting down");

    // Drops the callback and with it the only sender, closing the channel.
    dispatcher.unregister();

    if rt
        .block_on(async { tokio::time::timeout(Duration::from_secs(3), pipeline).await })
        .is_err()
    {
        log::warn!("orchestrator did not finish in time");
    }
    speech.stop();
    Ok(())
}
