use moodbox::cli::Args;
use moodbox::assets::{AssetCache, CACHE_FOLDERS};
use moodbox::audio::PcmSink;
use moodbox::coordinator::{Coordinator, DeviceSettings};
use moodbox::hw::sim::{SimScreen, SimSpeaker, SimSynth};
use moodbox::sequencer::Sequencer;
use moodbox::server::ApiServer;

use anyhow::Context;
use clap::Parser;
use log::{debug, info};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Cooperative main-loop tick
const LOOP_TICK: Duration = Duration::from_millis(10);

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Determine log level based on verbosity flags
    // 0 (default) = info, 1 (-v) = debug, 2+ (-vv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // Initialize logger based on --log flag
    if let Some(log_path) = &args.log_file {
        let file = std::fs::File::create(log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }

    info!("Moodbox appliance starting...");
    debug!("Command-line args: {:?}", args);

    // Boot-time asset snapshot. No storage means no device - this is fatal.
    let cache = Arc::new(
        AssetCache::load(&args.media_root, CACHE_FOLDERS)
            .context("storage unavailable, cannot boot")?,
    );
    if cache.is_empty() {
        // Legal but worth shouting about: every lookup will miss
        log::warn!("asset cache is empty, all lookups will 404");
    }

    // Speech buffer sized for the longest allowed utterance
    let capacity_samples = args.sample_rate as usize * args.speech_secs as usize;
    let sink = PcmSink::new(capacity_samples);
    info!(
        "Speech buffer: {} samples ({} s at {} Hz)",
        capacity_samples, args.speech_secs, args.sample_rate
    );

    let coordinator = Arc::new(Coordinator::new(
        DeviceSettings {
            brightness: args.brightness,
            volume: args.volume,
        },
        &args.boot_face,
    ));

    // Show the boot face on the first pass
    coordinator.face.request(args.boot_face.clone());

    let mut sequencer = Sequencer::new(
        Arc::clone(&coordinator),
        Arc::clone(&cache),
        Box::new(SimScreen::default()),
        Box::new(SimSpeaker::default()),
        Box::new(SimSynth::new(sink.clone(), args.sample_rate)),
        sink,
        args.sample_rate,
        args.media_root.clone(),
    );

    let _server = ApiServer::start(args.port, Arc::clone(&coordinator), Arc::clone(&cache));

    // Main loop: one sequencer pass per tick, forever
    loop {
        sequencer.run_pass();
        thread::sleep(LOOP_TICK);
    }
}
