use clap::Parser;
use std::path::PathBuf;

// Build version with stack info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "HTTP:   rouille 3 (sync)\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Face/speech/sound appliance daemon
#[derive(Parser, Debug)]
#[command(version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Root of the media tree (mood_matrix/, sounds/, www/)
    #[arg(value_name = "MEDIA_ROOT")]
    pub media_root: PathBuf,

    /// HTTP listen port
    #[arg(short = 'p', long = "port", value_name = "PORT", default_value = "8080")]
    pub port: u16,

    /// Speech synthesis sample rate in Hz
    #[arg(long = "sample-rate", value_name = "HZ", default_value = "16000")]
    pub sample_rate: u32,

    /// Longest utterance kept in the speech buffer, in seconds
    #[arg(long = "speech-secs", value_name = "SECS", default_value = "20")]
    pub speech_secs: u32,

    /// Display brightness at boot (0-255)
    #[arg(long = "brightness", value_name = "N", default_value = "255")]
    pub brightness: u8,

    /// Speaker volume at boot (0-255)
    #[arg(long = "volume", value_name = "N", default_value = "128")]
    pub volume: u8,

    /// Face shown at boot
    #[arg(long = "face", value_name = "NAME", default_value = "pleased")]
    pub boot_face: String,

    /// Enable logging to file instead of stderr
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Increase logging verbosity (default: info, -v: debug, -vv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
