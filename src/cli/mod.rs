use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::acquire::Strategy;

#[derive(Parser)]
#[command(
    name = "tubescript",
    about = "Fetch a video transcript from platform captions or chunked speech recognition",
    version,
    long_about = "Fetches the transcript of an online video. The captions strategy asks the \
platform for its own caption track; the audio-fallback strategy downloads the audio with \
yt-dlp and transcribes it in 30-second chunks through a speech-recognition service."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Acquire a transcript for a video URL
    Acquire {
        /// Video URL (watch, short-domain, or embed form)
        #[arg(value_name = "URL")]
        url: String,

        /// Acquisition strategy
        #[arg(short, long, value_enum, default_value = "captions")]
        strategy: StrategyArg,

        /// Output file path (prints to stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Language for captions and speech recognition (overrides config)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,
    },

    /// Show or initialize the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

/// CLI-facing strategy names; the core keeps its own enum so it stays free
/// of clap.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StrategyArg {
    /// Platform caption track
    Captions,
    /// Audio download + chunked speech recognition
    AudioFallback,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Captions => Strategy::Captions,
            StrategyArg::AudioFallback => Strategy::AudioFallback,
        }
    }
}
