//! Tubescript - fetch a video transcript from platform captions or audio.
//!
//! Two caller-selected strategies: the platform's own caption track, or a
//! fallback that downloads the audio track and runs chunked speech
//! recognition over 30-second windows. Both paths return a plain transcript
//! string or a typed error; rendering and anything downstream of the text
//! is the caller's business.

pub mod acquire;
pub mod audio;
pub mod captions;
pub mod cli;
pub mod config;
pub mod extractor;
pub mod output;
pub mod transcribe;
pub mod transcript;
pub mod utils;

pub use acquire::{AcquireError, Acquirer, Strategy};
pub use config::Config;
pub use extractor::VideoId;
pub use transcript::{Transcript, TranscriptSegment};
