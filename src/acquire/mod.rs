use std::path::PathBuf;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::audio::{AudioError, AudioSource, YtDlpAudio};
use crate::captions::{CaptionError, CaptionSource, YoutubeCaptions};
use crate::config::Config;
use crate::extractor;
use crate::transcribe::{
    ChunkCutter, ChunkedTranscriber, FfmpegCutter, GoogleRecognizer, SpeechRecognizer,
    TranscriptionError,
};
use crate::transcript::Transcript;

/// Caller-selected acquisition path. The two strategies are mutually
/// exclusive; a caption failure never silently falls through to the audio
/// path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fetch the platform's own caption track.
    Captions,
    /// Download the audio track and run chunked speech recognition over it.
    AudioFallback,
}

/// Everything that can go wrong acquiring a transcript. Each variant maps
/// to a specific, actionable message; nothing in here is a bare trace.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("not a recognized video reference: {0:?}")]
    InvalidReference(String),

    #[error(transparent)]
    Captions(#[from] CaptionError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error("could not create a working directory for the request: {0}")]
    Workdir(#[source] std::io::Error),
}

/// Composes extraction, caption retrieval, and the audio fallback into the
/// two-strategy state machine. Stateless across calls; each `acquire` is
/// independent and the audio path gets its own temporary directory that is
/// gone by the time the call returns, success or failure.
pub struct Acquirer {
    captions: Box<dyn CaptionSource>,
    audio: Box<dyn AudioSource>,
    transcriber: ChunkedTranscriber,
    temp_root: Option<PathBuf>,
}

impl Acquirer {
    pub fn new(config: &Config) -> Self {
        Self::with_services(
            Box::new(YoutubeCaptions::new(config.captions.languages.clone())),
            Box::new(YtDlpAudio::new(&config.tools.yt_dlp)),
            Box::new(FfmpegCutter::new(&config.tools.ffmpeg)),
            Box::new(GoogleRecognizer::new(
                &config.recognizer.api_key,
                &config.recognizer.language,
            )),
            config.app.temp_dir.clone(),
        )
    }

    /// Assemble an acquirer from explicit collaborators (tests substitute
    /// doubles here).
    pub fn with_services(
        captions: Box<dyn CaptionSource>,
        audio: Box<dyn AudioSource>,
        cutter: Box<dyn ChunkCutter>,
        recognizer: Box<dyn SpeechRecognizer>,
        temp_root: Option<PathBuf>,
    ) -> Self {
        Self {
            captions,
            audio,
            transcriber: ChunkedTranscriber::new(cutter, recognizer),
            temp_root,
        }
    }

    /// Acquire a transcript for `reference` using `strategy`. Returns the
    /// whole transcript as one unit; there is no partial or streaming
    /// terminal state.
    pub async fn acquire(
        &self,
        reference: &str,
        strategy: Strategy,
        cancel: &CancellationToken,
    ) -> Result<Transcript, AcquireError> {
        let id = extractor::extract(reference)
            .ok_or_else(|| AcquireError::InvalidReference(reference.to_string()))?;

        tracing::info!(video_id = %id, ?strategy, "acquiring transcript");

        match strategy {
            Strategy::Captions => {
                let segments = self.captions.fetch_captions(&id).await?;
                Ok(Transcript::from_segments(&segments))
            }
            Strategy::AudioFallback => {
                // Unique per-request directory; dropping it removes the
                // asset and any stragglers on every exit path.
                let workdir = self.request_workdir().map_err(AcquireError::Workdir)?;

                let asset = self.audio.fetch_audio(reference, workdir.path()).await?;
                let transcript = self.transcriber.transcribe(&asset, cancel).await?;

                Ok(transcript)
            }
        }
    }

    fn request_workdir(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("tubescript-");
        match &self.temp_root {
            Some(root) => {
                fs_err::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
    }
}
