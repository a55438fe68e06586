use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

/// Sample rate of the canonical asset, what the recognizer expects.
pub const SAMPLE_RATE: u32 = 16_000;

/// Deterministic name of the downloaded asset inside the request workdir.
const ASSET_FILENAME: &str = "source.wav";

/// A locally materialized audio file plus its duration.
///
/// Created for one acquisition request and never outlives it; the file
/// lives inside the request's temporary directory.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub duration: Duration,
}

/// Errors from downloading or transcoding the audio track.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("yt-dlp is not available, install it from https://github.com/yt-dlp/yt-dlp")]
    ToolMissing,

    #[error("audio download failed: {0}")]
    Download(String),

    #[error("could not read video metadata: {0}")]
    Metadata(String),

    #[error("downloaded audio file is missing or empty at {0}")]
    MissingOutput(PathBuf),

    #[error("audio file operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A source that materializes a video's audio track as a local asset.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Download and transcode the best available audio-only stream for
    /// `reference` into `workdir`. Either the asset fully materializes or
    /// the destination is left without a usable file.
    async fn fetch_audio(&self, reference: &str, workdir: &Path)
        -> Result<AudioAsset, AudioError>;
}

/// Audio fetcher driving the `yt-dlp` binary as a subprocess.
pub struct YtDlpAudio {
    yt_dlp_path: String,
}

#[derive(Debug, Deserialize)]
struct VideoMetadata {
    duration: Option<f64>,
}

impl YtDlpAudio {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }

    async fn check_availability(&self) -> bool {
        Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Probe video metadata without downloading anything.
    async fn probe_metadata(&self, reference: &str) -> Result<VideoMetadata, AudioError> {
        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-download", "--no-playlist"])
            .arg(reference)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(AudioError::Metadata(truncate_stderr(&output.stderr)));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| AudioError::Metadata(format!("unparseable yt-dlp metadata: {e}")))
    }
}

#[async_trait]
impl AudioSource for YtDlpAudio {
    async fn fetch_audio(
        &self,
        reference: &str,
        workdir: &Path,
    ) -> Result<AudioAsset, AudioError> {
        if !self.check_availability().await {
            return Err(AudioError::ToolMissing);
        }

        tracing::debug!(%reference, "probing video metadata");
        let metadata = self.probe_metadata(reference).await?;
        let duration = metadata
            .duration
            .map(Duration::from_secs_f64)
            .ok_or_else(|| {
                AudioError::Metadata("video metadata carries no duration".to_string())
            })?;

        let destination = workdir.join(ASSET_FILENAME);
        tracing::info!(%reference, dest = %destination.display(), "downloading audio track");

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--extract-audio",
                "--audio-format",
                "wav",
                // mono 16kHz, the fixed quality target for recognition
                "--postprocessor-args",
                "ffmpeg:-ac 1 -ar 16000",
                "--format",
                "bestaudio/best",
                "--no-playlist",
                "--no-exec",
                "--output",
            ])
            .arg(&destination)
            .arg(reference)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(AudioError::Download(truncate_stderr(&output.stderr)));
        }

        // yt-dlp appends the audio extension when the template has none
        let path = if destination.exists() {
            destination
        } else {
            workdir.join(format!("{ASSET_FILENAME}.wav"))
        };

        let complete = fs_err::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);
        if !complete {
            return Err(AudioError::MissingOutput(path));
        }

        tracing::debug!(duration_secs = duration.as_secs_f64(), "audio asset ready");
        Ok(AudioAsset { path, duration })
    }
}

/// Keep yt-dlp failure causes readable without dumping pages of stderr.
fn truncate_stderr(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).chars().take(1000).collect()
}
