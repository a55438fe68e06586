use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::ChunkSpan;
use crate::audio::SAMPLE_RATE;

/// Errors from materializing a chunk as a standalone clip.
#[derive(Debug, thiserror::Error)]
pub enum CutError {
    #[error("ffmpeg is not available, install it with your package manager")]
    ToolMissing,

    #[error("ffmpeg failed: {0}")]
    Ffmpeg(String),

    #[error("could not run ffmpeg: {0}")]
    Io(#[from] std::io::Error),
}

/// Materializes one span of an asset as a standalone clip file the
/// recognizer can consume.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChunkCutter: Send + Sync {
    async fn cut(&self, asset: &Path, span: &ChunkSpan, dest: &Path) -> Result<(), CutError>;
}

/// Chunk cutter shelling out to ffmpeg. Clips come out as mono 16 kHz FLAC,
/// the shape the speech endpoint consumes.
pub struct FfmpegCutter {
    ffmpeg_path: String,
}

impl FfmpegCutter {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl ChunkCutter for FfmpegCutter {
    async fn cut(&self, asset: &Path, span: &ChunkSpan, dest: &Path) -> Result<(), CutError> {
        let output = Command::new(&self.ffmpeg_path)
            .args([
                "-nostdin",
                "-y",
                "-ss",
                &format!("{:.3}", span.start.as_secs_f64()),
                "-t",
                &format!("{:.3}", span.len.as_secs_f64()),
                "-i",
            ])
            .arg(asset)
            .args(["-ac", "1", "-ar", &SAMPLE_RATE.to_string(), "-c:a", "flac"])
            .arg(dest)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CutError::ToolMissing
                } else {
                    CutError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr: String = String::from_utf8_lossy(&output.stderr)
                .chars()
                .take(1000)
                .collect();
            return Err(CutError::Ffmpeg(stderr));
        }

        Ok(())
    }
}
