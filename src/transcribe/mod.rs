use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::audio::AudioAsset;
use crate::transcript::Transcript;

pub mod cutter;
pub mod recognizer;

pub use cutter::{ChunkCutter, CutError, FfmpegCutter};
pub use recognizer::{GoogleRecognizer, Recognition, RecognitionError, SpeechRecognizer};

/// Fixed recognition window.
pub const CHUNK_SECONDS: u64 = 30;

/// One bounded-duration slice of an asset, identified by its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    pub index: usize,
    pub start: Duration,
    pub len: Duration,
}

/// Partition `total` into contiguous, non-overlapping 30-second spans that
/// cover it exhaustively. The final span carries the remainder (a full
/// window when `total` divides evenly).
pub fn plan_chunks(total: Duration) -> Vec<ChunkSpan> {
    let window = Duration::from_secs(CHUNK_SECONDS);
    let mut spans = Vec::new();
    let mut start = Duration::ZERO;
    let mut index = 0;

    while start < total {
        let len = window.min(total - start);
        spans.push(ChunkSpan { index, start, len });
        start += len;
        index += 1;
    }

    spans
}

/// Errors from the chunked transcription fallback.
///
/// A hard failure on any chunk invalidates the whole attempt; the failing
/// chunk's index rides along so the caller can say exactly where it broke.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("could not cut audio chunk {index}: {source}")]
    Chunk {
        index: usize,
        #[source]
        source: CutError,
    },

    #[error("speech recognition failed on chunk {index}: {source}")]
    Recognition {
        index: usize,
        #[source]
        source: RecognitionError,
    },

    #[error("transcription was cancelled")]
    Cancelled,
}

/// Splits an asset into fixed windows and recognizes each one independently.
///
/// Chunks are processed strictly in index order: aggregation depends on it,
/// and a hard failure on chunk *k* must abort before chunk *k+1* is touched.
/// A "no speech" outcome on a chunk is expected (silence, music) and simply
/// contributes nothing.
pub struct ChunkedTranscriber {
    cutter: Box<dyn ChunkCutter>,
    recognizer: Box<dyn SpeechRecognizer>,
}

impl ChunkedTranscriber {
    pub fn new(cutter: Box<dyn ChunkCutter>, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        Self { cutter, recognizer }
    }

    /// Transcribe the whole asset. The cancellation token is checked between
    /// chunk iterations, long videos can take minutes.
    pub async fn transcribe(
        &self,
        asset: &AudioAsset,
        cancel: &CancellationToken,
    ) -> Result<Transcript, TranscriptionError> {
        let spans = plan_chunks(asset.duration);
        let workdir = asset.path.parent().unwrap_or_else(|| Path::new("."));

        tracing::info!(
            chunks = spans.len(),
            duration_secs = asset.duration.as_secs_f64(),
            "starting chunked transcription"
        );

        let mut parts: Vec<String> = Vec::new();

        for span in &spans {
            if cancel.is_cancelled() {
                return Err(TranscriptionError::Cancelled);
            }

            let clip = workdir.join(format!("chunk_{:04}.flac", span.index));
            let outcome = self.process_chunk(&asset.path, span, &clip).await;

            // The clip is scoped to this iteration, gone whatever happened.
            if clip.exists() {
                if let Err(e) = fs_err::remove_file(&clip) {
                    tracing::warn!(clip = %clip.display(), error = %e, "failed to remove chunk clip");
                }
            }

            match outcome? {
                Recognition::Text(text) => {
                    tracing::debug!(chunk = span.index, chars = text.len(), "chunk recognized");
                    parts.push(text);
                }
                Recognition::NoSpeech => {
                    tracing::debug!(chunk = span.index, "no speech in chunk, skipping");
                }
            }
        }

        Ok(Transcript::from_parts(parts.iter().map(String::as_str)))
    }

    async fn process_chunk(
        &self,
        asset: &Path,
        span: &ChunkSpan,
        clip: &Path,
    ) -> Result<Recognition, TranscriptionError> {
        self.cutter
            .cut(asset, span, clip)
            .await
            .map_err(|source| TranscriptionError::Chunk {
                index: span.index,
                source,
            })?;

        self.recognizer
            .recognize(clip)
            .await
            .map_err(|source| TranscriptionError::Recognition {
                index: span.index,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::cutter::MockChunkCutter;
    use super::recognizer::MockSpeechRecognizer;
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn asset_in(dir: &Path, secs: u64) -> AudioAsset {
        let path = dir.join("source.wav");
        fs_err::write(&path, b"riff").unwrap();
        AudioAsset {
            path,
            duration: Duration::from_secs(secs),
        }
    }

    /// Cutter double that actually creates the clip file, so cleanup is
    /// observable.
    fn file_creating_cutter() -> MockChunkCutter {
        let mut cutter = MockChunkCutter::new();
        cutter.expect_cut().returning(|_, _, dest| {
            std::fs::write(dest, b"flac").unwrap();
            Ok(())
        });
        cutter
    }

    #[test]
    fn test_plan_chunks_exact_cover_with_remainder() {
        let spans = plan_chunks(Duration::from_secs(65));
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].start, Duration::ZERO);
        assert_eq!(spans[0].len, Duration::from_secs(30));
        assert_eq!(spans[1].start, Duration::from_secs(30));
        assert_eq!(spans[1].len, Duration::from_secs(30));
        assert_eq!(spans[2].start, Duration::from_secs(60));
        assert_eq!(spans[2].len, Duration::from_secs(5));
    }

    #[test]
    fn test_plan_chunks_even_division_keeps_full_last_window() {
        let spans = plan_chunks(Duration::from_secs(60));
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].len, Duration::from_secs(30));
    }

    #[test]
    fn test_plan_chunks_short_asset_is_one_chunk() {
        let spans = plan_chunks(Duration::from_secs(7));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].len, Duration::from_secs(7));
    }

    #[test]
    fn test_plan_chunks_no_gaps_no_overlaps() {
        let spans = plan_chunks(Duration::from_secs_f64(123.4));
        let mut cursor = Duration::ZERO;
        for (i, span) in spans.iter().enumerate() {
            assert_eq!(span.index, i);
            assert_eq!(span.start, cursor);
            cursor += span.len;
        }
        assert_eq!(cursor, Duration::from_secs_f64(123.4));
    }

    #[tokio::test]
    async fn test_no_speech_chunks_are_skipped_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let asset = asset_in(dir.path(), 65);

        let mut recognizer = MockSpeechRecognizer::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        recognizer.expect_recognize().returning(move |_| {
            Ok(match seen.fetch_add(1, Ordering::SeqCst) {
                0 => Recognition::Text("foo".to_string()),
                1 => Recognition::NoSpeech,
                _ => Recognition::Text("bar".to_string()),
            })
        });

        let transcriber = ChunkedTranscriber::new(Box::new(file_creating_cutter()), Box::new(recognizer));
        let transcript = transcriber
            .transcribe(&asset, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(transcript.as_str(), "foo bar");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_hard_failure_aborts_before_next_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let asset = asset_in(dir.path(), 90);

        let mut recognizer = MockSpeechRecognizer::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        recognizer.expect_recognize().returning(move |_| {
            match seen.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(Recognition::Text("first".to_string())),
                _ => Err(RecognitionError::Service("quota exceeded".to_string())),
            }
        });

        let transcriber = ChunkedTranscriber::new(Box::new(file_creating_cutter()), Box::new(recognizer));
        let err = transcriber
            .transcribe(&asset, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            TranscriptionError::Recognition { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other:?}"),
        }
        // chunk 2 was never requested
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clip_files_removed_after_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let asset = asset_in(dir.path(), 65);

        let mut recognizer = MockSpeechRecognizer::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        recognizer.expect_recognize().returning(move |_| {
            match seen.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(Recognition::Text("ok".to_string())),
                _ => Err(RecognitionError::Service("boom".to_string())),
            }
        });

        let transcriber = ChunkedTranscriber::new(Box::new(file_creating_cutter()), Box::new(recognizer));
        let _ = transcriber
            .transcribe(&asset, &CancellationToken::new())
            .await;

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("chunk_"))
            .collect();
        assert!(leftovers.is_empty(), "clip files left behind: {leftovers:?}");
    }

    #[tokio::test]
    async fn test_cancellation_checked_between_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let asset = asset_in(dir.path(), 65);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut recognizer = MockSpeechRecognizer::new();
        recognizer.expect_recognize().never();
        let mut cutter = MockChunkCutter::new();
        cutter.expect_cut().never();

        let transcriber = ChunkedTranscriber::new(Box::new(cutter), Box::new(recognizer));
        let err = transcriber.transcribe(&asset, &cancel).await.unwrap_err();
        assert!(matches!(err, TranscriptionError::Cancelled));
    }

    #[tokio::test]
    async fn test_cut_failure_carries_chunk_index() {
        let dir = tempfile::tempdir().unwrap();
        let asset = asset_in(dir.path(), 10);

        let mut cutter = MockChunkCutter::new();
        cutter
            .expect_cut()
            .returning(|_, _, _| Err(CutError::Ffmpeg("bad stream".to_string())));
        let mut recognizer = MockSpeechRecognizer::new();
        recognizer.expect_recognize().never();

        let transcriber = ChunkedTranscriber::new(Box::new(cutter), Box::new(recognizer));
        let err = transcriber
            .transcribe(&asset, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            TranscriptionError::Chunk { index, .. } => assert_eq!(index, 0),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
