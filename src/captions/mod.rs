use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::extractor::VideoId;
use crate::transcript::TranscriptSegment;

/// Default player metadata endpoint (InnerTube).
const DEFAULT_PLAYER_ENDPOINT: &str = "https://www.youtube.com/youtubei/v1/player";

/// Client identity expected by the player endpoint.
const CLIENT_NAME: &str = "ANDROID";
const CLIENT_VERSION: &str = "20.10.38";

/// Errors from the captions service.
///
/// `Disabled` and `NotFound` are expected outcomes the caller can react to
/// by switching strategy; they are not faults of this system. Transport
/// faults are surfaced as-is and never retried here, retrying cannot turn
/// a disabled or missing track into an existing one.
#[derive(Debug, thiserror::Error)]
pub enum CaptionError {
    #[error("captions are disabled for this video")]
    Disabled,

    #[error("no caption track found for languages [{0}]")]
    NotFound(String),

    #[error("captions service request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("captions service returned an unusable response: {0}")]
    Malformed(String),
}

/// A source of ordered, timed caption segments for a video.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch the caption track for `id`. Called exactly once per
    /// acquisition; segments come back trimmed and in document order.
    async fn fetch_captions(&self, id: &VideoId) -> Result<Vec<TranscriptSegment>, CaptionError>;
}

/// Caption retriever backed by the platform's player metadata and timedtext
/// endpoints, the same route youtube_transcript_api takes.
pub struct YoutubeCaptions {
    client: reqwest::Client,
    endpoint: String,
    languages: Vec<String>,
}

impl YoutubeCaptions {
    pub fn new(languages: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_PLAYER_ENDPOINT.to_string(),
            languages,
        }
    }

    /// Override the player endpoint (tests, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn fetch_player_response(&self, id: &VideoId) -> Result<PlayerResponse, CaptionError> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": CLIENT_NAME,
                    "clientVersion": CLIENT_VERSION,
                }
            },
            "videoId": id.as_str(),
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(CaptionError::Transport)?
            .error_for_status()
            .map_err(CaptionError::Transport)?;

        response
            .json::<PlayerResponse>()
            .await
            .map_err(CaptionError::Transport)
    }

    /// Pick the first track matching the language preference list, in
    /// preference order.
    fn select_track<'a>(&self, tracks: &'a [CaptionTrack]) -> Option<&'a CaptionTrack> {
        for lang in &self.languages {
            if let Some(track) = tracks.iter().find(|t| t.language_code == *lang) {
                return Some(track);
            }
        }
        None
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<TimedText, CaptionError> {
        let track_url = format!("{}&fmt=json3", track.base_url);

        let response = self
            .client
            .get(&track_url)
            .send()
            .await
            .map_err(CaptionError::Transport)?
            .error_for_status()
            .map_err(CaptionError::Transport)?;

        response
            .json::<TimedText>()
            .await
            .map_err(CaptionError::Transport)
    }
}

#[async_trait]
impl CaptionSource for YoutubeCaptions {
    async fn fetch_captions(&self, id: &VideoId) -> Result<Vec<TranscriptSegment>, CaptionError> {
        tracing::debug!(video_id = %id, "fetching caption track list");

        let player = self.fetch_player_response(id).await?;

        // No captions renderer at all means the uploader disabled captions.
        let tracks = player
            .captions
            .and_then(|c| c.renderer)
            .map(|r| r.caption_tracks)
            .ok_or(CaptionError::Disabled)?;

        let track = self
            .select_track(&tracks)
            .ok_or_else(|| CaptionError::NotFound(self.languages.join(", ")))?;

        tracing::debug!(language = %track.language_code, "fetching timedtext track");
        let timed_text = self.fetch_track(track).await?;

        let segments = parse_events(timed_text);
        if segments.is_empty() {
            return Err(CaptionError::Malformed(
                "caption track contained no text events".to_string(),
            ));
        }

        Ok(segments)
    }
}

/// Convert raw timedtext events into trimmed, ordered segments. Events with
/// no text (cues, window definitions) and events that trim to empty are
/// dropped; document order is preserved.
fn parse_events(timed_text: TimedText) -> Vec<TranscriptSegment> {
    timed_text
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event
                .segs
                .into_iter()
                .map(|seg| seg.utf8)
                .collect::<String>();
            let text = text.trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                text,
                start: Duration::from_millis(event.t_start_ms),
            })
        })
        .collect()
}

// Wire shapes for the player and timedtext responses. Only the fields this
// retriever reads are modeled; everything else in the (large) payloads is
// ignored.

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct TracklistRenderer {
    #[serde(rename = "captionTracks", default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedTextEvent {
    #[serde(rename = "tStartMs", default)]
    t_start_ms: u64,
    #[serde(default)]
    segs: Vec<TimedTextSeg>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSeg {
    utf8: String,
}
