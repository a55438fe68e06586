use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::audio::SAMPLE_RATE;

/// Default Speech v2 endpoint, the same one SpeechRecognition's
/// `recognize_google` talks to.
const DEFAULT_ENDPOINT: &str = "http://www.google.com/speech-api/v2/recognize";

/// Outcome of recognizing one bounded clip.
///
/// `NoSpeech` is an expected result for silent or unintelligible audio,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    Text(String),
    NoSpeech,
}

/// Errors from the speech-recognition service.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("speech service request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("speech service error: {0}")]
    Service(String),

    #[error("could not read clip file: {0}")]
    Clip(#[from] std::io::Error),
}

/// Recognizes speech in one bounded audio clip.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, clip: &Path) -> Result<Recognition, RecognitionError>;
}

/// Recognizer posting FLAC clips to the Google Speech v2 endpoint.
pub struct GoogleRecognizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    language: String,
}

impl GoogleRecognizer {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            language: language.into(),
        }
    }

    /// Override the service endpoint (tests, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self) -> String {
        format!(
            "{}?client=chromium&lang={}&key={}",
            self.endpoint,
            urlencoding::encode(&self.language),
            urlencoding::encode(&self.api_key),
        )
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleRecognizer {
    async fn recognize(&self, clip: &Path) -> Result<Recognition, RecognitionError> {
        let body = fs_err::read(clip)?;

        let response = self
            .client
            .post(self.request_url())
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("audio/x-flac; rate={SAMPLE_RATE}"),
            )
            .body(body)
            .send()
            .await
            .map_err(RecognitionError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecognitionError::Service(format!(
                "HTTP {status} from speech endpoint"
            )));
        }

        let text = response.text().await.map_err(RecognitionError::Transport)?;
        Ok(parse_response(&text))
    }
}

/// The service answers with one JSON object per line; the first line is
/// usually an empty `{"result":[]}` placeholder. The first line carrying a
/// non-empty result holds the alternatives; no such line means the clip was
/// not understood.
fn parse_response(body: &str) -> Recognition {
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let Ok(parsed) = serde_json::from_str::<SpeechResponse>(line) else {
            continue;
        };
        for result in parsed.result {
            if let Some(alternative) = result.alternative.into_iter().next() {
                let transcript = alternative.transcript.trim().to_string();
                if !transcript.is_empty() {
                    return Recognition::Text(transcript);
                }
            }
        }
    }
    Recognition::NoSpeech
}

#[derive(Debug, Deserialize)]
struct SpeechResponse {
    #[serde(default)]
    result: Vec<SpeechResult>,
}

#[derive(Debug, Deserialize)]
struct SpeechResult {
    #[serde(default)]
    alternative: Vec<SpeechAlternative>,
}

#[derive(Debug, Deserialize)]
struct SpeechAlternative {
    #[serde(default)]
    transcript: String,
}
