use std::time::Duration;

use serde::Serialize;

/// One ordered unit of transcript text with its start offset in the source.
///
/// Segments are kept in order of appearance and are never reordered; the
/// joined transcript depends on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptSegment {
    pub text: String,
    #[serde(with = "duration_secs")]
    pub start: Duration,
}

/// The finished, whitespace-normalized transcript text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    text: String,
}

impl Transcript {
    /// Join ordered segments into one transcript: each segment's text is
    /// trimmed, empty segments contribute nothing, and exactly one space
    /// separates adjacent contributions. Joining the same sequence twice
    /// yields the same output.
    pub fn from_segments(segments: &[TranscriptSegment]) -> Self {
        Self::from_parts(segments.iter().map(|s| s.text.as_str()))
    }

    /// Same join semantics over bare text parts (used by the chunked
    /// transcriber, where chunks carry no timing of their own).
    pub fn from_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> Self {
        let text = parts
            .into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl std::fmt::Display for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_f64(d.as_secs_f64())
    }
}
