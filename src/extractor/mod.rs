use url::Url;

/// Width of a platform video identifier.
const ID_LEN: usize = 11;

/// An opaque, validated video identifier derived from a reference URL.
///
/// Two references pointing at the same video always normalize to the same
/// `VideoId`. The token is exactly 11 characters over `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Validate a raw capture structurally. Rejects captures that swallowed
    /// trailing path segments or query separators.
    fn parse(candidate: &str) -> Option<Self> {
        if candidate.len() == ID_LEN
            && candidate
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            Some(Self(candidate.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the canonical video identifier from a reference URL.
///
/// Recognized shapes, tried in priority order:
/// 1. a `v` query parameter (`.../watch?v=ID`, extra parameters tolerated)
/// 2. a short-domain path form (`youtu.be/ID` and friends)
/// 3. an embed path form (`.../embed/ID`, `.../v/ID`)
///
/// Matching is by URL shape rather than a host allow-list, the same video id
/// appearing under `www.`/`m.` mirrors or shortener domains still resolves.
/// Anything that does not match, or whose captured token fails structural
/// validation, yields `None`; callers treat that as an invalid reference,
/// never a fatal condition.
pub fn extract(reference: &str) -> Option<VideoId> {
    let parsed = Url::parse(reference.trim()).ok()?;
    parsed.host_str()?;

    // 1. watch-style: the `v` query parameter, wherever it sits in the query
    if let Some(v) = parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
    {
        return VideoId::parse(&v);
    }

    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
    let first = segments.next()?;

    // 2. shortened path form: the id is the sole path segment
    if let Some(id) = VideoId::parse(first) {
        return Some(id);
    }

    // 3. embed path forms
    if matches!(first, "embed" | "v") {
        return VideoId::parse(segments.next()?);
    }

    None
}
