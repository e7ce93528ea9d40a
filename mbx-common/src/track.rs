//! Track reference value type

use serde::{Deserialize, Serialize};

/// Reference to a playable track.
///
/// Immutable once created; equality is by value. The `source_url` is a
/// resolvable locator (a watch URL), not a direct audio stream URL --
/// direct URLs expire, so audio is fetched on demand at play time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Track title as reported by the media source
    pub title: String,
    /// Channel or artist that published the track
    pub author: String,
    /// Resolvable source locator
    pub source_url: String,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            source_url: source_url.into(),
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} by {}", self.title, self.author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_equality_by_value() {
        let a = Track::new("Song", "Artist", "https://example.com/watch?v=1");
        let b = Track::new("Song", "Artist", "https://example.com/watch?v=1");
        let c = Track::new("Song", "Artist", "https://example.com/watch?v=2");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_track_display() {
        let track = Track::new("Never Gonna Give You Up", "Rick Astley", "url");
        assert_eq!(track.to_string(), "Never Gonna Give You Up by Rick Astley");
    }

    #[test]
    fn test_track_serde_round_trip() {
        let track = Track::new("Song", "Artist", "https://example.com/watch?v=1");
        let json = serde_json::to_string(&track).unwrap();
        let back: Track = serde_json::from_str(&json).unwrap();
        assert_eq!(track, back);
    }
}
