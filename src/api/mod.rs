use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// One unit of work handed to the song processor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackRequest {
    pub url: String,
    pub artist: Option<String>,
    pub album: Option<String>,
}

impl TrackRequest {
    pub fn new(url: impl Into<String>, artist: Option<String>, album: Option<String>) -> Self {
        Self {
            url: url.into(),
            artist,
            album,
        }
    }

    /// Same overrides, different source. Used when a playlist fans out.
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            artist: self.artist.clone(),
            album: self.album.clone(),
        }
    }
}

/// What the remote source reports about a track before anything is downloaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Seconds; 0 when the source does not report it
    pub duration: f64,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN.to_string(),
            artist: UNKNOWN.to_string(),
            album: UNKNOWN.to_string(),
            duration: 0.0,
        }
    }
}

/// Tally printed at the end of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub succeeded: usize,
    pub failed: Vec<(String, String)>,
}

impl RunReport {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, url: &str, reason: impl ToString) {
        self.failed.push((url.to_string(), reason.to_string()));
    }

    pub fn merge(&mut self, other: RunReport) {
        self.succeeded += other.succeeded;
        self.failed.extend(other.failed);
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }
}
