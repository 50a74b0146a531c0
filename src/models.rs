use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated track as returned by `POST /generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub mood: String,
    pub genre: String,
    /// Length in seconds.
    pub duration: f64,
    pub url: String,
    pub preview: String,
    pub generated_at: DateTime<Utc>,
}

/// Tracks are immutable once created, so lists share them instead of copying.
pub type TrackRef = Arc<Track>;

impl Track {
    /// File name used when saving the track: non-alphanumerics become `_`.
    pub fn download_file_name(&self) -> String {
        let stem: String = self
            .title
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}.mp3", stem)
    }

    pub fn share_text(&self) -> String {
        format!(
            "Check out this {} {} track I generated!",
            self.mood, self.genre
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub mood: String,
    pub genre: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Formats seconds as `m:ss`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
impl Track {
    pub fn mock(id: u64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            mood: "Happy".to_string(),
            genre: "Pop".to_string(),
            duration: 180.0,
            url: "https://example.com/track.mp3".to_string(),
            preview: "https://example.com/track.mp3".to_string(),
            generated_at: DateTime::parse_from_rfc3339("2025-01-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    pub fn mock_ref(id: u64) -> TrackRef {
        Arc::new(Self::mock(id, &format!("Track {}", id)))
    }
}
