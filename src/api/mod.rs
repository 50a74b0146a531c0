pub mod client;

pub use client::TrackClient;

use std::future::Future;

use crate::error::Result;
use crate::models::{HealthStatus, Track};

/// The four read/generate operations the front end needs from the backend.
pub trait TrackApi: Send + Sync {
    fn get_moods(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn get_genres(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// May take seconds; the backend simulates generation time.
    fn generate_track(&self, mood: &str, genre: &str)
    -> impl Future<Output = Result<Track>> + Send;

    fn health_check(&self) -> impl Future<Output = Result<HealthStatus>> + Send;
}
