pub mod api;
pub mod config;
pub mod error;
pub mod flow;
pub mod models;
pub mod playback;
pub mod server;
pub mod store;

pub use api::{TrackApi, TrackClient};
pub use config::Config;
pub use error::{AppError, Result};
pub use flow::{GenerationFlow, Options, Selection};
pub use models::{HealthStatus, Track, TrackRef, format_time};
pub use playback::{ClockMedia, PlaybackState, PlaybackSynchronizer, Progress};
pub use store::{AppState, FileStorage, Store};
