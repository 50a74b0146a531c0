pub mod media;
pub mod sync;

pub use media::{ClockMedia, MediaElement, MediaEvent};
pub use sync::{PlaybackState, PlaybackSynchronizer, Progress};
