use std::time::Instant;

use crate::error::{AppError, Result};
use crate::models::Track;

/// Notifications a media element raises while it loads and plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    Loaded,
    TimeUpdate { position: f64, duration: f64 },
    Ended,
}

/// A single playable resource, in the spirit of an HTML audio element.
pub trait MediaElement {
    fn load(&mut self, track: &Track);

    /// Starting can fail (unreachable source, missing output, ...).
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn seek(&mut self, position: f64);

    fn set_volume(&mut self, volume: f32);

    /// Drains notifications raised since the last poll.
    fn poll(&mut self) -> Vec<MediaEvent>;
}

/// Media element that advances a wall clock instead of decoding audio.
#[derive(Debug, Default)]
pub struct ClockMedia {
    source: Option<String>,
    duration: f64,
    offset: f64,
    started_at: Option<Instant>,
    volume: f32,
    pending_loaded: bool,
    ended: bool,
}

impl ClockMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn position(&self) -> f64 {
        let running = self
            .started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.offset + running).min(self.duration)
    }
}

impl MediaElement for ClockMedia {
    fn load(&mut self, track: &Track) {
        self.source = Some(track.preview.clone());
        self.duration = if track.duration.is_finite() {
            track.duration.max(0.0)
        } else {
            0.0
        };
        self.offset = 0.0;
        self.started_at = None;
        self.pending_loaded = true;
        self.ended = false;
    }

    fn play(&mut self) -> Result<()> {
        if self.source.is_none() {
            return Err(AppError::Playback("no source loaded".into()));
        }
        if self.ended {
            self.offset = 0.0;
            self.ended = false;
        }
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.offset = self.position();
        self.started_at = None;
    }

    fn seek(&mut self, position: f64) {
        self.offset = position.clamp(0.0, self.duration);
        self.ended = false;
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn poll(&mut self) -> Vec<MediaEvent> {
        let mut events = Vec::new();

        if self.pending_loaded {
            self.pending_loaded = false;
            events.push(MediaEvent::Loaded);
        }

        if self.started_at.is_some() {
            let position = self.position();
            events.push(MediaEvent::TimeUpdate {
                position,
                duration: self.duration,
            });

            if position >= self.duration {
                self.offset = self.duration;
                self.started_at = None;
                self.ended = true;
                events.push(MediaEvent::Ended);
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_without_source_fails() {
        let mut media = ClockMedia::new();
        assert!(matches!(media.play(), Err(AppError::Playback(_))));
    }

    #[test]
    fn test_load_raises_loaded_once() {
        let mut media = ClockMedia::new();
        media.load(&Track::mock(1, "a"));
        assert_eq!(media.poll(), vec![MediaEvent::Loaded]);
        assert!(media.poll().is_empty());
    }

    #[test]
    fn test_seek_while_paused_moves_position() {
        let mut media = ClockMedia::new();
        media.load(&Track::mock(1, "a"));
        media.seek(90.0);
        assert_eq!(media.position(), 90.0);
        media.seek(1000.0);
        assert_eq!(media.position(), 180.0);
    }

    #[test]
    fn test_reaching_the_end_raises_ended() {
        let mut track = Track::mock(1, "a");
        track.duration = 0.0;
        let mut media = ClockMedia::new();
        media.load(&track);
        media.play().unwrap();

        let events = media.poll();
        assert_eq!(events.last(), Some(&MediaEvent::Ended));
        assert!(media.poll().iter().all(|e| *e != MediaEvent::Ended));
    }
}
