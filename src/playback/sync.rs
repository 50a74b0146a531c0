use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::TrackRef;
use crate::playback::media::{MediaElement, MediaEvent};
use crate::store::Store;

pub const DEFAULT_VOLUME: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Paused,
    Playing,
    Ended,
}

/// Displayed position of the loaded track.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Progress {
    /// 0..=100
    pub percent: f64,
    /// Seconds.
    pub position: f64,
}

/// Keeps one media element and the store's `is_playing` flag in step.
pub struct PlaybackSynchronizer<M: MediaElement> {
    media: M,
    store: Arc<Store>,
    track: Option<TrackRef>,
    state: PlaybackState,
    progress: Progress,
    volume: f32,
}

impl<M: MediaElement> PlaybackSynchronizer<M> {
    pub fn new(media: M, store: Arc<Store>) -> Self {
        Self {
            media,
            store,
            track: None,
            state: PlaybackState::Idle,
            progress: Progress::default(),
            volume: DEFAULT_VOLUME,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn attach(&mut self, track: TrackRef) {
        debug!("Attaching track {} ({})", track.title, track.id);
        self.media.load(&track);
        self.track = Some(track);
        self.progress = Progress::default();
        self.state = PlaybackState::Paused;
        self.store.set_playing(false);
    }

    pub fn detach(&mut self) {
        if self.state == PlaybackState::Playing {
            self.media.pause();
        }
        self.track = None;
        self.progress = Progress::default();
        self.state = PlaybackState::Idle;
        self.store.set_playing(false);
    }

    /// Each call counts as one play request and records the track as recent.
    pub fn play(&mut self) -> PlaybackState {
        let Some(track) = self.track.clone() else {
            return self.state;
        };
        if self.state == PlaybackState::Playing {
            return self.state;
        }

        self.store.set_playing(true);
        self.store.add_to_recent(Arc::clone(&track));

        if self.state == PlaybackState::Ended {
            self.media.seek(0.0);
        }

        match self.media.play() {
            Ok(()) => {
                self.state = PlaybackState::Playing;
            }
            Err(e) => {
                warn!("Error playing {}: {}", track.title, e);
                self.state = PlaybackState::Paused;
                self.store.set_playing(false);
            }
        }

        self.state
    }

    pub fn pause(&mut self) -> PlaybackState {
        if self.state == PlaybackState::Playing {
            self.media.pause();
            self.state = PlaybackState::Paused;
            self.store.set_playing(false);
        }
        self.state
    }

    pub fn toggle(&mut self) -> PlaybackState {
        match self.state {
            PlaybackState::Playing => self.pause(),
            _ => self.play(),
        }
    }

    /// Seeks to fraction `f` of the track and shows it before the media catches up.
    pub fn seek(&mut self, fraction: f64) -> Option<Progress> {
        let duration = self.known_duration()?;
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let position = fraction * duration;
        self.media.seek(position);
        if self.state == PlaybackState::Ended {
            self.state = PlaybackState::Paused;
        }
        self.progress = Progress {
            percent: fraction * 100.0,
            position,
        };
        Some(self.progress)
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if self.track.is_some() {
            self.media.set_volume(self.volume);
        }
    }

    /// Applies one notification; returns the new progress when it changed.
    pub fn handle(&mut self, event: MediaEvent) -> Option<Progress> {
        match event {
            MediaEvent::Loaded => {
                self.media.set_volume(self.volume);
                None
            }
            MediaEvent::TimeUpdate { position, duration } => {
                if self.track.is_none() || !(duration.is_finite() && duration > 0.0) {
                    return None;
                }
                self.progress = Progress {
                    percent: (position / duration) * 100.0,
                    position,
                };
                Some(self.progress)
            }
            MediaEvent::Ended => {
                if self.track.is_none() {
                    return None;
                }
                self.state = PlaybackState::Ended;
                self.progress = Progress::default();
                self.store.set_playing(false);
                Some(self.progress)
            }
        }
    }

    /// Drains pending media notifications; returns the latest progress emitted.
    pub fn tick(&mut self) -> Option<Progress> {
        let mut latest = None;
        for event in self.media.poll() {
            if let Some(progress) = self.handle(event) {
                latest = Some(progress);
            }
        }
        latest
    }

    fn known_duration(&self) -> Option<f64> {
        let duration = self.track.as_ref()?.duration;
        (duration.is_finite() && duration > 0.0).then_some(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::models::Track;
    use crate::store::MemoryStorage;

    #[derive(Default)]
    struct ScriptedMedia {
        fail_play: bool,
        loaded: Vec<String>,
        plays: usize,
        seeks: Vec<f64>,
        volume: Option<f32>,
        queued: Vec<MediaEvent>,
    }

    impl MediaElement for ScriptedMedia {
        fn load(&mut self, track: &Track) {
            self.loaded.push(track.preview.clone());
        }

        fn play(&mut self) -> Result<()> {
            self.plays += 1;
            if self.fail_play {
                Err(AppError::Playback("autoplay blocked".into()))
            } else {
                Ok(())
            }
        }

        fn pause(&mut self) {}

        fn seek(&mut self, position: f64) {
            self.seeks.push(position);
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = Some(volume);
        }

        fn poll(&mut self) -> Vec<MediaEvent> {
            std::mem::take(&mut self.queued)
        }
    }

    fn player(media: ScriptedMedia) -> (PlaybackSynchronizer<ScriptedMedia>, Arc<Store>) {
        let store = Arc::new(Store::open(Box::new(MemoryStorage::new())));
        (PlaybackSynchronizer::new(media, Arc::clone(&store)), store)
    }

    fn track_with_duration(id: u64, duration: f64) -> TrackRef {
        let mut track = Track::mock(id, "t");
        track.duration = duration;
        Arc::new(track)
    }

    #[test]
    fn test_starts_idle_and_play_is_a_noop() {
        let (mut sync, store) = player(ScriptedMedia::default());
        assert_eq!(sync.state(), PlaybackState::Idle);
        assert_eq!(sync.play(), PlaybackState::Idle);
        assert!(store.snapshot().recent_tracks.is_empty());
    }

    #[test]
    fn test_attach_loads_paused() {
        let (mut sync, store) = player(ScriptedMedia::default());
        store.set_playing(true);
        sync.attach(Track::mock_ref(1));

        assert_eq!(sync.state(), PlaybackState::Paused);
        assert_eq!(sync.media().loaded.len(), 1);
        assert!(!store.snapshot().is_playing);
    }

    #[test]
    fn test_each_play_request_adds_to_recent_once() {
        let (mut sync, store) = player(ScriptedMedia::default());
        sync.attach(Track::mock_ref(1));

        assert_eq!(sync.play(), PlaybackState::Playing);
        assert!(store.snapshot().is_playing);
        assert_eq!(store.snapshot().recent_tracks.len(), 1);

        sync.pause();
        assert!(!store.snapshot().is_playing);
        sync.toggle();
        assert_eq!(sync.state(), PlaybackState::Playing);
        assert_eq!(sync.media().plays, 2);
        assert_eq!(store.snapshot().recent_tracks.len(), 1);
        assert_eq!(store.snapshot().recent_tracks[0].id, 1);
    }

    #[test]
    fn test_failed_start_reverts_to_paused() {
        let (mut sync, store) = player(ScriptedMedia {
            fail_play: true,
            ..Default::default()
        });
        sync.attach(Track::mock_ref(1));

        assert_eq!(sync.play(), PlaybackState::Paused);
        assert!(!store.snapshot().is_playing);
    }

    #[test]
    fn test_seek_half_of_200_seconds() {
        let (mut sync, _store) = player(ScriptedMedia::default());
        sync.attach(track_with_duration(1, 200.0));

        let progress = sync.seek(0.5).unwrap();
        assert_eq!(progress.position, 100.0);
        assert_eq!(progress.percent, 50.0);
        assert_eq!(sync.media().seeks, vec![100.0]);
    }

    #[test]
    fn test_seek_without_duration_is_ignored() {
        let (mut sync, _store) = player(ScriptedMedia::default());
        assert!(sync.seek(0.5).is_none());

        sync.attach(track_with_duration(1, 0.0));
        assert!(sync.seek(0.5).is_none());
        assert!(sync.media().seeks.is_empty());
    }

    #[test]
    fn test_time_update_computes_percent() {
        let (mut sync, _store) = player(ScriptedMedia::default());
        sync.attach(track_with_duration(1, 200.0));

        let progress = sync
            .handle(MediaEvent::TimeUpdate {
                position: 50.0,
                duration: 200.0,
            })
            .unwrap();
        assert_eq!(progress.percent, 25.0);
        assert_eq!(progress.position, 50.0);
    }

    #[test]
    fn test_time_update_with_unknown_duration_emits_nothing() {
        let (mut sync, _store) = player(ScriptedMedia::default());
        sync.attach(Track::mock_ref(1));

        for duration in [0.0, f64::NAN, f64::INFINITY] {
            let update = MediaEvent::TimeUpdate {
                position: 10.0,
                duration,
            };
            assert!(sync.handle(update).is_none());
        }
        assert_eq!(sync.progress(), Progress::default());
    }

    #[test]
    fn test_ended_resets_progress_and_playing_flag() {
        let (mut sync, store) = player(ScriptedMedia::default());
        sync.attach(Track::mock_ref(1));
        sync.play();
        sync.handle(MediaEvent::TimeUpdate {
            position: 179.0,
            duration: 180.0,
        });

        sync.media.queued = vec![MediaEvent::Ended];
        let progress = sync.tick().unwrap();

        assert_eq!(progress, Progress::default());
        assert_eq!(sync.state(), PlaybackState::Ended);
        assert!(!store.snapshot().is_playing);

        assert_eq!(sync.play(), PlaybackState::Playing);
    }

    #[test]
    fn test_seek_after_end_resumes_from_seeked_position() {
        let (mut sync, store) = player(ScriptedMedia::default());
        sync.attach(track_with_duration(1, 200.0));
        sync.play();
        sync.handle(MediaEvent::Ended);
        assert_eq!(sync.state(), PlaybackState::Ended);

        let progress = sync.seek(0.5).unwrap();
        assert_eq!(progress.position, 100.0);
        assert_eq!(sync.state(), PlaybackState::Paused);

        assert_eq!(sync.play(), PlaybackState::Playing);
        assert_eq!(sync.media().seeks, vec![100.0]);
        assert_eq!(sync.progress().position, 100.0);
        assert!(store.snapshot().is_playing);
    }

    #[test]
    fn test_volume_applied_on_load_and_clamped() {
        let (mut sync, _store) = player(ScriptedMedia::default());
        sync.set_volume(1.5);
        assert_eq!(sync.volume(), 1.0);
        assert_eq!(sync.media().volume, None);

        sync.attach(Track::mock_ref(1));
        sync.media.queued = vec![MediaEvent::Loaded];
        sync.tick();
        assert_eq!(sync.media().volume, Some(1.0));

        sync.set_volume(0.25);
        assert_eq!(sync.media().volume, Some(0.25));
    }
}
