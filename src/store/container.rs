use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::TrackRef;
use crate::store::persist::{StateStorage, load_state, save_state};
use crate::store::state::{Action, AppState};

/// Holds the current [`AppState`] snapshot and persists it on every change.
///
/// Observers call [`Store::subscribe`] and receive each new snapshot.
pub struct Store {
    tx: watch::Sender<Arc<AppState>>,
    storage: Box<dyn StateStorage>,
}

impl Store {
    /// Restores the persisted subset once; transient fields start fresh.
    pub fn open(storage: Box<dyn StateStorage>) -> Self {
        let state = load_state(storage.as_ref());
        debug!(
            "Store opened: {} liked, {} recent",
            state.liked_tracks.len(),
            state.recent_tracks.len()
        );
        let (tx, _rx) = watch::channel(Arc::new(state));
        Self { tx, storage }
    }

    pub fn snapshot(&self) -> Arc<AppState> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.tx.subscribe()
    }

    pub fn dispatch(&self, action: Action) {
        debug!("dispatch {:?}", action);

        // Saved under the channel lock so the record on disk matches the
        // latest snapshot even with concurrent dispatchers.
        self.tx.send_modify(|state| {
            let applied = state.apply(action);
            if let Err(e) = save_state(self.storage.as_ref(), &applied) {
                warn!("Failed to persist state: {}", e);
            }
            *state = Arc::new(applied);
        });
    }

    pub fn toggle_dark_mode(&self) {
        self.dispatch(Action::ToggleDarkMode);
    }

    pub fn set_generating(&self, generating: bool) {
        self.dispatch(Action::SetGenerating(generating));
    }

    pub fn set_current_track(&self, track: Option<TrackRef>) {
        self.dispatch(Action::SetCurrentTrack(track));
    }

    pub fn set_playing(&self, playing: bool) {
        self.dispatch(Action::SetPlaying(playing));
    }

    pub fn toggle_like(&self, track: TrackRef) {
        self.dispatch(Action::ToggleLike(track));
    }

    pub fn add_to_recent(&self, track: TrackRef) {
        self.dispatch(Action::AddToRecent(track));
    }

    pub fn clear_recent(&self) {
        self.dispatch(Action::ClearRecent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::models::Track;
    use crate::store::persist::MemoryStorage;

    struct SharedMemory(Arc<MemoryStorage>);

    impl StateStorage for SharedMemory {
        fn load(&self) -> Option<String> {
            self.0.load()
        }

        fn save(&self, contents: &str) -> Result<()> {
            self.0.save(contents)
        }
    }

    struct BrokenStorage;

    impl StateStorage for BrokenStorage {
        fn load(&self) -> Option<String> {
            None
        }

        fn save(&self, _contents: &str) -> Result<()> {
            Err(AppError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let memory = Arc::new(MemoryStorage::new());
        let store = Store::open(Box::new(SharedMemory(Arc::clone(&memory))));

        store.toggle_dark_mode();
        assert!(memory.contents().unwrap().contains("\"darkMode\": false"));

        store.add_to_recent(Track::mock_ref(9));
        let reopened = Store::open(Box::new(SharedMemory(Arc::clone(&memory))));
        let state = reopened.snapshot();
        assert!(!state.dark_mode);
        assert_eq!(state.recent_tracks[0].id, 9);
    }

    #[test]
    fn test_reopen_resets_transient_fields() {
        let memory = Arc::new(MemoryStorage::new());
        let store = Store::open(Box::new(SharedMemory(Arc::clone(&memory))));
        store.set_generating(true);
        store.set_playing(true);
        store.set_current_track(Some(Track::mock_ref(1)));

        let reopened = Store::open(Box::new(SharedMemory(memory)));
        let state = reopened.snapshot();
        assert!(!state.is_generating);
        assert!(!state.is_playing);
        assert!(state.current_track.is_none());
    }

    #[test]
    fn test_save_failure_does_not_block_transition() {
        let store = Store::open(Box::new(BrokenStorage));
        store.toggle_like(Track::mock_ref(3));
        assert!(store.snapshot().is_liked(3));
    }

    #[tokio::test]
    async fn test_subscribers_see_new_snapshots() {
        let store = Store::open(Box::new(MemoryStorage::new()));
        let mut rx = store.subscribe();

        store.set_generating(true);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_generating);

        store.set_generating(false);
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_generating);
    }

    #[test]
    fn test_concurrent_dispatch_persists_latest_snapshot() {
        let memory = Arc::new(MemoryStorage::new());
        let store = Arc::new(Store::open(Box::new(SharedMemory(Arc::clone(&memory)))));

        let handles: Vec<_> = (0..8u64)
            .map(|worker| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.add_to_recent(Track::mock_ref(worker * 100 + i));
                        store.toggle_like(Track::mock_ref(worker));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let live = store.snapshot();
        let reopened = Store::open(Box::new(SharedMemory(memory))).snapshot();
        let ids = |tracks: &[TrackRef]| tracks.iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(&reopened.recent_tracks), ids(&live.recent_tracks));
        assert_eq!(ids(&reopened.liked_tracks), ids(&live.liked_tracks));
    }

    #[test]
    fn test_current_track_is_shared_not_copied() {
        let store = Store::open(Box::new(MemoryStorage::new()));
        let track = Track::mock_ref(4);
        store.set_current_track(Some(Arc::clone(&track)));
        store.add_to_recent(Arc::clone(&track));

        let state = store.snapshot();
        assert!(Arc::ptr_eq(state.current_track.as_ref().unwrap(), &track));
        assert!(Arc::ptr_eq(&state.recent_tracks[0], &track));
    }
}
