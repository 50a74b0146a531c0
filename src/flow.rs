use std::sync::Arc;

use tracing::{error, info};

use crate::api::TrackApi;
use crate::error::{AppError, Result};
use crate::models::TrackRef;
use crate::store::Store;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub mood: Option<String>,
    pub genre: Option<String>,
}

impl Selection {
    pub fn is_complete(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.mood) && filled(&self.genre)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub moods: Vec<String>,
    pub genres: Vec<String>,
}

/// Clears the generating flag when dropped, whichever way `generate` exits.
struct GeneratingGuard<'a> {
    store: &'a Store,
}

impl<'a> GeneratingGuard<'a> {
    fn start(store: &'a Store) -> Self {
        store.set_generating(true);
        Self { store }
    }
}

impl Drop for GeneratingGuard<'_> {
    fn drop(&mut self) {
        self.store.set_generating(false);
    }
}

pub struct GenerationFlow<A: TrackApi> {
    api: A,
    store: Arc<Store>,
    selection: Selection,
}

impl<A: TrackApi> GenerationFlow<A> {
    pub fn new(api: A, store: Arc<Store>) -> Self {
        Self {
            api,
            store,
            selection: Selection::default(),
        }
    }

    /// Fetches both choice lists at once.
    pub async fn load_options(&self) -> Result<Options> {
        let (moods, genres) = tokio::try_join!(self.api.get_moods(), self.api.get_genres())?;
        Ok(Options { moods, genres })
    }

    pub fn select_mood(&mut self, mood: impl Into<String>) {
        self.selection.mood = Some(mood.into());
    }

    pub fn select_genre(&mut self, genre: impl Into<String>) {
        self.selection.genre = Some(genre.into());
    }

    pub fn can_generate(&self) -> bool {
        self.selection.is_complete() && !self.store.snapshot().is_generating
    }

    /// One generate round trip. The current track changes only on success.
    pub async fn generate(&self) -> Result<TrackRef> {
        let (Some(mood), Some(genre)) = (&self.selection.mood, &self.selection.genre) else {
            return Err(AppError::SelectionIncomplete);
        };
        if mood.trim().is_empty() || genre.trim().is_empty() {
            return Err(AppError::SelectionIncomplete);
        }
        if self.store.snapshot().is_generating {
            return Err(AppError::GenerationInFlight);
        }

        let _generating = GeneratingGuard::start(&self.store);

        match self.api.generate_track(mood, genre).await {
            Ok(track) => {
                let track = Arc::new(track);
                self.store.set_current_track(Some(Arc::clone(&track)));
                self.store.add_to_recent(Arc::clone(&track));
                info!("Now current: {} ({} / {})", track.title, track.mood, track.genre);
                Ok(track)
            }
            Err(e) => {
                error!("Failed to generate track: {}", e);
                Err(e)
            }
        }
    }
}
