use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::TrackRef;
use crate::store::state::{AppState, dedup_by_id, normalize_recent};

/// The whitelisted subset of [`AppState`] that survives restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default = "default_dark_mode")]
    pub dark_mode: bool,
    #[serde(default)]
    pub liked_tracks: Vec<TrackRef>,
    #[serde(default)]
    pub recent_tracks: Vec<TrackRef>,
}

fn default_dark_mode() -> bool {
    AppState::default().dark_mode
}

impl From<&AppState> for PersistedState {
    fn from(state: &AppState) -> Self {
        Self {
            dark_mode: state.dark_mode,
            liked_tracks: state.liked_tracks.clone(),
            recent_tracks: state.recent_tracks.clone(),
        }
    }
}

impl PersistedState {
    /// Builds a fresh state; transient fields always start at their defaults.
    pub fn into_app_state(self) -> AppState {
        AppState {
            dark_mode: self.dark_mode,
            liked_tracks: dedup_by_id(self.liked_tracks),
            recent_tracks: normalize_recent(self.recent_tracks),
            ..AppState::default()
        }
    }
}

/// Durable home of the persisted record.
pub trait StateStorage: Send + Sync {
    /// Raw record contents, or `None` when nothing is stored yet.
    fn load(&self) -> Option<String>;
    fn save(&self, contents: &str) -> Result<()>;
}

pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateStorage for FileStorage {
    fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Some(contents),
            Err(e) => {
                debug!("No stored state at {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    contents: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Option<String> {
        self.contents()
    }

    fn save(&self, contents: &str) -> Result<()> {
        if let Ok(mut slot) = self.contents.lock() {
            *slot = Some(contents.to_string());
        }
        Ok(())
    }
}

/// Reads the stored record. Missing or malformed content yields defaults.
pub fn load_state(storage: &dyn StateStorage) -> AppState {
    let Some(contents) = storage.load() else {
        return AppState::default();
    };

    match serde_json::from_str::<PersistedState>(&contents) {
        Ok(persisted) => persisted.into_app_state(),
        Err(e) => {
            warn!("Ignoring malformed stored state: {}", e);
            AppState::default()
        }
    }
}

pub fn save_state(storage: &dyn StateStorage, state: &AppState) -> Result<()> {
    let json = serde_json::to_string_pretty(&PersistedState::from(state))?;
    storage.save(&json)
}
