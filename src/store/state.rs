use crate::models::TrackRef;

pub const RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub dark_mode: bool,
    pub is_generating: bool,
    pub current_track: Option<TrackRef>,
    pub is_playing: bool,
    pub liked_tracks: Vec<TrackRef>,
    pub recent_tracks: Vec<TrackRef>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dark_mode: true,
            is_generating: false,
            current_track: None,
            is_playing: false,
            liked_tracks: Vec::new(),
            recent_tracks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    ToggleDarkMode,
    SetGenerating(bool),
    SetCurrentTrack(Option<TrackRef>),
    SetPlaying(bool),
    ToggleLike(TrackRef),
    AddToRecent(TrackRef),
    ClearRecent,
}

impl AppState {
    /// Returns the state after `action`. Never fails and never mutates `self`.
    pub fn apply(&self, action: Action) -> AppState {
        let mut next = self.clone();
        match action {
            Action::ToggleDarkMode => next.dark_mode = !self.dark_mode,
            Action::SetGenerating(generating) => next.is_generating = generating,
            Action::SetCurrentTrack(track) => next.current_track = track,
            Action::SetPlaying(playing) => next.is_playing = playing,
            Action::ToggleLike(track) => {
                next.liked_tracks = toggle_liked(&self.liked_tracks, track);
            }
            Action::AddToRecent(track) => {
                next.recent_tracks = push_recent(&self.recent_tracks, track);
            }
            Action::ClearRecent => next.recent_tracks.clear(),
        }
        next
    }

    pub fn is_liked(&self, id: u64) -> bool {
        self.liked_tracks.iter().any(|t| t.id == id)
    }

    /// Looks a track up by id in the current track, recent list, then liked list.
    pub fn find_track(&self, id: u64) -> Option<TrackRef> {
        self.current_track
            .iter()
            .chain(self.recent_tracks.iter())
            .chain(self.liked_tracks.iter())
            .find(|t| t.id == id)
            .cloned()
    }
}

fn toggle_liked(liked: &[TrackRef], track: TrackRef) -> Vec<TrackRef> {
    if liked.iter().any(|t| t.id == track.id) {
        liked.iter().filter(|t| t.id != track.id).cloned().collect()
    } else {
        let mut next = liked.to_vec();
        next.push(track);
        next
    }
}

fn push_recent(recent: &[TrackRef], track: TrackRef) -> Vec<TrackRef> {
    let id = track.id;
    std::iter::once(track)
        .chain(recent.iter().filter(|t| t.id != id).cloned())
        .take(RECENT_LIMIT)
        .collect()
}

/// Drops duplicate ids (first occurrence wins) and enforces the cap.
pub(crate) fn normalize_recent(tracks: Vec<TrackRef>) -> Vec<TrackRef> {
    let mut tracks = dedup_by_id(tracks);
    tracks.truncate(RECENT_LIMIT);
    tracks
}

pub(crate) fn dedup_by_id(tracks: Vec<TrackRef>) -> Vec<TrackRef> {
    let mut seen = std::collections::HashSet::new();
    tracks.into_iter().filter(|t| seen.insert(t.id)).collect()
}
