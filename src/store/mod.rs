pub mod container;
pub mod persist;
pub mod state;

pub use container::Store;
pub use persist::{FileStorage, MemoryStorage, PersistedState, StateStorage};
pub use state::{Action, AppState, RECENT_LIMIT};
