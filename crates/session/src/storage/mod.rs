mod atomic_io;
mod prefs;

pub use prefs::{JsonFilePrefs, MemoryPrefs, PrefsStore, StoreError, HIGH_SCORE_KEY};
