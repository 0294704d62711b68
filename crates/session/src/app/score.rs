use tracing::{info, warn};

use crate::storage::{PrefsStore, HIGH_SCORE_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRecord {
    pub is_new_high_score: bool,
    pub display_score: u32,
}

pub struct ScoreTracker {
    store: Box<dyn PrefsStore>,
    high_score: u32,
}

impl ScoreTracker {
    pub fn new(store: Box<dyn PrefsStore>) -> Self {
        let mut tracker = Self {
            store,
            high_score: 0,
        };
        tracker.load();
        tracker
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Re-reads the stored value. Never lowers the in-memory score.
    pub fn load(&mut self) -> u32 {
        let stored = match self.store.get_float(HIGH_SCORE_KEY) {
            Ok(Some(value)) => score_from_float(value),
            Ok(None) => 0,
            Err(error) => {
                warn!(error = %error, "high_score_load_failed; using 0");
                0
            }
        };
        self.high_score = self.high_score.max(stored);
        self.high_score
    }

    pub fn record(&mut self, level: u32) -> ScoreRecord {
        if level <= self.high_score {
            return ScoreRecord {
                is_new_high_score: false,
                display_score: self.high_score,
            };
        }

        self.high_score = level;
        if let Err(error) = self.store.set_float(HIGH_SCORE_KEY, level as f32) {
            warn!(level, error = %error, "high_score_save_failed");
        }
        info!(high_score = level, "new_high_score");
        ScoreRecord {
            is_new_high_score: true,
            display_score: level,
        }
    }

    pub fn reset(&mut self) {
        if let Err(error) = self.store.delete_key(HIGH_SCORE_KEY) {
            warn!(error = %error, "high_score_reset_failed");
        }
        self.high_score = 0;
        info!("high_score_reset");
    }
}

impl std::fmt::Debug for ScoreTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreTracker")
            .field("high_score", &self.high_score)
            .finish_non_exhaustive()
    }
}

fn score_from_float(value: f32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.min(u32::MAX as f32) as u32
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::storage::{JsonFilePrefs, MemoryPrefs, StoreError};

    struct BrokenPrefs;

    impl PrefsStore for BrokenPrefs {
        fn get_float(&mut self, _key: &str) -> Result<Option<f32>, StoreError> {
            Err(StoreError::Io {
                path: PathBuf::from("broken"),
                source: std::io::Error::other("disk gone"),
            })
        }

        fn set_float(&mut self, _key: &str, _value: f32) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: PathBuf::from("broken"),
                source: std::io::Error::other("disk gone"),
            })
        }

        fn delete_key(&mut self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct ReadOnlyPrefs {
        stored: f32,
    }

    impl PrefsStore for ReadOnlyPrefs {
        fn get_float(&mut self, _key: &str) -> Result<Option<f32>, StoreError> {
            Ok(Some(self.stored))
        }

        fn set_float(&mut self, _key: &str, _value: f32) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: PathBuf::from("read-only"),
                source: std::io::Error::other("read-only filesystem"),
            })
        }

        fn delete_key(&mut self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn higher_level_becomes_new_high_score() {
        let mut tracker =
            ScoreTracker::new(Box::new(MemoryPrefs::new().with_entry(HIGH_SCORE_KEY, 3.0)));

        let record = tracker.record(4);

        assert_eq!(
            record,
            ScoreRecord {
                is_new_high_score: true,
                display_score: 4
            }
        );
        assert_eq!(tracker.load(), 4);
    }

    #[test]
    fn non_increasing_levels_never_lower_the_score() {
        let mut tracker = ScoreTracker::new(Box::new(MemoryPrefs::new()));
        tracker.record(6);

        for level in [6, 5, 3, 1, 0] {
            let record = tracker.record(level);
            assert!(!record.is_new_high_score);
            assert_eq!(record.display_score, 6);
        }
        assert_eq!(tracker.load(), 6);
    }

    #[test]
    fn read_failure_defaults_to_zero_and_write_failure_keeps_memory_value() {
        let mut tracker = ScoreTracker::new(Box::new(BrokenPrefs));
        assert_eq!(tracker.high_score(), 0);

        let record = tracker.record(2);
        assert!(record.is_new_high_score);
        assert_eq!(tracker.high_score(), 2);
    }

    #[test]
    fn unsaved_high_score_survives_reload() {
        let mut tracker = ScoreTracker::new(Box::new(ReadOnlyPrefs { stored: 3.0 }));
        assert_eq!(tracker.high_score(), 3);

        assert!(tracker.record(7).is_new_high_score);

        assert_eq!(tracker.load(), 7);
        assert_eq!(tracker.high_score(), 7);
        assert!(!tracker.record(5).is_new_high_score);
    }

    #[test]
    fn read_failure_after_record_keeps_score() {
        let mut tracker = ScoreTracker::new(Box::new(BrokenPrefs));
        tracker.record(4);

        assert_eq!(tracker.load(), 4);
    }

    #[test]
    fn reset_clears_stored_value() {
        let mut tracker =
            ScoreTracker::new(Box::new(MemoryPrefs::new().with_entry(HIGH_SCORE_KEY, 9.0)));
        assert_eq!(tracker.high_score(), 9);

        tracker.reset();

        assert_eq!(tracker.high_score(), 0);
        assert_eq!(tracker.load(), 0);
        assert!(tracker.record(1).is_new_high_score);
    }

    #[test]
    fn file_backed_score_round_trips() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("prefs.json");

        ScoreTracker::new(Box::new(JsonFilePrefs::new(&path))).record(5);

        let reopened = ScoreTracker::new(Box::new(JsonFilePrefs::new(&path)));
        assert_eq!(reopened.high_score(), 5);
    }

    #[test]
    fn garbage_stored_values_read_as_zero() {
        assert_eq!(score_from_float(f32::NAN), 0);
        assert_eq!(score_from_float(-3.0), 0);
        assert_eq!(score_from_float(4.9), 4);
    }
}
