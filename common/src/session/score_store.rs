use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigManager, FileContentConfigProvider, Validate, YamlConfigSerializer};

pub const LEADERBOARD_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub score: u32,
    pub details: String,
}

/// High score and leaderboard persistence used when a single player session ends.
pub trait ScoreStore {
    fn get_high_score(&self) -> Result<u32, String>;
    fn set_high_score(&self, value: u32) -> Result<(), String>;
    fn get_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, String>;
    /// Returns the leaderboard after the append. A zero score leaves it untouched.
    fn append_leaderboard_entry(&self, score: u32, details: &str) -> Result<Vec<LeaderboardEntry>, String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredScores {
    pub high_score: u32,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl StoredScores {
    fn insert_entry(&mut self, score: u32, details: &str) -> bool {
        if score == 0 {
            return false;
        }
        self.leaderboard.push(LeaderboardEntry {
            score,
            details: details.to_string(),
        });
        // Stable: an equal score recorded later ranks below the earlier one.
        self.leaderboard.sort_by(|a, b| b.score.cmp(&a.score));
        self.leaderboard.truncate(LEADERBOARD_CAPACITY);
        true
    }
}

impl Validate for StoredScores {
    fn validate(&self) -> Result<(), String> {
        if self.leaderboard.len() > LEADERBOARD_CAPACITY {
            return Err(format!(
                "leaderboard holds {} entries, at most {} allowed",
                self.leaderboard.len(),
                LEADERBOARD_CAPACITY
            ));
        }
        if self.leaderboard.windows(2).any(|w| w[0].score < w[1].score) {
            return Err("leaderboard must be sorted by descending score".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryScoreStore {
    scores: Mutex<StoredScores>,
}

impl InMemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_scores<T>(&self, f: impl FnOnce(&mut StoredScores) -> T) -> Result<T, String> {
        let mut scores = self
            .scores
            .lock()
            .map_err(|_| "Score store lock poisoned".to_string())?;
        Ok(f(&mut scores))
    }
}

impl ScoreStore for InMemoryScoreStore {
    fn get_high_score(&self) -> Result<u32, String> {
        self.with_scores(|s| s.high_score)
    }

    fn set_high_score(&self, value: u32) -> Result<(), String> {
        self.with_scores(|s| s.high_score = value)
    }

    fn get_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, String> {
        self.with_scores(|s| s.leaderboard.clone())
    }

    fn append_leaderboard_entry(&self, score: u32, details: &str) -> Result<Vec<LeaderboardEntry>, String> {
        self.with_scores(|s| {
            s.insert_entry(score, details);
            s.leaderboard.clone()
        })
    }
}

/// Keeps scores in a YAML file next to the game config.
pub struct FileScoreStore {
    manager: ConfigManager<FileContentConfigProvider, StoredScores, YamlConfigSerializer>,
}

impl FileScoreStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            manager: ConfigManager::from_yaml_file(file_path),
        }
    }
}

impl ScoreStore for FileScoreStore {
    fn get_high_score(&self) -> Result<u32, String> {
        Ok(self.manager.get_config()?.high_score)
    }

    fn set_high_score(&self, value: u32) -> Result<(), String> {
        self.manager.update_config(|s| s.high_score = value).map(|_| ())
    }

    fn get_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, String> {
        Ok(self.manager.get_config()?.leaderboard)
    }

    fn append_leaderboard_entry(&self, score: u32, details: &str) -> Result<Vec<LeaderboardEntry>, String> {
        if score == 0 {
            return self.get_leaderboard();
        }
        let updated = self.manager.update_config(|s| {
            s.insert_entry(score, details);
        })?;
        Ok(updated.leaderboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_temp_file_path() -> PathBuf {
        let mut path = std::env::temp_dir();
        let random_number: u32 = rand::random();
        path.push(format!("temp_snake_scores_{}.yaml", random_number));
        path
    }

    #[test]
    fn test_zero_score_never_touches_leaderboard() {
        let store = InMemoryScoreStore::new();
        store.append_leaderboard_entry(40, "EASY - 10x10").unwrap();
        let before = store.get_leaderboard().unwrap();

        let after = store.append_leaderboard_entry(0, "HARD - 40x40").unwrap();

        assert_eq!(before, after);
        assert_eq!(store.get_leaderboard().unwrap(), before);
    }

    #[test]
    fn test_keeps_top_ten_sorted_descending() {
        let store = InMemoryScoreStore::new();
        for score in [30, 120, 10, 80, 50, 200, 60, 90, 20, 150, 70, 110, 40] {
            store.append_leaderboard_entry(score, "MEDIUM - 25x25").unwrap();
        }

        let scores: Vec<u32> = store.get_leaderboard().unwrap().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![200, 150, 120, 110, 90, 80, 70, 60, 50, 40]);
    }

    #[test]
    fn test_equal_scores_keep_insertion_order() {
        let store = InMemoryScoreStore::new();
        store.append_leaderboard_entry(50, "first").unwrap();
        store.append_leaderboard_entry(50, "second").unwrap();

        let board = store.get_leaderboard().unwrap();
        assert_eq!(board[0].details, "first");
        assert_eq!(board[1].details, "second");
    }

    #[test]
    fn test_file_store_persists_between_instances() {
        let path = get_temp_file_path();
        {
            let store = FileScoreStore::new(path.clone());
            assert_eq!(store.get_high_score().unwrap(), 0);
            store.set_high_score(140).unwrap();
            store.append_leaderboard_entry(140, "HARD - 20x20").unwrap();
            store.append_leaderboard_entry(0, "HARD - 20x20").unwrap();
        }

        let reopened = FileScoreStore::new(path);
        assert_eq!(reopened.get_high_score().unwrap(), 140);
        assert_eq!(
            reopened.get_leaderboard().unwrap(),
            vec![LeaderboardEntry {
                score: 140,
                details: "HARD - 20x20".to_string()
            }]
        );
    }

    #[test]
    fn test_unsorted_score_file_is_rejected() {
        let scores = StoredScores {
            high_score: 10,
            leaderboard: vec![
                LeaderboardEntry { score: 10, details: "a".to_string() },
                LeaderboardEntry { score: 20, details: "b".to_string() },
            ],
        };
        assert!(scores.validate().is_err());
    }
}
