//! Numbered JSON save files.
//!
//! Saves are written as `save_001.json`, `save_002.json`, ... in one
//! directory; the highest number is the latest save.

use settlers_core::{GameState, SnapshotError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save directory I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode game: {0}")]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a new save after the highest existing one
    pub fn save(&self, game: &GameState) -> Result<PathBuf, SaveError> {
        fs::create_dir_all(&self.dir)?;
        let next = self.indices()?.into_iter().max().unwrap_or(0) + 1;
        let path = self.dir.join(save_file_name(next));
        fs::write(&path, game.to_json()?)?;
        info!("Saved game to {}", path.display());
        Ok(path)
    }

    /// Path of the highest-numbered save, if any
    pub fn latest_path(&self) -> Option<PathBuf> {
        let latest = self.indices().ok()?.into_iter().max()?;
        Some(self.dir.join(save_file_name(latest)))
    }

    /// Load the latest save. Unreadable or corrupt files yield `None`.
    pub fn load_latest(&self) -> Option<GameState> {
        let path = self.latest_path()?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                return None;
            }
        };
        match GameState::from_json(&json) {
            Ok(game) => Some(game),
            Err(e) => {
                warn!("Ignoring corrupt save {}: {}", path.display(), e);
                None
            }
        }
    }

    fn indices(&self) -> Result<Vec<u32>, SaveError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut indices = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            if let Some(index) = name.to_str().and_then(parse_save_index) {
                indices.push(index);
            }
        }
        Ok(indices)
    }
}

fn save_file_name(index: u32) -> String {
    format!("save_{:03}.json", index)
}

fn parse_save_index(name: &str) -> Option<u32> {
    name.strip_prefix("save_")?.strip_suffix(".json")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use settlers_core::GameConfig;
    use tempfile::tempdir;

    fn game() -> GameState {
        GameState::new_match(1, 1, GameConfig::default())
    }

    #[test]
    fn test_parse_save_index() {
        assert_eq!(parse_save_index("save_007.json"), Some(7));
        assert_eq!(parse_save_index("save_1234.json"), Some(1234));
        assert_eq!(parse_save_index("notes.json"), None);
        assert_eq!(parse_save_index("save_abc.json"), None);
    }

    #[test]
    fn test_saves_are_numbered() {
        let dir = tempdir().expect("temp dir");
        let store = SaveStore::new(dir.path().join("saves"));

        let first = store.save(&game()).unwrap();
        let second = store.save(&game()).unwrap();

        assert_eq!(first.file_name().unwrap(), "save_001.json");
        assert_eq!(second.file_name().unwrap(), "save_002.json");
        assert_eq!(store.latest_path(), Some(second));
    }

    #[test]
    fn test_numbering_continues_after_gaps() {
        let dir = tempdir().expect("temp dir");
        fs::write(dir.path().join("save_041.json"), "{}").unwrap();
        let store = SaveStore::new(dir.path());

        let path = store.save(&game()).unwrap();
        assert_eq!(path.file_name().unwrap(), "save_042.json");
    }

    #[test]
    fn test_load_latest_round_trip() {
        let dir = tempdir().expect("temp dir");
        let store = SaveStore::new(dir.path());
        let mut original = game();
        original.players[0].victory_points = 4;

        store.save(&game()).unwrap();
        store.save(&original).unwrap();

        let loaded = store.load_latest().unwrap();
        assert_eq!(loaded.players[0].victory_points, 4);
        assert_eq!(loaded.board.tiles(), original.board.tiles());
    }

    #[test]
    fn test_load_latest_without_saves() {
        let dir = tempdir().expect("temp dir");
        let store = SaveStore::new(dir.path().join("missing"));
        assert!(store.load_latest().is_none());
    }

    #[test]
    fn test_corrupt_latest_save_is_ignored() {
        let dir = tempdir().expect("temp dir");
        let store = SaveStore::new(dir.path());
        store.save(&game()).unwrap();
        fs::write(dir.path().join("save_002.json"), "not json").unwrap();

        assert!(store.load_latest().is_none());
    }
}
