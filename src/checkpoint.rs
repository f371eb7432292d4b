//! Checkpoint persistence for resumable batch runs.
//!
//! The checkpoint is a single 1-based index: the last record written
//! successfully. It lives in `checkpoint.json` under the output root, is
//! overwritten after every success, and is deleted when the run completes.
//! A restart skips every index at or below the checkpoint.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Checkpoint file name under the output root.
pub const CHECKPOINT_FILE: &str = "checkpoint.json";

/// Persisted resume point. The JSON key is part of the on-disk contract
/// and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// 1-based index of the last successfully processed record.
    pub ultimo_registro: usize,
}

impl Checkpoint {
    fn path(output_dir: &Path) -> PathBuf {
        output_dir.join(CHECKPOINT_FILE)
    }

    /// Read the checkpoint if one exists. A corrupt file degrades to a
    /// fresh start with a warning instead of failing the run.
    pub fn load(output_dir: &Path) -> Option<Checkpoint> {
        let path = Self::path(output_dir);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(cp) => Some(cp),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt checkpoint, starting over");
                None
            }
        }
    }

    /// Overwrite the checkpoint with `last_index`.
    pub fn save(output_dir: &Path, last_index: usize) -> std::io::Result<()> {
        let cp = Checkpoint {
            ultimo_registro: last_index,
        };
        let json = serde_json::to_string(&cp).map_err(std::io::Error::other)?;
        fs::write(Self::path(output_dir), json)
    }

    /// Remove the checkpoint after a fully completed run. Best effort.
    pub fn clear(output_dir: &Path) {
        let path = Self::path(output_dir);
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Failed to remove checkpoint");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        Checkpoint::save(dir.path(), 5).unwrap();

        let cp = Checkpoint::load(dir.path()).unwrap();
        assert_eq!(cp.ultimo_registro, 5);
    }

    #[test]
    fn test_wire_format() {
        let dir = tempfile::tempdir().unwrap();
        Checkpoint::save(dir.path(), 12).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(CHECKPOINT_FILE)).unwrap();
        assert_eq!(raw, r#"{"ultimo_registro":12}"#);
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Checkpoint::load(dir.path()).is_none());
    }

    #[test]
    fn test_load_corrupt_is_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CHECKPOINT_FILE), "{broken").unwrap();
        assert!(Checkpoint::load(dir.path()).is_none());
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        Checkpoint::save(dir.path(), 1).unwrap();
        Checkpoint::clear(dir.path());
        assert!(!dir.path().join(CHECKPOINT_FILE).exists());
        // Clearing again is a no-op.
        Checkpoint::clear(dir.path());
    }
}
