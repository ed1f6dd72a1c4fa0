//! Persistence for `UserProgress`.
//!
//! A single JSON snapshot under the config directory. Loading merges the
//! persisted data over defaults (absent/corrupt fields fall back silently);
//! saving is fire-and-forget: a persistence failure is logged and gameplay
//! continues with in-memory state only.

use std::path::{Path, PathBuf};

use chrono::Utc;

use super::types::UserProgress;

const PROGRESS_FILE_NAME: &str = "progress.json";

/// Owner of the durable `UserProgress`. All mutation flows through
/// `mutate()`, which persists after applying the change.
pub struct ProgressStore {
    path: PathBuf,
    progress: UserProgress,
}

impl ProgressStore {
    /// Open the store at the default config location
    /// (`~/.config/errorparrot/progress.json` on Linux).
    pub fn at_default_location() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("errorparrot");
        Self::open(dir.join(PROGRESS_FILE_NAME))
    }

    /// Open the store backed by an explicit path (tests use a temp dir).
    pub fn open(path: PathBuf) -> Self {
        let progress = load_snapshot(&path);
        Self { path, progress }
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    /// Apply a transformation and persist. The save is atomic from the
    /// caller's perspective (no concurrent mutators exist; the event loop is
    /// the single writer). Persistence failure never reaches the caller.
    pub fn mutate<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut UserProgress) -> R,
    {
        let result = f(&mut self.progress);
        if let Err(e) = save_snapshot(&self.path, &self.progress) {
            log::warn!("Progress save failed (continuing in-memory): {}", e);
        }
        result
    }
}

fn load_snapshot(path: &Path) -> UserProgress {
    let mut progress = match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<UserProgress>(&contents) {
            Ok(progress) => progress,
            Err(e) => {
                log::warn!("Progress: failed to parse {:?}: {}", path, e);
                UserProgress::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => UserProgress::default(),
        Err(e) => {
            log::warn!("Progress: failed to read {:?}: {}", path, e);
            UserProgress::default()
        }
    };
    progress.normalize(Utc::now());
    progress
}

fn save_snapshot(path: &Path, progress: &UserProgress) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory {:?}: {}", parent, e))?;
    }

    let contents = serde_json::to_string_pretty(progress)
        .map_err(|e| format!("Serialize progress: {}", e))?;

    // Write atomically: temp file in the same directory, then rename. A crash
    // mid-write must not leave a partial progress.json behind.
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &contents)
        .map_err(|e| format!("Write temp progress {:?}: {}", tmp_path, e))?;

    // On Unix, rename atomically replaces the destination. On Windows, rename
    // fails if the destination exists, so remove it first (ignoring NotFound).
    if cfg!(windows) && path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(format!("Remove existing progress file {:?}: {}", path, e));
            }
        }
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| format!("Rename temp progress {:?} to {:?}: {}", tmp_path, path, e))?;
    Ok(())
}
