//! File-backed progress and preference stores.
//!
//! Contract: load once at startup, flush the full value after every
//! mutation. IO and parse faults are logged and degrade to defaults; the
//! trainer keeps running without persistence for that session and the
//! fault is never surfaced to the user.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::domain::Theme;

fn write_json_file(path: &PathBuf, payload: &str) {
  if let Some(parent) = path.parent() {
    if let Err(e) = std::fs::create_dir_all(parent) {
      error!(target: "versicle_backend", path = %path.display(), error = %e, "Failed to create store directory");
      return;
    }
  }
  if let Err(e) = std::fs::write(path, payload) {
    error!(target: "versicle_backend", path = %path.display(), error = %e, "Failed to write store file");
  }
}

/// Completed plan days, persisted as a JSON list of day integers.
/// Append-only from the application's perspective.
pub struct ProgressStore {
  path: PathBuf,
  completed: HashSet<u32>,
}

impl ProgressStore {
  pub fn load(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let completed = match std::fs::read_to_string(&path) {
      Ok(s) => match serde_json::from_str::<Vec<u32>>(&s) {
        Ok(days) => {
          let set: HashSet<u32> = days.into_iter().collect();
          info!(target: "versicle_backend", path = %path.display(), days = set.len(), "Loaded progress");
          set
        }
        Err(e) => {
          warn!(target: "versicle_backend", path = %path.display(), error = %e, "Corrupt progress file; starting empty");
          HashSet::new()
        }
      },
      // A missing file is the normal first run.
      Err(_) => HashSet::new(),
    };
    Self { path, completed }
  }

  pub fn completed(&self) -> &HashSet<u32> {
    &self.completed
  }

  /// Insert and flush. Returns whether the day was newly completed.
  pub fn mark_complete(&mut self, day: u32) -> bool {
    let added = self.completed.insert(day);
    if added {
      self.flush();
    }
    added
  }

  fn flush(&self) {
    let mut days: Vec<u32> = self.completed.iter().copied().collect();
    days.sort_unstable();
    match serde_json::to_string(&days) {
      Ok(payload) => write_json_file(&self.path, &payload),
      Err(e) => error!(target: "versicle_backend", error = %e, "Failed to serialize progress"),
    }
  }
}

/// Two-valued display preference, persisted as a JSON string.
pub struct PrefStore {
  path: PathBuf,
  theme: Theme,
}

impl PrefStore {
  pub fn load(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let theme = match std::fs::read_to_string(&path) {
      Ok(s) => match serde_json::from_str::<Theme>(&s) {
        Ok(theme) => theme,
        Err(e) => {
          warn!(target: "versicle_backend", path = %path.display(), error = %e, "Invalid theme file; using default");
          Theme::default()
        }
      },
      Err(_) => Theme::default(),
    };
    Self { path, theme }
  }

  pub fn theme(&self) -> Theme {
    self.theme
  }

  pub fn toggle(&mut self) -> Theme {
    self.theme = self.theme.toggled();
    match serde_json::to_string(&self.theme) {
      Ok(payload) => write_json_file(&self.path, &payload),
      Err(e) => error!(target: "versicle_backend", error = %e, "Failed to serialize theme"),
    }
    self.theme
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("versicle-{}-{}.json", name, uuid::Uuid::new_v4()))
  }

  #[test]
  fn progress_round_trips_through_the_file() {
    let path = temp_path("progress");
    {
      let mut store = ProgressStore::load(&path);
      assert!(store.completed().is_empty());
      assert!(store.mark_complete(3));
      assert!(store.mark_complete(1));
    }
    let store = ProgressStore::load(&path);
    assert_eq!(store.completed(), &HashSet::from([1, 3]));
    let _ = std::fs::remove_file(&path);
  }

  #[test]
  fn marking_a_day_twice_keeps_set_semantics() {
    let path = temp_path("progress-idem");
    let mut store = ProgressStore::load(&path);
    assert!(store.mark_complete(5));
    assert!(!store.mark_complete(5));
    assert_eq!(store.completed().len(), 1);
    let _ = std::fs::remove_file(&path);
  }

  #[test]
  fn corrupt_progress_degrades_to_empty() {
    let path = temp_path("progress-corrupt");
    std::fs::write(&path, "{not json").expect("test file written");
    let store = ProgressStore::load(&path);
    assert!(store.completed().is_empty());
    let _ = std::fs::remove_file(&path);
  }

  #[test]
  fn theme_defaults_and_toggles_persistently() {
    let path = temp_path("theme");
    {
      let mut store = PrefStore::load(&path);
      assert_eq!(store.theme(), Theme::Warm);
      assert_eq!(store.toggle(), Theme::Cool);
    }
    let store = PrefStore::load(&path);
    assert_eq!(store.theme(), Theme::Cool);
    let _ = std::fs::remove_file(&path);
  }

  #[test]
  fn invalid_theme_file_falls_back_to_default() {
    let path = temp_path("theme-invalid");
    std::fs::write(&path, "\"neon\"").expect("test file written");
    let store = PrefStore::load(&path);
    assert_eq!(store.theme(), Theme::Warm);
    let _ = std::fs::remove_file(&path);
  }
}
