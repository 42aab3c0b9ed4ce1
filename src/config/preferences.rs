//! Persisted display preferences
//!
//! A small JSON blob with visual toggles and the onboarding flag. The store
//! is the only writer; each successful update is written to disk and then
//! broadcast to every in-process subscriber.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPreferences {
    pub enable_3d_effects: bool,
    pub enable_glow: bool,
    pub animated_backgrounds: bool,
    pub onboarding_seen: bool,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            enable_3d_effects: true,
            enable_glow: true,
            animated_backgrounds: true,
            onboarding_seen: false,
        }
    }
}

impl DisplayPreferences {
    /// Set a flag by its JSON name
    pub fn set(&mut self, key: &str, value: bool) -> ConfigResult<()> {
        match key {
            "enable_3d_effects" => self.enable_3d_effects = value,
            "enable_glow" => self.enable_glow = value,
            "animated_backgrounds" => self.animated_backgrounds = value,
            "onboarding_seen" => self.onboarding_seen = value,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

type Listener = Box<dyn Fn(&DisplayPreferences) + Send + Sync>;

/// Single-writer store for [`DisplayPreferences`]
pub struct PreferenceStore {
    path: PathBuf,
    current: DisplayPreferences,
    listeners: Vec<Listener>,
}

impl PreferenceStore {
    /// Open the store at `path`; missing or corrupt files yield defaults
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| match serde_json::from_str(&content) {
                Ok(prefs) => Some(prefs),
                Err(e) => {
                    tracing::warn!("Ignoring corrupt preferences at {}: {}", path.display(), e);
                    None
                }
            })
            .unwrap_or_default();
        Self {
            path,
            current,
            listeners: Vec::new(),
        }
    }

    /// Open the store at the default location
    pub fn open_default() -> ConfigResult<Self> {
        Self::default_path()
            .map(Self::open)
            .ok_or(ConfigError::NoConfigDir)
    }

    /// ~/.local/share/repotoire/preferences.json (platform data dir)
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("repotoire").join("preferences.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> DisplayPreferences {
        self.current
    }

    /// Register a callback fired after every successful update
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&DisplayPreferences) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Apply `change`, persist, then notify subscribers.
    ///
    /// Nothing is broadcast when the value is unchanged or the write fails.
    pub fn update<F>(&mut self, change: F) -> ConfigResult<DisplayPreferences>
    where
        F: FnOnce(&mut DisplayPreferences),
    {
        let mut next = self.current;
        change(&mut next);
        if next == self.current {
            return Ok(next);
        }

        self.persist(&next)?;
        self.current = next;
        tracing::debug!("Display preferences updated: {:?}", next);
        for listener in &self.listeners {
            listener(&next);
        }
        Ok(next)
    }

    pub fn mark_onboarding_seen(&mut self) -> ConfigResult<DisplayPreferences> {
        self.update(|p| p.onboarding_seen = true)
    }

    pub fn reset(&mut self) -> ConfigResult<DisplayPreferences> {
        self.update(|p| *p = DisplayPreferences::default())
    }

    fn persist(&self, prefs: &DisplayPreferences) -> ConfigResult<()> {
        let io = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        let json = serde_json::to_string_pretty(prefs).map_err(|e| ConfigError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, json).map_err(io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = PreferenceStore::open(dir.path().join("prefs.json"));
        assert_eq!(store.get(), DisplayPreferences::default());
        assert!(!store.get().onboarding_seen);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = PreferenceStore::open(&path);
        assert_eq!(store.get(), DisplayPreferences::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"enable_glow": false}"#).unwrap();
        let prefs = PreferenceStore::open(&path).get();
        assert!(!prefs.enable_glow);
        assert!(prefs.enable_3d_effects);
    }

    #[test]
    fn test_update_persists_and_broadcasts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("prefs.json");
        let mut store = PreferenceStore::open(&path);

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        store.subscribe(move |p| {
            assert!(!p.animated_backgrounds);
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.update(|p| p.animated_backgrounds = false).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        // No-op update does not broadcast
        store.update(|p| p.animated_backgrounds = false).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        let reopened = PreferenceStore::open(&path);
        assert!(!reopened.get().animated_backgrounds);
    }

    #[test]
    fn test_onboarding_flag() {
        let dir = tempdir().unwrap();
        let mut store = PreferenceStore::open(dir.path().join("p.json"));
        store.mark_onboarding_seen().unwrap();
        assert!(store.get().onboarding_seen);
        store.reset().unwrap();
        assert!(!store.get().onboarding_seen);
    }

    #[test]
    fn test_set_by_name() {
        let mut prefs = DisplayPreferences::default();
        prefs.set("enable_glow", false).unwrap();
        assert!(!prefs.enable_glow);
        assert!(prefs.set("dark_mode", true).is_err());
    }
}
