//! Configuration for the application and the viewer
//!
//! Two kinds of configuration live here:
//!
//! - [`AppConfig`] - runtime options fixed at `Application::initialize` time
//!   (surface backend, dispatch tick, viewport title). Not persisted.
//! - [`ViewerPreferences`] - user preferences for the native viewer, stored
//!   as JSON in the platform-appropriate data directory.
//!
//! # App Data Location
//!
//! Preferences are stored under `dev.pixwatch.pixwatch-rs`:
//!
//! - **Linux**: `~/.local/share/dev.pixwatch.pixwatch-rs/`
//! - **macOS**: `~/Library/Application Support/dev.pixwatch.pixwatch-rs/`
//! - **Windows**: `%APPDATA%\dev.pixwatch.pixwatch-rs\`

use crate::error::{PixWatchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.pixwatch.pixwatch-rs";

/// Viewer preferences filename
pub const PREFERENCES_FILE: &str = "viewer_prefs.json";

/// Which surface implementation `exec` drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceBackend {
    /// eframe/egui viewer windows
    #[default]
    Native,
    /// No display; the event loop still dispatches readiness, buffer
    /// composition and plot callbacks. Used for embedding without a screen
    /// and by the test suite.
    Headless,
}

/// Runtime options for one application session
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: SurfaceBackend,
    /// Upper bound on how long the GUI loop sleeps between dispatches
    pub tick: Duration,
    /// Title of the native viewport
    pub title: String,
    /// Preferences applied by the native viewer
    pub viewer: ViewerPreferences,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: SurfaceBackend::default(),
            tick: Duration::from_millis(16),
            title: "Pixel Watch".to_string(),
            viewer: ViewerPreferences::default(),
        }
    }
}

impl AppConfig {
    /// Configuration for a headless session
    pub fn headless() -> Self {
        Self {
            backend: SurfaceBackend::Headless,
            ..Self::default()
        }
    }
}

/// Persisted preferences for the native viewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewerPreferences {
    /// Use the dark egui theme
    pub dark_mode: bool,
    /// Initial viewport width in points
    pub window_width: f32,
    /// Initial viewport height in points
    pub window_height: f32,
    /// Maximum number of autocomplete suggestions shown under the search box
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_max_suggestions() -> usize {
    8
}

impl Default for ViewerPreferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            window_width: 1024.0,
            window_height: 720.0,
            max_suggestions: default_max_suggestions(),
        }
    }
}

impl ViewerPreferences {
    /// Platform path of the preferences file, if a data directory exists
    pub fn preferences_path() -> Option<PathBuf> {
        dirs_next::data_dir().map(|dir| dir.join(APP_ID).join(PREFERENCES_FILE))
    }

    /// Load preferences from the default location, falling back to defaults
    /// on any failure
    pub fn load_or_default() -> Self {
        let Some(path) = Self::preferences_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!("failed to load viewer preferences, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load preferences from an explicit path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save preferences to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::preferences_path()
            .ok_or_else(|| PixWatchError::Config("no data directory available".to_string()))?;
        self.save_to(&path)
    }

    /// Save preferences to an explicit path, creating parent directories
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!("saved viewer preferences to {:?}", path);
        Ok(())
    }
}
