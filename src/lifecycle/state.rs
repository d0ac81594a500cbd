use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

/// Version of the startup popup shipped with this build. Bump it when the
/// intro text changes so returning users see it again.
pub const STARTUP_POPUP_VERSION: u32 = 5;

/// Process-level startup switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartupConfig {
    pub popup_version: u32,
    pub app_version: String,
    pub disable_startup_popups: bool,
    pub show_recent_repos: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            popup_version: STARTUP_POPUP_VERSION,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            disable_startup_popups: false,
            show_recent_repos: false,
        }
    }
}

/// Persisted application state read and written during process setup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppState {
    pub startup_popup_version: u32,
    pub last_version: String,
    pub recent_repos: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPopup {
    Intro,
    BreakingChanges,
}

/// Which popup process setup shows, if any.
pub fn startup_popup(config: &StartupConfig, state: &AppState) -> Option<StartupPopup> {
    if config.disable_startup_popups {
        return None;
    }
    if state.startup_popup_version < config.popup_version {
        Some(StartupPopup::Intro)
    } else {
        Some(StartupPopup::BreakingChanges)
    }
}

/// Storage for [`AppState`].
pub trait AppStateStore: Send {
    fn app_state(&self) -> &AppState;
    fn app_state_mut(&mut self) -> &mut AppState;
    fn save(&mut self) -> Result<()>;
}

/// Keeps state in memory and counts saves.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    state: AppState,
    saves: usize,
}

impl MemoryStateStore {
    pub fn new(state: AppState) -> Self {
        Self { state, saves: 0 }
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl AppStateStore for MemoryStateStore {
    fn app_state(&self) -> &AppState {
        &self.state
    }

    fn app_state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    fn save(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }
}

/// App state stored as pretty-printed JSON on disk.
#[derive(Debug, Clone)]
pub struct JsonStateFile {
    path: PathBuf,
    state: AppState,
}

impl JsonStateFile {
    /// Load state from `path`; a missing file starts from defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => AppState::default(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppState::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AppStateStore for JsonStateFile {
    fn app_state(&self) -> &AppState {
        &self.state
    }

    fn app_state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    fn save(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.state)?;
        fs::write(&self.path, raw).map_err(|err| {
            LayoutError::State(format!("writing {}: {err}", self.path.display()))
        })
    }
}
