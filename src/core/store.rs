use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::warn;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::core::{ConfigProfile, EngineError, ProfileMode, Result};

/// Per-project directory holding the local profile; never shown in the tree.
pub const WORKSPACE_DIR_NAME: &str = ".patchwork";
const APP_DIR_NAME: &str = "patchwork";

/* ============================ App-level settings =========================== */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Prefer the project-local profile when no explicit mode was requested.
    pub default_to_local_config: bool,
    pub prompt_for_directory_on_startup: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_to_local_config: false,
            prompt_for_directory_on_startup: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub last_directory: Option<PathBuf>,
    pub last_config_mode: Option<ProfileMode>,
}

/* ================================ Profiles ================================= */

/// Both scopes as read from storage; either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePair {
    pub global: Option<ConfigProfile>,
    pub local: Option<ConfigProfile>,
}

impl ProfilePair {
    #[must_use]
    pub const fn get(&self, mode: ProfileMode) -> Option<&ConfigProfile> {
        match mode {
            ProfileMode::Global => self.global.as_ref(),
            ProfileMode::Local => self.local.as_ref(),
        }
    }

    pub fn set(&mut self, mode: ProfileMode, profile: ConfigProfile) {
        match mode {
            ProfileMode::Global => self.global = Some(profile),
            ProfileMode::Local => self.local = Some(profile),
        }
    }

    #[must_use]
    pub const fn contains(&self, mode: ProfileMode) -> bool {
        self.get(mode).is_some()
    }
}

pub trait ProfileStore {
    fn read_profiles(&self, project_root: &Path) -> Result<ProfilePair>;

    fn write_profile(
        &self,
        project_root: &Path,
        mode: ProfileMode,
        profile: &ConfigProfile,
    ) -> Result<()>;

    /// Best-effort persisted preference for the next launch.
    fn set_active_mode_hint(&self, mode: ProfileMode);

    fn active_mode_hint(&self) -> Option<ProfileMode> {
        None
    }

    /// Best-effort record of the last opened project.
    fn remember_project(&self, _project_root: &Path) {}
}

/* ========================== Paths & filesystem store ======================= */

#[must_use]
pub fn workspace_dir(project_root: &Path) -> PathBuf {
    project_root.join(WORKSPACE_DIR_NAME)
}

#[must_use]
pub fn local_profile_file(project_root: &Path) -> PathBuf {
    workspace_dir(project_root).join("profile.json")
}

/// JSON files under `<config_home>/patchwork/` plus `<project>/.patchwork/profile.json`.
#[derive(Debug, Clone)]
pub struct FsProfileStore {
    config_home: PathBuf,
}

impl FsProfileStore {
    pub fn new(config_home: impl Into<PathBuf>) -> Self {
        Self {
            config_home: config_home.into(),
        }
    }

    /// Store rooted at the platform's per-user configuration directory.
    pub fn from_user_dirs() -> Result<Self> {
        let home = dirs::config_dir().ok_or_else(|| {
            EngineError::io(
                PathBuf::new(),
                io::Error::new(io::ErrorKind::NotFound, "no user configuration directory"),
            )
        })?;
        Ok(Self::new(home))
    }

    #[must_use]
    pub fn app_dir(&self) -> PathBuf {
        self.config_home.join(APP_DIR_NAME)
    }

    #[must_use]
    pub fn global_profile_file(&self) -> PathBuf {
        self.app_dir().join("global.json")
    }

    fn settings_file(&self) -> PathBuf {
        self.app_dir().join("settings.json")
    }

    fn session_file(&self) -> PathBuf {
        self.app_dir().join("session.json")
    }

    #[must_use]
    pub fn load_app_settings(&self) -> AppSettings {
        read_json(&self.settings_file()).ok().flatten().unwrap_or_default()
    }

    pub fn save_app_settings(&self, settings: &AppSettings) -> io::Result<()> {
        write_json_atomic(&self.settings_file(), settings)
    }

    #[must_use]
    pub fn load_session_state(&self) -> SessionState {
        read_json(&self.session_file()).ok().flatten().unwrap_or_default()
    }

    pub fn save_session_state(&self, state: &SessionState) -> io::Result<()> {
        write_json_atomic(&self.session_file(), state)
    }

    fn read_profile(&self, path: &Path, mode: ProfileMode) -> Result<Option<ConfigProfile>> {
        match read_json::<ConfigProfile>(path) {
            Ok(found) => Ok(found.map(|p| p.migrate(mode))),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!("ignoring unreadable {mode} profile {}: {e}", path.display());
                Ok(None)
            }
            Err(e) => Err(EngineError::io(path, e)),
        }
    }

    fn update_session(&self, f: impl FnOnce(&mut SessionState)) {
        let mut state = self.load_session_state();
        f(&mut state);
        if let Err(e) = self.save_session_state(&state) {
            warn!("failed to save session state: {e}");
        }
    }
}

impl ProfileStore for FsProfileStore {
    fn read_profiles(&self, project_root: &Path) -> Result<ProfilePair> {
        Ok(ProfilePair {
            global: self.read_profile(&self.global_profile_file(), ProfileMode::Global)?,
            local: self.read_profile(&local_profile_file(project_root), ProfileMode::Local)?,
        })
    }

    fn write_profile(
        &self,
        project_root: &Path,
        mode: ProfileMode,
        profile: &ConfigProfile,
    ) -> Result<()> {
        let result = match mode {
            ProfileMode::Global => {
                let mut stripped = profile.clone();
                stripped.previous_files.clear();
                write_json_atomic(&self.global_profile_file(), &stripped)
            }
            ProfileMode::Local => write_json_atomic(&local_profile_file(project_root), profile),
        };
        result.map_err(|source| EngineError::Persistence { mode, source })
    }

    fn set_active_mode_hint(&self, mode: ProfileMode) {
        self.update_session(|s| s.last_config_mode = Some(mode));
    }

    fn active_mode_hint(&self) -> Option<ProfileMode> {
        self.load_session_state().last_config_mode
    }

    fn remember_project(&self, project_root: &Path) {
        self.update_session(|s| s.last_directory = Some(project_root.to_path_buf()));
    }
}

/* ================================= JSON IO ================================= */

/// `Ok(None)` when the file does not exist; parse failures map to `InvalidData`.
fn read_json<T: DeserializeOwned>(path: &Path) -> io::Result<Option<T>> {
    let data = match fs::read(path) {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    serde_json::from_slice::<T>(&data)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(value).map_err(|e| io::Error::other(e.to_string()))?;

    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
