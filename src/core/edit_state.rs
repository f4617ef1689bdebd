use std::path::Path;

use log::info;

use crate::core::{
    ConfigProfile, EngineError, ProfileEdit, ProfileField, ProfileMode, ProfilePair, ProfileStore,
    Result,
};

/// Picks the scope to activate when a project is opened.
///
/// An explicit preference wins if that profile exists. Otherwise the
/// application's "prefer local" setting decides, falling back to whichever
/// profile exists, and finally to the preferred scope (to be materialized).
#[must_use]
pub fn choose_mode(
    profiles: &ProfilePair,
    preference: Option<ProfileMode>,
    prefer_local: bool,
) -> ProfileMode {
    if let Some(mode) = preference
        && profiles.contains(mode)
    {
        return mode;
    }
    let preferred = if prefer_local {
        ProfileMode::Local
    } else {
        ProfileMode::Global
    };
    if profiles.contains(preferred) || !profiles.contains(preferred.other()) {
        preferred
    } else {
        preferred.other()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Filter-relevant fields changed: rescan the tree and drop session exclusions.
    pub reload_tree: bool,
    pub changed: Vec<ProfileField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Requested mode was already active.
    Unchanged,
    /// `materialized` is set when the target scope had no stored profile and
    /// a default one must be written.
    Switched { materialized: bool },
}

/// In-edit configuration with its last saved snapshot.
///
/// `Uninitialized` is modelled by the owner holding no value; once built the
/// state is always `Loaded`. Dirtiness is a full field-wise comparison of
/// `active` against `original`, so reverting every edit clears it.
#[derive(Debug, Clone)]
pub struct ConfigEditState {
    mode: ProfileMode,
    active: ConfigProfile,
    original: ConfigProfile,
    profiles: ProfilePair,
}

impl ConfigEditState {
    /// Returns the state plus whether the chosen scope was materialized with defaults.
    #[must_use]
    pub fn load(
        mut profiles: ProfilePair,
        preference: Option<ProfileMode>,
        prefer_local: bool,
    ) -> (Self, bool) {
        let mode = choose_mode(&profiles, preference, prefer_local);
        let materialized = !profiles.contains(mode);
        let chosen = profiles.get(mode).cloned().unwrap_or_default();
        if materialized {
            profiles.set(mode, chosen.clone());
        }
        let state = Self {
            mode,
            active: chosen.clone(),
            original: chosen,
            profiles,
        };
        (state, materialized)
    }

    #[must_use]
    pub const fn mode(&self) -> ProfileMode {
        self.mode
    }

    #[must_use]
    pub const fn active(&self) -> &ConfigProfile {
        &self.active
    }

    #[must_use]
    pub const fn original(&self) -> &ConfigProfile {
        &self.original
    }

    #[must_use]
    pub const fn profiles(&self) -> &ProfilePair {
        &self.profiles
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.active != self.original
    }

    #[must_use]
    pub fn dirty_fields(&self) -> Vec<ProfileField> {
        ProfileField::ALL
            .into_iter()
            .filter(|f| f.differs(&self.active, &self.original))
            .collect()
    }

    /// Applies one field edit; returns the resulting dirtiness.
    pub fn edit(&mut self, edit: ProfileEdit) -> bool {
        edit.apply(&mut self.active);
        self.is_dirty()
    }

    /// Writes the active profile. On failure nothing changes and the edits stay dirty.
    pub fn save<S: ProfileStore + ?Sized>(
        &mut self,
        store: &S,
        project_root: &Path,
    ) -> Result<SaveOutcome> {
        store.write_profile(project_root, self.mode, &self.active)?;

        let changed = self.dirty_fields();
        let reload_tree = self.active.filtering_differs(&self.original);

        self.original = self.active.clone();
        self.profiles.set(self.mode, self.active.clone());
        info!(
            "saved {} profile ({} changed fields, reload: {reload_tree})",
            self.mode,
            changed.len()
        );
        Ok(SaveOutcome {
            reload_tree,
            changed,
        })
    }

    /// Discards edits; returns whether anything was discarded.
    pub fn reset(&mut self) -> bool {
        let was_dirty = self.is_dirty();
        self.active = self.original.clone();
        was_dirty
    }

    /// Activates the other scope. Refused with `Blocked` while dirty.
    pub fn switch_mode(&mut self, new_mode: ProfileMode) -> Result<SwitchOutcome> {
        if self.is_dirty() {
            return Err(EngineError::Blocked {
                requested: new_mode,
            });
        }
        if new_mode == self.mode {
            return Ok(SwitchOutcome::Unchanged);
        }

        let materialized = !self.profiles.contains(new_mode);
        let next = self.profiles.get(new_mode).cloned().unwrap_or_default();
        if materialized {
            self.profiles.set(new_mode, next.clone());
        }
        self.mode = new_mode;
        self.active = next.clone();
        self.original = next;
        Ok(SwitchOutcome::Switched { materialized })
    }

    /// Records a stored selection on the saved snapshot of `mode` without
    /// touching pending edits; returns the snapshot to persist.
    pub fn store_previous_files(&mut self, mode: ProfileMode, files: Vec<String>) -> ConfigProfile {
        let mut saved = self.profiles.get(mode).cloned().unwrap_or_default();
        saved.previous_files.clone_from(&files);
        self.profiles.set(mode, saved.clone());
        if mode == self.mode {
            self.original.previous_files.clone_from(&files);
            self.active.previous_files = files;
        }
        saved
    }
}
