use std::collections::BTreeSet;

use crate::core::ConfigProfile;

/// Union of persisted and session-only excluded directories (root-relative, `/`-separated).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveExclusions(BTreeSet<String>);

impl EffectiveExclusions {
    #[must_use]
    pub fn new(persisted: &BTreeSet<String>, session: &BTreeSet<String>) -> Self {
        Self(persisted.union(session).cloned().collect())
    }

    #[must_use]
    pub fn contains(&self, rel_dir: &str) -> bool {
        !rel_dir.is_empty() && self.0.contains(rel_dir)
    }

    /// True when `rel_path` is an excluded directory or lies beneath one.
    #[must_use]
    pub fn covers(&self, rel_path: &str) -> bool {
        if self.0.is_empty() || rel_path.is_empty() {
            return false;
        }
        let mut end = 0;
        for part in rel_path.split('/') {
            end += part.len();
            if self.0.contains(&rel_path[..end]) {
                return true;
            }
            end += 1;
        }
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What a tree-view exclusion toggle ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionToggle {
    /// Added to the session overlay.
    SessionExcluded,
    /// Removed from the session overlay.
    SessionIncluded,
    /// Removed from the in-edit profile's persisted set; needs a save.
    PersistedLifted,
}

/// Session-only exclusions. Persisted ones live on the active profile.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSpec {
    session: BTreeSet<String>,
}

impl ExclusionSpec {
    #[must_use]
    pub fn effective(&self, profile: &ConfigProfile) -> EffectiveExclusions {
        EffectiveExclusions::new(&profile.exclude_dirs, &self.session)
    }

    #[must_use]
    pub const fn session(&self) -> &BTreeSet<String> {
        &self.session
    }

    /// Flips `rel_dir` in the session overlay; returns whether it is now excluded.
    pub fn toggle_session(&mut self, rel_dir: &str) -> bool {
        if self.session.remove(rel_dir) {
            false
        } else {
            self.session.insert(rel_dir.to_string());
            true
        }
    }

    pub fn remove_session(&mut self, rel_dir: &str) -> bool {
        self.session.remove(rel_dir)
    }

    pub fn clear_session(&mut self) -> bool {
        let had_any = !self.session.is_empty();
        self.session.clear();
        had_any
    }
}
