use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
};

use log::debug;

use crate::core::{EffectiveExclusions, FolderState, Tree, folder_state};

/// Called synchronously with the new contents after every effective mutation.
pub type SelectionObserver = Box<dyn FnMut(&BTreeSet<PathBuf>)>;

/// Absolute paths of selected files. Directories are never members.
#[derive(Default)]
pub struct SelectionSet {
    paths: BTreeSet<PathBuf>,
    observers: Vec<SelectionObserver>,
}

impl fmt::Debug for SelectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionSet")
            .field("paths", &self.paths)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl SelectionSet {
    #[must_use]
    pub const fn paths(&self) -> &BTreeSet<PathBuf> {
        &self.paths
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&BTreeSet<PathBuf>) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Flips membership of a file. Paths missing from the tree or under an
    /// excluded directory are ignored.
    pub fn toggle_file(&mut self, path: &Path, tree: &Tree, exclusions: &EffectiveExclusions) -> bool {
        if !tree.contains_file(path) || tree.is_under_excluded(path, exclusions) {
            debug!("ignoring toggle of unselectable path {}", path.display());
            return false;
        }
        if !self.paths.remove(path) {
            self.paths.insert(path.to_path_buf());
        }
        self.notify();
        true
    }

    /// Checked folders get cleared, anything else gets fully selected.
    pub fn toggle_folder(&mut self, descendants: &[PathBuf]) -> bool {
        if descendants.is_empty() {
            return false;
        }
        if folder_state(descendants, &self.paths) == FolderState::Checked {
            for p in descendants {
                self.paths.remove(p);
            }
        } else {
            self.paths.extend(descendants.iter().cloned());
        }
        self.notify();
        true
    }

    pub fn select_all(&mut self, selectable: &[PathBuf]) {
        self.paths = selectable.iter().cloned().collect();
        self.notify();
    }

    pub fn clear_all(&mut self) {
        self.paths.clear();
        self.notify();
    }

    /// Replaces the contents wholesale (restoration, rehydration).
    pub fn replace(&mut self, paths: BTreeSet<PathBuf>) {
        self.paths = paths;
        self.notify();
    }

    /// Drops members failing `keep`; notifies only if something was removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&Path) -> bool) -> usize {
        let before = self.paths.len();
        self.paths.retain(|p| keep(p.as_path()));
        let dropped = before - self.paths.len();
        if dropped > 0 {
            self.notify();
        }
        dropped
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer(&self.paths);
        }
    }
}
