use std::{collections::BTreeSet, path::PathBuf};

use serde::Serialize;

use crate::core::{EffectiveExclusions, Node, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderState {
    Checked,
    Unchecked,
    Indeterminate,
}

impl FolderState {
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Checked => "[x]",
            Self::Unchecked => "[ ]",
            Self::Indeterminate => "[~]",
        }
    }
}

/// Checkbox state for a folder whose selectable files are `descendants`.
/// An empty set (nothing selectable, e.g. an excluded folder) is `Unchecked`.
#[must_use]
pub fn folder_state(descendants: &[PathBuf], selection: &BTreeSet<PathBuf>) -> FolderState {
    if descendants.is_empty() {
        return FolderState::Unchecked;
    }
    let selected = descendants.iter().filter(|p| selection.contains(*p)).count();
    if selected == descendants.len() {
        FolderState::Checked
    } else if selected == 0 {
        FolderState::Unchecked
    } else {
        FolderState::Indeterminate
    }
}

/// Uncached evaluation straight from the tree.
#[must_use]
pub fn evaluate_folder(
    tree: &Tree,
    folder: &Node,
    selection: &BTreeSet<PathBuf>,
    exclusions: &EffectiveExclusions,
) -> FolderState {
    folder_state(&tree.descendant_files(folder, exclusions), selection)
}
