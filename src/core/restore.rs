use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use crate::core::{EffectiveExclusions, Tree, absolute_from_unix, relative_unix};

/// Selection to install after a reload: the captured one, reduced to what is
/// still selectable. No capture (first load) means an empty selection.
#[must_use]
pub fn restore_selection(
    captured: Option<&BTreeSet<PathBuf>>,
    selectable: &[PathBuf],
) -> BTreeSet<PathBuf> {
    let Some(captured) = captured else {
        return BTreeSet::new();
    };
    selectable
        .iter()
        .filter(|p| captured.contains(*p))
        .cloned()
        .collect()
}

/// Absolute paths for stored root-relative entries, keeping only files that
/// exist in `tree` and are not under an excluded directory.
#[must_use]
pub fn rehydrate_previous(
    tree: &Tree,
    previous: &[String],
    exclusions: &EffectiveExclusions,
) -> BTreeSet<PathBuf> {
    previous
        .iter()
        .map(|rel| absolute_from_unix(tree.root_dir(), rel))
        .filter(|abs| tree.contains_file(abs) && !tree.is_under_excluded(abs, exclusions))
        .collect()
}

/// Root-relative, forward-slash form of the selection for `previous_files`.
#[must_use]
pub fn relativize_selection<'a, I>(root: &Path, selection: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    selection
        .into_iter()
        .filter_map(|p| relative_unix(root, p))
        .filter(|rel| !rel.is_empty())
        .collect()
}
