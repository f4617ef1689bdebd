use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use log::debug;

use crate::core::{ConfigProfile, EffectiveExclusions, Node, Result, absolute_from_unix, relative_unix};

/// Source of directory snapshots; filtering of what exists at all happens here.
pub trait TreeProvider {
    fn scan(&self, root: &Path, profile: &ConfigProfile) -> Result<Node>;
}

/* ================================ Tree model =============================== */

/// Immutable snapshot of a project's hierarchy. Replaced wholesale on reload.
#[derive(Debug, Clone)]
pub struct Tree {
    root_dir: PathBuf,
    root: Node,
    files: HashSet<PathBuf>,
}

impl Tree {
    #[must_use]
    pub fn new(root_dir: impl Into<PathBuf>, root: Node) -> Self {
        let mut files = HashSet::new();
        gather_files(&root, &mut files);
        Self {
            root_dir: root_dir.into(),
            root,
            files,
        }
    }

    #[must_use]
    pub const fn root(&self) -> &Node {
        &self.root
    }

    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    #[must_use]
    pub fn relative(&self, path: &Path) -> Option<String> {
        relative_unix(&self.root_dir, path)
    }

    #[must_use]
    pub fn absolute(&self, rel: &str) -> PathBuf {
        absolute_from_unix(&self.root_dir, rel)
    }

    /// True when `path` is a non-directory leaf of this snapshot.
    #[must_use]
    pub fn contains_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn find(&self, path: &Path) -> Option<&Node> {
        fn rec<'a>(n: &'a Node, target: &Path) -> Option<&'a Node> {
            if n.path == target {
                return Some(n);
            }
            if !n.is_dir || !target.starts_with(&n.path) {
                return None;
            }
            n.children.iter().find_map(|c| rec(c, target))
        }
        rec(&self.root, path)
    }

    /// True when `path` sits inside an effectively excluded directory, or is one.
    /// Only directories match an entry themselves; a file named like an
    /// excluded entry is judged by its ancestors alone.
    #[must_use]
    pub fn is_under_excluded(&self, path: &Path, exclusions: &EffectiveExclusions) -> bool {
        let Some(rel) = self.relative(path) else {
            return false;
        };
        if self.contains_file(path) {
            let parent = rel.rsplit_once('/').map_or("", |(dir, _)| dir);
            exclusions.covers(parent)
        } else {
            exclusions.covers(&rel)
        }
    }

    /// Selectable files under `node`, in tree order. Exclusion is inherited by descendants.
    #[must_use]
    pub fn descendant_files(&self, node: &Node, exclusions: &EffectiveExclusions) -> Vec<PathBuf> {
        let mut out = Vec::new();
        if self.is_under_excluded(&node.path, exclusions) {
            return out;
        }
        self.collect_files(node, exclusions, &mut out);
        out
    }

    fn collect_files(&self, node: &Node, exclusions: &EffectiveExclusions, out: &mut Vec<PathBuf>) {
        if !node.is_dir {
            out.push(node.path.clone());
            return;
        }
        for child in &node.children {
            if child.is_dir && self.is_excluded_dir(child, exclusions) {
                continue;
            }
            self.collect_files(child, exclusions, out);
        }
    }

    fn is_excluded_dir(&self, node: &Node, exclusions: &EffectiveExclusions) -> bool {
        self.relative(&node.path)
            .is_some_and(|rel| exclusions.contains(&rel))
    }
}

fn gather_files(n: &Node, set: &mut HashSet<PathBuf>) {
    if !n.is_dir {
        set.insert(n.path.clone());
        return;
    }
    for c in &n.children {
        gather_files(c, set);
    }
}

/* ============================= Descendant index ============================ */

/// `descendant_files` for every directory of one tree, computed in a single pass
/// for one exclusion set. Rebuilt when the tree or the exclusions change.
#[derive(Debug, Clone)]
pub struct DescendantIndex {
    exclusions: EffectiveExclusions,
    by_dir: HashMap<PathBuf, Vec<PathBuf>>,
}

impl DescendantIndex {
    #[must_use]
    pub fn build(tree: &Tree, exclusions: &EffectiveExclusions) -> Self {
        let mut by_dir = HashMap::new();
        index_rec(tree, tree.root(), exclusions, false, &mut by_dir);
        debug!(
            "descendant index built: {} dirs, {} exclusions",
            by_dir.len(),
            exclusions.len()
        );
        Self {
            exclusions: exclusions.clone(),
            by_dir,
        }
    }

    #[must_use]
    pub fn is_built_for(&self, exclusions: &EffectiveExclusions) -> bool {
        &self.exclusions == exclusions
    }

    /// Same answer as `Tree::descendant_files`, without walking the subtree.
    #[must_use]
    pub fn files_under(&self, tree: &Tree, node: &Node) -> Vec<PathBuf> {
        if node.is_dir {
            return self.by_dir.get(&node.path).cloned().unwrap_or_default();
        }
        if tree.is_under_excluded(&node.path, &self.exclusions) {
            Vec::new()
        } else {
            vec![node.path.clone()]
        }
    }

    #[must_use]
    pub fn dir_files(&self, dir: &Path) -> &[PathBuf] {
        self.by_dir.get(dir).map_or(&[], Vec::as_slice)
    }
}

fn index_rec(
    tree: &Tree,
    node: &Node,
    exclusions: &EffectiveExclusions,
    inherited_excluded: bool,
    by_dir: &mut HashMap<PathBuf, Vec<PathBuf>>,
) -> Vec<PathBuf> {
    if !node.is_dir {
        return if inherited_excluded {
            Vec::new()
        } else {
            vec![node.path.clone()]
        };
    }

    let excluded = inherited_excluded || tree.is_excluded_dir(node, exclusions);
    let mut files = Vec::new();
    for child in &node.children {
        files.extend(index_rec(tree, child, exclusions, excluded, by_dir));
    }
    by_dir.insert(node.path.clone(), files.clone());
    files
}
