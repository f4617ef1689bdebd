use std::{
    collections::{BTreeSet, HashSet},
    ffi::OsString,
    fs, io,
    path::{Component, Path, PathBuf},
};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log::debug;

use crate::core::{
    ConfigProfile, DEFAULT_IGNORES, EngineError, Node, Result, TreeProvider, WORKSPACE_DIR_NAME,
};

type NamePath = (String, PathBuf);

/* =========================== Filesystem & paths ============================ */

#[must_use]
pub fn path_to_unix(p: &Path) -> String {
    let mut s = String::new();
    let mut first = true;

    for comp in p {
        if !first {
            s.push('/');
        }
        first = false;
        s.push_str(&comp.to_string_lossy());
    }

    s
}

/// Root-relative form of `path` with forward slashes; the root itself maps to `""`.
#[must_use]
pub fn relative_unix(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(path_to_unix(rel))
}

/// Absolute path for a root-relative, forward-slash path.
#[must_use]
pub fn absolute_from_unix(root: &Path, rel: &str) -> PathBuf {
    rel.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

#[must_use]
pub fn normalize_path(p: &Path) -> PathBuf {
    if p.as_os_str().is_empty() {
        return PathBuf::new();
    }

    if let Ok(c) = dunce::canonicalize(p) {
        return c;
    }

    let mut prefix: Option<OsString> = None;
    let mut has_root = false;
    let mut parts: Vec<OsString> = Vec::new();

    for comp in p.components() {
        match comp {
            Component::Prefix(pref) => {
                prefix = Some(pref.as_os_str().to_os_string());
            }
            Component::RootDir => {
                has_root = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(last) = parts.last() {
                    if last == ".." {
                        parts.push(OsString::from(".."));
                    } else {
                        let _ = parts.pop();
                    }
                } else if !has_root && prefix.is_none() {
                    parts.push(OsString::from(".."));
                }
            }
            Component::Normal(name) => {
                parts.push(name.to_os_string());
            }
        }
    }

    let mut out = PathBuf::new();
    if let Some(pref) = prefix {
        out.push(pref);
    }
    if has_root {
        out.push(Component::RootDir.as_os_str());
    }
    for part in parts {
        out.push(part);
    }
    out
}

/* ============================ Extension filters ============================ */

/// Parses a comma list like `.rs, py, *.toml` into normalized `.ext` tokens.
#[must_use]
pub fn parse_extension_list<'a, I>(tokens: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens
        .into_iter()
        .flat_map(|raw| raw.split(','))
        .filter_map(|tok| {
            let stripped = tok.trim().trim_start_matches('*').trim_start_matches('.');
            if stripped.is_empty() {
                None
            } else {
                Some(format!(".{}", stripped.to_lowercase()))
            }
        })
        .collect()
}

/// Matches a full extensionless filename, any multi-dot suffix, or the last extension.
fn path_matches_extension_filters(p: &Path, filters: &HashSet<String>) -> bool {
    let filename = p.file_name().and_then(|name| name.to_str()).unwrap_or("");
    if filename.is_empty() {
        return false;
    }

    let filename_lower = filename.to_lowercase();
    if filters.contains(&format!(".{filename_lower}")) {
        return true;
    }

    let mut dot_pos = 0;
    while let Some(pos) = filename_lower[dot_pos..].find('.') {
        let actual_pos = dot_pos + pos;
        if filters.contains(&filename_lower[actual_pos..]) {
            return true;
        }
        dot_pos = actual_pos + 1;
    }

    false
}

/* =============================== Tree scanning ============================= */

/// Upstream filtering derived from a profile's filter fields.
struct ScanFilters {
    include_all: bool,
    include_exts: HashSet<String>,
    exclude_exts: HashSet<String>,
    gitignore: Option<Gitignore>,
    show_ignored: bool,
    show_default_ignored: bool,
    keep_dirs: BTreeSet<String>,
}

impl ScanFilters {
    fn from_profile(root: &Path, profile: &ConfigProfile) -> Self {
        let include_all = profile.include_file_types.trim().is_empty()
            || profile.include_file_types.trim() == "*";
        let include_exts = if include_all {
            HashSet::new()
        } else {
            parse_extension_list([profile.include_file_types.as_str()])
        };
        let gitignore = if profile.use_git_ignore {
            load_gitignore(root)
        } else {
            None
        };

        Self {
            include_all,
            include_exts,
            exclude_exts: parse_extension_list(profile.exclude_file_types.iter().map(String::as_str)),
            gitignore,
            show_ignored: profile.show_ignored_in_tree,
            show_default_ignored: profile.show_default_ignored_in_tree,
            keep_dirs: profile.exclude_dirs.clone(),
        }
    }

    fn passes_ignores(&self, path: &Path, name: &str, is_dir: bool) -> bool {
        if self.show_ignored {
            return true;
        }
        let git_ignored = self
            .gitignore
            .as_ref()
            .is_some_and(|gi| gi.matched(path, is_dir).is_ignore());
        if git_ignored {
            return false;
        }
        self.show_default_ignored || !DEFAULT_IGNORES.contains(&name)
    }

    fn passes_extension(&self, path: &Path) -> bool {
        if self.include_all {
            self.exclude_exts.is_empty() || !path_matches_extension_filters(path, &self.exclude_exts)
        } else {
            path_matches_extension_filters(path, &self.include_exts)
        }
    }
}

/// Nearest `.gitignore` at `root` or one of its ancestors.
fn load_gitignore(root: &Path) -> Option<Gitignore> {
    for dir in root.ancestors() {
        let candidate = dir.join(".gitignore");
        if candidate.is_file() {
            let mut builder = GitignoreBuilder::new(dir);
            if let Some(err) = builder.add(&candidate) {
                debug!("partial .gitignore at {}: {err}", candidate.display());
            }
            return builder.build().ok();
        }
    }
    None
}

/// Scans the real filesystem, applying ignore files and file-type filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTreeProvider;

impl TreeProvider for FsTreeProvider {
    fn scan(&self, root: &Path, profile: &ConfigProfile) -> Result<Node> {
        let meta = fs::metadata(root).map_err(|e| EngineError::io(root, e))?;
        if !meta.is_dir() {
            return Err(EngineError::io(
                root,
                io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }
        let entries = fs::read_dir(root).map_err(|e| EngineError::io(root, e))?;

        let filters = ScanFilters::from_profile(root, profile);
        let mut node = Node::dir(root, Vec::new());
        node.children = scan_children(root, root, entries, &filters);
        Ok(node)
    }
}

fn scan_dir(root: &Path, dir: &Path, filters: &ScanFilters) -> Node {
    let mut node = Node::dir(dir, Vec::new());
    // Unreadable subdirectories stay in the tree as empty directories.
    if let Ok(entries) = fs::read_dir(dir) {
        node.children = scan_children(root, dir, entries, filters);
    }
    node
}

fn scan_children(root: &Path, dir: &Path, entries: fs::ReadDir, filters: &ScanFilters) -> Vec<Node> {
    let (mut dirs, mut files) = gather_dir_entries(root, dir, entries, filters);

    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut children = Vec::with_capacity(dirs.len() + files.len());

    for (_name, path) in dirs {
        let child = scan_dir(root, &path, filters);
        let keep_visible = relative_unix(root, &path)
            .is_some_and(|rel| filters.keep_dirs.contains(&rel));
        if !child.children.is_empty() || keep_visible {
            children.push(child);
        }
    }
    for (_name, path) in files {
        children.push(Node::file(path));
    }

    children
}

fn gather_dir_entries(
    root: &Path,
    dir: &Path,
    entries: fs::ReadDir,
    filters: &ScanFilters,
) -> (Vec<NamePath>, Vec<NamePath>) {
    let mut dirs: Vec<NamePath> = Vec::new();
    let mut files: Vec<NamePath> = Vec::new();

    for ent in entries.flatten() {
        let path = ent.path();
        let name: String = ent.file_name().to_string_lossy().into_owned();
        let is_dir = ent.file_type().map(|ft| ft.is_dir()).unwrap_or(false);

        if is_dir {
            if dir == root && name == WORKSPACE_DIR_NAME {
                continue;
            }
            if filters.passes_ignores(&path, &name, true) {
                dirs.push((name, path));
            }
            continue;
        }

        if filters.passes_ignores(&path, &name, false) && filters.passes_extension(&path) {
            files.push((name, path));
        }
    }

    (dirs, files)
}
