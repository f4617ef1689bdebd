use std::path::{Path, PathBuf};

use patchwork::core::{absolute_from_unix, normalize_path, path_to_unix, relative_unix};
use pretty_assertions::assert_eq;

#[cfg(windows)]
mod windows_paths {
    use super::*;

    #[test]
    fn path_to_unix_handles_unc_paths() {
        let unc_path = PathBuf::from(r"\\server\share\path\to\file");
        assert_eq!(path_to_unix(&unc_path), "//server/share/path/to/file");
    }

    #[test]
    fn relative_unix_uses_forward_slashes() {
        let root = Path::new(r"C:\proj");
        assert_eq!(
            relative_unix(root, Path::new(r"C:\proj\src\lib.rs")).as_deref(),
            Some("src/lib.rs")
        );
    }
}

#[test]
fn path_to_unix_joins_components() {
    assert_eq!(path_to_unix(Path::new("a/b/c")), "a/b/c");
    assert_eq!(path_to_unix(Path::new("")), "");
}

#[test]
fn relative_unix_maps_root_to_empty() {
    let root = Path::new("/proj");
    assert_eq!(relative_unix(root, root).as_deref(), Some(""));
    assert_eq!(
        relative_unix(root, Path::new("/proj/src/lib.rs")).as_deref(),
        Some("src/lib.rs")
    );
    assert_eq!(relative_unix(root, Path::new("/other/x")), None);
    // Component-wise, not string prefix.
    assert_eq!(relative_unix(root, Path::new("/project/x")), None);
}

#[test]
fn absolute_from_unix_tolerates_separator_noise() {
    let root = Path::new("/proj");
    assert_eq!(absolute_from_unix(root, "src/lib.rs"), PathBuf::from("/proj/src/lib.rs"));
    assert_eq!(absolute_from_unix(root, "src\\lib.rs"), PathBuf::from("/proj/src/lib.rs"));
    assert_eq!(absolute_from_unix(root, "./src//lib.rs"), PathBuf::from("/proj/src/lib.rs"));
    assert_eq!(absolute_from_unix(root, ""), PathBuf::from("/proj"));
}

#[test]
fn relative_and_absolute_agree() {
    let root = Path::new("/proj");
    for rel in ["a.txt", "sub/b.txt", "deep/er/c.md"] {
        let abs = absolute_from_unix(root, rel);
        assert_eq!(relative_unix(root, &abs).as_deref(), Some(rel));
    }
}

#[test]
fn normalize_path_handles_dot_segments() {
    let normalized = normalize_path(Path::new("/no-such-root/a/./b/../c//d/"));
    assert_eq!(normalized, PathBuf::from("/no-such-root/a/c/d"));
}

#[test]
fn normalize_path_keeps_leading_parent_dirs_for_relative_paths() {
    let normalized = normalize_path(Path::new("../no-such-dir/x"));
    let s = normalized.to_string_lossy();
    assert!(s.ends_with("no-such-dir/x"));
    assert!(!s.contains("//"));
}

#[test]
fn normalize_path_of_empty_is_empty() {
    assert_eq!(normalize_path(Path::new("")), PathBuf::new());
}

#[test]
fn normalize_path_canonicalizes_existing_directories() {
    let tmp = tempfile::tempdir().expect("tmp");
    fs_create(&tmp.path().join("inner"));
    let messy = tmp.path().join("inner").join("..").join("inner");
    assert_eq!(normalize_path(&messy), normalize_path(&tmp.path().join("inner")));
}

fn fs_create(p: &Path) {
    std::fs::create_dir_all(p).expect("mkdir");
}
