use std::path::{Path, PathBuf};

/// UI-free representation of a filesystem node, as handed over by a tree provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub children: Vec<Node>,
}

impl Node {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: file_name_of(&path),
            path,
            is_dir: false,
            children: Vec::new(),
        }
    }

    pub fn dir(path: impl Into<PathBuf>, children: Vec<Self>) -> Self {
        let path = path.into();
        Self {
            name: file_name_of(&path),
            path,
            is_dir: true,
            children,
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

mod edit_state;
mod engine;
mod error;
mod exclusion;
mod fs;
mod profile;
mod restore;
mod selection;
mod store;
mod tree;
mod tristate;

pub use edit_state::*;
pub use engine::*;
pub use error::*;
pub use exclusion::*;
pub use fs::*;
pub use profile::*;
pub use restore::*;
pub use selection::*;
pub use store::*;
pub use tree::*;
pub use tristate::*;
