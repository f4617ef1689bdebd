#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet},
    io,
    path::{Path, PathBuf},
    rc::Rc,
};

use patchwork::core::{
    AppSettings, ConfigProfile, Engine, EngineError, Node, ProfileMode, ProfilePair, ProfileStore,
    Result, TreeProvider,
};

pub fn root() -> PathBuf {
    PathBuf::from("/proj")
}

/// root{a.txt, sub/{b.txt, c.txt}}
pub fn sample_tree() -> Node {
    let r = root();
    Node::dir(
        &r,
        vec![
            Node::file(r.join("a.txt")),
            Node::dir(
                r.join("sub"),
                vec![Node::file(r.join("sub/b.txt")), Node::file(r.join("sub/c.txt"))],
            ),
        ],
    )
}

/// root{x.txt, y.txt, docs/{guide.md, deep/{notes.md}}}
pub fn docs_tree() -> Node {
    let r = root();
    Node::dir(
        &r,
        vec![
            Node::dir(
                r.join("docs"),
                vec![
                    Node::dir(r.join("docs/deep"), vec![Node::file(r.join("docs/deep/notes.md"))]),
                    Node::file(r.join("docs/guide.md")),
                ],
            ),
            Node::file(r.join("x.txt")),
            Node::file(r.join("y.txt")),
        ],
    )
}

/// Builds a tree under `root()` from `/`-separated relative file paths.
pub fn tree_from_rel_paths(files: &[String]) -> Node {
    #[derive(Default)]
    struct T {
        dirs: BTreeMap<String, T>,
        files: BTreeSet<String>,
    }
    fn build(t: &T, path: PathBuf) -> Node {
        let mut children = Vec::new();
        for (name, sub) in &t.dirs {
            children.push(build(sub, path.join(name)));
        }
        for f in &t.files {
            children.push(Node::file(path.join(f)));
        }
        Node::dir(path, children)
    }

    let mut top = T::default();
    for f in files {
        let parts: Vec<&str> = f.split('/').collect();
        let Some((file, dirs)) = parts.split_last() else {
            continue;
        };
        let mut cur = &mut top;
        for d in dirs {
            cur = cur.dirs.entry((*d).to_string()).or_default();
        }
        cur.files.insert((*file).to_string());
    }
    build(&top, root())
}

/* ============================== Profile store ============================== */

#[derive(Default)]
pub struct StoreState {
    pub profiles: RefCell<ProfilePair>,
    pub fail_writes: Cell<bool>,
    pub writes: Cell<usize>,
    pub hint: Cell<Option<ProfileMode>>,
}

/// In-memory store; clones share state so tests can inspect it after
/// handing one to the engine.
#[derive(Clone, Default)]
pub struct MemoryStore(pub Rc<StoreState>);

impl MemoryStore {
    pub fn with_profiles(global: Option<ConfigProfile>, local: Option<ConfigProfile>) -> Self {
        let store = Self::default();
        *store.0.profiles.borrow_mut() = ProfilePair { global, local };
        store
    }

    pub fn fail_writes(&self, fail: bool) {
        self.0.fail_writes.set(fail);
    }

    pub fn writes(&self) -> usize {
        self.0.writes.get()
    }

    pub fn saved(&self, mode: ProfileMode) -> Option<ConfigProfile> {
        self.0.profiles.borrow().get(mode).cloned()
    }

    pub fn hint(&self) -> Option<ProfileMode> {
        self.0.hint.get()
    }
}

impl ProfileStore for MemoryStore {
    fn read_profiles(&self, _project_root: &Path) -> Result<ProfilePair> {
        Ok(self.0.profiles.borrow().clone())
    }

    fn write_profile(&self, _root: &Path, mode: ProfileMode, profile: &ConfigProfile) -> Result<()> {
        if self.0.fail_writes.get() {
            return Err(EngineError::Persistence {
                mode,
                source: io::Error::other("disk full"),
            });
        }
        self.0.writes.set(self.0.writes.get() + 1);
        self.0.profiles.borrow_mut().set(mode, profile.clone());
        Ok(())
    }

    fn set_active_mode_hint(&self, mode: ProfileMode) {
        self.0.hint.set(Some(mode));
    }
}

/* =============================== Tree provider ============================= */

#[derive(Clone)]
pub struct StaticProvider {
    tree: Rc<RefCell<Node>>,
    fail: Rc<Cell<bool>>,
    scans: Rc<Cell<usize>>,
}

impl StaticProvider {
    pub fn new(tree: Node) -> Self {
        Self {
            tree: Rc::new(RefCell::new(tree)),
            fail: Rc::new(Cell::new(false)),
            scans: Rc::new(Cell::new(0)),
        }
    }

    pub fn set_tree(&self, tree: Node) {
        *self.tree.borrow_mut() = tree;
    }

    pub fn fail(&self, fail: bool) {
        self.fail.set(fail);
    }

    pub fn scans(&self) -> usize {
        self.scans.get()
    }
}

impl TreeProvider for StaticProvider {
    fn scan(&self, root: &Path, _profile: &ConfigProfile) -> Result<Node> {
        if self.fail.get() {
            return Err(EngineError::io(
                root,
                io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            ));
        }
        self.scans.set(self.scans.get() + 1);
        Ok(self.tree.borrow().clone())
    }
}

pub type TestEngine = Engine<MemoryStore, StaticProvider>;

/// Engine opened on `tree` with a single global profile.
pub fn open_with(tree: Node, global: ConfigProfile) -> (TestEngine, MemoryStore, StaticProvider) {
    let store = MemoryStore::with_profiles(Some(global), None);
    let provider = StaticProvider::new(tree);
    let mut engine = Engine::new(store.clone(), provider.clone(), AppSettings::default());
    engine
        .open_project(&root(), Some(ProfileMode::Global))
        .expect("open project");
    (engine, store, provider)
}

pub fn open_sample() -> (TestEngine, MemoryStore, StaticProvider) {
    open_with(sample_tree(), ConfigProfile::default())
}

pub fn p(rel: &str) -> PathBuf {
    root().join(rel)
}
