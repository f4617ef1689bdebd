use std::{
    cell::OnceCell,
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::Serialize;

use crate::core::{
    AppSettings, ConfigEditState, ConfigProfile, DescendantIndex, EffectiveExclusions,
    EngineError, ExclusionSpec, ExclusionToggle, FolderState, Node, ProfileEdit, ProfileField,
    ProfileMode, ProfileStore, Result, SaveOutcome, SelectionSet, SwitchOutcome, Tree,
    TreeProvider, folder_state, normalize_path, rehydrate_previous, relativize_selection,
    restore_selection,
};

/// Per-node facts the tree view renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeState {
    pub selected: bool,
    /// `None` for files.
    pub folder_state: Option<FolderState>,
    pub effectively_excluded: bool,
    pub excluded_by_config: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub path: PathBuf,
    pub name: String,
    pub depth: usize,
    pub is_dir: bool,
    pub state: NodeState,
}

/// Everything the output generator needs for one "generate" action.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
    pub profile: ConfigProfile,
}

#[derive(Debug)]
struct Project {
    tree: Tree,
    config: ConfigEditState,
}

/// Application state for one window: the open project, its configuration
/// edit state, the selection and the exclusion overlay.
///
/// Every operation either completes and installs new state, or fails and
/// leaves the previous state untouched. Selection/exclusion recomputation
/// always reads the exclusions of the current in-edit profile.
pub struct Engine<S, P> {
    store: S,
    provider: P,
    settings: AppSettings,
    project: Option<Project>,
    selection: SelectionSet,
    exclusions: ExclusionSpec,
    index: OnceCell<DescendantIndex>,
}

impl<S: ProfileStore, P: TreeProvider> Engine<S, P> {
    pub fn new(store: S, provider: P, settings: AppSettings) -> Self {
        Self {
            store,
            provider,
            settings,
            project: None,
            selection: SelectionSet::default(),
            exclusions: ExclusionSpec::default(),
            index: OnceCell::new(),
        }
    }

    /* ------------------------------- accessors ------------------------------ */

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub const fn is_open(&self) -> bool {
        self.project.is_some()
    }

    pub fn root(&self) -> Option<&Path> {
        self.project.as_ref().map(|p| p.tree.root_dir())
    }

    pub fn tree(&self) -> Option<&Tree> {
        self.project.as_ref().map(|p| &p.tree)
    }

    pub fn config(&self) -> Option<&ConfigEditState> {
        self.project.as_ref().map(|p| &p.config)
    }

    pub fn mode(&self) -> Option<ProfileMode> {
        self.config().map(ConfigEditState::mode)
    }

    pub fn is_dirty(&self) -> bool {
        self.config().is_some_and(ConfigEditState::is_dirty)
    }

    pub fn active_profile(&self) -> Option<&ConfigProfile> {
        self.config().map(ConfigEditState::active)
    }

    pub const fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn subscribe_selection(&mut self, observer: impl FnMut(&BTreeSet<PathBuf>) + 'static) {
        self.selection.subscribe(observer);
    }

    pub const fn session_exclusions(&self) -> &BTreeSet<String> {
        self.exclusions.session()
    }

    pub fn effective_exclusions(&self) -> EffectiveExclusions {
        self.project
            .as_ref()
            .map(|p| self.exclusions.effective(p.config.active()))
            .unwrap_or_default()
    }

    /* ----------------------------- project loads ---------------------------- */

    /// Opens `root`: reads both profiles, activates one, scans the tree.
    /// Starts with an empty selection and no session exclusions.
    pub fn open_project(&mut self, root: &Path, preference: Option<ProfileMode>) -> Result<()> {
        let root = normalize_path(root);
        let profiles = self.store.read_profiles(&root)?;
        let preference = preference.or_else(|| self.store.active_mode_hint());
        let (config, materialized) =
            ConfigEditState::load(profiles, preference, self.settings.default_to_local_config);
        if materialized {
            self.store
                .write_profile(&root, config.mode(), config.active())?;
        }
        let node = self.provider.scan(&root, config.active())?;

        let mode = config.mode();
        self.project = Some(Project {
            tree: Tree::new(&root, node),
            config,
        });
        self.exclusions.clear_session();
        self.invalidate();
        self.selection.clear_all();

        self.store.set_active_mode_hint(mode);
        self.store.remember_project(&root);
        info!("opened {} with the {mode} profile", root.display());
        Ok(())
    }

    /// Rescans the open project, keeping whatever of the selection survives.
    pub fn reload_tree(&mut self) -> Result<()> {
        let project = self.project.as_ref().ok_or(EngineError::NoProject)?;
        let node = self
            .provider
            .scan(project.tree.root_dir(), project.config.active())?;
        let captured = self.selection.paths().clone();
        self.install_tree(node, Some(&captured));
        Ok(())
    }

    fn install_tree(&mut self, node: Node, captured: Option<&BTreeSet<PathBuf>>) {
        let Some(project) = self.project.as_mut() else {
            return;
        };
        let root_dir = project.tree.root_dir().to_path_buf();
        project.tree = Tree::new(root_dir, node);
        self.invalidate();

        let restored = match self.index_and_tree() {
            Some((index, tree)) => restore_selection(captured, index.dir_files(&tree.root().path)),
            None => BTreeSet::new(),
        };
        debug!(
            "restored {} of {} selected files after reload",
            restored.len(),
            captured.map_or(0, BTreeSet::len)
        );
        self.selection.replace(restored);
    }

    /* ------------------------------- selection ------------------------------ */

    pub fn toggle_file(&mut self, path: &Path) -> bool {
        let Some(project) = self.project.as_ref() else {
            return false;
        };
        let exclusions = self.exclusions.effective(project.config.active());
        self.selection
            .toggle_file(path, &project.tree, &exclusions)
    }

    /// Toggles a folder as a whole; a file path behaves like `toggle_file`.
    pub fn toggle_folder(&mut self, path: &Path) -> bool {
        let Some(descendants) = self.selectable_under(path) else {
            debug!("ignoring toggle of unknown path {}", path.display());
            return false;
        };
        let is_dir = self
            .tree()
            .and_then(|t| t.find(path))
            .is_some_and(|n| n.is_dir);
        if !is_dir {
            return self.toggle_file(path);
        }
        self.selection.toggle_folder(&descendants)
    }

    pub fn select_all(&mut self) -> usize {
        let all = self
            .tree()
            .map(|t| t.root().path.clone())
            .and_then(|root| self.selectable_under(&root))
            .unwrap_or_default();
        self.selection.select_all(&all);
        all.len()
    }

    pub fn clear_all(&mut self) {
        self.selection.clear_all();
    }

    /// Re-applies the stored selection, dropping anything not currently
    /// selectable. Returns how many files ended up selected.
    ///
    /// The list lives on the saved project-local profile whichever scope is
    /// active, since that is where `record_generation` writes it.
    pub fn use_previous_selection(&mut self) -> Result<usize> {
        let project = self.project.as_ref().ok_or(EngineError::NoProject)?;
        let exclusions = self.exclusions.effective(project.config.active());
        let previous = project
            .config
            .profiles()
            .get(ProfileMode::Local)
            .map_or(&[][..], |p| p.previous_files.as_slice());
        let restored = rehydrate_previous(&project.tree, previous, &exclusions);
        let count = restored.len();
        self.selection.replace(restored);
        Ok(count)
    }

    fn selectable_under(&self, path: &Path) -> Option<Vec<PathBuf>> {
        let (index, tree) = self.index_and_tree()?;
        let node = tree.find(path)?;
        Some(index.files_under(tree, node))
    }

    /* ------------------------------- exclusions ----------------------------- */

    /// Tree-view exclusion toggle on a directory.
    ///
    /// A directory excluded by the profile is lifted through a profile edit
    /// (marks dirty, needs a save); anything else flips the session overlay.
    pub fn toggle_exclusion(&mut self, dir: &Path) -> Option<ExclusionToggle> {
        let project = self.project.as_mut()?;
        let is_dir = project.tree.find(dir).is_some_and(|n| n.is_dir);
        let rel = project.tree.relative(dir).filter(|r| !r.is_empty());
        let Some(rel) = rel.filter(|_| is_dir) else {
            debug!("ignoring exclusion toggle on {}", dir.display());
            return None;
        };

        let outcome = if project.config.active().exclude_dirs.contains(&rel) {
            let mut persisted = project.config.active().exclude_dirs.clone();
            persisted.remove(&rel);
            project.config.edit(ProfileEdit::ExcludeDirs(persisted));
            self.exclusions.remove_session(&rel);
            ExclusionToggle::PersistedLifted
        } else if self.exclusions.toggle_session(&rel) {
            ExclusionToggle::SessionExcluded
        } else {
            ExclusionToggle::SessionIncluded
        };

        self.exclusions_changed();
        Some(outcome)
    }

    fn exclusions_changed(&mut self) {
        self.invalidate();
        let Some(project) = self.project.as_ref() else {
            return;
        };
        let exclusions = self.exclusions.effective(project.config.active());
        let tree = &project.tree;
        let dropped = self
            .selection
            .retain(|p| tree.contains_file(p) && !tree.is_under_excluded(p, &exclusions));
        if dropped > 0 {
            debug!("dropped {dropped} newly excluded files from the selection");
        }
    }

    /* ------------------------------ configuration --------------------------- */

    /// Edits the in-edit profile; returns the resulting dirtiness.
    pub fn edit(&mut self, edit: ProfileEdit) -> Result<bool> {
        let project = self.project.as_mut().ok_or(EngineError::NoProject)?;
        let touches_exclusions = edit.field() == ProfileField::ExcludeDirs;
        let dirty = project.config.edit(edit);
        if touches_exclusions {
            self.exclusions_changed();
        }
        Ok(dirty)
    }

    /// Persists the in-edit profile. When filter-relevant fields changed the
    /// session overlay is cleared and the tree rescanned (selection restored).
    pub fn save(&mut self) -> Result<SaveOutcome> {
        let project = self.project.as_mut().ok_or(EngineError::NoProject)?;
        let root = project.tree.root_dir().to_path_buf();
        let outcome = project.config.save(&self.store, &root)?;

        if outcome.reload_tree {
            self.exclusions.clear_session();
            self.exclusions_changed();
            self.reload_tree()?;
        }
        Ok(outcome)
    }

    /// Discards unsaved edits; returns whether there was anything to discard.
    pub fn reset(&mut self) -> bool {
        let Some(project) = self.project.as_mut() else {
            return false;
        };
        let discarded = project.config.reset();
        if discarded {
            self.exclusions_changed();
        }
        discarded
    }

    /// Activates the other profile scope and rescans with it.
    ///
    /// Fails with `Blocked` while dirty. Session exclusions are dropped and
    /// the current selection is carried over where still selectable.
    pub fn switch_mode(&mut self, mode: ProfileMode) -> Result<SwitchOutcome> {
        let project = self.project.as_ref().ok_or(EngineError::NoProject)?;
        let root = project.tree.root_dir().to_path_buf();
        let mut next = project.config.clone();
        let outcome = next.switch_mode(mode)?;
        let SwitchOutcome::Switched { materialized } = outcome else {
            return Ok(outcome);
        };

        if materialized {
            self.store.write_profile(&root, mode, next.active())?;
        }
        let node = self.provider.scan(&root, next.active())?;

        let captured = self.selection.paths().clone();
        if let Some(project) = self.project.as_mut() {
            project.config = next;
        }
        self.exclusions.clear_session();
        self.install_tree(node, Some(&captured));
        self.store.set_active_mode_hint(mode);
        info!("switched to the {mode} profile");
        Ok(outcome)
    }

    /* -------------------------------- output -------------------------------- */

    pub fn generation_request(&self) -> Result<GenerationRequest> {
        let project = self.project.as_ref().ok_or(EngineError::NoProject)?;
        Ok(GenerationRequest {
            root: project.tree.root_dir().to_path_buf(),
            files: self.selection.paths().iter().cloned().collect(),
            profile: project.config.active().clone(),
        })
    }

    /// After a successful generate: when `store_files_chosen` is set, writes
    /// the selection to the project-local profile's `previous_files`.
    /// Pending edits and dirtiness are left alone.
    pub fn record_generation(&mut self) -> Result<bool> {
        let project = self.project.as_mut().ok_or(EngineError::NoProject)?;
        if !project.config.active().store_files_chosen {
            return Ok(false);
        }
        let root = project.tree.root_dir().to_path_buf();
        let files = relativize_selection(&root, self.selection.paths());

        let mut next = project.config.clone();
        let snapshot = next.store_previous_files(ProfileMode::Local, files);
        self.store
            .write_profile(&root, ProfileMode::Local, &snapshot)?;
        project.config = next;
        Ok(true)
    }

    /* ------------------------------- rendering ------------------------------ */

    pub fn tree_state(&self, path: &Path) -> Option<NodeState> {
        let (index, tree) = self.index_and_tree()?;
        let node = tree.find(path)?;
        Some(self.node_state(index, tree, &self.effective_exclusions(), node))
    }

    /// Pre-order list of every node with its render state.
    pub fn node_views(&self) -> Vec<NodeView> {
        let mut out = Vec::new();
        if let Some((index, tree)) = self.index_and_tree() {
            let exclusions = self.effective_exclusions();
            self.collect_views(index, tree, &exclusions, tree.root(), 0, &mut out);
        }
        out
    }

    /// Folder states keyed by directory path.
    pub fn folder_states(&self) -> HashMap<PathBuf, FolderState> {
        self.node_views()
            .into_iter()
            .filter_map(|v| v.state.folder_state.map(|s| (v.path, s)))
            .collect()
    }

    fn collect_views(
        &self,
        index: &DescendantIndex,
        tree: &Tree,
        exclusions: &EffectiveExclusions,
        node: &Node,
        depth: usize,
        out: &mut Vec<NodeView>,
    ) {
        out.push(NodeView {
            path: node.path.clone(),
            name: node.name.clone(),
            depth,
            is_dir: node.is_dir,
            state: self.node_state(index, tree, exclusions, node),
        });
        for child in &node.children {
            self.collect_views(index, tree, exclusions, child, depth + 1, out);
        }
    }

    fn node_state(
        &self,
        index: &DescendantIndex,
        tree: &Tree,
        exclusions: &EffectiveExclusions,
        node: &Node,
    ) -> NodeState {
        let rel = tree.relative(&node.path).unwrap_or_default();
        let persisted = self
            .active_profile()
            .is_some_and(|p| p.exclude_dirs.contains(&rel));

        NodeState {
            selected: !node.is_dir && self.selection.contains(&node.path),
            folder_state: node
                .is_dir
                .then(|| folder_state(index.dir_files(&node.path), self.selection.paths())),
            effectively_excluded: tree.is_under_excluded(&node.path, exclusions),
            excluded_by_config: node.is_dir && persisted,
        }
    }

    /* ------------------------------ memoization ----------------------------- */

    fn index_and_tree(&self) -> Option<(&DescendantIndex, &Tree)> {
        let project = self.project.as_ref()?;
        let index = self.index.get_or_init(|| {
            DescendantIndex::build(
                &project.tree,
                &self.exclusions.effective(project.config.active()),
            )
        });
        debug_assert!(index.is_built_for(&self.exclusions.effective(project.config.active())));
        Some((index, &project.tree))
    }

    fn invalidate(&mut self) {
        self.index = OnceCell::new();
    }
}
