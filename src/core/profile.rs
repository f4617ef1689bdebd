use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result};

/// Current on-disk profile format.
pub const PROFILE_VERSION: u32 = 2;

/// Names hidden from the tree unless `show_default_ignored_in_tree` is set.
pub const DEFAULT_IGNORES: [&str; 6] = [
    ".git",
    ".vscode",
    "__pycache__",
    ".DS_Store",
    ".idea",
    ".gitignore",
];

/* ================================ Profiles ================================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileMode {
    Global,
    Local,
}

impl ProfileMode {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Global => Self::Local,
            Self::Local => Self::Global,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for ProfileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "local" => Ok(Self::Local),
            other => Err(EngineError::InvalidValue {
                field: "mode".into(),
                value: other.to_string(),
            }),
        }
    }
}

/// All user-editable settings of one configuration scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigProfile {
    pub version: u32,
    pub use_git_ignore: bool,
    pub include_file_types: String,
    pub exclude_file_types: Vec<String>,
    /// Root-relative directories, forward slashes.
    #[serde(with = "comma_list")]
    pub exclude_dirs: BTreeSet<String>,
    pub output_file: String,
    pub output_file_locally: bool,
    pub copy_to_clipboard: bool,
    pub safe_mode: bool,
    pub store_files_chosen: bool,
    pub line_numbers: bool,
    pub show_ignored_in_tree: bool,
    pub show_default_ignored_in_tree: bool,
    /// Root-relative paths of the last stored selection.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub previous_files: Vec<String>,
}

impl Default for ConfigProfile {
    fn default() -> Self {
        Self {
            version: PROFILE_VERSION,
            use_git_ignore: true,
            include_file_types: "*".to_string(),
            exclude_file_types: Vec::new(),
            exclude_dirs: BTreeSet::new(),
            output_file: "patchwork_output.txt".to_string(),
            output_file_locally: true,
            copy_to_clipboard: false,
            safe_mode: true,
            store_files_chosen: true,
            line_numbers: false,
            show_ignored_in_tree: false,
            show_default_ignored_in_tree: false,
            previous_files: Vec::new(),
        }
    }
}

impl ConfigProfile {
    /// Brings an older on-disk profile up to `PROFILE_VERSION`.
    #[must_use]
    pub fn migrate(mut self, mode: ProfileMode) -> Self {
        if self.version < 1 {
            if mode == ProfileMode::Local {
                self.previous_files.clear();
            }
            self.version = 1;
        }
        if self.version < 2 {
            self.show_ignored_in_tree = false;
            self.show_default_ignored_in_tree = false;
            self.version = 2;
        }
        if mode == ProfileMode::Global {
            self.previous_files.clear();
        }
        self
    }

    #[must_use]
    pub fn filtering_differs(&self, other: &Self) -> bool {
        FILTERING_FIELDS.iter().any(|f| f.differs(self, other))
    }
}

/* ================================= Fields ================================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    UseGitIgnore,
    IncludeFileTypes,
    ExcludeFileTypes,
    ExcludeDirs,
    OutputFile,
    OutputFileLocally,
    CopyToClipboard,
    SafeMode,
    StoreFilesChosen,
    LineNumbers,
    ShowIgnoredInTree,
    ShowDefaultIgnoredInTree,
    PreviousFiles,
}

/// Fields whose change after a save requires rescanning the tree.
pub const FILTERING_FIELDS: [ProfileField; 6] = [
    ProfileField::IncludeFileTypes,
    ProfileField::ExcludeFileTypes,
    ProfileField::UseGitIgnore,
    ProfileField::ExcludeDirs,
    ProfileField::ShowIgnoredInTree,
    ProfileField::ShowDefaultIgnoredInTree,
];

impl ProfileField {
    pub const ALL: [Self; 13] = [
        Self::UseGitIgnore,
        Self::IncludeFileTypes,
        Self::ExcludeFileTypes,
        Self::ExcludeDirs,
        Self::OutputFile,
        Self::OutputFileLocally,
        Self::CopyToClipboard,
        Self::SafeMode,
        Self::StoreFilesChosen,
        Self::LineNumbers,
        Self::ShowIgnoredInTree,
        Self::ShowDefaultIgnoredInTree,
        Self::PreviousFiles,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UseGitIgnore => "use_git_ignore",
            Self::IncludeFileTypes => "include_file_types",
            Self::ExcludeFileTypes => "exclude_file_types",
            Self::ExcludeDirs => "exclude_dirs",
            Self::OutputFile => "output_file",
            Self::OutputFileLocally => "output_file_locally",
            Self::CopyToClipboard => "copy_to_clipboard",
            Self::SafeMode => "safe_mode",
            Self::StoreFilesChosen => "store_files_chosen",
            Self::LineNumbers => "line_numbers",
            Self::ShowIgnoredInTree => "show_ignored_in_tree",
            Self::ShowDefaultIgnoredInTree => "show_default_ignored_in_tree",
            Self::PreviousFiles => "previous_files",
        }
    }

    #[must_use]
    pub fn is_filtering_relevant(self) -> bool {
        FILTERING_FIELDS.contains(&self)
    }

    /// Compares this single field between two profiles.
    #[must_use]
    pub fn differs(self, a: &ConfigProfile, b: &ConfigProfile) -> bool {
        match self {
            Self::UseGitIgnore => a.use_git_ignore != b.use_git_ignore,
            Self::IncludeFileTypes => a.include_file_types != b.include_file_types,
            Self::ExcludeFileTypes => a.exclude_file_types != b.exclude_file_types,
            Self::ExcludeDirs => a.exclude_dirs != b.exclude_dirs,
            Self::OutputFile => a.output_file != b.output_file,
            Self::OutputFileLocally => a.output_file_locally != b.output_file_locally,
            Self::CopyToClipboard => a.copy_to_clipboard != b.copy_to_clipboard,
            Self::SafeMode => a.safe_mode != b.safe_mode,
            Self::StoreFilesChosen => a.store_files_chosen != b.store_files_chosen,
            Self::LineNumbers => a.line_numbers != b.line_numbers,
            Self::ShowIgnoredInTree => a.show_ignored_in_tree != b.show_ignored_in_tree,
            Self::ShowDefaultIgnoredInTree => {
                a.show_default_ignored_in_tree != b.show_default_ignored_in_tree
            }
            Self::PreviousFiles => a.previous_files != b.previous_files,
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProfileField {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.name() == key)
            .ok_or_else(|| EngineError::UnknownField(key.to_string()))
    }
}

/// A single typed field assignment against the in-edit profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileEdit {
    UseGitIgnore(bool),
    IncludeFileTypes(String),
    ExcludeFileTypes(Vec<String>),
    ExcludeDirs(BTreeSet<String>),
    OutputFile(String),
    OutputFileLocally(bool),
    CopyToClipboard(bool),
    SafeMode(bool),
    StoreFilesChosen(bool),
    LineNumbers(bool),
    ShowIgnoredInTree(bool),
    ShowDefaultIgnoredInTree(bool),
    PreviousFiles(Vec<String>),
}

impl ProfileEdit {
    #[must_use]
    pub const fn field(&self) -> ProfileField {
        match self {
            Self::UseGitIgnore(_) => ProfileField::UseGitIgnore,
            Self::IncludeFileTypes(_) => ProfileField::IncludeFileTypes,
            Self::ExcludeFileTypes(_) => ProfileField::ExcludeFileTypes,
            Self::ExcludeDirs(_) => ProfileField::ExcludeDirs,
            Self::OutputFile(_) => ProfileField::OutputFile,
            Self::OutputFileLocally(_) => ProfileField::OutputFileLocally,
            Self::CopyToClipboard(_) => ProfileField::CopyToClipboard,
            Self::SafeMode(_) => ProfileField::SafeMode,
            Self::StoreFilesChosen(_) => ProfileField::StoreFilesChosen,
            Self::LineNumbers(_) => ProfileField::LineNumbers,
            Self::ShowIgnoredInTree(_) => ProfileField::ShowIgnoredInTree,
            Self::ShowDefaultIgnoredInTree(_) => ProfileField::ShowDefaultIgnoredInTree,
            Self::PreviousFiles(_) => ProfileField::PreviousFiles,
        }
    }

    pub fn apply(self, profile: &mut ConfigProfile) {
        match self {
            Self::UseGitIgnore(v) => profile.use_git_ignore = v,
            Self::IncludeFileTypes(v) => profile.include_file_types = v,
            Self::ExcludeFileTypes(v) => profile.exclude_file_types = v,
            Self::ExcludeDirs(v) => profile.exclude_dirs = v,
            Self::OutputFile(v) => profile.output_file = v,
            Self::OutputFileLocally(v) => profile.output_file_locally = v,
            Self::CopyToClipboard(v) => profile.copy_to_clipboard = v,
            Self::SafeMode(v) => profile.safe_mode = v,
            Self::StoreFilesChosen(v) => profile.store_files_chosen = v,
            Self::LineNumbers(v) => profile.line_numbers = v,
            Self::ShowIgnoredInTree(v) => profile.show_ignored_in_tree = v,
            Self::ShowDefaultIgnoredInTree(v) => profile.show_default_ignored_in_tree = v,
            Self::PreviousFiles(v) => profile.previous_files = v,
        }
    }

    /// Builds an edit from a persisted field name and its textual value.
    pub fn parse(field: &str, value: &str) -> Result<Self> {
        let field: ProfileField = field.parse()?;
        let value = value.trim();
        let flag = || parse_bool(field, value);
        Ok(match field {
            ProfileField::UseGitIgnore => Self::UseGitIgnore(flag()?),
            ProfileField::IncludeFileTypes => Self::IncludeFileTypes(value.to_string()),
            ProfileField::ExcludeFileTypes => Self::ExcludeFileTypes(split_list(value)),
            ProfileField::ExcludeDirs => Self::ExcludeDirs(parse_dir_set(value)),
            ProfileField::OutputFile => Self::OutputFile(value.to_string()),
            ProfileField::OutputFileLocally => Self::OutputFileLocally(flag()?),
            ProfileField::CopyToClipboard => Self::CopyToClipboard(flag()?),
            ProfileField::SafeMode => Self::SafeMode(flag()?),
            ProfileField::StoreFilesChosen => Self::StoreFilesChosen(flag()?),
            ProfileField::LineNumbers => Self::LineNumbers(flag()?),
            ProfileField::ShowIgnoredInTree => Self::ShowIgnoredInTree(flag()?),
            ProfileField::ShowDefaultIgnoredInTree => Self::ShowDefaultIgnoredInTree(flag()?),
            ProfileField::PreviousFiles => Self::PreviousFiles(split_list(value)),
        })
    }
}

fn parse_bool(field: ProfileField, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(EngineError::InvalidValue {
            field: field.name().to_string(),
            value: value.to_string(),
        }),
    }
}

/* ============================== List helpers =============================== */

#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parses a comma-joined directory list into normalized relative paths.
#[must_use]
pub fn parse_dir_set(raw: &str) -> BTreeSet<String> {
    split_list(raw)
        .into_iter()
        .map(|s| s.replace('\\', "/").trim_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[must_use]
pub fn join_dir_set(dirs: &BTreeSet<String>) -> String {
    dirs.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

mod comma_list {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dirs: &BTreeSet<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::join_dir_set(dirs))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<String>, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(super::parse_dir_set(&raw))
    }
}
