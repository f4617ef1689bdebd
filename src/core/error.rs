use std::{io, path::PathBuf};

use thiserror::Error;

use crate::core::ProfileMode;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Tree scan or profile read failed; prior state is retained.
    #[error("I/O failure at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Profile write failed; unsaved edits are kept for a retry.
    #[error("failed to persist {mode} profile: {source}")]
    Persistence {
        mode: ProfileMode,
        #[source]
        source: io::Error,
    },

    /// Mode switch attempted while the in-edit profile is dirty.
    #[error("cannot switch to the {requested} profile with unsaved edits; save or reset first")]
    Blocked { requested: ProfileMode },

    #[error("no project directory is open")]
    NoProject,

    #[error("unknown profile field `{0}`")]
    UnknownField(String),

    #[error("invalid value `{value}` for profile field `{field}`")]
    InvalidValue { field: String, value: String },
}

impl EngineError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
