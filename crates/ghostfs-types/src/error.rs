use thiserror::Error;

/// Errors surfaced by the ghost file store.
///
/// Drivers map their native failures (io, sqlx) into these variants at the
/// boundary; the service layer propagates them unmodified.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GhostError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("driver error: {0}")]
    Driver(String),

    #[error(
        "disk is not caught up with the database ledger: {pending} pending revision(s) \
         ({missing_on_disk} missing from the disk marker, {unknown_on_disk} unknown to the database)"
    )]
    SyncPrecondition {
        pending: usize,
        missing_on_disk: usize,
        unknown_on_disk: usize,
    },

    #[error("invalid JSON in '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("the size of '{path}' ({size} bytes) is over the {limit} bytes limit")]
    FileTooLarge { path: String, size: u64, limit: u64 },

    #[error("invalid bot id '{0}'")]
    InvalidBotId(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl GhostError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
