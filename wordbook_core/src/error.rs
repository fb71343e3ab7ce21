//! Error types for every notebook operation

use thiserror::Error;

/// Rejected user action. State is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("dictionary '{0}' already exists")]
    ThemeExists(String),
    #[error("dictionary '{0}' does not exist")]
    UnknownTheme(String),
    #[error("dictionary '{0}' is the default and cannot be removed or renamed")]
    ProtectedTheme(String),
    #[error("dictionary name cannot be empty")]
    EmptyThemeName,
    #[error("quiz result '{0}' was already recorded")]
    DuplicateResult(String),
    #[error("need at least {required} words to start a quiz, found {available}")]
    InsufficientPool { available: usize, required: usize },
}

/// The external word lookup failed. Safe to retry.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("nothing to look up")]
    EmptyQuery,
    #[error("lookup returned no content")]
    EmptyResponse,
    #[error("lookup returned unreadable data: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("lookup failed: {0}")]
    Provider(String),
}

/// Backup import aborted as a whole.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("backup file is empty")]
    Empty,
    #[error("backup file has an invalid format: {0}")]
    Malformed(String),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write backup: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to encode dictionary list: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to serialize stored value: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("cannot {action} while in {from} step")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },
    #[error("question was already answered")]
    AlreadyAnswered,
    #[error("question has not been answered yet")]
    NotAnswered,
    #[error("option {0} does not exist")]
    OptionOutOfRange(usize),
    #[error("answer mode does not match question type")]
    WrongAnswerMode,
}

/// Any failure surfaced by [`crate::Notebook`].
#[derive(Debug, Error)]
pub enum NotebookError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
