//! Character sheet operation errors.

use std::path::PathBuf;

use sheetforge_domain::ValidationErrors;

/// Errors that can occur during character sheet operations.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Character breaks the rules: {0}")]
    Rules(#[from] ValidationErrors),

    #[error("Invalid character JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to read character from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SheetError {
    /// The rule violations, when the error is a rules rejection.
    pub fn violations(&self) -> Option<&ValidationErrors> {
        match self {
            SheetError::Rules(errors) => Some(errors),
            _ => None,
        }
    }
}
