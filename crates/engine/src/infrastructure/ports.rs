//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Rule data (JSON file, embedded tables, anything else that yields tables)
//! - Randomness, via the domain's `RandomSource`

use std::path::PathBuf;

use sheetforge_domain::{RuleTables, ValidationErrors};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RulesLoadError {
    #[error("Failed to read rule tables from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse rule tables from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Rule tables are inconsistent: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("No rule tables configured: the SRD set is disabled and no rules file is set")]
    NoRules,
}

// =============================================================================
// Ports
// =============================================================================

/// Supplies rule tables to be merged into the active set.
#[cfg_attr(test, mockall::automock)]
pub trait RulesSource: Send + Sync {
    /// Human-readable origin for logs.
    fn describe(&self) -> String;

    fn load(&self) -> Result<RuleTables, RulesLoadError>;
}
