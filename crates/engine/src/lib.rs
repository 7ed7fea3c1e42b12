//! Sheetforge Engine library.
//!
//! Runs the rules domain with real randomness, rule data from disk, logging
//! and memoization.
//!
//! ## Structure
//!
//! - `infrastructure/` - configuration, random sources and rule-table loading
//! - `use_cases/` - dice and character sheet services
//! - `app` - application composition
//! - `cli` - the `sheetforge` command line

pub mod app;
pub mod cli;
pub mod infrastructure;
pub mod use_cases;

/// End-to-end scenarios across the domain and engine services.
#[cfg(test)]
mod e2e_tests;

pub use app::App;
