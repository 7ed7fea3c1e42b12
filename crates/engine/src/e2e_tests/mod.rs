//! End-to-end scenarios.
//!
//! These drive the engine the way the CLI does: a composed [`App`] with the
//! SRD tables, characters read from JSON files, and scripted or seeded dice.
//!
//! ```bash
//! cargo test -p sheetforge-engine --lib e2e_tests
//! ```
//!
//! [`App`]: crate::App

mod dice_tests;
mod e2e_helpers;
mod level_up_tests;

pub use e2e_helpers::*;
