//! Use cases - User story orchestration.
//!
//! Each module wraps domain operations for one area with logging, caching
//! and statistics.

pub mod character_sheet;
pub mod dice;

pub use character_sheet::{CacheStats, CharacterSheetService, SheetCache, SheetError};
pub use dice::{DiceService, RollStats};
