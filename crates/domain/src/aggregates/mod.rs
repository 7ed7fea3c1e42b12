//! Aggregate roots - domain objects that own their related data
//!
//! | Aggregate | Owns |
//! |-----------|------|
//! | [`Character`] | race, class levels, abilities, feats, equipment, skill ranks, HP rolls |
//!
//! Aggregates are immutable snapshots. Edits go through the builder methods
//! or the operations in [`crate::rules::allocation`], which return a new
//! snapshot instead of mutating in place.

mod character;

pub use character::{Character, ClassLevel};
