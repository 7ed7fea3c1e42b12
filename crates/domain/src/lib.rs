//! Rules engine domain for d20 character sheets.
//!
//! - [`value_objects`]: dice expressions, ability scores, typed modifiers and
//!   the random source port
//! - [`aggregates`]: the immutable [`Character`] snapshot
//! - [`rules`]: rule tables, modifier resolution, stat aggregation and
//!   allocation operations
//!
//! Nothing here performs I/O, logs, or owns a random number generator.

pub mod aggregates;
pub mod error;
pub mod ids;
pub mod rules;
pub mod value_objects;

pub use aggregates::{Character, ClassLevel};
pub use error::{DomainError, RuleViolation, ValidationErrors};
pub use ids::{CharacterId, ClassId, FeatId, ItemId, RaceId, SkillId};
pub use rules::{derive_stats, recompute, resolve, DerivedStats, Resolution, RuleTables};
pub use value_objects::{
    Ability, AbilityScores, DiceError, DiceExpression, Modifier, ModifierTarget, RandomSource,
    RandomSourceError, RollResult, ScriptedRandom,
};
