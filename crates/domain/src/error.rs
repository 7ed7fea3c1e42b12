//! Unified error types for the domain layer
//!
//! Dice problems surface as [`DiceError`]; rules problems are collected into
//! [`ValidationErrors`] so a caller sees every violation of a single pass at
//! once. [`DomainError`] unifies both for callers that do not care which.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::ids::{ClassId, FeatId, ItemId, RaceId, SkillId};
use crate::value_objects::{Ability, DiceError};

/// A single broken rule found while resolving or recomputing a character.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "violation", content = "detail", rename_all = "camelCase")]
pub enum RuleViolation {
    #[error("Unknown race: {0}")]
    UnknownRace(RaceId),

    #[error("Unknown class: {0}")]
    UnknownClass(ClassId),

    #[error("Unknown feat: {0}")]
    UnknownFeat(FeatId),

    #[error("Unknown item: {0}")]
    UnknownItem(ItemId),

    #[error("Unknown skill: {0}")]
    UnknownSkill(SkillId),

    #[error("Character has no class levels")]
    EmptyClassList,

    #[error("Class {class} has invalid level {level}")]
    InvalidClassLevel { class: ClassId, level: u32 },

    #[error("Total character level {level} exceeds the maximum of {max}")]
    LevelAboveMaximum { level: u32, max: u32 },

    #[error("{ability} score {score} is below the minimum of 1")]
    AbilityScoreBelowMinimum { ability: Ability, score: i32 },

    #[error("{taken} ability increases taken but only {allowed} allowed")]
    TooManyAbilityIncreases { taken: u32, allowed: u32 },

    #[error("Skill {skill} has {ranks} ranks, cap is {cap}")]
    SkillRanksOverCap { skill: SkillId, ranks: u32, cap: u32 },

    #[error("Skill points overspent: {spent} of {total}")]
    SkillPointsOverspent { spent: u32, total: u32 },

    #[error("Feat slots overspent: {spent} of {total}")]
    FeatSlotsOverspent { spent: u32, total: u32 },

    #[error("Feat {0} can only be taken once")]
    DuplicateFeat(FeatId),

    #[error("Feat {feat} requires {requirement}")]
    FeatPrerequisiteNotMet { feat: FeatId, requirement: String },

    #[error("Hit point roll {roll} at level {level} is outside 1..={hit_die}")]
    HitPointRollOutOfRange { level: u32, roll: u32, hit_die: u32 },

    #[error("No hit point roll can be recorded for level {level}")]
    UnexpectedHitPointRoll { level: u32 },

    #[error("Cannot wear {second} together with {first} in the {slot} slot")]
    ConflictingEquipment {
        slot: String,
        first: ItemId,
        second: ItemId,
    },

    #[error("Item {0} is not equipped")]
    ItemNotEquipped(ItemId),

    #[error("Invalid rule data for {entry}: {reason}")]
    InvalidRuleData { entry: String, reason: String },
}

/// Every violation found in one resolve/recompute pass.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<RuleViolation>);

impl ValidationErrors {
    pub fn new(violations: Vec<RuleViolation>) -> Self {
        Self(violations)
    }

    /// `Ok(())` when nothing was collected, otherwise the collected violations.
    pub fn check(violations: Vec<RuleViolation>) -> Result<(), Self> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self(violations))
        }
    }

    pub fn violations(&self) -> &[RuleViolation] {
        &self.0
    }

    pub fn into_violations(self) -> Vec<RuleViolation> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, violation: &RuleViolation) -> bool {
        self.0.contains(violation)
    }
}

impl From<RuleViolation> for ValidationErrors {
    fn from(violation: RuleViolation) -> Self {
        Self(vec![violation])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rule violation(s)", self.0.len())?;
        for (i, violation) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{violation}")?;
        }
        Ok(())
    }
}

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Dice expression could not be parsed or evaluated
    #[error(transparent)]
    Dice(#[from] DiceError),

    /// Character breaks one or more rules
    #[error(transparent)]
    Rules(#[from] ValidationErrors),
}

impl DomainError {
    /// Creates a validation error for value objects that reject their input.
    ///
    /// # Example
    /// ```ignore
    /// if name.is_empty() {
    ///     return Err(DomainError::validation("Character name cannot be empty"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
