//! Typed modifiers and the stacking rule that combines them
//!
//! A [`Modifier`] is a signed adjustment to one [`ModifierTarget`], tagged with
//! a [`BonusType`] and the [`ModifierSource`] that granted it. Modifiers are
//! never edited; they are regenerated from the character's selections.
//!
//! Stacking:
//! - `untyped` and `circumstance` modifiers always add up
//! - for every other type only the largest magnitude applies; on a magnitude
//!   tie the positive value wins
//! - totals of different types add up
//!
//! The result does not depend on the order modifiers arrive in.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::abilities::Ability;
use crate::ids::{ClassId, FeatId, ItemId, RaceId, SkillId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveKind {
    Fortitude,
    Reflex,
    Will,
}

impl SaveKind {
    pub const ALL: [SaveKind; 3] = [SaveKind::Fortitude, SaveKind::Reflex, SaveKind::Will];

    /// Ability whose modifier feeds this save.
    pub fn ability(&self) -> Ability {
        match self {
            SaveKind::Fortitude => Ability::Constitution,
            SaveKind::Reflex => Ability::Dexterity,
            SaveKind::Will => Ability::Wisdom,
        }
    }
}

/// What a modifier adjusts
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "camelCase")]
pub enum ModifierTarget {
    Ability(Ability),
    Save(SaveKind),
    ArmorClass,
    Skill(SkillId),
    Speed,
    HitPoints,
    /// Spells per day of the given spell level
    SpellSlots(u8),
    AttackRoll,
    DamageRoll,
    Initiative,
}

/// Bonus type governing how modifiers stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusType {
    Enhancement,
    Racial,
    Size,
    Dodge,
    Deflection,
    NaturalArmor,
    Armor,
    Shield,
    Untyped,
    Circumstance,
}

impl BonusType {
    /// Whether several modifiers of this type all apply.
    pub fn always_stacks(&self) -> bool {
        matches!(self, BonusType::Untyped | BonusType::Circumstance)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BonusType::Enhancement => "enhancement",
            BonusType::Racial => "racial",
            BonusType::Size => "size",
            BonusType::Dodge => "dodge",
            BonusType::Deflection => "deflection",
            BonusType::NaturalArmor => "natural_armor",
            BonusType::Armor => "armor",
            BonusType::Shield => "shield",
            BonusType::Untyped => "untyped",
            BonusType::Circumstance => "circumstance",
        }
    }
}

/// Where a modifier came from, for itemized display
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum ModifierSource {
    Race(RaceId),
    Class(ClassId),
    Feat(FeatId),
    Item(ItemId),
}

impl fmt::Display for ModifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierSource::Race(id) => write!(f, "race:{id}"),
            ModifierSource::Class(id) => write!(f, "class:{id}"),
            ModifierSource::Feat(id) => write!(f, "feat:{id}"),
            ModifierSource::Item(id) => write!(f, "item:{id}"),
        }
    }
}

/// A signed, typed adjustment to one target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifier {
    pub target: ModifierTarget,
    pub value: i32,
    pub bonus_type: BonusType,
    pub source: ModifierSource,
}

impl Modifier {
    pub fn new(
        target: ModifierTarget,
        value: i32,
        bonus_type: BonusType,
        source: ModifierSource,
    ) -> Self {
        Self {
            target,
            value,
            bonus_type,
            source,
        }
    }
}

/// The modifiers that survived stacking for one target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackedModifiers {
    applied: Vec<Modifier>,
}

impl StackedModifiers {
    pub fn applied(&self) -> &[Modifier] {
        &self.applied
    }

    /// Sum of the applied values, saturating at the `i32` bounds.
    pub fn total(&self) -> i32 {
        saturating_total(self.applied.iter())
    }

    pub fn total_for(&self, bonus_type: BonusType) -> i32 {
        saturating_total(self.applied.iter().filter(|m| m.bonus_type == bonus_type))
    }

    /// Total ignoring the listed bonus types.
    pub fn total_excluding(&self, excluded: &[BonusType]) -> i32 {
        saturating_total(
            self.applied
                .iter()
                .filter(|m| !excluded.contains(&m.bonus_type)),
        )
    }

    /// Per-type totals, in bonus type order.
    pub fn by_type(&self) -> BTreeMap<BonusType, i32> {
        let mut totals = BTreeMap::new();
        for m in &self.applied {
            let total: &mut i32 = totals.entry(m.bonus_type).or_insert(0);
            *total = total.saturating_add(m.value);
        }
        totals
    }
}

fn saturating_total<'a>(modifiers: impl Iterator<Item = &'a Modifier>) -> i32 {
    modifiers.fold(0i32, |total, m| total.saturating_add(m.value))
}

/// Stack `modifiers` under the bonus-type rules.
///
/// Callers pass the modifiers of a single target.
pub fn stack_modifiers<'a>(modifiers: impl IntoIterator<Item = &'a Modifier>) -> StackedModifiers {
    let mut by_type: BTreeMap<BonusType, Vec<&Modifier>> = BTreeMap::new();
    for m in modifiers {
        by_type.entry(m.bonus_type).or_default().push(m);
    }

    let mut applied = Vec::new();
    for (bonus_type, mut group) in by_type {
        if bonus_type.always_stacks() {
            group.sort_by(|a, b| a.source.cmp(&b.source).then(b.value.cmp(&a.value)));
            applied.extend(group.into_iter().cloned());
        } else if let Some(best) = group.into_iter().max_by(|a, b| stronger(a, b)) {
            applied.push(best.clone());
        }
    }
    StackedModifiers { applied }
}

/// Stack the modifiers in `modifiers` that target `target`.
pub fn stack_for_target(modifiers: &[Modifier], target: &ModifierTarget) -> StackedModifiers {
    stack_modifiers(modifiers.iter().filter(|m| &m.target == target))
}

// Larger magnitude wins, then the positive value, then the lower source so
// equal modifiers pick the same winner regardless of order.
fn stronger(a: &Modifier, b: &Modifier) -> Ordering {
    a.value
        .unsigned_abs()
        .cmp(&b.value.unsigned_abs())
        .then(a.value.cmp(&b.value))
        .then(b.source.cmp(&a.source))
}
