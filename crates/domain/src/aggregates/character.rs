//! Character aggregate - a player character's rule-relevant choices
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: all fields are encapsulated
//! - **Immutable snapshot**: every change returns a new `Character`; derived
//!   numbers are never stored here, they are recomputed from these inputs
//! - **Valid by construction**: `new()` takes pre-validated types; rule
//!   validity (ranks, pools, prerequisites) is checked by recompute

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, ClassId, FeatId, ItemId, RaceId, SkillId};
use crate::value_objects::{Ability, AbilityScores, CharacterName};

/// Levels taken in one class, in the order they were taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassLevel {
    pub class: ClassId,
    pub level: u32,
}

impl ClassLevel {
    pub fn new(class: impl Into<ClassId>, level: u32) -> Self {
        Self {
            class: class.into(),
            level,
        }
    }
}

/// A character's raw selections
///
/// # Invariants
///
/// - `name` is always non-empty and <= 200 characters (enforced by `CharacterName`)
/// - the first entry of `classes` supplies the character's first level
/// - `hit_point_rolls` is keyed by character level (2 and up)
///
/// # Example
///
/// ```
/// use sheetforge_domain::aggregates::Character;
/// use sheetforge_domain::value_objects::{AbilityScores, CharacterName};
///
/// let name = CharacterName::new("Tordek").expect("valid name");
/// let character = Character::new(name, "dwarf", "fighter", AbilityScores::uniform(12));
///
/// assert_eq!(character.total_level(), 1);
/// assert_eq!(character.with_class_levels("fighter", 4).total_level(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    #[serde(default)]
    id: CharacterId,
    name: CharacterName,
    race: RaceId,
    classes: Vec<ClassLevel>,
    base_abilities: AbilityScores,
    #[serde(default)]
    ability_increases: Vec<Ability>,
    #[serde(default)]
    feats: Vec<FeatId>,
    #[serde(default)]
    equipment: Vec<ItemId>,
    #[serde(default)]
    skill_ranks: BTreeMap<SkillId, u32>,
    #[serde(default)]
    hit_point_rolls: BTreeMap<u32, u32>,
    #[serde(default)]
    experience: u64,
    #[serde(default)]
    damage_taken: u32,
}

impl Character {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Create a level 1 character in `first_class`.
    pub fn new(
        name: CharacterName,
        race: impl Into<RaceId>,
        first_class: impl Into<ClassId>,
        base_abilities: AbilityScores,
    ) -> Self {
        Self {
            id: CharacterId::new(),
            name,
            race: race.into(),
            classes: vec![ClassLevel::new(first_class, 1)],
            base_abilities,
            ability_increases: Vec::new(),
            feats: Vec::new(),
            equipment: Vec::new(),
            skill_ranks: BTreeMap::new(),
            hit_point_rolls: BTreeMap::new(),
            experience: 0,
            damage_taken: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> CharacterId {
        self.id
    }

    pub fn name(&self) -> &CharacterName {
        &self.name
    }

    pub fn race(&self) -> &RaceId {
        &self.race
    }

    pub fn classes(&self) -> &[ClassLevel] {
        &self.classes
    }

    pub fn base_abilities(&self) -> &AbilityScores {
        &self.base_abilities
    }

    pub fn ability_increases(&self) -> &[Ability] {
        &self.ability_increases
    }

    pub fn feats(&self) -> &[FeatId] {
        &self.feats
    }

    pub fn equipment(&self) -> &[ItemId] {
        &self.equipment
    }

    pub fn skill_ranks(&self) -> &BTreeMap<SkillId, u32> {
        &self.skill_ranks
    }

    pub fn ranks_in(&self, skill: &SkillId) -> u32 {
        self.skill_ranks.get(skill).copied().unwrap_or(0)
    }

    pub fn hit_point_rolls(&self) -> &BTreeMap<u32, u32> {
        &self.hit_point_rolls
    }

    pub fn experience(&self) -> u64 {
        self.experience
    }

    pub fn damage_taken(&self) -> u32 {
        self.damage_taken
    }

    /// Sum of all class levels.
    pub fn total_level(&self) -> u32 {
        self.classes
            .iter()
            .fold(0u32, |total, c| total.saturating_add(c.level))
    }

    /// Levels taken in `class` across every entry.
    pub fn class_level(&self, class: &ClassId) -> u32 {
        self.classes
            .iter()
            .filter(|c| &c.class == class)
            .fold(0u32, |total, c| total.saturating_add(c.level))
    }

    // =========================================================================
    // Snapshot builders
    // =========================================================================

    pub fn with_id(mut self, id: CharacterId) -> Self {
        self.id = id;
        self
    }

    /// Set the level of the first entry for `class`, adding the entry if the
    /// character has none.
    pub fn with_class_levels(mut self, class: impl Into<ClassId>, level: u32) -> Self {
        let class = class.into();
        match self.classes.iter_mut().find(|c| c.class == class) {
            Some(entry) => entry.level = level,
            None => self.classes.push(ClassLevel::new(class, level)),
        }
        self
    }

    pub fn with_classes(mut self, classes: Vec<ClassLevel>) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_ability_increase(mut self, ability: Ability) -> Self {
        self.ability_increases.push(ability);
        self
    }

    pub fn with_feat(mut self, feat: impl Into<FeatId>) -> Self {
        self.feats.push(feat.into());
        self
    }

    pub fn with_item(mut self, item: impl Into<ItemId>) -> Self {
        self.equipment.push(item.into());
        self
    }

    pub fn with_skill_ranks(mut self, skill: impl Into<SkillId>, ranks: u32) -> Self {
        let skill = skill.into();
        if ranks == 0 {
            self.skill_ranks.remove(&skill);
        } else {
            self.skill_ranks.insert(skill, ranks);
        }
        self
    }

    pub fn with_hit_point_roll(mut self, character_level: u32, roll: u32) -> Self {
        self.hit_point_rolls.insert(character_level, roll);
        self
    }

    pub fn with_experience(mut self, experience: u64) -> Self {
        self.experience = experience;
        self
    }

    pub fn with_damage_taken(mut self, damage: u32) -> Self {
        self.damage_taken = damage;
        self
    }

    /// Append one level of `class`, extending the last entry when it is the
    /// same class so the level order is preserved.
    pub fn with_next_level(mut self, class: impl Into<ClassId>) -> Self {
        let class = class.into();
        match self.classes.last_mut() {
            Some(last) if last.class == class => last.level = last.level.saturating_add(1),
            _ => self.classes.push(ClassLevel::new(class, 1)),
        }
        self
    }

    /// Remove one copy of `item`; `None` when it was not equipped.
    pub fn without_item(mut self, item: &ItemId) -> Option<Self> {
        let index = self.equipment.iter().position(|i| i == item)?;
        self.equipment.remove(index);
        Some(self)
    }
}
