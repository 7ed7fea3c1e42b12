//! Static rule tables: races, classes, feats, items and skills.
//!
//! Every record is a tagged, schema-checked value. Tables are loaded whole
//! (from JSON or [`RuleTables::srd`]) and then cross-checked with
//! [`RuleTables::validate`] before any character is resolved against them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::progression::{
    BabProgression, BonusSpellRule, HitPointPolicy, SaveProgression, MAX_CHARACTER_LEVEL,
};
use crate::error::{RuleViolation, ValidationErrors};
use crate::ids::{ClassId, FeatId, ItemId, RaceId, SkillId};
use crate::value_objects::{
    Ability, BonusType, Modifier, ModifierSource, ModifierTarget,
};

/// Creature size; drives the size modifier to AC and attack rolls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Size {
    Fine,
    Diminutive,
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
    Colossal,
}

impl Size {
    pub fn modifier(&self) -> i32 {
        match self {
            Size::Fine => 8,
            Size::Diminutive => 4,
            Size::Tiny => 2,
            Size::Small => 1,
            Size::Medium => 0,
            Size::Large => -1,
            Size::Huge => -2,
            Size::Gargantuan => -4,
            Size::Colossal => -8,
        }
    }
}

/// A modifier as authored in a table; the source is attached on resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModifierGrant {
    pub target: ModifierTarget,
    pub value: i32,
    pub bonus_type: BonusType,
}

impl ModifierGrant {
    pub fn new(target: ModifierTarget, value: i32, bonus_type: BonusType) -> Self {
        Self {
            target,
            value,
            bonus_type,
        }
    }

    pub fn with_source(&self, source: ModifierSource) -> Modifier {
        Modifier::new(self.target.clone(), self.value, self.bonus_type, source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RaceDefinition {
    pub name: String,
    #[serde(default)]
    pub size: Size,
    pub base_speed: u32,
    #[serde(default)]
    pub ability_adjustments: BTreeMap<Ability, i32>,
    #[serde(default)]
    pub modifiers: Vec<ModifierGrant>,
    #[serde(default)]
    pub bonus_feats: u32,
    #[serde(default)]
    pub bonus_skill_points_per_level: u32,
}

/// Something a class grants once its class level is reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClassFeature {
    BonusFeat { level: u32 },
    Modifier { level: u32, name: String, grant: ModifierGrant },
}

impl ClassFeature {
    pub fn level(&self) -> u32 {
        match self {
            ClassFeature::BonusFeat { level } | ClassFeature::Modifier { level, .. } => *level,
        }
    }
}

/// Spells per day by class level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Spellcasting {
    pub ability: Ability,
    /// One row per class level (index 0 is level 1). A row maps spell level
    /// to base slots; a level missing from the row cannot be cast yet, while
    /// an explicit 0 means only bonus slots are available.
    pub slots_per_day: Vec<BTreeMap<u8, u32>>,
}

impl Spellcasting {
    pub fn row(&self, class_level: u32) -> Option<&BTreeMap<u8, u32>> {
        let index = usize::try_from(class_level).ok()?.checked_sub(1)?;
        self.slots_per_day.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassDefinition {
    pub name: String,
    pub hit_die: u32,
    pub base_attack: BabProgression,
    pub fortitude: SaveProgression,
    pub reflex: SaveProgression,
    pub will: SaveProgression,
    pub skill_points_per_level: u32,
    #[serde(default)]
    pub class_skills: BTreeSet<SkillId>,
    #[serde(default)]
    pub features: Vec<ClassFeature>,
    #[serde(default)]
    pub spellcasting: Option<Spellcasting>,
}

/// A requirement checked against the recomputed character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FeatPrerequisite {
    Ability { ability: Ability, minimum: i32 },
    BaseAttackBonus { minimum: i32 },
    Feat { feat: FeatId },
    CharacterLevel { minimum: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FeatDefinition {
    pub name: String,
    #[serde(default)]
    pub modifiers: Vec<ModifierGrant>,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub prerequisites: Vec<FeatPrerequisite>,
}

/// Limits a worn armor or shield puts on its wearer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArmorProfile {
    #[serde(default)]
    pub max_dex_bonus: Option<i32>,
    /// Penalty magnitude applied to armor-affected skills
    #[serde(default)]
    pub armor_check_penalty: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ItemKind {
    Weapon,
    Armor(ArmorProfile),
    Shield(ArmorProfile),
    Wondrous,
}

impl ItemKind {
    /// Equipment slot that holds at most one item, if any.
    pub fn exclusive_slot(&self) -> Option<&'static str> {
        match self {
            ItemKind::Armor(_) => Some("armor"),
            ItemKind::Shield(_) => Some("shield"),
            ItemKind::Weapon | ItemKind::Wondrous => None,
        }
    }

    pub fn armor_profile(&self) -> Option<&ArmorProfile> {
        match self {
            ItemKind::Armor(profile) | ItemKind::Shield(profile) => Some(profile),
            ItemKind::Weapon | ItemKind::Wondrous => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ItemDefinition {
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub modifiers: Vec<ModifierGrant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SkillDefinition {
    pub name: String,
    pub key_ability: Ability,
    #[serde(default)]
    pub trained_only: bool,
    #[serde(default)]
    pub armor_check_penalty: bool,
    /// Skills whose ranks grant a synergy bonus to this one
    #[serde(default)]
    pub synergy_sources: Vec<SkillId>,
}

/// The complete rule data a character is resolved against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleTables {
    #[serde(default)]
    pub races: BTreeMap<RaceId, RaceDefinition>,
    #[serde(default)]
    pub classes: BTreeMap<ClassId, ClassDefinition>,
    #[serde(default)]
    pub feats: BTreeMap<FeatId, FeatDefinition>,
    #[serde(default)]
    pub items: BTreeMap<ItemId, ItemDefinition>,
    #[serde(default)]
    pub skills: BTreeMap<SkillId, SkillDefinition>,
    #[serde(default)]
    pub bonus_spells: BonusSpellRule,
    #[serde(default)]
    pub hit_points: HitPointPolicy,
}

impl RuleTables {
    pub fn race(&self, id: &RaceId) -> Option<&RaceDefinition> {
        self.races.get(id)
    }

    pub fn class(&self, id: &ClassId) -> Option<&ClassDefinition> {
        self.classes.get(id)
    }

    pub fn feat(&self, id: &FeatId) -> Option<&FeatDefinition> {
        self.feats.get(id)
    }

    pub fn item(&self, id: &ItemId) -> Option<&ItemDefinition> {
        self.items.get(id)
    }

    pub fn skill(&self, id: &SkillId) -> Option<&SkillDefinition> {
        self.skills.get(id)
    }

    /// Overlay `other` onto these tables; entries with the same id are
    /// replaced and the configuration rules are taken from `other`.
    pub fn merge(&mut self, other: RuleTables) {
        self.races.extend(other.races);
        self.classes.extend(other.classes);
        self.feats.extend(other.feats);
        self.items.extend(other.items);
        self.skills.extend(other.skills);
        self.bonus_spells = other.bonus_spells;
        self.hit_points = other.hit_points;
    }

    /// Check that every cross-reference points at a known entry and that
    /// numeric data is usable.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut violations = Vec::new();

        for (id, race) in &self.races {
            let entry = format!("race:{id}");
            self.check_grants(&entry, &race.modifiers, &mut violations);
        }

        for (id, class) in &self.classes {
            let entry = format!("class:{id}");
            if class.hit_die < 2 {
                violations.push(invalid(&entry, "hit die must be at least 2"));
            }
            for skill in &class.class_skills {
                if !self.skills.contains_key(skill) {
                    violations.push(invalid(&entry, format!("unknown class skill {skill}")));
                }
            }
            for feature in &class.features {
                if feature.level() == 0 || feature.level() > MAX_CHARACTER_LEVEL {
                    violations.push(invalid(
                        &entry,
                        format!("feature level {} is out of range", feature.level()),
                    ));
                }
                if let ClassFeature::Modifier { grant, .. } = feature {
                    self.check_grants(&entry, std::slice::from_ref(grant), &mut violations);
                }
            }
            if let Some(casting) = &class.spellcasting {
                if casting.slots_per_day.len() != MAX_CHARACTER_LEVEL as usize {
                    violations.push(invalid(
                        &entry,
                        format!(
                            "spell table has {} rows, expected {}",
                            casting.slots_per_day.len(),
                            MAX_CHARACTER_LEVEL
                        ),
                    ));
                }
                if casting.slots_per_day.iter().flat_map(|row| row.keys()).any(|l| *l > 9) {
                    violations.push(invalid(&entry, "spell levels run from 0 to 9"));
                }
            }
        }

        for (id, feat) in &self.feats {
            let entry = format!("feat:{id}");
            self.check_grants(&entry, &feat.modifiers, &mut violations);
            for prerequisite in &feat.prerequisites {
                if let FeatPrerequisite::Feat { feat: required } = prerequisite {
                    if !self.feats.contains_key(required) {
                        violations.push(invalid(
                            &entry,
                            format!("prerequisite feat {required} is unknown"),
                        ));
                    }
                }
            }
        }

        for (id, item) in &self.items {
            let entry = format!("item:{id}");
            self.check_grants(&entry, &item.modifiers, &mut violations);
            if let Some(max_dex) = item.kind.armor_profile().and_then(|p| p.max_dex_bonus) {
                if max_dex < 0 {
                    violations.push(invalid(&entry, "max dex bonus cannot be negative"));
                }
            }
        }

        for (id, skill) in &self.skills {
            let entry = format!("skill:{id}");
            for source in &skill.synergy_sources {
                if !self.skills.contains_key(source) {
                    violations.push(invalid(&entry, format!("unknown synergy source {source}")));
                }
            }
        }

        ValidationErrors::check(violations)
    }

    fn check_grants(
        &self,
        entry: &str,
        grants: &[ModifierGrant],
        violations: &mut Vec<RuleViolation>,
    ) {
        for grant in grants {
            match &grant.target {
                ModifierTarget::Skill(skill) if !self.skills.contains_key(skill) => {
                    let message = format!("modifier targets unknown skill {skill}");
                    violations.push(invalid(entry, message));
                }
                ModifierTarget::SpellSlots(level) if *level > 9 => {
                    violations.push(invalid(entry, format!("spell level {level} is out of range")));
                }
                _ => {}
            }
        }
    }
}

fn invalid(entry: &str, reason: impl Into<String>) -> RuleViolation {
    RuleViolation::InvalidRuleData {
        entry: entry.to_string(),
        reason: reason.into(),
    }
}
