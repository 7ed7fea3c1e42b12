//! Modifier source resolution
//!
//! Turns a character's selections into a flat list of typed modifiers plus the
//! per-level class facts aggregation needs. No stacking happens here, and the
//! output depends only on the character and the tables.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::progression::{
    BabProgression, BonusSpellRule, HitPointPolicy, SaveProgression, MAX_CHARACTER_LEVEL,
};
use super::tables::{
    ClassFeature, FeatPrerequisite, RuleTables, SkillDefinition, Size, Spellcasting,
};
use crate::aggregates::Character;
use crate::error::{RuleViolation, ValidationErrors};
use crate::ids::{ClassId, FeatId, SkillId};
use crate::value_objects::{BonusType, Modifier, ModifierSource, ModifierTarget};

/// One character level and the class it was taken in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedClassLevel {
    pub class: ClassId,
    /// Level within `class` reached at this step (1-based)
    pub class_level: u32,
    /// Overall character level reached at this step (1-based)
    pub character_level: u32,
    pub hit_die: u32,
    pub skill_points_per_level: u32,
}

/// All levels taken in one class, merged across entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedClass {
    pub class: ClassId,
    pub levels: u32,
    pub base_attack: BabProgression,
    pub fortitude: SaveProgression,
    pub reflex: SaveProgression,
    pub will: SaveProgression,
    pub spellcasting: Option<Spellcasting>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFeat {
    pub feat: FeatId,
    pub repeatable: bool,
    pub prerequisites: Vec<FeatPrerequisite>,
}

/// Limits imposed by worn armor and shields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmorLimits {
    /// Lowest max dex bonus among worn items
    pub max_dex_bonus: Option<i32>,
    /// Summed penalty magnitude for armor-affected skills
    pub armor_check_penalty: u32,
}

/// Everything aggregation needs, with rule-table lookups already done
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub modifiers: Vec<Modifier>,
    pub level_sequence: Vec<ResolvedClassLevel>,
    pub classes: Vec<ResolvedClass>,
    pub class_skills: BTreeSet<SkillId>,
    pub skills: BTreeMap<SkillId, SkillDefinition>,
    pub feats: Vec<ResolvedFeat>,
    pub size: Size,
    pub base_speed: u32,
    pub racial_bonus_feats: u32,
    pub class_bonus_feats: u32,
    pub bonus_skill_points_per_level: u32,
    pub armor: ArmorLimits,
    pub bonus_spells: BonusSpellRule,
    pub hit_points: HitPointPolicy,
}

impl Resolution {
    /// Modifiers aimed at `target`.
    pub fn modifiers_for<'a>(
        &'a self,
        target: &'a ModifierTarget,
    ) -> impl Iterator<Item = &'a Modifier> + 'a {
        self.modifiers.iter().filter(move |m| &m.target == target)
    }
}

/// Resolve `character` against `tables`.
///
/// Every unknown id and structural problem is collected before failing, so
/// the caller sees them all at once.
pub fn resolve(character: &Character, tables: &RuleTables) -> Result<Resolution, ValidationErrors> {
    let mut violations = Vec::new();

    let race = tables.race(character.race());
    if race.is_none() {
        violations.push(RuleViolation::UnknownRace(character.race().clone()));
    }

    if character.classes().is_empty() {
        violations.push(RuleViolation::EmptyClassList);
    }
    let mut unknown_classes = BTreeSet::new();
    let mut class_entries = Vec::with_capacity(character.classes().len());
    for entry in character.classes() {
        if entry.level == 0 {
            violations.push(RuleViolation::InvalidClassLevel {
                class: entry.class.clone(),
                level: entry.level,
            });
        }
        match tables.class(&entry.class) {
            Some(definition) => class_entries.push((entry, definition)),
            None => {
                if unknown_classes.insert(entry.class.clone()) {
                    violations.push(RuleViolation::UnknownClass(entry.class.clone()));
                }
            }
        }
    }
    let total_level = character.total_level();
    if total_level > MAX_CHARACTER_LEVEL {
        violations.push(RuleViolation::LevelAboveMaximum {
            level: total_level,
            max: MAX_CHARACTER_LEVEL,
        });
    }

    let mut unknown_feats = BTreeSet::new();
    let mut feats = Vec::with_capacity(character.feats().len());
    for id in character.feats() {
        match tables.feat(id) {
            Some(definition) => feats.push((id, definition)),
            None => {
                if unknown_feats.insert(id.clone()) {
                    violations.push(RuleViolation::UnknownFeat(id.clone()));
                }
            }
        }
    }

    let mut items = Vec::with_capacity(character.equipment().len());
    let mut worn = BTreeMap::new();
    for id in character.equipment() {
        let Some(definition) = tables.item(id) else {
            violations.push(RuleViolation::UnknownItem(id.clone()));
            continue;
        };
        if let Some(slot) = definition.kind.exclusive_slot() {
            if let Some(first) = worn.insert(slot, id) {
                violations.push(RuleViolation::ConflictingEquipment {
                    slot: slot.to_string(),
                    first: first.clone(),
                    second: id.clone(),
                });
            }
        }
        items.push((id, definition));
    }

    for skill in character.skill_ranks().keys() {
        if tables.skill(skill).is_none() {
            violations.push(RuleViolation::UnknownSkill(skill.clone()));
        }
    }

    ValidationErrors::check(violations)?;
    let race = race.ok_or_else(|| RuleViolation::UnknownRace(character.race().clone()))?;

    let mut modifiers = Vec::new();

    // Race
    let race_source = ModifierSource::Race(character.race().clone());
    for (ability, value) in &race.ability_adjustments {
        modifiers.push(Modifier::new(
            ModifierTarget::Ability(*ability),
            *value,
            BonusType::Racial,
            race_source.clone(),
        ));
    }
    let size_modifier = race.size.modifier();
    if size_modifier != 0 {
        for target in [ModifierTarget::ArmorClass, ModifierTarget::AttackRoll] {
            modifiers.push(Modifier::new(
                target,
                size_modifier,
                BonusType::Size,
                race_source.clone(),
            ));
        }
    }
    modifiers.extend(
        race.modifiers
            .iter()
            .map(|grant| grant.with_source(race_source.clone())),
    );

    // Classes, level by level
    let mut level_sequence = Vec::with_capacity(total_level as usize);
    let mut classes: Vec<ResolvedClass> = Vec::new();
    let mut class_skills = BTreeSet::new();
    let mut features_by_class = BTreeMap::new();
    for (entry, definition) in &class_entries {
        let index = match classes.iter().position(|c| c.class == entry.class) {
            Some(index) => index,
            None => {
                classes.push(ResolvedClass {
                    class: entry.class.clone(),
                    levels: 0,
                    base_attack: definition.base_attack,
                    fortitude: definition.fortitude,
                    reflex: definition.reflex,
                    will: definition.will,
                    spellcasting: definition.spellcasting.clone(),
                });
                class_skills.extend(definition.class_skills.iter().cloned());
                features_by_class.insert(entry.class.clone(), &definition.features);
                classes.len() - 1
            }
        };
        for _ in 0..entry.level {
            classes[index].levels += 1;
            level_sequence.push(ResolvedClassLevel {
                class: entry.class.clone(),
                class_level: classes[index].levels,
                character_level: level_sequence.len() as u32 + 1,
                hit_die: definition.hit_die,
                skill_points_per_level: definition.skill_points_per_level,
            });
        }
    }

    let mut class_bonus_feats = 0;
    for class in &classes {
        let Some(features) = features_by_class.get(&class.class) else {
            continue;
        };
        let class_source = ModifierSource::Class(class.class.clone());
        for feature in features.iter().filter(|f| f.level() <= class.levels) {
            match feature {
                ClassFeature::BonusFeat { .. } => class_bonus_feats += 1,
                ClassFeature::Modifier { grant, .. } => {
                    modifiers.push(grant.with_source(class_source.clone()));
                }
            }
        }
    }

    // Feats
    let mut resolved_feats = Vec::with_capacity(feats.len());
    for (id, definition) in feats {
        let source = ModifierSource::Feat(id.clone());
        modifiers.extend(
            definition
                .modifiers
                .iter()
                .map(|grant| grant.with_source(source.clone())),
        );
        resolved_feats.push(ResolvedFeat {
            feat: id.clone(),
            repeatable: definition.repeatable,
            prerequisites: definition.prerequisites.clone(),
        });
    }

    // Equipment
    let mut armor = ArmorLimits::default();
    for (id, definition) in items {
        let source = ModifierSource::Item(id.clone());
        modifiers.extend(
            definition
                .modifiers
                .iter()
                .map(|grant| grant.with_source(source.clone())),
        );
        if let Some(profile) = definition.kind.armor_profile() {
            armor.armor_check_penalty = armor
                .armor_check_penalty
                .saturating_add(profile.armor_check_penalty);
            if let Some(limit) = profile.max_dex_bonus {
                armor.max_dex_bonus = Some(armor.max_dex_bonus.map_or(limit, |m| m.min(limit)));
            }
        }
    }

    Ok(Resolution {
        modifiers,
        level_sequence,
        classes,
        class_skills,
        skills: tables.skills.clone(),
        feats: resolved_feats,
        size: race.size,
        base_speed: race.base_speed,
        racial_bonus_feats: race.bonus_feats,
        class_bonus_feats,
        bonus_skill_points_per_level: race.bonus_skill_points_per_level,
        armor,
        bonus_spells: tables.bonus_spells.clone(),
        hit_points: tables.hit_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::ClassLevel;
    use crate::ids::{ItemId, RaceId};
    use crate::value_objects::{Ability, AbilityScores, CharacterName};

    fn character(race: &str, class: &str) -> Character {
        let name = CharacterName::new("Test").expect("valid name");
        Character::new(name, race, class, AbilityScores::uniform(12))
    }

    #[test]
    fn unknown_ids_are_reported_together() {
        let c = character("lizardfolk", "warlock")
            .with_feat("spell_mastery")
            .with_item("vorpal_sword")
            .with_skill_ranks("fly", 1);

        let errors = resolve(&c, &RuleTables::srd()).expect_err("unknown ids");
        assert_eq!(
            errors.violations(),
            &[
                RuleViolation::UnknownRace(RaceId::new("lizardfolk")),
                RuleViolation::UnknownClass(ClassId::new("warlock")),
                RuleViolation::UnknownFeat(FeatId::new("spell_mastery")),
                RuleViolation::UnknownItem(ItemId::new("vorpal_sword")),
                RuleViolation::UnknownSkill(SkillId::new("fly")),
            ]
        );
    }

    #[test]
    fn structural_problems_are_reported() {
        let c = character("human", "fighter").with_classes(vec![]);
        let errors = resolve(&c, &RuleTables::srd()).expect_err("no classes");
        assert!(errors.contains(&RuleViolation::EmptyClassList));

        let c = character("human", "fighter").with_class_levels("fighter", 21);
        let errors = resolve(&c, &RuleTables::srd()).expect_err("too many levels");
        assert!(errors.contains(&RuleViolation::LevelAboveMaximum { level: 21, max: 20 }));

        let c = character("human", "fighter").with_class_levels("wizard", 0);
        let errors = resolve(&c, &RuleTables::srd()).expect_err("zero level");
        assert!(errors.contains(&RuleViolation::InvalidClassLevel {
            class: ClassId::new("wizard"),
            level: 0,
        }));
    }

    #[test]
    fn level_sequence_follows_entry_order() {
        let c = character("human", "fighter").with_classes(vec![
            ClassLevel::new("fighter", 2),
            ClassLevel::new("wizard", 1),
            ClassLevel::new("fighter", 1),
        ]);
        let resolution = resolve(&c, &RuleTables::srd()).expect("resolves");

        let steps: Vec<(&str, u32, u32)> = resolution
            .level_sequence
            .iter()
            .map(|l| (l.class.as_str(), l.class_level, l.character_level))
            .collect();
        assert_eq!(
            steps,
            vec![
                ("fighter", 1, 1),
                ("fighter", 2, 2),
                ("wizard", 1, 3),
                ("fighter", 3, 4),
            ]
        );
        assert_eq!(resolution.classes.len(), 2);
        assert_eq!(resolution.classes[0].levels, 3);
        assert!(resolution.class_skills.contains(&SkillId::new("spellcraft")));
        assert!(resolution.class_skills.contains(&SkillId::new("climb")));
    }

    #[test]
    fn class_features_unlock_by_class_level() {
        let c = character("human", "fighter").with_class_levels("fighter", 4);
        let resolution = resolve(&c, &RuleTables::srd()).expect("resolves");
        assert_eq!(resolution.class_bonus_feats, 3);
        assert_eq!(resolution.racial_bonus_feats, 1);

        let c = character("human", "barbarian");
        let resolution = resolve(&c, &RuleTables::srd()).expect("resolves");
        let speed: Vec<_> = resolution.modifiers_for(&ModifierTarget::Speed).collect();
        assert_eq!(speed.len(), 1);
        assert_eq!(speed[0].value, 10);
        assert_eq!(speed[0].source, ModifierSource::Class(ClassId::new("barbarian")));
    }

    #[test]
    fn race_emits_ability_and_size_modifiers() {
        let resolution = resolve(&character("halfling", "rogue"), &RuleTables::srd())
            .expect("resolves");

        let dex: Vec<_> = resolution
            .modifiers_for(&ModifierTarget::Ability(Ability::Dexterity))
            .collect();
        assert_eq!(dex.len(), 1);
        assert_eq!(dex[0].value, 2);
        assert_eq!(dex[0].bonus_type, BonusType::Racial);

        let size_ac: Vec<_> = resolution
            .modifiers_for(&ModifierTarget::ArmorClass)
            .filter(|m| m.bonus_type == BonusType::Size)
            .collect();
        assert_eq!(size_ac.len(), 1);
        assert_eq!(size_ac[0].value, 1);
        assert_eq!(resolution.size, Size::Small);
        assert_eq!(resolution.base_speed, 20);
    }

    #[test]
    fn worn_armor_sets_limits() {
        let c = character("human", "fighter")
            .with_item("chain_shirt")
            .with_item("heavy_steel_shield")
            .with_item("ring_of_protection_1");
        let resolution = resolve(&c, &RuleTables::srd()).expect("resolves");

        assert_eq!(resolution.armor.max_dex_bonus, Some(4));
        assert_eq!(resolution.armor.armor_check_penalty, 4);
        assert_eq!(resolution.modifiers_for(&ModifierTarget::ArmorClass).count(), 3);
    }

    #[test]
    fn two_suits_of_armor_conflict() {
        let c = character("human", "fighter")
            .with_item("chain_shirt")
            .with_item("full_plate");
        let errors = resolve(&c, &RuleTables::srd()).expect_err("conflict");
        assert_eq!(
            errors.violations(),
            &[RuleViolation::ConflictingEquipment {
                slot: "armor".to_string(),
                first: ItemId::new("chain_shirt"),
                second: ItemId::new("full_plate"),
            }]
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let c = character("elf", "wizard")
            .with_feat("alertness")
            .with_item("ring_of_protection_1");
        let tables = RuleTables::srd();
        assert_eq!(resolve(&c, &tables), resolve(&c, &tables));
    }
}
