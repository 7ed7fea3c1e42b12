//! Immutable character edits
//!
//! Every operation clones the character, applies one change and recomputes.
//! A rejected change returns the violations and leaves the caller's snapshot
//! untouched.

use super::aggregation::{derive_stats, DerivedStats};
use super::tables::RuleTables;
use crate::aggregates::Character;
use crate::error::{RuleViolation, ValidationErrors};
use crate::ids::{ClassId, FeatId, ItemId, SkillId};
use crate::value_objects::Ability;

/// An accepted change: the new snapshot and its derived stats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub character: Character,
    pub stats: DerivedStats,
}

fn commit(character: Character, tables: &RuleTables) -> Result<Allocation, ValidationErrors> {
    let stats = derive_stats(&character, tables)?;
    Ok(Allocation { character, stats })
}

/// Add `ranks` to `skill`.
pub fn allocate_skill_ranks(
    character: &Character,
    skill: &SkillId,
    ranks: u32,
    tables: &RuleTables,
) -> Result<Allocation, ValidationErrors> {
    let total = character.ranks_in(skill).saturating_add(ranks);
    commit(character.clone().with_skill_ranks(skill.clone(), total), tables)
}

pub fn take_feat(
    character: &Character,
    feat: &FeatId,
    tables: &RuleTables,
) -> Result<Allocation, ValidationErrors> {
    commit(character.clone().with_feat(feat.clone()), tables)
}

pub fn equip_item(
    character: &Character,
    item: &ItemId,
    tables: &RuleTables,
) -> Result<Allocation, ValidationErrors> {
    commit(character.clone().with_item(item.clone()), tables)
}

pub fn unequip_item(
    character: &Character,
    item: &ItemId,
    tables: &RuleTables,
) -> Result<Allocation, ValidationErrors> {
    let updated = character
        .clone()
        .without_item(item)
        .ok_or_else(|| RuleViolation::ItemNotEquipped(item.clone()))?;
    commit(updated, tables)
}

/// Take the next character level in `class`, optionally with its rolled hit
/// die.
pub fn add_class_level(
    character: &Character,
    class: &ClassId,
    hit_point_roll: Option<u32>,
    tables: &RuleTables,
) -> Result<Allocation, ValidationErrors> {
    let updated = character.clone().with_next_level(class.clone());
    let level = updated.total_level();
    let updated = match hit_point_roll {
        Some(roll) => updated.with_hit_point_roll(level, roll),
        None => updated,
    };
    commit(updated, tables)
}

pub fn record_hit_point_roll(
    character: &Character,
    character_level: u32,
    roll: u32,
    tables: &RuleTables,
) -> Result<Allocation, ValidationErrors> {
    commit(character.clone().with_hit_point_roll(character_level, roll), tables)
}

pub fn apply_ability_increase(
    character: &Character,
    ability: Ability,
    tables: &RuleTables,
) -> Result<Allocation, ValidationErrors> {
    commit(character.clone().with_ability_increase(ability), tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{AbilityScores, CharacterName};

    fn fighter() -> Character {
        let name = CharacterName::new("Tordek").expect("valid name");
        Character::new(name, "dwarf", "fighter", AbilityScores::uniform(10))
    }

    #[test]
    fn allocating_ranks_spends_points() {
        let tables = RuleTables::srd();
        let c = fighter();
        let result = allocate_skill_ranks(&c, &SkillId::new("climb"), 3, &tables).expect("fits");
        assert_eq!(result.character.ranks_in(&SkillId::new("climb")), 3);
        assert_eq!(result.stats.skill_points.spent, 3);

        let again = allocate_skill_ranks(&result.character, &SkillId::new("climb"), 1, &tables)
            .expect("fits");
        assert_eq!(again.character.ranks_in(&SkillId::new("climb")), 4);
    }

    #[test]
    fn over_allocation_is_rejected_and_the_snapshot_is_unchanged() {
        let tables = RuleTables::srd();
        let c = fighter()
            .with_skill_ranks("climb", 4)
            .with_skill_ranks("jump", 4);

        let err = allocate_skill_ranks(&c, &SkillId::new("swim"), 1, &tables)
            .expect_err("no points left");
        assert!(err.contains(&RuleViolation::SkillPointsOverspent { spent: 9, total: 8 }));
        assert_eq!(c.ranks_in(&SkillId::new("swim")), 0);
        assert_eq!(
            derive_stats(&c, &tables).expect("still valid").skill_points.available,
            0
        );
    }

    #[test]
    fn take_feat_checks_prerequisites() {
        let tables = RuleTables::srd();
        let c = fighter();
        let err = take_feat(&c, &FeatId::new("power_attack"), &tables).expect_err("str 10");
        assert_eq!(err.len(), 1);

        let result = take_feat(&c, &FeatId::new("improved_initiative"), &tables).expect("ok");
        assert_eq!(result.stats.initiative, 4);
        assert!(c.feats().is_empty());
    }

    #[test]
    fn equip_and_unequip_round_trip_armor_class() {
        let tables = RuleTables::srd();
        let c = fighter();
        let armored = equip_item(&c, &ItemId::new("breastplate"), &tables).expect("ok");
        assert_eq!(armored.stats.armor_class.total, 15);

        let bare = unequip_item(&armored.character, &ItemId::new("breastplate"), &tables)
            .expect("equipped");
        assert_eq!(bare.stats.armor_class.total, 10);
        assert!(bare.character.equipment().is_empty());
    }

    #[test]
    fn second_suit_of_armor_conflicts() {
        let tables = RuleTables::srd();
        let c = fighter().with_item("chain_shirt");
        let err = equip_item(&c, &ItemId::new("full_plate"), &tables).expect_err("two armors");
        assert!(matches!(
            err.violations()[0],
            RuleViolation::ConflictingEquipment { .. }
        ));
    }

    #[test]
    fn unequipping_a_missing_item_fails() {
        let err = unequip_item(&fighter(), &ItemId::new("longsword"), &RuleTables::srd())
            .expect_err("not equipped");
        assert_eq!(
            err.into_violations(),
            vec![RuleViolation::ItemNotEquipped(ItemId::new("longsword"))]
        );
    }

    #[test]
    fn add_class_level_records_the_roll() {
        let tables = RuleTables::srd();
        let c = fighter();
        let second = add_class_level(&c, &ClassId::new("fighter"), Some(7), &tables).expect("ok");
        assert_eq!(second.character.total_level(), 2);
        assert_eq!(second.character.hit_point_rolls().get(&2), Some(&7));
        // dwarf con 12: (10 + 1) + (7 + 1)
        assert_eq!(second.stats.hit_points.max, 19);
        assert_eq!(second.stats.hit_points.levels[1].die_value, 7);
        assert_eq!(
            second.stats.hit_points.levels[1].source,
            crate::rules::HitDieSource::Rolled
        );

        let multi = add_class_level(&second.character, &ClassId::new("rogue"), None, &tables)
            .expect("ok");
        assert_eq!(multi.character.classes().len(), 2);
        assert_eq!(multi.stats.total_level, 3);
    }

    #[test]
    fn add_class_level_rejects_a_bad_roll() {
        let tables = RuleTables::srd();
        let err = add_class_level(&fighter(), &ClassId::new("fighter"), Some(12), &tables)
            .expect_err("d10");
        assert!(err.contains(&RuleViolation::HitPointRollOutOfRange {
            level: 2,
            roll: 12,
            hit_die: 10,
        }));
    }

    #[test]
    fn allocating_far_past_the_cap_is_rejected() {
        let tables = RuleTables::srd();
        let c = fighter();
        let err = allocate_skill_ranks(&c, &SkillId::new("hide"), u32::MAX, &tables)
            .expect_err("over the cap");
        assert!(err.contains(&RuleViolation::SkillRanksOverCap {
            skill: SkillId::new("hide"),
            ranks: u32::MAX,
            cap: 2,
        }));
        assert_eq!(c.ranks_in(&SkillId::new("hide")), 0);
    }

    #[test]
    fn record_hit_point_roll_replaces_the_average() {
        let tables = RuleTables::srd();
        let c = fighter().with_class_levels("fighter", 2);
        let result = record_hit_point_roll(&c, 2, 10, &tables).expect("ok");
        assert_eq!(result.stats.hit_points.max, 22);
    }

    #[test]
    fn ability_increase_needs_level_four() {
        let tables = RuleTables::srd();
        let err = apply_ability_increase(&fighter(), Ability::Strength, &tables)
            .expect_err("level 1");
        assert!(err.contains(&RuleViolation::TooManyAbilityIncreases { taken: 1, allowed: 0 }));

        let c = fighter().with_class_levels("fighter", 4);
        let result = apply_ability_increase(&c, Ability::Strength, &tables).expect("level 4");
        assert_eq!(result.stats.abilities[&Ability::Strength].score, 11);
    }
}
