//! E2E tests for building a character one decision at a time.

use sheetforge_domain::value_objects::{Ability, AbilityScores};
use sheetforge_domain::{ClassId, FeatId, ItemId, RuleViolation, SkillId};

use super::{create_test_character, E2ETestContext};

#[test]
fn test_build_a_multiclass_character() {
    let ctx = E2ETestContext::srd();
    let sheets = &ctx.app.sheets;
    let abilities = AbilityScores::new(14, 14, 12, 12, 10, 8);
    let start = create_test_character("Vadania", "elf", "rogue", 1, abilities);

    let step = sheets
        .allocate_skill_ranks(&start, &SkillId::new("tumble"), 4)
        .expect("class skill");
    let step = sheets
        .take_feat(&step.character, &FeatId::new("dodge"))
        .expect("dex 16");
    let step = sheets
        .equip_item(&step.character, &ItemId::new("leather_armor"))
        .expect("light armor");
    let step = sheets
        .add_class_level(&step.character, &ClassId::new("fighter"), Some(9))
        .expect("second level");
    let step = sheets
        .allocate_skill_ranks(&step.character, &SkillId::new("tumble"), 1)
        .expect("cap 5");

    let stats = &step.stats;
    assert_eq!(stats.total_level, 2);
    // rogue 0 + fighter 1
    assert_eq!(stats.attacks.base_attack_bonus, 1);
    // rogue d6 max + fighter roll 9, con 10 after the elf penalty
    assert_eq!(stats.hit_points.max, 15);
    // 10 + dex 3 + armor 2 + dodge 1
    assert_eq!(stats.armor_class.total, 16);
    assert_eq!(stats.armor_class.flat_footed, 12);
    // 5 ranks: jump and balance get synergy
    assert_eq!(stats.skills[&SkillId::new("jump")].synergy, 2);
    assert_eq!(stats.skills[&SkillId::new("balance")].synergy, 2);
}

#[test]
fn test_rejected_step_keeps_the_last_good_snapshot() {
    let ctx = E2ETestContext::srd();
    let sheets = &ctx.app.sheets;
    let abilities = AbilityScores::uniform(12);
    let start = create_test_character("Krusk", "half_orc", "barbarian", 1, abilities);

    let good = sheets
        .take_feat(&start, &FeatId::new("toughness"))
        .expect("one slot");
    let err = sheets
        .take_feat(&good.character, &FeatId::new("great_fortitude"))
        .expect_err("no slots left");
    assert!(err
        .violations()
        .expect("rules error")
        .contains(&RuleViolation::FeatSlotsOverspent { spent: 2, total: 1 }));

    assert_eq!(good.character.feats(), &[FeatId::new("toughness")]);
    assert_eq!(sheets.compute(&good.character).expect("still valid"), good.stats);
}

#[test]
fn test_fourth_level_ability_increase() {
    let ctx = E2ETestContext::srd();
    let sheets = &ctx.app.sheets;
    let abilities = AbilityScores::uniform(10).with(Ability::Intelligence, 15);
    let character = create_test_character("Ember", "human", "wizard", 3, abilities);

    let leveled = sheets
        .add_class_level(&character, &ClassId::new("wizard"), None)
        .expect("level 4");
    let raised = sheets
        .apply_ability_increase(&leveled.character, Ability::Intelligence)
        .expect("earned at 4");

    assert_eq!(raised.stats.abilities[&Ability::Intelligence].score, 16);
    // int +3: one bonus first-level and one bonus second-level spell
    let wizard = &raised.stats.spell_slots[0];
    assert_eq!(wizard.levels[&1].total, 3 + 1);
    assert_eq!(wizard.levels[&2].total, 2 + 1);
}
