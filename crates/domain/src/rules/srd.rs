//! Built-in subset of the open d20 reference tables.

use std::collections::{BTreeMap, BTreeSet};

use super::progression::{BabProgression, SaveProgression};
use super::tables::{
    ArmorProfile, ClassDefinition, ClassFeature, FeatDefinition, FeatPrerequisite, ItemDefinition,
    ItemKind, ModifierGrant, RaceDefinition, RuleTables, SkillDefinition, Size, Spellcasting,
};
use crate::ids::{ClassId, FeatId, ItemId, RaceId, SkillId};
use crate::value_objects::{Ability, BonusType, ModifierTarget, SaveKind};

use Ability::{Charisma, Constitution, Dexterity, Intelligence, Strength, Wisdom};
use BabProgression as Bab;
use SaveProgression::{Good, Poor};

// Spells per day, one row per class level starting at spell level 0.
const WIZARD_SLOTS: [&[u32]; 20] = [
    &[3, 1],
    &[4, 2],
    &[4, 2, 1],
    &[4, 3, 2],
    &[4, 3, 2, 1],
    &[4, 3, 3, 2],
    &[4, 4, 3, 2, 1],
    &[4, 4, 3, 3, 2],
    &[4, 4, 4, 3, 2, 1],
    &[4, 4, 4, 3, 3, 2],
    &[4, 4, 4, 4, 3, 2, 1],
    &[4, 4, 4, 4, 3, 3, 2],
    &[4, 4, 4, 4, 4, 3, 2, 1],
    &[4, 4, 4, 4, 4, 3, 3, 2],
    &[4, 4, 4, 4, 4, 4, 3, 2, 1],
    &[4, 4, 4, 4, 4, 4, 3, 3, 2],
    &[4, 4, 4, 4, 4, 4, 4, 3, 2, 1],
    &[4, 4, 4, 4, 4, 4, 4, 3, 3, 2],
    &[4, 4, 4, 4, 4, 4, 4, 4, 3, 3],
    &[4, 4, 4, 4, 4, 4, 4, 4, 4, 4],
];

const CLERIC_SLOTS: [&[u32]; 20] = [
    &[3, 1],
    &[4, 2],
    &[4, 2, 1],
    &[5, 3, 2],
    &[5, 3, 2, 1],
    &[5, 3, 3, 2],
    &[6, 4, 3, 2, 1],
    &[6, 4, 3, 3, 2],
    &[6, 4, 4, 3, 2, 1],
    &[6, 4, 4, 3, 3, 2],
    &[6, 5, 4, 4, 3, 2, 1],
    &[6, 5, 4, 4, 3, 3, 2],
    &[6, 5, 5, 4, 4, 3, 2, 1],
    &[6, 5, 5, 4, 4, 3, 3, 2],
    &[6, 5, 5, 5, 4, 4, 3, 2, 1],
    &[6, 5, 5, 5, 4, 4, 3, 3, 2],
    &[6, 5, 5, 5, 5, 4, 4, 3, 2, 1],
    &[6, 5, 5, 5, 5, 4, 4, 3, 3, 2],
    &[6, 5, 5, 5, 5, 5, 4, 4, 3, 3],
    &[6, 5, 5, 5, 5, 5, 4, 4, 4, 4],
];

// Paladins start at spell level 1 and get nothing before class level 4.
const PALADIN_SLOTS: [&[u32]; 20] = [
    &[],
    &[],
    &[],
    &[0],
    &[0],
    &[1],
    &[1],
    &[1, 0],
    &[1, 0],
    &[1, 1],
    &[1, 1, 0],
    &[1, 1, 1],
    &[1, 1, 1],
    &[2, 1, 1, 0],
    &[2, 1, 1, 1],
    &[2, 2, 1, 1],
    &[2, 2, 2, 1],
    &[3, 2, 2, 1],
    &[3, 3, 3, 2],
    &[3, 3, 3, 3],
];

const SKILLS: &[(&str, &str, Ability, bool, bool, &[&str])] = &[
    // (id, name, key ability, trained only, armor check penalty, synergy sources)
    ("balance", "Balance", Dexterity, false, true, &["tumble"]),
    ("bluff", "Bluff", Charisma, false, false, &[]),
    ("climb", "Climb", Strength, false, true, &[]),
    ("concentration", "Concentration", Constitution, false, false, &[]),
    ("diplomacy", "Diplomacy", Charisma, false, false, &["bluff", "sense_motive"]),
    ("handle_animal", "Handle Animal", Charisma, true, false, &[]),
    ("heal", "Heal", Wisdom, false, false, &[]),
    ("hide", "Hide", Dexterity, false, true, &[]),
    ("intimidate", "Intimidate", Charisma, false, false, &["bluff"]),
    ("jump", "Jump", Strength, false, true, &["tumble"]),
    ("knowledge_arcana", "Knowledge (Arcana)", Intelligence, true, false, &[]),
    ("knowledge_religion", "Knowledge (Religion)", Intelligence, true, false, &[]),
    ("listen", "Listen", Wisdom, false, false, &[]),
    ("move_silently", "Move Silently", Dexterity, false, true, &[]),
    ("open_lock", "Open Lock", Dexterity, true, false, &[]),
    ("ride", "Ride", Dexterity, false, false, &["handle_animal"]),
    ("search", "Search", Intelligence, false, false, &[]),
    ("sense_motive", "Sense Motive", Wisdom, false, false, &[]),
    ("spellcraft", "Spellcraft", Intelligence, true, false, &["knowledge_arcana"]),
    ("spot", "Spot", Wisdom, false, false, &[]),
    ("swim", "Swim", Strength, false, true, &[]),
    ("tumble", "Tumble", Dexterity, true, true, &["jump"]),
    ("use_magic_device", "Use Magic Device", Charisma, true, false, &[]),
];

impl RuleTables {
    /// Races, classes, feats, items and skills from the d20 reference tables.
    pub fn srd() -> Self {
        Self {
            races: races(),
            classes: classes(),
            feats: feats(),
            items: items(),
            skills: SKILLS
                .iter()
                .map(|&(id, name, key_ability, trained_only, armor_check_penalty, synergy)| {
                    (
                        SkillId::new(id),
                        SkillDefinition {
                            name: name.to_string(),
                            key_ability,
                            trained_only,
                            armor_check_penalty,
                            synergy_sources: synergy.iter().map(|s| SkillId::new(*s)).collect(),
                        },
                    )
                })
                .collect(),
            ..Self::default()
        }
    }
}

fn grant(target: ModifierTarget, value: i32, bonus_type: BonusType) -> ModifierGrant {
    ModifierGrant::new(target, value, bonus_type)
}

fn skill_grant(skill: &str, value: i32, bonus_type: BonusType) -> ModifierGrant {
    grant(ModifierTarget::Skill(SkillId::new(skill)), value, bonus_type)
}

fn skill_set(ids: &[&str]) -> BTreeSet<SkillId> {
    ids.iter().map(|id| SkillId::new(*id)).collect()
}

fn slot_rows(first_spell_level: u8, rows: &[&[u32]]) -> Vec<BTreeMap<u8, u32>> {
    rows.iter()
        .map(|row| {
            (first_spell_level..)
                .zip(row.iter().copied())
                .collect::<BTreeMap<u8, u32>>()
        })
        .collect()
}

fn race(
    name: &str,
    size: Size,
    base_speed: u32,
    adjustments: &[(Ability, i32)],
    modifiers: Vec<ModifierGrant>,
) -> RaceDefinition {
    RaceDefinition {
        name: name.to_string(),
        size,
        base_speed,
        ability_adjustments: adjustments.iter().copied().collect(),
        modifiers,
        bonus_feats: 0,
        bonus_skill_points_per_level: 0,
    }
}

fn races() -> BTreeMap<RaceId, RaceDefinition> {
    let racial = BonusType::Racial;
    let mut human = race("Human", Size::Medium, 30, &[], vec![]);
    human.bonus_feats = 1;
    human.bonus_skill_points_per_level = 1;

    let halfling_saves = SaveKind::ALL
        .into_iter()
        .map(|save| grant(ModifierTarget::Save(save), 1, racial));

    BTreeMap::from([
        (RaceId::new("human"), human),
        (
            RaceId::new("dwarf"),
            race(
                "Dwarf",
                Size::Medium,
                20,
                &[(Constitution, 2), (Charisma, -2)],
                vec![skill_grant("search", 2, racial)],
            ),
        ),
        (
            RaceId::new("elf"),
            race(
                "Elf",
                Size::Medium,
                30,
                &[(Dexterity, 2), (Constitution, -2)],
                vec![
                    skill_grant("listen", 2, racial),
                    skill_grant("search", 2, racial),
                    skill_grant("spot", 2, racial),
                ],
            ),
        ),
        (
            RaceId::new("gnome"),
            race(
                "Gnome",
                Size::Small,
                20,
                &[(Constitution, 2), (Strength, -2)],
                vec![skill_grant("listen", 2, racial)],
            ),
        ),
        (
            RaceId::new("halfling"),
            race(
                "Halfling",
                Size::Small,
                20,
                &[(Dexterity, 2), (Strength, -2)],
                [
                    skill_grant("climb", 2, racial),
                    skill_grant("jump", 2, racial),
                    skill_grant("listen", 2, racial),
                    skill_grant("move_silently", 2, racial),
                ]
                .into_iter()
                .chain(halfling_saves)
                .collect(),
            ),
        ),
        (
            RaceId::new("half_orc"),
            race(
                "Half-Orc",
                Size::Medium,
                30,
                &[(Strength, 2), (Intelligence, -2), (Charisma, -2)],
                vec![],
            ),
        ),
    ])
}

fn class(
    name: &str,
    hit_die: u32,
    base_attack: BabProgression,
    saves: [SaveProgression; 3],
    skill_points_per_level: u32,
    class_skills: &[&str],
) -> ClassDefinition {
    let [fortitude, reflex, will] = saves;
    ClassDefinition {
        name: name.to_string(),
        hit_die,
        base_attack,
        fortitude,
        reflex,
        will,
        skill_points_per_level,
        class_skills: skill_set(class_skills),
        features: Vec::new(),
        spellcasting: None,
    }
}

fn bonus_feats_at(levels: &[u32]) -> Vec<ClassFeature> {
    levels
        .iter()
        .map(|&level| ClassFeature::BonusFeat { level })
        .collect()
}

fn classes() -> BTreeMap<ClassId, ClassDefinition> {
    let mut barbarian = class(
        "Barbarian",
        12,
        Bab::Good,
        [Good, Poor, Poor],
        4,
        &["climb", "handle_animal", "intimidate", "jump", "listen", "ride", "swim"],
    );
    barbarian.features.push(ClassFeature::Modifier {
        level: 1,
        name: "Fast Movement".to_string(),
        grant: grant(ModifierTarget::Speed, 10, BonusType::Untyped),
    });

    let mut fighter = class(
        "Fighter",
        10,
        Bab::Good,
        [Good, Poor, Poor],
        2,
        &["climb", "handle_animal", "intimidate", "jump", "ride", "swim"],
    );
    fighter.features = bonus_feats_at(&[1, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20]);

    let rogue = class(
        "Rogue",
        6,
        Bab::Average,
        [Poor, Good, Poor],
        8,
        &[
            "balance",
            "bluff",
            "climb",
            "diplomacy",
            "hide",
            "intimidate",
            "jump",
            "listen",
            "move_silently",
            "open_lock",
            "search",
            "sense_motive",
            "spot",
            "swim",
            "tumble",
            "use_magic_device",
        ],
    );

    let mut wizard = class(
        "Wizard",
        4,
        Bab::Poor,
        [Poor, Poor, Good],
        2,
        &["concentration", "knowledge_arcana", "spellcraft"],
    );
    wizard.features = bonus_feats_at(&[5, 10, 15, 20]);
    wizard.spellcasting = Some(Spellcasting {
        ability: Intelligence,
        slots_per_day: slot_rows(0, &WIZARD_SLOTS),
    });

    let mut cleric = class(
        "Cleric",
        8,
        Bab::Average,
        [Good, Poor, Good],
        2,
        &[
            "concentration",
            "diplomacy",
            "heal",
            "knowledge_arcana",
            "knowledge_religion",
            "spellcraft",
        ],
    );
    cleric.spellcasting = Some(Spellcasting {
        ability: Wisdom,
        slots_per_day: slot_rows(0, &CLERIC_SLOTS),
    });

    let mut paladin = class(
        "Paladin",
        10,
        Bab::Good,
        [Good, Poor, Poor],
        2,
        &[
            "concentration",
            "diplomacy",
            "handle_animal",
            "heal",
            "knowledge_religion",
            "ride",
            "sense_motive",
        ],
    );
    paladin.spellcasting = Some(Spellcasting {
        ability: Wisdom,
        slots_per_day: slot_rows(1, &PALADIN_SLOTS),
    });

    BTreeMap::from([
        (ClassId::new("barbarian"), barbarian),
        (ClassId::new("cleric"), cleric),
        (ClassId::new("fighter"), fighter),
        (ClassId::new("paladin"), paladin),
        (ClassId::new("rogue"), rogue),
        (ClassId::new("wizard"), wizard),
    ])
}

fn feat(
    name: &str,
    modifiers: Vec<ModifierGrant>,
    prerequisites: Vec<FeatPrerequisite>,
) -> FeatDefinition {
    FeatDefinition {
        name: name.to_string(),
        modifiers,
        repeatable: false,
        prerequisites,
    }
}

fn min_ability(ability: Ability, minimum: i32) -> FeatPrerequisite {
    FeatPrerequisite::Ability { ability, minimum }
}

fn feats() -> BTreeMap<FeatId, FeatDefinition> {
    let untyped = BonusType::Untyped;
    let mut toughness = feat(
        "Toughness",
        vec![grant(ModifierTarget::HitPoints, 3, untyped)],
        vec![],
    );
    toughness.repeatable = true;

    BTreeMap::from([
        (
            FeatId::new("alertness"),
            feat(
                "Alertness",
                vec![
                    skill_grant("listen", 2, untyped),
                    skill_grant("spot", 2, untyped),
                ],
                vec![],
            ),
        ),
        (
            FeatId::new("cleave"),
            feat(
                "Cleave",
                vec![],
                vec![
                    min_ability(Strength, 13),
                    FeatPrerequisite::Feat {
                        feat: FeatId::new("power_attack"),
                    },
                ],
            ),
        ),
        (
            FeatId::new("combat_expertise"),
            feat("Combat Expertise", vec![], vec![min_ability(Intelligence, 13)]),
        ),
        (
            FeatId::new("dodge"),
            feat(
                "Dodge",
                vec![grant(ModifierTarget::ArmorClass, 1, BonusType::Dodge)],
                vec![min_ability(Dexterity, 13)],
            ),
        ),
        (
            FeatId::new("great_fortitude"),
            feat(
                "Great Fortitude",
                vec![grant(ModifierTarget::Save(SaveKind::Fortitude), 2, untyped)],
                vec![],
            ),
        ),
        (
            FeatId::new("improved_initiative"),
            feat(
                "Improved Initiative",
                vec![grant(ModifierTarget::Initiative, 4, untyped)],
                vec![],
            ),
        ),
        (
            FeatId::new("iron_will"),
            feat(
                "Iron Will",
                vec![grant(ModifierTarget::Save(SaveKind::Will), 2, untyped)],
                vec![],
            ),
        ),
        (
            FeatId::new("lightning_reflexes"),
            feat(
                "Lightning Reflexes",
                vec![grant(ModifierTarget::Save(SaveKind::Reflex), 2, untyped)],
                vec![],
            ),
        ),
        (
            FeatId::new("power_attack"),
            feat("Power Attack", vec![], vec![min_ability(Strength, 13)]),
        ),
        (FeatId::new("toughness"), toughness),
        (
            FeatId::new("weapon_focus"),
            feat(
                "Weapon Focus",
                vec![grant(ModifierTarget::AttackRoll, 1, untyped)],
                vec![FeatPrerequisite::BaseAttackBonus { minimum: 1 }],
            ),
        ),
    ])
}

fn item(name: &str, kind: ItemKind, modifiers: Vec<ModifierGrant>) -> ItemDefinition {
    ItemDefinition {
        name: name.to_string(),
        kind,
        modifiers,
    }
}

fn armor(max_dex_bonus: Option<i32>, armor_check_penalty: u32) -> ArmorProfile {
    ArmorProfile {
        max_dex_bonus,
        armor_check_penalty,
    }
}

fn ac(value: i32, bonus_type: BonusType) -> ModifierGrant {
    grant(ModifierTarget::ArmorClass, value, bonus_type)
}

fn items() -> BTreeMap<ItemId, ItemDefinition> {
    use BonusType::{Armor, Deflection, Enhancement, NaturalArmor, Shield};

    BTreeMap::from([
        (ItemId::new("longsword"), item("Longsword", ItemKind::Weapon, vec![])),
        (
            ItemId::new("leather_armor"),
            item(
                "Leather Armor",
                ItemKind::Armor(armor(Some(6), 0)),
                vec![ac(2, Armor)],
            ),
        ),
        (
            ItemId::new("chain_shirt"),
            item(
                "Chain Shirt",
                ItemKind::Armor(armor(Some(4), 2)),
                vec![ac(4, Armor)],
            ),
        ),
        (
            ItemId::new("breastplate"),
            item(
                "Breastplate",
                ItemKind::Armor(armor(Some(3), 4)),
                vec![ac(5, Armor)],
            ),
        ),
        (
            ItemId::new("full_plate"),
            item(
                "Full Plate",
                ItemKind::Armor(armor(Some(1), 6)),
                vec![ac(8, Armor)],
            ),
        ),
        (
            ItemId::new("light_wooden_shield"),
            item(
                "Light Wooden Shield",
                ItemKind::Shield(armor(None, 1)),
                vec![ac(1, Shield)],
            ),
        ),
        (
            ItemId::new("heavy_steel_shield"),
            item(
                "Heavy Steel Shield",
                ItemKind::Shield(armor(None, 2)),
                vec![ac(2, Shield)],
            ),
        ),
        (
            ItemId::new("bracers_of_armor_1"),
            item("Bracers of Armor +1", ItemKind::Wondrous, vec![ac(1, Armor)]),
        ),
        (
            ItemId::new("ring_of_protection_1"),
            item(
                "Ring of Protection +1",
                ItemKind::Wondrous,
                vec![ac(1, Deflection)],
            ),
        ),
        (
            ItemId::new("ring_of_protection_2"),
            item(
                "Ring of Protection +2",
                ItemKind::Wondrous,
                vec![ac(2, Deflection)],
            ),
        ),
        (
            ItemId::new("amulet_of_natural_armor_1"),
            item(
                "Amulet of Natural Armor +1",
                ItemKind::Wondrous,
                vec![ac(1, NaturalArmor)],
            ),
        ),
        (
            ItemId::new("gauntlets_of_ogre_power"),
            item(
                "Gauntlets of Ogre Power",
                ItemKind::Wondrous,
                vec![grant(ModifierTarget::Ability(Strength), 2, Enhancement)],
            ),
        ),
        (
            ItemId::new("belt_of_giant_strength_4"),
            item(
                "Belt of Giant Strength +4",
                ItemKind::Wondrous,
                vec![grant(ModifierTarget::Ability(Strength), 4, Enhancement)],
            ),
        ),
        (
            ItemId::new("boots_of_striding_and_springing"),
            item(
                "Boots of Striding and Springing",
                ItemKind::Wondrous,
                vec![
                    grant(ModifierTarget::Speed, 10, Enhancement),
                    skill_grant("jump", 5, Enhancement),
                ],
            ),
        ),
    ])
}
