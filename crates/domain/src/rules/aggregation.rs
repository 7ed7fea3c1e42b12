//! Stat aggregation
//!
//! [`recompute`] turns a character plus its [`Resolution`] into a full
//! [`DerivedStats`] snapshot. It is pure: the same inputs always give the same
//! output, and every rule violation found in a pass is reported together
//! instead of being clamped away.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::progression::{
    ability_increases_for_level, experience_for_level, feat_slots_for_level, format_bonus,
    iterative_attacks, skill_rank_cap, skill_rank_cost, HitPointPolicy, MAX_CHARACTER_LEVEL,
};
use super::resolver::{resolve, Resolution};
use super::tables::{FeatPrerequisite, RuleTables, Size};
use crate::aggregates::Character;
use crate::error::{RuleViolation, ValidationErrors};
use crate::ids::{ClassId, SkillId};
use crate::value_objects::{
    ability_modifier, stack_for_target, Ability, BonusType, Modifier, ModifierTarget, SaveKind,
};

/// Base armor class before any modifier.
const BASE_ARMOR_CLASS: i32 = 10;
/// Ranks a synergy source skill needs before it helps.
const SYNERGY_RANKS: u32 = 5;
const SYNERGY_BONUS: i32 = 2;
/// Skill points are multiplied by this at first level.
const FIRST_LEVEL_SKILL_MULTIPLIER: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityLine {
    pub base: i32,
    pub increases: i32,
    pub bonus: i32,
    pub score: i32,
    pub modifier: i32,
}

/// How a level's hit die was counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HitDieSource {
    FirstLevel,
    Rolled,
    Average,
    Maximum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitPointLevel {
    pub character_level: u32,
    pub class: ClassId,
    pub hit_die: u32,
    pub die_value: u32,
    pub source: HitDieSource,
    pub constitution_modifier: i32,
    pub total: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitPoints {
    pub max: i32,
    pub current: i32,
    /// Stacked hit point modifiers (Toughness and the like)
    pub bonus: i32,
    pub levels: Vec<HitPointLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcComponent {
    pub label: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmorClass {
    pub total: i32,
    pub touch: i32,
    pub flat_footed: i32,
    pub max_dex_bonus: Option<i32>,
    pub components: Vec<AcComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackBonuses {
    pub base_attack_bonus: i32,
    /// Full-attack sequence, e.g. `["+11", "+6", "+1"]`
    pub iterative: Vec<String>,
    pub melee: i32,
    pub ranged: i32,
    pub damage: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingThrow {
    pub base: i32,
    pub ability: i32,
    pub misc: i32,
    pub total: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingThrows {
    pub fortitude: SavingThrow,
    pub reflex: SavingThrow,
    pub will: SavingThrow,
}

impl SavingThrows {
    pub fn get(&self, kind: SaveKind) -> &SavingThrow {
        match kind {
            SaveKind::Fortitude => &self.fortitude,
            SaveKind::Reflex => &self.reflex,
            SaveKind::Will => &self.will,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillLine {
    pub name: String,
    pub ability: Ability,
    pub ranks: u32,
    pub max_ranks: u32,
    pub class_skill: bool,
    pub ability_modifier: i32,
    pub misc: i32,
    pub synergy: i32,
    pub armor_check_penalty: i32,
    pub total: i32,
    /// False for trained-only skills without ranks
    pub usable: bool,
}

/// A spendable allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub total: u32,
    pub spent: u32,
    pub available: u32,
}

impl Pool {
    fn new(total: u32, spent: u32) -> Self {
        Self {
            total,
            spent,
            available: total.saturating_sub(spent),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellSlotLine {
    pub base: u32,
    pub bonus: u32,
    pub misc: i32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSpellSlots {
    pub class: ClassId,
    pub caster_level: u32,
    pub ability: Ability,
    pub levels: BTreeMap<u8, SpellSlotLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceProgress {
    pub current: u64,
    pub current_level_threshold: u64,
    pub next_level_threshold: Option<u64>,
    pub level_up_pending: bool,
}

/// Every derived number on a character sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub total_level: u32,
    pub size: Size,
    pub abilities: BTreeMap<Ability, AbilityLine>,
    pub hit_points: HitPoints,
    pub armor_class: ArmorClass,
    pub attacks: AttackBonuses,
    pub saves: SavingThrows,
    pub initiative: i32,
    pub speed: i32,
    pub skills: BTreeMap<SkillId, SkillLine>,
    pub skill_points: Pool,
    pub feats: Pool,
    pub spell_slots: Vec<ClassSpellSlots>,
    pub experience: ExperienceProgress,
}

impl DerivedStats {
    pub fn ability_modifier(&self, ability: Ability) -> i32 {
        self.abilities.get(&ability).map_or(0, |line| line.modifier)
    }

    pub fn skill_total(&self, skill: &SkillId) -> Option<i32> {
        self.skills.get(skill).map(|line| line.total)
    }
}

/// Resolve and recompute in one step.
pub fn derive_stats(
    character: &Character,
    tables: &RuleTables,
) -> Result<DerivedStats, ValidationErrors> {
    let resolution = resolve(character, tables)?;
    recompute(character, &resolution)
}

/// Recompute every derived attribute of `character`.
pub fn recompute(
    character: &Character,
    resolution: &Resolution,
) -> Result<DerivedStats, ValidationErrors> {
    let mut violations = Vec::new();
    let modifiers = resolution.modifiers.as_slice();
    let total_level = character.total_level();

    let abilities = compute_abilities(character, modifiers, total_level, &mut violations);
    let modifier_of = |ability: Ability| abilities.get(&ability).map_or(0, |l| l.modifier);

    let hit_points = compute_hit_points(
        character,
        resolution,
        modifier_of(Ability::Constitution),
        &mut violations,
    );
    let armor_class = compute_armor_class(resolution, modifier_of(Ability::Dexterity));

    let base_attack_bonus: i32 = resolution
        .classes
        .iter()
        .map(|c| c.base_attack.bonus_at(c.levels))
        .sum();
    let attack_misc = stack_for_target(modifiers, &ModifierTarget::AttackRoll).total();
    let attacks = AttackBonuses {
        base_attack_bonus,
        iterative: iterative_attacks(base_attack_bonus)
            .into_iter()
            .map(format_bonus)
            .collect(),
        melee: sum([base_attack_bonus, modifier_of(Ability::Strength), attack_misc]),
        ranged: sum([base_attack_bonus, modifier_of(Ability::Dexterity), attack_misc]),
        damage: modifier_of(Ability::Strength)
            .saturating_add(stack_for_target(modifiers, &ModifierTarget::DamageRoll).total()),
    };

    let save = |kind: SaveKind| {
        let base = resolution
            .classes
            .iter()
            .map(|c| {
                let progression = match kind {
                    SaveKind::Fortitude => c.fortitude,
                    SaveKind::Reflex => c.reflex,
                    SaveKind::Will => c.will,
                };
                progression.bonus_at(c.levels)
            })
            .sum();
        let ability = modifier_of(kind.ability());
        let misc = stack_for_target(modifiers, &ModifierTarget::Save(kind)).total();
        SavingThrow {
            base,
            ability,
            misc,
            total: sum([base, ability, misc]),
        }
    };
    let saves = SavingThrows {
        fortitude: save(SaveKind::Fortitude),
        reflex: save(SaveKind::Reflex),
        will: save(SaveKind::Will),
    };

    let initiative = modifier_of(Ability::Dexterity)
        .saturating_add(stack_for_target(modifiers, &ModifierTarget::Initiative).total());
    let speed = stack_for_target(modifiers, &ModifierTarget::Speed)
        .total()
        .saturating_add_unsigned(resolution.base_speed)
        .max(0);

    let skills = compute_skills(character, resolution, &modifier_of, total_level, &mut violations);
    let skill_points = compute_skill_points(
        character,
        resolution,
        modifier_of(Ability::Intelligence),
        &mut violations,
    );

    let feats = compute_feats(
        character,
        resolution,
        &abilities,
        base_attack_bonus,
        total_level,
        &mut violations,
    );

    let spell_slots = compute_spell_slots(resolution, modifiers, &modifier_of);

    let next_level_threshold =
        (total_level < MAX_CHARACTER_LEVEL).then(|| experience_for_level(total_level + 1));
    let experience = ExperienceProgress {
        current: character.experience(),
        current_level_threshold: experience_for_level(total_level),
        next_level_threshold,
        level_up_pending: next_level_threshold
            .is_some_and(|threshold| character.experience() >= threshold),
    };

    ValidationErrors::check(violations)?;

    Ok(DerivedStats {
        total_level,
        size: resolution.size,
        abilities,
        hit_points,
        armor_class,
        attacks,
        saves,
        initiative,
        speed,
        skills,
        skill_points,
        feats,
        spell_slots,
        experience,
    })
}

fn compute_abilities(
    character: &Character,
    modifiers: &[Modifier],
    total_level: u32,
    violations: &mut Vec<RuleViolation>,
) -> BTreeMap<Ability, AbilityLine> {
    let taken = character.ability_increases().len() as u32;
    let allowed = ability_increases_for_level(total_level);
    if taken > allowed {
        violations.push(RuleViolation::TooManyAbilityIncreases { taken, allowed });
    }

    Ability::ALL
        .into_iter()
        .map(|ability| {
            let base = character.base_abilities().get(ability);
            let increases = character
                .ability_increases()
                .iter()
                .filter(|a| **a == ability)
                .count() as i32;
            let bonus = stack_for_target(modifiers, &ModifierTarget::Ability(ability)).total();
            let score = sum([base, increases, bonus]);
            if score < 1 {
                violations.push(RuleViolation::AbilityScoreBelowMinimum { ability, score });
            }
            let line = AbilityLine {
                base,
                increases,
                bonus,
                score,
                modifier: ability_modifier(score),
            };
            (ability, line)
        })
        .collect()
}

fn compute_hit_points(
    character: &Character,
    resolution: &Resolution,
    constitution_modifier: i32,
    violations: &mut Vec<RuleViolation>,
) -> HitPoints {
    let total_level = resolution.level_sequence.len() as u32;
    for &level in character.hit_point_rolls().keys() {
        if level < 2 || level > total_level {
            violations.push(RuleViolation::UnexpectedHitPointRoll { level });
        }
    }

    let policy_source = match resolution.hit_points {
        HitPointPolicy::Average => HitDieSource::Average,
        HitPointPolicy::Maximum => HitDieSource::Maximum,
    };

    let levels: Vec<HitPointLevel> = resolution
        .level_sequence
        .iter()
        .map(|step| {
            let hit_die = step.hit_die;
            let recorded = character.hit_point_rolls().get(&step.character_level).copied();
            let (die_value, source) = match recorded {
                _ if step.character_level == 1 => (hit_die, HitDieSource::FirstLevel),
                Some(roll) if (1..=hit_die).contains(&roll) => (roll, HitDieSource::Rolled),
                Some(roll) => {
                    violations.push(RuleViolation::HitPointRollOutOfRange {
                        level: step.character_level,
                        roll,
                        hit_die,
                    });
                    (resolution.hit_points.unrolled_value(hit_die), policy_source)
                }
                None => (resolution.hit_points.unrolled_value(hit_die), policy_source),
            };
            HitPointLevel {
                character_level: step.character_level,
                class: step.class.clone(),
                hit_die,
                die_value,
                source,
                constitution_modifier,
                total: constitution_modifier.saturating_add_unsigned(die_value).max(1),
            }
        })
        .collect();

    let bonus = stack_for_target(&resolution.modifiers, &ModifierTarget::HitPoints).total();
    let max = sum(levels.iter().map(|l| l.total).chain([bonus])).max(1);
    HitPoints {
        max,
        current: max.saturating_sub_unsigned(character.damage_taken()),
        bonus,
        levels,
    }
}

/// Touch AC drops armor, shield and natural armor bonuses. Flat-footed AC
/// drops a positive Dexterity modifier and dodge bonuses, but a Dexterity
/// penalty still applies.
fn compute_armor_class(resolution: &Resolution, dexterity_modifier: i32) -> ArmorClass {
    let max_dex_bonus = resolution.armor.max_dex_bonus;
    let dex = max_dex_bonus.map_or(dexterity_modifier, |cap| dexterity_modifier.min(cap));
    let stacked = stack_for_target(&resolution.modifiers, &ModifierTarget::ArmorClass);

    let mut components = vec![
        AcComponent {
            label: "base".to_string(),
            value: BASE_ARMOR_CLASS,
        },
        AcComponent {
            label: "dexterity".to_string(),
            value: dex,
        },
    ];
    components.extend(stacked.by_type().into_iter().map(|(bonus_type, value)| AcComponent {
        label: bonus_type.label().to_string(),
        value,
    }));

    ArmorClass {
        total: sum([BASE_ARMOR_CLASS, dex, stacked.total()]),
        touch: sum([
            BASE_ARMOR_CLASS,
            dex,
            stacked.total_excluding(&[
                BonusType::Armor,
                BonusType::Shield,
                BonusType::NaturalArmor,
            ]),
        ]),
        flat_footed: sum([
            BASE_ARMOR_CLASS,
            dex.min(0),
            stacked.total_excluding(&[BonusType::Dodge]),
        ]),
        max_dex_bonus,
        components,
    }
}

fn compute_skills(
    character: &Character,
    resolution: &Resolution,
    modifier_of: &dyn Fn(Ability) -> i32,
    total_level: u32,
    violations: &mut Vec<RuleViolation>,
) -> BTreeMap<SkillId, SkillLine> {
    let armor_penalty = 0i32.saturating_sub_unsigned(resolution.armor.armor_check_penalty);

    resolution
        .skills
        .iter()
        .map(|(id, definition)| {
            let ranks = character.ranks_in(id);
            let class_skill = resolution.class_skills.contains(id);
            let max_ranks = skill_rank_cap(total_level, class_skill);
            if ranks > max_ranks {
                violations.push(RuleViolation::SkillRanksOverCap {
                    skill: id.clone(),
                    ranks,
                    cap: max_ranks,
                });
            }

            let ability_modifier = modifier_of(definition.key_ability);
            let misc =
                stack_for_target(&resolution.modifiers, &ModifierTarget::Skill(id.clone())).total();
            let synergy = definition
                .synergy_sources
                .iter()
                .filter(|source| character.ranks_in(source) >= SYNERGY_RANKS)
                .count() as i32
                * SYNERGY_BONUS;
            let armor_check_penalty = if definition.armor_check_penalty {
                armor_penalty
            } else {
                0
            };

            let line = SkillLine {
                name: definition.name.clone(),
                ability: definition.key_ability,
                ranks,
                max_ranks,
                class_skill,
                ability_modifier,
                misc,
                synergy,
                armor_check_penalty,
                total: sum([ability_modifier, misc, synergy, armor_check_penalty])
                    .saturating_add_unsigned(ranks),
                usable: !definition.trained_only || ranks > 0,
            };
            (id.clone(), line)
        })
        .collect()
}

fn compute_skill_points(
    character: &Character,
    resolution: &Resolution,
    intelligence_modifier: i32,
    violations: &mut Vec<RuleViolation>,
) -> Pool {
    let total = resolution
        .level_sequence
        .iter()
        .map(|step| {
            let per_level = intelligence_modifier
                .saturating_add_unsigned(step.skill_points_per_level)
                .saturating_add_unsigned(resolution.bonus_skill_points_per_level)
                .max(1)
                .unsigned_abs();
            if step.character_level == 1 {
                per_level.saturating_mul(FIRST_LEVEL_SKILL_MULTIPLIER)
            } else {
                per_level
            }
        })
        .fold(0u32, u32::saturating_add);

    let spent = character
        .skill_ranks()
        .iter()
        .map(|(skill, ranks)| {
            ranks.saturating_mul(skill_rank_cost(resolution.class_skills.contains(skill)))
        })
        .fold(0u32, u32::saturating_add);

    if spent > total {
        violations.push(RuleViolation::SkillPointsOverspent { spent, total });
    }
    Pool::new(total, spent)
}

fn compute_feats(
    character: &Character,
    resolution: &Resolution,
    abilities: &BTreeMap<Ability, AbilityLine>,
    base_attack_bonus: i32,
    total_level: u32,
    violations: &mut Vec<RuleViolation>,
) -> Pool {
    let total = feat_slots_for_level(total_level)
        .saturating_add(resolution.racial_bonus_feats)
        .saturating_add(resolution.class_bonus_feats);
    let spent = character.feats().len() as u32;
    if spent > total {
        violations.push(RuleViolation::FeatSlotsOverspent { spent, total });
    }

    let mut seen = BTreeSet::new();
    for feat in &resolution.feats {
        if !seen.insert(&feat.feat) {
            if !feat.repeatable {
                let duplicate = RuleViolation::DuplicateFeat(feat.feat.clone());
                if !violations.contains(&duplicate) {
                    violations.push(duplicate);
                }
            }
            continue;
        }

        for prerequisite in &feat.prerequisites {
            let unmet = match prerequisite {
                FeatPrerequisite::Ability { ability, minimum } => {
                    let score = abilities.get(ability).map_or(0, |l| l.score);
                    (score < *minimum).then(|| format!("{ability} {minimum}"))
                }
                FeatPrerequisite::BaseAttackBonus { minimum } => (base_attack_bonus < *minimum)
                    .then(|| format!("base attack bonus {}", format_bonus(*minimum))),
                FeatPrerequisite::Feat { feat: required } => (!character.feats().contains(required))
                    .then(|| format!("feat {required}")),
                FeatPrerequisite::CharacterLevel { minimum } => {
                    (total_level < *minimum).then(|| format!("character level {minimum}"))
                }
            };
            if let Some(requirement) = unmet {
                violations.push(RuleViolation::FeatPrerequisiteNotMet {
                    feat: feat.feat.clone(),
                    requirement,
                });
            }
        }
    }

    Pool::new(total, spent)
}

fn compute_spell_slots(
    resolution: &Resolution,
    modifiers: &[Modifier],
    modifier_of: &dyn Fn(Ability) -> i32,
) -> Vec<ClassSpellSlots> {
    resolution
        .classes
        .iter()
        .filter_map(|class| {
            let casting = class.spellcasting.as_ref()?;
            let row = casting.row(class.levels)?;
            let ability_modifier = modifier_of(casting.ability);
            let levels = row
                .iter()
                .map(|(&spell_level, &base)| {
                    let bonus = resolution.bonus_spells.bonus_slots(ability_modifier, spell_level);
                    let misc =
                        stack_for_target(modifiers, &ModifierTarget::SpellSlots(spell_level))
                            .total();
                    let total = misc
                        .saturating_add_unsigned(base.saturating_add(bonus))
                        .max(0)
                        .unsigned_abs();
                    (
                        spell_level,
                        SpellSlotLine {
                            base,
                            bonus,
                            misc,
                            total,
                        },
                    )
                })
                .collect();
            Some(ClassSpellSlots {
                class: class.class.clone(),
                caster_level: class.levels,
                ability: casting.ability,
                levels,
            })
        })
        .collect()
}

/// Sum that saturates at the `i32` bounds instead of overflowing.
fn sum(values: impl IntoIterator<Item = i32>) -> i32 {
    values.into_iter().fold(0, i32::saturating_add)
}
