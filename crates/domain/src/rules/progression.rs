//! Level-driven progressions: attack bonus, saves, experience, rank caps,
//! feat slots and bonus spells.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Highest total character level the tables cover.
pub const MAX_CHARACTER_LEVEL: u32 = 20;

/// Iterative attacks step down by this much.
const ITERATIVE_ATTACK_STEP: i32 = 5;

/// Base attack bonus tier of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BabProgression {
    /// +1 per level
    Good,
    /// +3 per 4 levels
    Average,
    /// +1 per 2 levels
    Poor,
}

impl BabProgression {
    pub fn bonus_at(&self, class_level: u32) -> i32 {
        let level = class_level as i32;
        match self {
            BabProgression::Good => level,
            BabProgression::Average => level * 3 / 4,
            BabProgression::Poor => level / 2,
        }
    }
}

/// Base save tier of a class for one save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveProgression {
    Good,
    Poor,
}

impl SaveProgression {
    pub fn bonus_at(&self, class_level: u32) -> i32 {
        let level = class_level as i32;
        match self {
            SaveProgression::Good => 2 + level / 2,
            SaveProgression::Poor => level / 3,
        }
    }
}

/// Attack bonuses for a full attack: the base bonus, then every 5 lower
/// while still positive. Always has at least one entry.
pub fn iterative_attacks(base_attack_bonus: i32) -> Vec<i32> {
    let mut attacks = vec![base_attack_bonus];
    let mut next = base_attack_bonus - ITERATIVE_ATTACK_STEP;
    while next > 0 {
        attacks.push(next);
        next -= ITERATIVE_ATTACK_STEP;
    }
    attacks
}

/// Render a bonus with an explicit sign ("+5", "+0", "-1").
pub fn format_bonus(value: i32) -> String {
    format!("{value:+}")
}

/// Experience needed to reach `level`: `1000 * n * (n - 1) / 2`.
pub fn experience_for_level(level: u32) -> u64 {
    let n = u64::from(level);
    1000 * n * n.saturating_sub(1) / 2
}

/// Highest level `experience` qualifies for, capped at the table maximum.
pub fn level_for_experience(experience: u64) -> u32 {
    (1..=MAX_CHARACTER_LEVEL)
        .rev()
        .find(|&level| experience >= experience_for_level(level))
        .unwrap_or(1)
}

/// Maximum ranks in a skill at `character_level`.
pub fn skill_rank_cap(character_level: u32, class_skill: bool) -> u32 {
    let cap = character_level.saturating_add(3);
    if class_skill {
        cap
    } else {
        cap / 2
    }
}

/// Skill points spent on one rank.
pub fn skill_rank_cost(class_skill: bool) -> u32 {
    if class_skill {
        1
    } else {
        2
    }
}

/// Feat slots every character gets by `character_level`.
pub fn feat_slots_for_level(character_level: u32) -> u32 {
    if character_level == 0 {
        return 0;
    }
    1 + (character_level - 1) / 3
}

/// Ability increases earned by `character_level` (one per four levels).
pub fn ability_increases_for_level(character_level: u32) -> u32 {
    character_level / 4
}

/// How the hit points of levels without a recorded roll are counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HitPointPolicy {
    /// `floor(hitDie / 2) + 1`
    #[default]
    Average,
    /// Full hit die every level
    Maximum,
}

impl HitPointPolicy {
    pub fn unrolled_value(&self, hit_die: u32) -> u32 {
        match self {
            HitPointPolicy::Average => hit_die / 2 + 1,
            HitPointPolicy::Maximum => hit_die,
        }
    }
}

/// Bonus spells per day granted by a high casting ability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum BonusSpellRule {
    /// Spell level `L >= 1` gains `floor((mod - L) / 4) + 1` when `mod >= L`
    #[default]
    Standard,
    /// Explicit rows keyed by ability modifier; entry `i` is the bonus for
    /// spell level `i + 1`. Modifiers above the highest row use that row.
    Table { rows: BTreeMap<i32, Vec<u32>> },
}

impl BonusSpellRule {
    pub fn bonus_slots(&self, ability_modifier: i32, spell_level: u8) -> u32 {
        if spell_level == 0 {
            return 0;
        }
        let level = i32::from(spell_level);
        match self {
            BonusSpellRule::Standard => {
                if ability_modifier < level {
                    0
                } else {
                    ((ability_modifier - level) / 4 + 1) as u32
                }
            }
            BonusSpellRule::Table { rows } => rows
                .range(..=ability_modifier)
                .next_back()
                .and_then(|(_, row)| row.get(usize::from(spell_level) - 1))
                .copied()
                .unwrap_or(0),
        }
    }
}
