//! Ability scores, modifiers and score generation
//!
//! Scores are generated either by rolling (`4d6dl1` per ability, or straight
//! `3d6`) or by spending a point-buy budget on scores between 8 and 18.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::dice::{DiceError, DiceExpression, RollResult};
use super::random::RandomSource;
use crate::error::DomainError;

/// The six abilities, in sheet order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        };
        f.write_str(name)
    }
}

impl FromStr for Ability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "str" | "strength" => Ok(Ability::Strength),
            "dex" | "dexterity" => Ok(Ability::Dexterity),
            "con" | "constitution" => Ok(Ability::Constitution),
            "int" | "intelligence" => Ok(Ability::Intelligence),
            "wis" | "wisdom" => Ok(Ability::Wisdom),
            "cha" | "charisma" => Ok(Ability::Charisma),
            other => Err(DomainError::parse(format!("Unknown ability: {other}"))),
        }
    }
}

/// Standard d20 modifier: `floor((score - 10) / 2)`.
pub fn ability_modifier(score: i32) -> i32 {
    score.saturating_sub(10).div_euclid(2)
}

/// One score per ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl AbilityScores {
    pub fn new(
        strength: i32,
        dexterity: i32,
        constitution: i32,
        intelligence: i32,
        wisdom: i32,
        charisma: i32,
    ) -> Self {
        Self {
            strength,
            dexterity,
            constitution,
            intelligence,
            wisdom,
            charisma,
        }
    }

    /// Every score set to `score`.
    pub fn uniform(score: i32) -> Self {
        Self::new(score, score, score, score, score, score)
    }

    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    fn slot(&mut self, ability: Ability) -> &mut i32 {
        match ability {
            Ability::Strength => &mut self.strength,
            Ability::Dexterity => &mut self.dexterity,
            Ability::Constitution => &mut self.constitution,
            Ability::Intelligence => &mut self.intelligence,
            Ability::Wisdom => &mut self.wisdom,
            Ability::Charisma => &mut self.charisma,
        }
    }

    pub fn with(mut self, ability: Ability, score: i32) -> Self {
        *self.slot(ability) = score;
        self
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        ability_modifier(self.get(ability))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ability, i32)> + '_ {
        Ability::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::uniform(10)
    }
}

/// How rolled scores are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationMethod {
    /// Roll 4d6 and drop the lowest die
    FourD6DropLowest,
    /// Roll 3d6 straight
    ThreeD6,
}

impl GenerationMethod {
    pub fn formula(&self) -> &'static str {
        match self {
            GenerationMethod::FourD6DropLowest => "4d6dl1",
            GenerationMethod::ThreeD6 => "3d6",
        }
    }
}

impl FromStr for GenerationMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "4d6" | "4d6dl1" | "standard" => Ok(GenerationMethod::FourD6DropLowest),
            "3d6" | "classic" => Ok(GenerationMethod::ThreeD6),
            other => Err(DomainError::parse(format!(
                "Unknown generation method: {other}"
            ))),
        }
    }
}

/// Rolled scores plus the roll behind each one, in `Ability::ALL` order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAbilities {
    pub method: GenerationMethod,
    pub scores: AbilityScores,
    pub rolls: Vec<RollResult>,
}

/// Roll one score per ability with `method`.
pub fn roll_ability_scores(
    method: GenerationMethod,
    rng: &mut dyn RandomSource,
) -> Result<GeneratedAbilities, DiceError> {
    let expr = DiceExpression::parse(method.formula())?;
    let mut scores = AbilityScores::default();
    let mut rolls = Vec::with_capacity(Ability::ALL.len());
    for ability in Ability::ALL {
        let roll = expr.evaluate(rng)?;
        // a handful of d6 always fits in i32
        scores = scores.with(ability, roll.total as i32);
        rolls.push(roll);
    }
    Ok(GeneratedAbilities {
        method,
        scores,
        rolls,
    })
}

pub const POINT_BUY_MIN_SCORE: i32 = 8;
pub const POINT_BUY_MAX_SCORE: i32 = 18;
/// Budget for a standard-power campaign
pub const DEFAULT_POINT_BUY_BUDGET: u32 = 25;

/// Cost of buying `score` from a base of 8.
pub fn point_buy_cost(score: i32) -> Option<u32> {
    let cost = match score {
        8 => 0,
        9 => 1,
        10 => 2,
        11 => 3,
        12 => 4,
        13 => 5,
        14 => 6,
        15 => 8,
        16 => 10,
        17 => 13,
        18 => 16,
        _ => return None,
    };
    Some(cost)
}

/// Total point-buy cost of `scores`, rejecting out-of-range scores and
/// spends over `budget`.
pub fn point_buy_total(scores: &AbilityScores, budget: u32) -> Result<u32, DomainError> {
    let mut total = 0;
    for (ability, score) in scores.iter() {
        let cost = point_buy_cost(score).ok_or_else(|| {
            DomainError::validation(format!(
                "{ability} {score} is outside the point-buy range \
                 {POINT_BUY_MIN_SCORE}-{POINT_BUY_MAX_SCORE}"
            ))
        })?;
        total += cost;
    }
    if total > budget {
        return Err(DomainError::validation(format!(
            "Point buy costs {total}, budget is {budget}"
        )));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::random::ScriptedRandom;
    use proptest::prelude::*;

    #[test]
    fn test_ability_modifier_floors_toward_negative_infinity() {
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(9), -1);
        assert_eq!(ability_modifier(7), -2);
        assert_eq!(ability_modifier(20), 5);
        assert_eq!(ability_modifier(1), -5);
        assert_eq!(ability_modifier(0), -5);
    }

    #[test]
    fn test_with_replaces_one_score() {
        let scores = AbilityScores::default().with(Ability::Wisdom, 16);
        assert_eq!(scores.wisdom, 16);
        assert_eq!(scores.modifier(Ability::Wisdom), 3);
        assert_eq!(scores.strength, 10);
    }

    #[test]
    fn test_ability_parses_short_and_long_names() {
        assert_eq!("dex".parse::<Ability>(), Ok(Ability::Dexterity));
        assert_eq!("Charisma".parse::<Ability>(), Ok(Ability::Charisma));
        assert!("luck".parse::<Ability>().is_err());
    }

    #[test]
    fn test_roll_four_d6_drop_lowest() {
        let faces = [
            6, 5, 4, 1, // 15
            3, 3, 3, 3, // 9
            6, 6, 6, 6, // 18
            1, 1, 1, 2, // 4
            2, 4, 6, 5, // 15
            5, 5, 1, 1, // 11
        ];
        let mut rng = ScriptedRandom::new(faces);
        let generated =
            roll_ability_scores(GenerationMethod::FourD6DropLowest, &mut rng).expect("roll");

        assert_eq!(generated.scores, AbilityScores::new(15, 9, 18, 4, 15, 11));
        assert_eq!(generated.rolls.len(), 6);
        assert_eq!(generated.rolls[0].terms[0].kept_rolls, vec![6, 5, 4]);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn test_roll_three_d6_needs_eighteen_dice() {
        let mut rng = ScriptedRandom::new([1; 17]);
        assert!(roll_ability_scores(GenerationMethod::ThreeD6, &mut rng).is_err());
    }

    #[test]
    fn test_point_buy_costs() {
        assert_eq!(point_buy_cost(8), Some(0));
        assert_eq!(point_buy_cost(14), Some(6));
        assert_eq!(point_buy_cost(18), Some(16));
        assert_eq!(point_buy_cost(7), None);
        assert_eq!(point_buy_cost(19), None);

        // 8 + 6 + 5 + 4 + 2 + 0
        let scores = AbilityScores::new(15, 14, 13, 12, 10, 8);
        assert_eq!(point_buy_total(&scores, 25), Ok(25));
        assert!(point_buy_total(&scores, 24).is_err());
        assert!(point_buy_total(&scores.with(Ability::Charisma, 7), 40).is_err());
    }

    proptest! {
        #[test]
        fn prop_modifier_matches_floor_division(score in -50i32..100) {
            let expected = ((score - 10) as f64 / 2.0).floor() as i32;
            prop_assert_eq!(ability_modifier(score), expected);
        }
    }
}
