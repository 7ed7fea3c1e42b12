//! Dice rolling use cases.
//!
//! Wraps the domain dice engine with per-formula roll statistics. Statistics
//! are keyed by the canonical formula text, so `"1D20 + 5"` and `"1d20+5"`
//! count together.

use dashmap::DashMap;
use serde::Serialize;
use sheetforge_domain::value_objects::{
    roll_ability_scores, AdvantageRoll, DiceError, DiceExpression, GeneratedAbilities,
    GenerationMethod, RandomSource, RollMode, RollResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RollTally {
    count: u64,
    sum: i64,
    min: i64,
    max: i64,
}

impl RollTally {
    fn first(total: i64) -> Self {
        Self {
            count: 1,
            sum: total,
            min: total,
            max: total,
        }
    }

    fn add(&mut self, total: i64) {
        self.count += 1;
        self.sum += total;
        self.min = self.min.min(total);
        self.max = self.max.max(total);
    }
}

/// Running statistics for one formula
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollStats {
    pub formula: String,
    pub count: u64,
    pub sum: i64,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
}

impl RollStats {
    fn from_tally(formula: String, tally: RollTally) -> Self {
        Self {
            formula,
            count: tally.count,
            sum: tally.sum,
            min: tally.min,
            max: tally.max,
            mean: tally.sum as f64 / tally.count as f64,
        }
    }
}

/// Service for rolling dice formulas.
#[derive(Debug, Default)]
pub struct DiceService {
    stats: DashMap<String, RollTally>,
}

impl DiceService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and roll `formula`.
    pub fn roll(&self, formula: &str, rng: &mut dyn RandomSource) -> Result<RollResult, DiceError> {
        let expr = DiceExpression::parse(formula)?;
        let result = expr.evaluate(rng)?;
        tracing::debug!(formula = %result.formula, total = result.total, "Rolled dice");
        self.record(result.formula.clone(), result.total);
        Ok(result)
    }

    /// Roll a lone d20 twice under `mode`.
    pub fn roll_with_mode(
        &self,
        formula: &str,
        mode: RollMode,
        rng: &mut dyn RandomSource,
    ) -> Result<AdvantageRoll, DiceError> {
        let expr = DiceExpression::parse(formula)?;
        let roll = expr.roll_with_mode(mode, rng)?;
        tracing::debug!(
            formula = %expr,
            ?mode,
            first = roll.first.total,
            second = roll.second.total,
            total = roll.total,
            "Rolled with advantage mode"
        );
        self.record(stats_key(&expr, mode), roll.total);
        Ok(roll)
    }

    pub fn roll_abilities(
        &self,
        method: GenerationMethod,
        rng: &mut dyn RandomSource,
    ) -> Result<GeneratedAbilities, DiceError> {
        let generated = roll_ability_scores(method, rng)?;
        for roll in &generated.rolls {
            self.record(roll.formula.clone(), roll.total);
        }
        tracing::debug!(?method, scores = ?generated.scores, "Rolled ability scores");
        Ok(generated)
    }

    /// Statistics for `formula`, if it has been rolled.
    pub fn stats(&self, formula: &str) -> Option<RollStats> {
        let key = DiceExpression::parse(formula)
            .map(|expr| expr.to_string())
            .unwrap_or_else(|_| formula.to_string());
        self.stats
            .get(&key)
            .map(|entry| RollStats::from_tally(key.clone(), *entry.value()))
    }

    /// Statistics for every formula rolled so far, ordered by formula.
    pub fn all_stats(&self) -> Vec<RollStats> {
        let mut all: Vec<RollStats> = self
            .stats
            .iter()
            .map(|entry| RollStats::from_tally(entry.key().clone(), *entry.value()))
            .collect();
        all.sort_by(|a, b| a.formula.cmp(&b.formula));
        all
    }

    pub fn reset_stats(&self) {
        self.stats.clear();
    }

    fn record(&self, key: String, total: i64) {
        self.stats
            .entry(key)
            .and_modify(|tally| tally.add(total))
            .or_insert_with(|| RollTally::first(total));
    }
}

fn stats_key(expr: &DiceExpression, mode: RollMode) -> String {
    match mode {
        RollMode::Advantage => format!("{expr} (advantage)"),
        RollMode::Disadvantage => format!("{expr} (disadvantage)"),
    }
}
