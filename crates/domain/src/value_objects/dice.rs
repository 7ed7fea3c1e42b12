//! Dice expression parsing and evaluation
//!
//! Supports formulas like "1d20+5", "2d6-1", "4d6dl1", "2d20kh1", "d8".
//! Terms are joined left to right with `+` and `-`; a dice term may carry one
//! selector (`dl`/`dh` drop lowest/highest N, `kh`/`kl` keep highest/lowest N).
//! Whitespace is ignored and letters are case-insensitive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::random::{RandomSource, RandomSourceError};

/// Largest number of dice a single term may roll.
pub const MAX_DICE_COUNT: u32 = 1_000;
/// Largest die size accepted.
pub const MAX_DIE_SIDES: u32 = 10_000;
/// Largest flat modifier accepted.
pub const MAX_FLAT_VALUE: u32 = 1_000_000;

/// Errors from parsing or rolling a dice expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    /// The formula does not match the grammar or breaks a term invariant
    #[error("Malformed dice expression at '{token}': {reason}")]
    MalformedExpression { token: String, reason: String },
    /// Advantage/disadvantage requested for something other than a lone 1d20
    #[error("Advantage and disadvantage need a single 1d20 term, got '{0}'")]
    UnsupportedForAdvantage(String),
    /// The injected random source failed
    #[error(transparent)]
    RandomSourceFailure(#[from] RandomSourceError),
}

impl DiceError {
    fn malformed(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedExpression {
            token: token.into(),
            reason: reason.into(),
        }
    }
}

/// Sign applied to a term's subtotal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    fn apply(self, value: i64) -> i64 {
        match self {
            Sign::Plus => value,
            Sign::Minus => -value,
        }
    }
}

/// Which rolls of a dice term count toward its subtotal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    DropLowest(u32),
    DropHighest(u32),
    KeepHighest(u32),
    KeepLowest(u32),
}

impl Selection {
    pub fn amount(&self) -> u32 {
        match *self {
            Selection::DropLowest(n)
            | Selection::DropHighest(n)
            | Selection::KeepHighest(n)
            | Selection::KeepLowest(n) => n,
        }
    }

    /// How many of `count` rolls survive the selection.
    pub fn kept_count(&self, count: u32) -> u32 {
        match *self {
            Selection::DropLowest(n) | Selection::DropHighest(n) => count - n,
            Selection::KeepHighest(n) | Selection::KeepLowest(n) => n,
        }
    }

    /// Kept rolls, highest first.
    fn select(&self, rolls: &[u32]) -> Vec<u32> {
        let mut sorted = rolls.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        let len = sorted.len();
        let n = (self.amount() as usize).min(len);
        match *self {
            Selection::DropLowest(_) => sorted[..len - n].to_vec(),
            Selection::DropHighest(_) => sorted[n..].to_vec(),
            Selection::KeepHighest(_) => sorted[..n].to_vec(),
            Selection::KeepLowest(_) => sorted[len - n..].to_vec(),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Selection::DropLowest(_) => "dl",
            Selection::DropHighest(_) => "dh",
            Selection::KeepHighest(_) => "kh",
            Selection::KeepLowest(_) => "kl",
        };
        write!(f, "{}{}", code, self.amount())
    }
}

/// `count` dice with `sides` faces, optionally filtered by a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceTerm {
    count: u32,
    sides: u32,
    selection: Option<Selection>,
}

impl DiceTerm {
    /// Create a dice term, enforcing count, size and selection bounds.
    pub fn new(count: u32, sides: u32, selection: Option<Selection>) -> Result<Self, DiceError> {
        let term = Self {
            count,
            sides,
            selection,
        };
        let token = term.to_string();
        if count == 0 {
            return Err(DiceError::malformed(token, "dice count must be at least 1"));
        }
        if count > MAX_DICE_COUNT {
            return Err(DiceError::malformed(
                token,
                format!("dice count cannot exceed {MAX_DICE_COUNT}"),
            ));
        }
        if sides < 2 {
            return Err(DiceError::malformed(token, "die size must be at least 2"));
        }
        if sides > MAX_DIE_SIDES {
            return Err(DiceError::malformed(
                token,
                format!("die size cannot exceed {MAX_DIE_SIDES}"),
            ));
        }
        if let Some(selection) = selection {
            let amount = selection.amount();
            if amount == 0 || amount >= count {
                return Err(DiceError::malformed(
                    token,
                    format!("selection amount must be between 1 and {}", count - 1),
                ));
            }
        }
        Ok(term)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn sides(&self) -> u32 {
        self.sides
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn kept_count(&self) -> u32 {
        self.selection
            .map_or(self.count, |selection| selection.kept_count(self.count))
    }

    /// Raw rolls in draw order and the kept subset.
    fn roll(&self, rng: &mut dyn RandomSource) -> Result<(Vec<u32>, Vec<u32>), DiceError> {
        let raw = (0..self.count)
            .map(|_| rng.roll_die(self.sides))
            .collect::<Result<Vec<_>, _>>()?;
        let kept = match self.selection {
            Some(selection) => selection.select(&raw),
            None => raw.clone(),
        };
        Ok((raw, kept))
    }
}

impl fmt::Display for DiceTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        if let Some(selection) = self.selection {
            write!(f, "{selection}")?;
        }
        Ok(())
    }
}

/// Body of a term, before its sign is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Flat(u32),
    Dice(DiceTerm),
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermKind::Flat(value) => write!(f, "{value}"),
            TermKind::Dice(dice) => write!(f, "{dice}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    sign: Sign,
    kind: TermKind,
}

impl Term {
    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn kind(&self) -> &TermKind {
        &self.kind
    }

    fn bounds(&self) -> (i64, i64) {
        let (low, high) = match self.kind {
            TermKind::Flat(value) => (i64::from(value), i64::from(value)),
            TermKind::Dice(dice) => {
                let kept = i64::from(dice.kept_count());
                (kept, kept * i64::from(dice.sides))
            }
        };
        match self.sign {
            Sign::Plus => (low, high),
            Sign::Minus => (-high, -low),
        }
    }

    fn roll(&self, rng: &mut dyn RandomSource) -> Result<TermRoll, DiceError> {
        let (raw_rolls, kept_rolls, magnitude) = match self.kind {
            TermKind::Flat(value) => (Vec::new(), Vec::new(), i64::from(value)),
            TermKind::Dice(dice) => {
                let (raw, kept) = dice.roll(rng)?;
                let sum = kept.iter().map(|&face| i64::from(face)).sum();
                (raw, kept, sum)
            }
        };
        Ok(TermRoll {
            term: self.kind.to_string(),
            sign: self.sign,
            raw_rolls,
            kept_rolls,
            subtotal: self.sign.apply(magnitude),
        })
    }
}

/// A parsed dice formula
///
/// Immutable once parsed. `Display` renders canonical text that parses back to
/// an identical expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceExpression {
    terms: Vec<Term>,
}

impl DiceExpression {
    /// Parse a formula such as "1d20+5" or "4d6dl1".
    pub fn parse(input: &str) -> Result<Self, DiceError> {
        let normalized: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(DiceError::malformed("", "empty formula"));
        }

        let (mut sign, mut rest) = if let Some(stripped) = normalized.strip_prefix('-') {
            (Sign::Minus, stripped)
        } else if let Some(stripped) = normalized.strip_prefix('+') {
            (Sign::Plus, stripped)
        } else {
            (Sign::Plus, normalized.as_str())
        };
        let mut operator = &normalized[..normalized.len() - rest.len()];

        let mut terms = Vec::new();
        loop {
            let end = rest
                .find(|c: char| c == '+' || c == '-')
                .unwrap_or(rest.len());
            let (text, tail) = rest.split_at(end);
            if text.is_empty() {
                let token = if operator.is_empty() { rest } else { operator };
                return Err(DiceError::malformed(
                    token,
                    "expected a number or dice term",
                ));
            }
            terms.push(Term {
                sign,
                kind: parse_term(text)?,
            });

            let Some(next) = tail.chars().next() else {
                break;
            };
            sign = if next == '-' { Sign::Minus } else { Sign::Plus };
            operator = tail;
            rest = &tail[1..];
        }

        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Smallest total this expression can produce.
    pub fn min_total(&self) -> i64 {
        self.terms.iter().map(|term| term.bounds().0).sum()
    }

    /// Largest total this expression can produce.
    pub fn max_total(&self) -> i64 {
        self.terms.iter().map(|term| term.bounds().1).sum()
    }

    /// Roll every term against `rng` and sum the signed subtotals.
    pub fn evaluate(&self, rng: &mut dyn RandomSource) -> Result<RollResult, DiceError> {
        let mut terms = Vec::with_capacity(self.terms.len());
        let mut total = 0_i64;
        for term in &self.terms {
            let roll = term.roll(rng)?;
            total += roll.subtotal;
            terms.push(roll);
        }
        Ok(RollResult {
            formula: self.to_string(),
            terms,
            total,
        })
    }

    /// Roll twice and keep the higher total.
    pub fn roll_advantage(&self, rng: &mut dyn RandomSource) -> Result<AdvantageRoll, DiceError> {
        self.roll_with_mode(RollMode::Advantage, rng)
    }

    /// Roll twice and keep the lower total.
    pub fn roll_disadvantage(
        &self,
        rng: &mut dyn RandomSource,
    ) -> Result<AdvantageRoll, DiceError> {
        self.roll_with_mode(RollMode::Disadvantage, rng)
    }

    /// Roll twice under `mode`; only a lone, positive, unfiltered 1d20 qualifies.
    pub fn roll_with_mode(
        &self,
        mode: RollMode,
        rng: &mut dyn RandomSource,
    ) -> Result<AdvantageRoll, DiceError> {
        if !self.is_single_d20() {
            return Err(DiceError::UnsupportedForAdvantage(self.to_string()));
        }
        let first = self.evaluate(rng)?;
        let second = self.evaluate(rng)?;
        let total = match mode {
            RollMode::Advantage => first.total.max(second.total),
            RollMode::Disadvantage => first.total.min(second.total),
        };
        Ok(AdvantageRoll {
            mode,
            first,
            second,
            total,
        })
    }

    fn is_single_d20(&self) -> bool {
        matches!(
            self.terms.as_slice(),
            [Term {
                sign: Sign::Plus,
                kind: TermKind::Dice(DiceTerm {
                    count: 1,
                    sides: 20,
                    selection: None,
                }),
            }]
        )
    }
}

fn parse_term(text: &str) -> Result<TermKind, DiceError> {
    let Some((count_text, after)) = text.split_once('d') else {
        return Ok(TermKind::Flat(parse_number(
            text,
            "flat modifier",
            MAX_FLAT_VALUE,
        )?));
    };

    // "d20" means "1d20"
    let count = if count_text.is_empty() {
        1
    } else {
        parse_number(count_text, "dice count", u32::MAX)?
    };

    let sides_end = after
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after.len());
    let (sides_text, selector_text) = after.split_at(sides_end);
    if sides_text.is_empty() {
        return Err(DiceError::malformed(text, "missing die size"));
    }
    let sides = parse_number(sides_text, "die size", u32::MAX)?;

    let selection = if selector_text.is_empty() {
        None
    } else {
        Some(parse_selection(selector_text)?)
    };

    Ok(TermKind::Dice(DiceTerm::new(count, sides, selection)?))
}

fn parse_selection(text: &str) -> Result<Selection, DiceError> {
    let mut chars = text.chars();
    let code = (chars.next(), chars.next());
    let build: fn(u32) -> Selection = match code {
        (Some('d'), Some('l')) => Selection::DropLowest,
        (Some('d'), Some('h')) => Selection::DropHighest,
        (Some('k'), Some('h')) => Selection::KeepHighest,
        (Some('k'), Some('l')) => Selection::KeepLowest,
        _ => {
            return Err(DiceError::malformed(
                text,
                "unknown selector, expected dl, dh, kh or kl",
            ))
        }
    };
    let amount = parse_number(chars.as_str(), "selection amount", MAX_DICE_COUNT)?;
    Ok(build(amount))
}

fn parse_number(text: &str, what: &str, max: u32) -> Result<u32, DiceError> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(DiceError::malformed(text, format!("expected digits for {what}")));
    }
    let value: u64 = text
        .parse()
        .map_err(|_| DiceError::malformed(text, format!("{what} is too large")))?;
    u32::try_from(value)
        .ok()
        .filter(|value| *value <= max)
        .ok_or_else(|| DiceError::malformed(text, format!("{what} cannot exceed {max}")))
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            match (i, term.sign) {
                (0, Sign::Plus) => {}
                (_, Sign::Minus) => f.write_str("-")?,
                (_, Sign::Plus) => f.write_str("+")?,
            }
            write!(f, "{}", term.kind)?;
        }
        Ok(())
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DiceExpression {
    type Error = DiceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<DiceExpression> for String {
    fn from(expr: DiceExpression) -> String {
        expr.to_string()
    }
}

/// Outcome of one term of a roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermRoll {
    /// Unsigned canonical text of the term ("4d6dl1", "5")
    pub term: String,
    pub sign: Sign,
    /// Every die drawn, in draw order (empty for flat terms)
    pub raw_rolls: Vec<u32>,
    /// Dice that count toward the subtotal; highest first when a selector applies
    pub kept_rolls: Vec<u32>,
    pub subtotal: i64,
}

/// Structured result of evaluating a dice expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollResult {
    pub formula: String,
    pub terms: Vec<TermRoll>,
    pub total: i64,
}

impl RollResult {
    /// The face of the only die kept, when exactly one die counted.
    pub fn natural(&self) -> Option<u32> {
        let mut kept = self.terms.iter().flat_map(|term| term.kept_rolls.iter());
        match (kept.next(), kept.next()) {
            (Some(&face), None) => Some(face),
            _ => None,
        }
    }
}

/// Advantage keeps the higher of two rolls, disadvantage the lower
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollMode {
    Advantage,
    Disadvantage,
}

/// Both constituent rolls of an advantage/disadvantage roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvantageRoll {
    pub mode: RollMode,
    pub first: RollResult,
    pub second: RollResult,
    pub total: i64,
}

impl AdvantageRoll {
    /// The constituent roll whose total was used.
    pub fn kept(&self) -> &RollResult {
        let first_wins = match self.mode {
            RollMode::Advantage => self.first.total >= self.second.total,
            RollMode::Disadvantage => self.first.total <= self.second.total,
        };
        if first_wins {
            &self.first
        } else {
            &self.second
        }
    }
}
