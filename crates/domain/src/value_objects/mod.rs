//! Value objects - Immutable objects defined by their attributes

mod abilities;
mod dice;
mod modifier;
mod names;
mod random;

pub use abilities::{
    ability_modifier, point_buy_cost, point_buy_total, roll_ability_scores, Ability,
    AbilityScores, GeneratedAbilities, GenerationMethod, DEFAULT_POINT_BUY_BUDGET,
    POINT_BUY_MAX_SCORE, POINT_BUY_MIN_SCORE,
};
pub use dice::{
    AdvantageRoll, DiceError, DiceExpression, DiceTerm, RollMode, RollResult, Selection, Sign,
    Term, TermKind, TermRoll, MAX_DICE_COUNT, MAX_DIE_SIDES, MAX_FLAT_VALUE,
};
pub use modifier::{
    stack_for_target, stack_modifiers, BonusType, Modifier, ModifierSource, ModifierTarget,
    SaveKind, StackedModifiers,
};
pub use names::CharacterName;
pub use random::{RandomSource, RandomSourceError, ScriptedRandom};

#[cfg(test)]
pub use random::MockRandomSource;
