//! d20 rules: data tables, progression formulas, modifier resolution and
//! stat aggregation.

pub mod aggregation;
pub mod allocation;
mod progression;
pub mod resolver;
mod srd;
mod tables;

pub use aggregation::{
    derive_stats, recompute, AbilityLine, AcComponent, ArmorClass, AttackBonuses,
    ClassSpellSlots, DerivedStats, ExperienceProgress, HitDieSource, HitPointLevel, HitPoints,
    Pool, SavingThrow, SavingThrows, SkillLine, SpellSlotLine,
};
pub use allocation::{
    add_class_level, allocate_skill_ranks, apply_ability_increase, equip_item,
    record_hit_point_roll, take_feat, unequip_item, Allocation,
};
pub use progression::{
    ability_increases_for_level, experience_for_level, feat_slots_for_level, format_bonus,
    iterative_attacks, level_for_experience, skill_rank_cap, skill_rank_cost, BabProgression,
    BonusSpellRule, HitPointPolicy, SaveProgression, MAX_CHARACTER_LEVEL,
};
pub use resolver::{
    resolve, ArmorLimits, Resolution, ResolvedClass, ResolvedClassLevel, ResolvedFeat,
};
pub use tables::{
    ArmorProfile, ClassDefinition, ClassFeature, FeatDefinition, FeatPrerequisite,
    ItemDefinition, ItemKind, ModifierGrant, RaceDefinition, RuleTables, SkillDefinition, Size,
    Spellcasting,
};
