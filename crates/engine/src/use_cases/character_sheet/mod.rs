//! Character sheet use cases.
//!
//! Computes derived stats for character snapshots and applies allocation
//! operations against the active rule tables. Accepted results are memoized
//! by snapshot fingerprint in a bounded, expiring cache.

mod cache;
mod error;
mod fingerprint;

pub use cache::SheetCache;
pub use error::SheetError;
pub use fingerprint::character_fingerprint;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sheetforge_domain::rules::{self, Allocation};
use sheetforge_domain::value_objects::Ability;
use sheetforge_domain::{
    Character, ClassId, DerivedStats, FeatId, ItemId, RuleTables, SkillId, ValidationErrors,
};

/// Hit and miss counts for the sheet cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct CharacterSheetService {
    tables: Arc<RuleTables>,
    /// `None` when caching is disabled.
    cache: Option<SheetCache>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CharacterSheetService {
    pub fn new(tables: Arc<RuleTables>, cache: Option<SheetCache>) -> Self {
        Self {
            tables,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    /// Read a character snapshot from a JSON file.
    pub fn load_character(path: &Path) -> Result<Character, SheetError> {
        let text = std::fs::read_to_string(path).map_err(|source| SheetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Derived stats for `character`.
    pub fn compute(&self, character: &Character) -> Result<DerivedStats, SheetError> {
        let Some(cache) = &self.cache else {
            return Ok(self.recompute(character)?);
        };

        let key = character_fingerprint(character)?;
        if let Some(stats) = cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(character = %character.name(), "Sheet cache hit");
            return Ok(stats);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let stats = self.recompute(character)?;
        cache.insert(key, stats.clone());
        Ok(stats)
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.as_ref().map_or(0, SheetCache::len),
        }
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    // === Allocation Methods ===

    pub fn allocate_skill_ranks(
        &self,
        character: &Character,
        skill: &SkillId,
        ranks: u32,
    ) -> Result<Allocation, SheetError> {
        self.accept(
            "allocate_skill_ranks",
            character,
            rules::allocate_skill_ranks(character, skill, ranks, &self.tables),
        )
    }

    pub fn take_feat(
        &self,
        character: &Character,
        feat: &FeatId,
    ) -> Result<Allocation, SheetError> {
        self.accept(
            "take_feat",
            character,
            rules::take_feat(character, feat, &self.tables),
        )
    }

    pub fn equip_item(
        &self,
        character: &Character,
        item: &ItemId,
    ) -> Result<Allocation, SheetError> {
        self.accept(
            "equip_item",
            character,
            rules::equip_item(character, item, &self.tables),
        )
    }

    pub fn unequip_item(
        &self,
        character: &Character,
        item: &ItemId,
    ) -> Result<Allocation, SheetError> {
        self.accept(
            "unequip_item",
            character,
            rules::unequip_item(character, item, &self.tables),
        )
    }

    pub fn add_class_level(
        &self,
        character: &Character,
        class: &ClassId,
        hit_point_roll: Option<u32>,
    ) -> Result<Allocation, SheetError> {
        self.accept(
            "add_class_level",
            character,
            rules::add_class_level(character, class, hit_point_roll, &self.tables),
        )
    }

    pub fn record_hit_point_roll(
        &self,
        character: &Character,
        character_level: u32,
        roll: u32,
    ) -> Result<Allocation, SheetError> {
        self.accept(
            "record_hit_point_roll",
            character,
            rules::record_hit_point_roll(character, character_level, roll, &self.tables),
        )
    }

    pub fn apply_ability_increase(
        &self,
        character: &Character,
        ability: Ability,
    ) -> Result<Allocation, SheetError> {
        self.accept(
            "apply_ability_increase",
            character,
            rules::apply_ability_increase(character, ability, &self.tables),
        )
    }

    fn recompute(&self, character: &Character) -> Result<DerivedStats, ValidationErrors> {
        let stats = rules::derive_stats(character, &self.tables)?;
        tracing::debug!(
            character = %character.name(),
            level = stats.total_level,
            hit_points = stats.hit_points.max,
            armor_class = stats.armor_class.total,
            "Recomputed character sheet"
        );
        Ok(stats)
    }

    fn accept(
        &self,
        operation: &'static str,
        character: &Character,
        result: Result<Allocation, ValidationErrors>,
    ) -> Result<Allocation, SheetError> {
        match result {
            Ok(allocation) => {
                tracing::debug!(operation, character = %character.name(), "Allocation accepted");
                if let Some(cache) = &self.cache {
                    let key = character_fingerprint(&allocation.character)?;
                    cache.insert(key, allocation.stats.clone());
                }
                Ok(allocation)
            }
            Err(errors) => {
                tracing::warn!(
                    operation,
                    character = %character.name(),
                    violations = %errors,
                    "Allocation rejected"
                );
                Err(errors.into())
            }
        }
    }
}
