//! Application state and composition.

use std::sync::Arc;

use sheetforge_domain::RuleTables;

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::ports::RulesLoadError;
use crate::infrastructure::rule_tables::load_configured_rule_tables;
use crate::use_cases::{CharacterSheetService, DiceService, SheetCache};

/// Main application state.
pub struct App {
    pub config: AppConfig,
    pub rules: Arc<RuleTables>,
    pub dice: DiceService,
    pub sheets: CharacterSheetService,
}

impl App {
    /// Load the configured rule tables and wire the services.
    pub fn new(config: AppConfig) -> Result<Self, RulesLoadError> {
        let tables = load_configured_rule_tables(&config)?;
        Ok(Self::with_tables(config, tables))
    }

    pub fn with_tables(config: AppConfig, tables: RuleTables) -> Self {
        let rules = Arc::new(tables);
        let cache = config
            .sheet_cache
            .then(|| SheetCache::new(config.sheet_cache_ttl, config.sheet_cache_capacity));
        let sheets = CharacterSheetService::new(rules.clone(), cache);
        Self {
            config,
            rules,
            dice: DiceService::new(),
            sheets,
        }
    }
}
