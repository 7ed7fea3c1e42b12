//! Rule table loading.
//!
//! The active tables are the built-in SRD set (unless disabled) with any
//! configured sources merged over it, then validated as a whole.

use std::path::{Path, PathBuf};

use sheetforge_domain::RuleTables;

use super::config::AppConfig;
use super::ports::{RulesLoadError, RulesSource};

/// Rule tables stored as a JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileRules {
    path: PathBuf,
}

impl JsonFileRules {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RulesSource for JsonFileRules {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<RuleTables, RulesLoadError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| RulesLoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| RulesLoadError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

/// Build the active rule tables for `config`.
pub fn load_rule_tables(
    config: &AppConfig,
    sources: &[&dyn RulesSource],
) -> Result<RuleTables, RulesLoadError> {
    if !config.include_srd && sources.is_empty() {
        return Err(RulesLoadError::NoRules);
    }

    let mut tables = if config.include_srd {
        RuleTables::srd()
    } else {
        RuleTables::default()
    };

    for source in sources {
        let overlay = source.load()?;
        tracing::info!(
            source = %source.describe(),
            races = overlay.races.len(),
            classes = overlay.classes.len(),
            feats = overlay.feats.len(),
            items = overlay.items.len(),
            skills = overlay.skills.len(),
            "Merging rule tables"
        );
        tables.merge(overlay);
    }

    if let Some(policy) = config.hit_points {
        tables.hit_points = policy;
    }

    tables.validate()?;
    tracing::info!(
        srd = config.include_srd,
        races = tables.races.len(),
        classes = tables.classes.len(),
        hit_points = ?tables.hit_points,
        "Rule tables ready"
    );
    Ok(tables)
}

/// Load the tables named by `config`, reading its rules file if one is set.
pub fn load_configured_rule_tables(config: &AppConfig) -> Result<RuleTables, RulesLoadError> {
    match &config.rules_path {
        Some(path) => load_rule_tables(config, &[&JsonFileRules::new(path)]),
        None => load_rule_tables(config, &[]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockRulesSource;
    use sheetforge_domain::rules::HitPointPolicy;
    use sheetforge_domain::{ClassId, RaceId, RuleViolation};
    use std::io::Write;

    const HOMEBREW: &str = r#"{
        "races": {
            "tiefling": {
                "name": "Tiefling",
                "baseSpeed": 30,
                "abilityAdjustments": { "dexterity": 2, "intelligence": 2, "charisma": -2 }
            }
        },
        "hitPoints": "maximum"
    }"#;

    fn write_rules(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write rules");
        file
    }

    #[test]
    fn srd_only_by_default() {
        let tables = load_configured_rule_tables(&AppConfig::default()).expect("srd");
        assert!(tables.race(&RaceId::new("dwarf")).is_some());
        assert!(tables.class(&ClassId::new("wizard")).is_some());
    }

    #[test]
    fn json_file_is_merged_over_the_srd() {
        let file = write_rules(HOMEBREW);
        let config = AppConfig {
            rules_path: Some(file.path().to_path_buf()),
            ..AppConfig::default()
        };

        let tables = load_configured_rule_tables(&config).expect("merged");
        assert!(tables.race(&RaceId::new("tiefling")).is_some());
        assert!(tables.race(&RaceId::new("elf")).is_some());
        assert_eq!(tables.hit_points, HitPointPolicy::Maximum);
    }

    #[test]
    fn config_hit_point_mode_wins_over_the_file() {
        let file = write_rules(HOMEBREW);
        let config = AppConfig {
            rules_path: Some(file.path().to_path_buf()),
            hit_points: Some(HitPointPolicy::Average),
            ..AppConfig::default()
        };
        let tables = load_configured_rule_tables(&config).expect("merged");
        assert_eq!(tables.hit_points, HitPointPolicy::Average);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = JsonFileRules::new(dir.path().join("absent.json"));
        let err = load_rule_tables(&AppConfig::default(), &[&source]).expect_err("missing");
        assert!(matches!(err, RulesLoadError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let file = write_rules(r#"{ "races": { "orc": { "speed": 30 } } }"#);
        let source = JsonFileRules::new(file.path());
        let err = load_rule_tables(&AppConfig::default(), &[&source]).expect_err("bad field");
        assert!(matches!(err, RulesLoadError::Parse { .. }));
        assert_eq!(source.path(), file.path());
    }

    #[test]
    fn dangling_references_fail_validation() {
        let file = write_rules(
            r#"{
                "classes": {
                    "scout": {
                        "name": "Scout",
                        "hitDie": 8,
                        "baseAttack": "average",
                        "fortitude": "poor",
                        "reflex": "good",
                        "will": "poor",
                        "skillPointsPerLevel": 8,
                        "classSkills": ["parkour"]
                    }
                }
            }"#,
        );
        let source = JsonFileRules::new(file.path());
        let err = load_rule_tables(&AppConfig::default(), &[&source]).expect_err("unknown skill");
        let RulesLoadError::Invalid(errors) = err else {
            panic!("expected a validation failure");
        };
        assert!(matches!(
            errors.violations()[0],
            RuleViolation::InvalidRuleData { .. }
        ));
    }

    #[test]
    fn disabling_the_srd_needs_another_source() {
        let config = AppConfig {
            include_srd: false,
            ..AppConfig::default()
        };
        assert!(matches!(
            load_rule_tables(&config, &[]),
            Err(RulesLoadError::NoRules)
        ));

        let mut source = MockRulesSource::new();
        source.expect_describe().return_const("memory".to_string());
        source
            .expect_load()
            .times(1)
            .returning(|| Ok(RuleTables::srd()));
        let tables = load_rule_tables(&config, &[&source]).expect("mocked tables");
        assert!(tables.race(&RaceId::new("human")).is_some());
    }

    #[test]
    fn source_failures_propagate() {
        let mut source = MockRulesSource::new();
        source.expect_describe().return_const("broken".to_string());
        source
            .expect_load()
            .returning(|| Err(RulesLoadError::NoRules));
        assert!(load_rule_tables(&AppConfig::default(), &[&source]).is_err());
    }
}
