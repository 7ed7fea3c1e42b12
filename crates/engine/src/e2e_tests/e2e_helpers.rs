//! Shared setup for end-to-end scenarios.

use std::io::Write;

use sheetforge_domain::value_objects::{AbilityScores, CharacterName};
use sheetforge_domain::{Character, RuleTables};

use crate::infrastructure::config::AppConfig;
use crate::App;

pub struct E2ETestContext {
    pub app: App,
}

impl E2ETestContext {
    pub fn srd() -> Self {
        Self {
            app: App::with_tables(AppConfig::default(), RuleTables::srd()),
        }
    }
}

pub fn create_test_character(
    name: &str,
    race: &str,
    class: &str,
    level: u32,
    abilities: AbilityScores,
) -> Character {
    let name = CharacterName::new(name).expect("valid test name");
    Character::new(name, race, class, abilities).with_class_levels(class, level)
}

/// Write `character` to a temp file the way a client would save it.
pub fn write_character_file(character: &Character) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    let json = serde_json::to_string_pretty(character).expect("serialize character");
    file.write_all(json.as_bytes()).expect("write character");
    file
}
