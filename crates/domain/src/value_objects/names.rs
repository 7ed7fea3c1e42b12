//! Character names as printed on a sheet.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Longest name that fits the sheet header
const MAX_NAME_CHARS: usize = 64;

/// Trimmed, non-empty, single-line character name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CharacterName(String);

impl CharacterName {
    pub fn new(name: impl AsRef<str>) -> Result<Self, DomainError> {
        let name = name.as_ref().trim();
        let problem = if name.is_empty() {
            Some("is empty".to_string())
        } else if name.chars().any(char::is_control) {
            Some("contains control characters".to_string())
        } else if name.chars().count() > MAX_NAME_CHARS {
            Some(format!("is longer than {MAX_NAME_CHARS} characters"))
        } else {
            None
        };
        match problem {
            Some(problem) => Err(DomainError::validation(format!(
                "Character name {problem}"
            ))),
            None => Ok(Self(name.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CharacterName {
    type Error = DomainError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<CharacterName> for String {
    fn from(name: CharacterName) -> String {
        name.0
    }
}
