//! Random source port for dice evaluation.
//!
//! The domain never owns an RNG. Callers hand a [`RandomSource`] to each
//! evaluation; the engine crate provides OS-backed and seeded sources.

use std::collections::VecDeque;

use thiserror::Error;

/// The random source could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Random source failure: {0}")]
pub struct RandomSourceError(String);

impl RandomSourceError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Uniform integer source for die rolls.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource {
    /// Draw one value uniformly from `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> Result<u32, RandomSourceError>;
}

/// Replays a fixed sequence of die faces.
///
/// Used to reproduce physical rolls or recorded results. Running out of
/// values, or a value that does not fit the die being rolled, is an error
/// rather than a silent substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedRandom {
    values: VecDeque<u32>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn roll_die(&mut self, sides: u32) -> Result<u32, RandomSourceError> {
        let value = self
            .values
            .pop_front()
            .ok_or_else(|| RandomSourceError::new("scripted rolls exhausted"))?;
        if value == 0 || value > sides {
            return Err(RandomSourceError::new(format!(
                "scripted roll {value} does not fit a d{sides}"
            )));
        }
        Ok(value)
    }
}
