//! Command-line surface of the `sheetforge` binary.
//!
//! Commands print JSON so their output can be piped into other tools.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use serde_json::{json, Value};
use sheetforge_domain::value_objects::{
    point_buy_total, AbilityScores, GenerationMethod, RandomSource, RollMode, ScriptedRandom,
    DEFAULT_POINT_BUY_BUDGET,
};

use crate::app::App;
use crate::infrastructure::random::{SeededRandom, SystemRandom};
use crate::infrastructure::rule_tables::{load_rule_tables, JsonFileRules};
use crate::use_cases::CharacterSheetService;

pub const USAGE: &str = "\
usage:
  sheetforge roll <formula> [--advantage | --disadvantage] [--seed N | --rolls A,B,...]
  sheetforge sheet <character.json>
  sheetforge abilities [4d6 | 3d6] [--seed N | --rolls A,B,...]
  sheetforge abilities point-buy STR DEX CON INT WIS CHA [--budget N]
  sheetforge validate-rules <rules.json>";

/// Where die faces come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dice {
    System,
    Seeded(u64),
    /// Replay of physical or recorded rolls
    Scripted(Vec<u32>),
}

impl Dice {
    fn source(&self) -> Box<dyn RandomSource> {
        match self {
            Dice::System => Box::new(SystemRandom::new()),
            Dice::Seeded(seed) => Box::new(SeededRandom::new(*seed)),
            Dice::Scripted(faces) => Box::new(ScriptedRandom::new(faces.iter().copied())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Roll {
        formula: String,
        mode: Option<RollMode>,
        dice: Dice,
    },
    Sheet {
        path: PathBuf,
    },
    Abilities {
        method: GenerationMethod,
        dice: Dice,
    },
    PointBuy {
        scores: AbilityScores,
        budget: u32,
    },
    ValidateRules {
        path: PathBuf,
    },
}

/// Parse the arguments after the program name.
pub fn parse_args<I, S>(args: I) -> anyhow::Result<Command>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let (command, rest) = args
        .split_first()
        .ok_or_else(|| anyhow!("missing command\n{USAGE}"))?;

    let mut positional = Vec::new();
    let mut mode = None;
    let mut dice = Dice::System;
    let mut budget = DEFAULT_POINT_BUY_BUDGET;
    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--advantage" | "--adv" => mode = Some(RollMode::Advantage),
            "--disadvantage" | "--dis" => mode = Some(RollMode::Disadvantage),
            "--seed" => {
                let value = iter.next().ok_or_else(|| anyhow!("--seed needs a value"))?;
                let seed = value
                    .parse()
                    .with_context(|| format!("invalid seed {value:?}"))?;
                dice = Dice::Seeded(seed);
            }
            "--rolls" => {
                let value = iter.next().ok_or_else(|| anyhow!("--rolls needs a value"))?;
                dice = Dice::Scripted(parse_faces(value)?);
            }
            "--budget" => {
                let value = iter.next().ok_or_else(|| anyhow!("--budget needs a value"))?;
                budget = value
                    .parse()
                    .with_context(|| format!("invalid budget {value:?}"))?;
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            _ => positional.push(arg.as_str()),
        }
    }

    match (command.as_str(), positional.as_slice()) {
        ("roll", [formula]) => Ok(Command::Roll {
            formula: formula.to_string(),
            mode,
            dice,
        }),
        ("sheet", [path]) => Ok(Command::Sheet {
            path: PathBuf::from(path),
        }),
        ("abilities", ["point-buy", scores @ ..]) => Ok(Command::PointBuy {
            scores: parse_scores(scores)?,
            budget,
        }),
        ("abilities", []) => Ok(Command::Abilities {
            method: GenerationMethod::FourD6DropLowest,
            dice,
        }),
        ("abilities", [method]) => Ok(Command::Abilities {
            method: method.parse()?,
            dice,
        }),
        ("validate-rules", [path]) => Ok(Command::ValidateRules {
            path: PathBuf::from(path),
        }),
        (other, _) => bail!("unrecognized command line for {other:?}\n{USAGE}"),
    }
}

fn parse_faces(value: &str) -> anyhow::Result<Vec<u32>> {
    value
        .split(',')
        .map(|face| {
            face.trim()
                .parse()
                .with_context(|| format!("invalid die face {face:?}"))
        })
        .collect()
}

fn parse_scores(values: &[&str]) -> anyhow::Result<AbilityScores> {
    let scores = values
        .iter()
        .map(|v| v.parse::<i32>().with_context(|| format!("invalid score {v:?}")))
        .collect::<anyhow::Result<Vec<i32>>>()?;
    match scores.as_slice() {
        &[strength, dexterity, constitution, intelligence, wisdom, charisma] => Ok(
            AbilityScores::new(strength, dexterity, constitution, intelligence, wisdom, charisma),
        ),
        _ => bail!("point-buy needs six scores, got {}", scores.len()),
    }
}

/// Run `command` against `app` and return its JSON output.
pub fn execute(app: &App, command: Command) -> anyhow::Result<Value> {
    match command {
        Command::Roll {
            formula,
            mode,
            dice,
        } => {
            let mut rng = dice.source();
            let output = match mode {
                None => serde_json::to_value(app.dice.roll(&formula, rng.as_mut())?)?,
                Some(mode) => {
                    serde_json::to_value(app.dice.roll_with_mode(&formula, mode, rng.as_mut())?)?
                }
            };
            Ok(output)
        }
        Command::Sheet { path } => {
            let character = CharacterSheetService::load_character(&path)?;
            let stats = app
                .sheets
                .compute(&character)
                .with_context(|| format!("computing sheet for {}", path.display()))?;
            tracing::info!(
                character = %character.name(),
                level = stats.total_level,
                "Computed character sheet"
            );
            Ok(json!({ "character": character, "stats": stats }))
        }
        Command::Abilities { method, dice } => {
            let mut rng = dice.source();
            let generated = app.dice.roll_abilities(method, rng.as_mut())?;
            Ok(serde_json::to_value(generated)?)
        }
        Command::PointBuy { scores, budget } => {
            let spent = point_buy_total(&scores, budget)?;
            Ok(json!({ "scores": scores, "spent": spent, "budget": budget }))
        }
        Command::ValidateRules { path } => {
            let source = JsonFileRules::new(&path);
            let tables = load_rule_tables(&app.config, &[&source])
                .with_context(|| format!("validating {}", path.display()))?;
            Ok(json!({
                "valid": true,
                "races": tables.races.len(),
                "classes": tables.classes.len(),
                "feats": tables.feats.len(),
                "items": tables.items.len(),
                "skills": tables.skills.len(),
            }))
        }
    }
}
