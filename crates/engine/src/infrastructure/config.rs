//! Engine configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use sheetforge_domain::rules::HitPointPolicy;

pub const RULES_PATH_VAR: &str = "SHEETFORGE_RULES_PATH";
pub const SRD_VAR: &str = "SHEETFORGE_SRD";
pub const HP_MODE_VAR: &str = "SHEETFORGE_HP_MODE";
pub const SHEET_CACHE_VAR: &str = "SHEETFORGE_SHEET_CACHE";
pub const SHEET_CACHE_TTL_VAR: &str = "SHEETFORGE_SHEET_CACHE_TTL_SECS";
pub const SHEET_CACHE_CAPACITY_VAR: &str = "SHEETFORGE_SHEET_CACHE_CAPACITY";

const DEFAULT_SHEET_CACHE_TTL: Duration = Duration::from_secs(600);
const DEFAULT_SHEET_CACHE_CAPACITY: usize = 1024;

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "sheetforge=info,sheetforge_engine=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// JSON rule tables merged over the built-in set
    pub rules_path: Option<PathBuf>,
    /// Whether the built-in SRD tables are loaded
    pub include_srd: bool,
    /// Overrides the rule tables' hit point policy when set
    pub hit_points: Option<HitPointPolicy>,
    pub sheet_cache: bool,
    pub sheet_cache_ttl: Duration,
    /// Most sheets kept before the oldest is evicted
    pub sheet_cache_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            include_srd: true,
            hit_points: None,
            sheet_cache: true,
            sheet_cache_ttl: DEFAULT_SHEET_CACHE_TTL,
            sheet_cache_capacity: DEFAULT_SHEET_CACHE_CAPACITY,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, so tests need not touch the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let rules_path = lookup(RULES_PATH_VAR)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let include_srd = match lookup(SRD_VAR) {
            Some(value) => parse_flag(&value).with_context(|| format!("invalid {SRD_VAR}"))?,
            None => true,
        };

        let hit_points = match lookup(HP_MODE_VAR) {
            Some(value) => {
                Some(parse_hit_points(&value).with_context(|| format!("invalid {HP_MODE_VAR}"))?)
            }
            None => None,
        };

        let sheet_cache = match lookup(SHEET_CACHE_VAR) {
            Some(value) => {
                parse_flag(&value).with_context(|| format!("invalid {SHEET_CACHE_VAR}"))?
            }
            None => true,
        };

        let sheet_cache_ttl = match lookup(SHEET_CACHE_TTL_VAR) {
            Some(value) => Duration::from_secs(
                parse_positive(&value).with_context(|| format!("invalid {SHEET_CACHE_TTL_VAR}"))?,
            ),
            None => DEFAULT_SHEET_CACHE_TTL,
        };

        let sheet_cache_capacity = match lookup(SHEET_CACHE_CAPACITY_VAR) {
            Some(value) => {
                let capacity = parse_positive(&value)
                    .with_context(|| format!("invalid {SHEET_CACHE_CAPACITY_VAR}"))?;
                usize::try_from(capacity)
                    .with_context(|| format!("invalid {SHEET_CACHE_CAPACITY_VAR}"))?
            }
            None => DEFAULT_SHEET_CACHE_CAPACITY,
        };

        Ok(Self {
            rules_path,
            include_srd,
            hit_points,
            sheet_cache,
            sheet_cache_ttl,
            sheet_cache_capacity,
        })
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected true or false, got {other:?}"),
    }
}

fn parse_positive(value: &str) -> anyhow::Result<u64> {
    let number: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("expected a whole number, got {value:?}"))?;
    if number == 0 {
        bail!("must be greater than zero");
    }
    Ok(number)
}

fn parse_hit_points(value: &str) -> anyhow::Result<HitPointPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "average" | "avg" => Ok(HitPointPolicy::Average),
        "max" | "maximum" => Ok(HitPointPolicy::Maximum),
        other => bail!("expected average or max, got {other:?}"),
    }
}
