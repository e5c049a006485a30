use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chain::{ChainMode, StageChain};
use crate::error::{Result, ScrublineError};
use crate::stage::builtin::{self, StageId};

/// Chain configuration loaded from a YAML file.
///
/// ```yaml
/// mode: all
/// stages:
///   - trim
///   - sql
///   - html
/// ```
///
/// Both fields are optional; an empty file yields the default chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Traversal mode. Default: first-match.
    #[serde(default)]
    pub mode: ChainMode,

    /// Explicit stage list by name, in traversal order. Default: the full
    /// built-in order.
    #[serde(default)]
    pub stages: Option<Vec<String>>,
}

impl ChainConfig {
    /// Load from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&raw).map_err(|e| ScrublineError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Resolve the configured stage names and build the chain. Unknown
    /// names and duplicates are rejected.
    pub fn build_chain(&self) -> Result<StageChain> {
        let ids = match &self.stages {
            Some(names) => names
                .iter()
                .map(|name| name.parse::<StageId>())
                .collect::<Result<Vec<_>>>()?,
            None => builtin::default_order().to_vec(),
        };
        StageChain::from_ids(&ids, self.mode)
    }
}

/// Named chain variations carried over from earlier deployments. Each is a
/// subset of the full order with the relative ordering preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// All thirteen stages.
    Default,
    /// Without the SQL stage.
    NoSql,
    /// Without the XSS stage.
    NoXss,
    /// Without the VB, Ruby, and Lua stages.
    NoMinor,
}

impl Preset {
    pub fn stage_ids(&self) -> Vec<StageId> {
        let skip: &[StageId] = match self {
            Preset::Default => &[],
            Preset::NoSql => &[StageId::Sql],
            Preset::NoXss => &[StageId::Xss],
            Preset::NoMinor => &[StageId::Vb, StageId::Ruby, StageId::Lua],
        };
        builtin::default_order()
            .into_iter()
            .filter(|id| !skip.contains(id))
            .collect()
    }

    /// Build the preset's chain in the given mode.
    pub fn build_chain(&self, mode: ChainMode) -> StageChain {
        StageChain::from_ids(&self.stage_ids(), mode)
            .expect("preset stage lists contain no duplicates")
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Preset::Default),
            "no-sql" | "nosql" => Ok(Preset::NoSql),
            "no-xss" | "noxss" => Ok(Preset::NoXss),
            "no-minor" | "nominor" => Ok(Preset::NoMinor),
            _ => Err(format!("unknown preset: {s}")),
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preset::Default => write!(f, "default"),
            Preset::NoSql => write!(f, "no-sql"),
            Preset::NoXss => write!(f, "no-xss"),
            Preset::NoMinor => write!(f, "no-minor"),
        }
    }
}
