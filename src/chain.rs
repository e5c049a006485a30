use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrublineError};
use crate::stage::builtin::{self, StageId};
use crate::stage::Stage;

/// Per-call mutable state threaded through one chain traversal. Created
/// fresh for every run and discarded afterwards, so the processed flag can
/// never leak between calls or between chains shared across threads.
#[derive(Debug)]
pub struct ProcessingContext {
    pub value: String,
    pub processed: bool,
}

impl ProcessingContext {
    pub fn new(input: &str) -> Self {
        Self {
            value: input.to_string(),
            processed: false,
        }
    }
}

/// How the chain reacts once a stage has changed the string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainMode {
    /// Faithful single-application policy: the first stage that changes the
    /// string wins, every later stage passes the value through untouched.
    #[default]
    FirstMatch,
    /// Apply every stage in traversal order, logging each one that fires.
    All,
}

impl std::str::FromStr for ChainMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first-match" | "first" => Ok(ChainMode::FirstMatch),
            "all" => Ok(ChainMode::All),
            _ => Err(format!("unknown chain mode: {s} (expected first-match or all)")),
        }
    }
}

impl std::fmt::Display for ChainMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainMode::FirstMatch => write!(f, "first-match"),
            ChainMode::All => write!(f, "all"),
        }
    }
}

/// Record of one stage that fired during a traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Applied {
    /// Name of the stage that changed the string.
    pub stage: String,

    /// The stage's human-readable log message.
    pub message: String,

    /// When the stage fired.
    pub timestamp: DateTime<Utc>,
}

/// Result of one chain traversal: the final string plus the ordered record
/// of every stage that fired.
#[derive(Debug, Clone, Serialize)]
pub struct ChainOutcome {
    pub output: String,
    pub applied: Vec<Applied>,
}

/// An immutable-after-construction ordered sequence of stages. Traversal
/// always starts at the first stage; no stage name appears twice.
#[derive(Debug)]
pub struct StageChain {
    stages: Vec<Stage>,
    mode: ChainMode,
}

impl StageChain {
    /// Build a chain from explicit stages. Rejects duplicate stage names.
    pub fn new(stages: Vec<Stage>, mode: ChainMode) -> Result<Self> {
        let mut seen: Vec<&str> = Vec::with_capacity(stages.len());
        for stage in &stages {
            if seen.contains(&stage.name()) {
                return Err(ScrublineError::DuplicateStage {
                    name: stage.name().to_string(),
                });
            }
            seen.push(stage.name());
        }
        Ok(Self { stages, mode })
    }

    /// Build a chain from built-in stage ids, preserving the given order.
    pub fn from_ids(ids: &[StageId], mode: ChainMode) -> Result<Self> {
        let mut seen: Vec<StageId> = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.contains(id) {
                return Err(ScrublineError::DuplicateStage {
                    name: id.name().to_string(),
                });
            }
            seen.push(*id);
        }
        Ok(Self {
            stages: ids.iter().map(StageId::build).collect(),
            mode,
        })
    }

    /// The fixed default chain: all thirteen built-in stages in canonical
    /// order, first-match mode.
    pub fn default_chain() -> Self {
        Self {
            stages: builtin::default_order().iter().map(StageId::build).collect(),
            mode: ChainMode::FirstMatch,
        }
    }

    pub fn with_mode(mut self, mode: ChainMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ChainMode {
        self.mode
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run the full traversal with a fresh context.
    pub fn run(&self, input: &str) -> ChainOutcome {
        self.run_with_sink(input, &mut |_| {})
    }

    /// Run the full traversal, invoking `sink` at the moment each stage
    /// fires (before the traversal finishes), in traversal order.
    ///
    /// Every stage is visited even after the processed flag is set; the
    /// suppressed stages simply pass the value through untouched.
    pub fn run_with_sink(&self, input: &str, sink: &mut dyn FnMut(&Applied)) -> ChainOutcome {
        let mut ctx = ProcessingContext::new(input);
        let mut applied = Vec::new();

        for stage in &self.stages {
            if self.mode == ChainMode::FirstMatch && ctx.processed {
                continue;
            }
            let (next, changed) = stage.apply(&ctx.value);
            if !changed {
                continue;
            }
            ctx.value = next;
            ctx.processed = true;
            let record = Applied {
                stage: stage.name().to_string(),
                message: stage.message().to_string(),
                timestamp: Utc::now(),
            };
            sink(&record);
            applied.push(record);
        }

        ChainOutcome {
            output: ctx.value,
            applied,
        }
    }
}
