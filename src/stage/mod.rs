pub mod builtin;

pub use builtin::StageId;

use aho_corasick::AhoCorasick;
use regex::{NoExpand, Regex};

use crate::error::{Result, ScrublineError};

/// A single rewrite operation within a stage.
///
/// Rules are applied sequentially over the whole string: each rule sees the
/// output of the rule before it, so a replacement introduced by one rule can
/// be rewritten again by a later rule in the same stage. That ordering is
/// part of the observable contract and is pinned by the test suite.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Strip leading and trailing whitespace.
    Trim,
    /// Case-sensitive substring replacement, all occurrences.
    Literal { find: String, replace: String },
    /// Regex replacement, all occurrences. Case-insensitivity is expressed
    /// in the pattern itself via `(?i)`.
    Pattern { regex: Regex, replace: String },
}

impl Rule {
    pub fn literal(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Rule::Literal {
            find: find.into(),
            replace: replace.into(),
        }
    }

    /// Compile a pattern rule. Fails on an invalid regex.
    pub fn pattern(pattern: &str, replace: impl Into<String>) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| ScrublineError::InvalidRule {
            reason: format!("invalid pattern {pattern:?}: {e}"),
        })?;
        Ok(Rule::Pattern {
            regex,
            replace: replace.into(),
        })
    }

    fn rewrite(&self, input: &str) -> String {
        match self {
            Rule::Trim => input.trim().to_string(),
            Rule::Literal { find, replace } => input.replace(find.as_str(), replace),
            // NoExpand: replacement text is literal, `$` has no meaning.
            Rule::Pattern { regex, replace } => {
                regex.replace_all(input, NoExpand(replace)).into_owned()
            }
        }
    }
}

/// One sanitization stage: a named, ordered rule table that detects and
/// rewrites a single class of unsafe substring pattern.
///
/// Stages hold no per-call state (the processed flag lives in the chain's
/// [`ProcessingContext`](crate::chain::ProcessingContext)), so a stage is
/// freely shareable across calls and threads.
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    message: String,
    rules: Vec<Rule>,
    /// Literal-trigger prescan. Built only when every rule is a literal, so
    /// the stage can be skipped without running its table. Never affects the
    /// result, only the cost of the no-match path.
    triggers: Option<AhoCorasick>,
}

impl Stage {
    /// Build a stage from a rule table. The log message is emitted whenever
    /// the stage changes the string.
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        rules: Vec<Rule>,
    ) -> Result<Self> {
        let name = name.into();
        let triggers = literal_triggers(&rules).map_err(|e| ScrublineError::InvalidRule {
            reason: format!("stage {name}: {e}"),
        })?;
        Ok(Self {
            name,
            message: message.into(),
            rules,
            triggers,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Apply the full rule table. Pure function of the input: returns the
    /// rewritten string and whether anything changed.
    pub fn apply(&self, input: &str) -> (String, bool) {
        if let Some(ac) = &self.triggers {
            if !ac.is_match(input) {
                return (input.to_string(), false);
            }
        }
        let mut out = input.to_string();
        for rule in &self.rules {
            out = rule.rewrite(&out);
        }
        let changed = out != input;
        (out, changed)
    }
}

/// Build the prescan automaton over literal finds, or None when a trim or
/// pattern rule means the stage must always be attempted.
fn literal_triggers(rules: &[Rule]) -> std::result::Result<Option<AhoCorasick>, aho_corasick::BuildError> {
    let mut finds = Vec::with_capacity(rules.len());
    for rule in rules {
        match rule {
            Rule::Literal { find, .. } => finds.push(find.clone()),
            Rule::Trim | Rule::Pattern { .. } => return Ok(None),
        }
    }
    if finds.is_empty() {
        return Ok(None);
    }
    AhoCorasick::new(&finds).map(Some)
}
