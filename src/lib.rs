//! Ordered, single-application input-sanitization pipeline.
//!
//! A fixed chain of independent stages, each neutralizing one class of
//! injection risk (OS command, SQL, HTML/XSS, template, language-specific
//! code injection, directory traversal) in an untrusted string. Escaping is
//! textual and substring/regex based; nothing here parses SQL, HTML, or
//! shell grammar, and already-encoded sequences are never decoded.
//!
//! Under the default first-match mode a single `sanitize` call applies at
//! most one stage's transformation: the first stage that changes the string
//! preempts every later one. Callers expecting multi-class neutralization
//! should use [`ChainMode::All`].
//!
//! ```
//! use scrubline::Sanitizer;
//!
//! let mut sanitizer = Sanitizer::new("  hello  ");
//! assert_eq!(sanitizer.sanitize(), "hello");
//! assert_eq!(sanitizer.messages(), ["Trim applied."]);
//! ```

pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod sanitizer;
pub mod stage;

pub use chain::{Applied, ChainMode, ChainOutcome, ProcessingContext, StageChain};
pub use config::{ChainConfig, Preset};
pub use error::{Result, ScrublineError};
pub use sanitizer::Sanitizer;
pub use stage::{Rule, Stage, StageId};
