use crate::chain::{Applied, StageChain};

/// Sink invoked at the moment a stage fires.
pub type Sink = Box<dyn FnMut(&Applied) + Send>;

/// The orchestrator: owns a chain and the string being sanitized, runs the
/// string through the chain, and keeps the ordered log of every stage that
/// fired.
///
/// Repeat [`sanitize`](Sanitizer::sanitize) calls re-run the chain on the
/// stored result of the previous call; each call gets its own fresh
/// traversal context. Note that a second pass is not always a no-op:
/// escaping stages can fire again on their own output.
///
/// ```
/// use scrubline::Sanitizer;
///
/// let mut sanitizer = Sanitizer::new("  '; DROP TABLE users");
/// assert_eq!(sanitizer.sanitize(), "'; DROP TABLE users");
/// assert_eq!(sanitizer.messages(), ["Trim applied."]);
/// ```
pub struct Sanitizer {
    chain: StageChain,
    data: String,
    log: Vec<Applied>,
    sink: Option<Sink>,
}

impl Sanitizer {
    /// Wrap an input string with the default chain.
    pub fn new(input: impl Into<String>) -> Self {
        Self::with_chain(input, StageChain::default_chain())
    }

    /// Wrap an input string with a custom chain.
    pub fn with_chain(input: impl Into<String>, chain: StageChain) -> Self {
        Self {
            chain,
            data: input.into(),
            log: Vec::new(),
            sink: None,
        }
    }

    /// Install an observability sink, called once per firing stage as it
    /// fires. The internal log is kept either way.
    pub fn with_sink(mut self, sink: impl FnMut(&Applied) + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Run the chain once over the current string and return the result.
    pub fn sanitize(&mut self) -> String {
        let outcome = match self.sink.as_mut() {
            Some(sink) => self.chain.run_with_sink(&self.data, &mut **sink),
            None => self.chain.run(&self.data),
        };
        self.data = outcome.output;
        self.log.extend(outcome.applied);
        self.data.clone()
    }

    /// The current string (input before the first `sanitize` call, the
    /// latest output afterwards).
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Ordered log of every stage that fired, across all `sanitize` calls
    /// on this instance.
    pub fn log(&self) -> &[Applied] {
        &self.log
    }

    /// The log reduced to its human-readable messages.
    pub fn messages(&self) -> Vec<&str> {
        self.log.iter().map(|a| a.message.as_str()).collect()
    }
}

/// A sink that forwards each firing to `tracing` at info level.
pub fn tracing_sink() -> impl FnMut(&Applied) + Send + 'static {
    |applied: &Applied| {
        tracing::info!(stage = %applied.stage, "{}", applied.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainMode;
    use crate::stage::StageId;

    #[test]
    fn sanitize_updates_stored_data() {
        let mut sanitizer = Sanitizer::new("  hello  ");
        assert_eq!(sanitizer.data(), "  hello  ");
        assert_eq!(sanitizer.sanitize(), "hello");
        assert_eq!(sanitizer.data(), "hello");
    }

    #[test]
    fn repeat_calls_rerun_on_current_string() {
        let mut sanitizer = Sanitizer::new("  hello  ");
        sanitizer.sanitize();
        // Nothing left for any stage to match.
        assert_eq!(sanitizer.sanitize(), "hello");
        assert_eq!(sanitizer.messages(), ["Trim applied."]);
    }

    #[test]
    fn repeat_call_can_fire_a_different_stage() {
        // First call trims, second call reaches the OS stage.
        let mut sanitizer = Sanitizer::new("  a|b  ");
        assert_eq!(sanitizer.sanitize(), "a|b");
        assert_eq!(sanitizer.sanitize(), "a\\|b");
        assert_eq!(
            sanitizer.messages(),
            ["Trim applied.", "OS Injection prevention applied."]
        );
    }

    #[test]
    fn sink_fires_per_stage() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let chain = StageChain::from_ids(
            &[StageId::Trim, StageId::Sql, StageId::Html],
            ChainMode::All,
        )
        .unwrap();
        let mut sanitizer = Sanitizer::with_chain("  it's  ", chain)
            .with_sink(move |a| sink_seen.lock().unwrap().push(a.stage.clone()));

        assert_eq!(sanitizer.sanitize(), "it&#039;&#039;s");
        assert_eq!(*seen.lock().unwrap(), ["trim", "sql", "html"]);
    }

    #[test]
    fn no_match_leaves_log_empty() {
        let mut sanitizer = Sanitizer::new("plain");
        assert_eq!(sanitizer.sanitize(), "plain");
        assert!(sanitizer.log().is_empty());
    }
}
