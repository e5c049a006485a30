use clap::Parser;

use scrubline::cli::Cli;

fn main() -> anyhow::Result<()> {
    // Keep stdout clean for sanitized output; stage firings go to stderr.
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Cli::parse().dispatch()
}
