use std::io::Read;
use std::path::Path;

use crate::chain::{ChainMode, StageChain};
use crate::config::{ChainConfig, Preset};
use crate::sanitizer::{tracing_sink, Sanitizer};

/// Sanitize one string and print the result (or a JSON report) to stdout.
pub fn run(
    input: Option<String>,
    mode: Option<ChainMode>,
    preset: Option<Preset>,
    config: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let chain = resolve_chain(mode, preset, config)?;

    let input = match input {
        Some(input) => input,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut sanitizer = Sanitizer::with_chain(input, chain).with_sink(tracing_sink());
    let output = sanitizer.sanitize();

    if json {
        #[derive(serde::Serialize)]
        struct Report<'a> {
            output: &'a str,
            applied: &'a [crate::chain::Applied],
        }
        let report = Report {
            output: &output,
            applied: sanitizer.log(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{output}");
    }

    Ok(())
}

/// Config file wins over preset; an explicit `--mode` overrides both.
fn resolve_chain(
    mode: Option<ChainMode>,
    preset: Option<Preset>,
    config: Option<&Path>,
) -> anyhow::Result<StageChain> {
    let chain = if let Some(path) = config {
        ChainConfig::load(path)?.build_chain()?
    } else if let Some(preset) = preset {
        preset.build_chain(ChainMode::default())
    } else {
        StageChain::default_chain()
    };
    Ok(match mode {
        Some(mode) => chain.with_mode(mode),
        None => chain,
    })
}
