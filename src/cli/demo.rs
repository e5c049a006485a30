use crate::sanitizer::Sanitizer;

const EXAMPLE: &str = " Hello, World! <script>alert('XSS');</script> ";

/// Sanitize the built-in example and show each stage as it fires.
pub fn run() -> anyhow::Result<()> {
    eprintln!("scrubline: input:  {EXAMPLE:?}");

    let mut sanitizer =
        Sanitizer::new(EXAMPLE).with_sink(|applied| eprintln!("scrubline: {}", applied.message));
    let output = sanitizer.sanitize();

    eprintln!("scrubline: output: {output:?}");
    println!("{output}");
    Ok(())
}
