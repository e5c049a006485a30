use crate::chain::StageChain;

/// Print the default chain in traversal order.
pub fn run() -> anyhow::Result<()> {
    let chain = StageChain::default_chain();
    for (idx, stage) in chain.stages().iter().enumerate() {
        println!(
            "{:>2}. {:<12} {:>2} rule(s)  {}",
            idx + 1,
            stage.name(),
            stage.rules().len(),
            stage.message()
        );
    }
    Ok(())
}
