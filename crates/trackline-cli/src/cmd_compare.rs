use crate::host::{self, Output, TargetArgs};
use anyhow::Result;
use trackline::ViewConfig;

pub async fn run(target: TargetArgs, output: Output) -> Result<()> {
    let node = host::build_node(&target, ViewConfig::default())?;
    let comparison = node.get_files_comparison().await?;

    if output.json {
        return output.print_json(&comparison);
    }

    let Some(comparison) = comparison else {
        println!("No comparison available ({})", node.classification());
        return Ok(());
    };
    println!("{}", comparison.title);
    println!("  {}..{}", comparison.ref1, comparison.ref2);
    if comparison.files.is_empty() {
        println!("  (no changed files)");
    }
    for file in &comparison.files {
        println!("  {} {}", file.status, file.path);
    }
    Ok(())
}
