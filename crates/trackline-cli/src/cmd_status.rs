use crate::host::{self, Output, TargetArgs};
use anyhow::Result;

pub fn run(target: TargetArgs, output: Output) -> Result<()> {
    let repo = host::open_repo(&target.repo)?;
    let tracking = trackline_git::tracking_status(&repo, &target.branch)?;
    let classifications = tracking.classifications();

    if output.json {
        return output.print_json(&serde_json::json!({
            "status": tracking.status,
            "head": tracking.head_short,
            "upstream_missing": tracking.upstream_missing,
            "classifications": classifications,
        }));
    }

    let status = &tracking.status;
    match &status.upstream {
        Some(upstream) => println!("{} -> {}", status.reference, upstream),
        None => println!("{} (no upstream)", status.reference),
    }
    if tracking.upstream_missing {
        println!("  upstream reference is missing");
    } else if status.upstream.is_some() {
        println!(
            "  ahead {}, behind {}",
            status.state.ahead, status.state.behind
        );
    }
    println!("  status: {}", host::join(&classifications));
    Ok(())
}
