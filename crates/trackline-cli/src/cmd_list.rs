use crate::host::{self, Output, RepoArgs};
use anyhow::Result;

pub fn run(args: RepoArgs, output: Output) -> Result<()> {
    let repo = host::open_repo(&args)?;
    let branches = trackline_git::list_tracking(&repo)?;

    if output.json {
        let items: Vec<serde_json::Value> = branches
            .iter()
            .map(|b| {
                serde_json::json!({
                    "ref": b.status.reference,
                    "head": b.head_short,
                    "upstream": b.status.upstream,
                    "ahead": b.status.state.ahead,
                    "behind": b.status.state.behind,
                    "classifications": b.classifications(),
                })
            })
            .collect();
        return output.print_json(&serde_json::json!({ "branches": items }));
    }

    if branches.is_empty() {
        println!("  (no local branches)");
        return Ok(());
    }
    for b in &branches {
        let upstream = b.status.upstream.as_deref().unwrap_or("-");
        println!(
            "  {} {} -> {} [{}]",
            b.head_short,
            b.status.reference,
            upstream,
            host::join(&b.classifications())
        );
    }
    Ok(())
}
