use crate::host::{self, Output, TargetArgs, ViewArgs};
use anyhow::Result;
use trackline::TrackingChild;

pub async fn run(target: TargetArgs, view: ViewArgs, pages: usize, output: Output) -> Result<()> {
    let node = host::build_node(&target, view.to_config()?)?;

    let mut children = node.get_children().await?;
    for _ in 1..pages {
        if !node.load_more(None).await? {
            break;
        }
        children = node.get_children().await?;
    }

    if output.json {
        return output.print_json(&serde_json::json!({
            "id": node.id(),
            "classification": node.classification(),
            "children": children,
        }));
    }

    if children.is_empty() {
        println!("  (nothing to show: {})", node.classification());
        return Ok(());
    }
    for child in &children {
        println!("{}", render(child));
    }
    Ok(())
}

fn render(child: &TrackingChild) -> String {
    match child {
        TrackingChild::FilesSummary(entry) => format!(
            "files: {} {} {}",
            entry.reference, entry.direction, entry.upstream
        ),
        TrackingChild::File(file) => match &file.old_path {
            Some(old) => format!("  {} {} -> {}", file.status, old, file.path),
            None => format!("  {} {}", file.status, file.path),
        },
        TrackingChild::DateMarker { date } => format!("-- {} --", date),
        TrackingChild::Commit(commit) => format!(
            "  {} {} ({})",
            commit.short_id, commit.subject, commit.author
        ),
        TrackingChild::LoadMore(_) => "  ... more".to_string(),
    }
}
