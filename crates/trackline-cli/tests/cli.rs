use assert_cmd::Command;
use git2::{BranchType, Oid, Repository};
use predicates::prelude::*;
use std::path::Path;

/// A repository whose current branch is two commits ahead of `origin/<branch>`.
fn ahead_repo() -> (tempfile::TempDir, String, Vec<Oid>) {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    let mut oids = Vec::new();
    for i in 1..=4 {
        let name = format!("file{}.txt", i);
        std::fs::write(dir.path().join(&name), format!("v{}", i)).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(&name)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = repo.signature().unwrap();
        let parent = oids.last().map(|oid| repo.find_commit(*oid).unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, &format!("commit {}", i), &tree, &parents)
            .unwrap();
        oids.push(oid);
    }

    let branch = repo.head().unwrap().shorthand().unwrap().to_string();
    repo.remote("origin", "https://example.com/org/repo.git").unwrap();
    repo.reference(
        &format!("refs/remotes/origin/{}", branch),
        oids[1],
        true,
        "test upstream",
    )
    .unwrap();
    repo.find_branch(&branch, BranchType::Local)
        .unwrap()
        .set_upstream(Some(&format!("origin/{}", branch)))
        .unwrap();

    (dir, branch, oids)
}

fn trackline(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("trackline").unwrap();
    cmd.args(args).arg("--repo").arg(dir);
    cmd
}

#[test]
fn test_status_reports_ahead() {
    let (dir, branch, _) = ahead_repo();
    trackline(dir.path(), &["status", &branch])
        .assert()
        .success()
        .stdout(predicate::str::contains("ahead 2, behind 0"))
        .stdout(predicate::str::contains("status: ahead"));
}

#[test]
fn test_list_json() {
    let (dir, branch, _) = ahead_repo();
    let output = trackline(dir.path(), &["list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let branches = json["branches"].as_array().unwrap();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0]["ref"], branch.as_str());
    assert_eq!(branches[0]["ahead"], 2);
    assert_eq!(branches[0]["classifications"][0], "ahead");
}

#[test]
fn test_children_json_lists_unpushed_commits() {
    let (dir, branch, oids) = ahead_repo();
    let output = trackline(dir.path(), &["children", &branch, "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let children = json["children"].as_array().unwrap();
    assert_eq!(children[0]["kind"], "files-summary");
    let commits: Vec<String> = children
        .iter()
        .filter(|c| c["kind"] == "commit")
        .map(|c| c["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(commits, vec![oids[3].to_string(), oids[2].to_string()]);
}

#[test]
fn test_children_paging() {
    let (dir, branch, _) = ahead_repo();
    trackline(dir.path(), &["children", &branch, "--page-size", "1", "--no-files", "--no-dates"])
        .assert()
        .success()
        .stdout(predicate::str::contains("commit 4"))
        .stdout(predicate::str::contains("commit 3").not())
        .stdout(predicate::str::contains("... more"));

    trackline(dir.path(), &["children", &branch, "--page-size", "1", "--pages", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("commit 3"))
        .stdout(predicate::str::contains("... more").not());
}

#[test]
fn test_children_flattened_ahead_lists_files() {
    let (dir, branch, _) = ahead_repo();
    trackline(dir.path(), &["children", &branch, "--no-ahead-commits"])
        .assert()
        .success()
        .stdout(predicate::str::contains("A file3.txt"))
        .stdout(predicate::str::contains("A file4.txt"))
        .stdout(predicate::str::contains("commit 4").not());
}

#[test]
fn test_wrong_direction_fails() {
    let (dir, branch, _) = ahead_repo();
    trackline(dir.path(), &["children", &branch, "--direction", "behind"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not behind"));
}

#[test]
fn test_compare_push_changes() {
    let (dir, branch, oids) = ahead_repo();
    trackline(dir.path(), &["compare", &branch])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Changes to push from {}",
            branch
        )))
        .stdout(predicate::str::contains(format!("{}..{}", oids[1], branch)));
}

#[test]
fn test_not_a_repository() {
    let dir = tempfile::tempdir().unwrap();
    trackline(dir.path(), &["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open repository"));
}
