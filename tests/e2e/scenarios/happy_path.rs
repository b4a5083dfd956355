use crate::harness::{Assertion, CommitSpec, ErrorMatch, Scenario};

#[test]
fn test_feature_branch_squash_merge() {
    Scenario::new("feature_branch_squash_merge")
        .init()
        .branch("feature/x")
        .checkout("feature/x")
        .commit_with(CommitSpec::new("add X").decision("Use X"))
        .squash_merge("feature/x")
        .fails_with(ErrorMatch::SelfMerge)
        .checkout("main")
        .squash_merge("feature/x")
        .assert_on_branch("main")
        .assert_commit_count("main", 2) // seed + squash commit
        .assert_head_contains("Squash merge: feature/x")
        .assert_head_decisions(&["Use X"])
        .assert(Assertion::BranchMissing("feature/x".into()))
        .assert(Assertion::BranchStorageRemoved("feature".into()))
        .assert(Assertion::ArchiveCount(1))
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_squash_merge_summarizes_whole_branch() {
    Scenario::new("squash_summarizes_branch")
        .init()
        .branch("auth")
        .checkout("auth")
        .commit_with(
            CommitSpec::new("sessions first")
                .decision("Use sessions")
                .log("Need login", "Add session store", "Logins work"),
        )
        .commit_with(
            CommitSpec::new("switch to JWT")
                .log("rejected Sessions: state does not scale", "Use JWT", "Stateless"),
        )
        .commit_with(CommitSpec::new("sign tokens").decision("Sign with RS256"))
        .checkout("main")
        .squash_merge("auth")
        .assert(Assertion::SquashedFrom {
            branch: "auth".into(),
            original_commits: 3,
        })
        .assert_head_decisions(&["Use sessions", "Use JWT", "Sign with RS256"])
        .assert(Assertion::Custom(Box::new(|engine| {
            let head = engine.log(None, 1)?.pop().ok_or_else(|| anyhow::anyhow!("no head"))?;
            anyhow::ensure!(head.ota_logs.is_empty(), "squash commit carries logs");
            anyhow::ensure!(
                head.alternatives.iter().any(|a| a.what == "Sessions"),
                "rejected alternative lost: {:?}",
                head.alternatives
            );
            let archive = engine
                .archives()?
                .pop()
                .ok_or_else(|| anyhow::anyhow!("no archive"))?;
            anyhow::ensure!(archive.join("summary.md").exists(), "summary.md missing");
            anyhow::ensure!(archive.join("ota_logs.json").exists(), "ota_logs.json missing");
            Ok(())
        })))
        .run()
        .unwrap();
}

#[test]
fn test_simple_merge_keeps_commits() {
    Scenario::new("simple_merge")
        .init()
        .branch("docs")
        .checkout("docs")
        .commit("write guide")
        .commit("fix typos")
        .checkout("main")
        .simple_merge("docs")
        .assert_commit_count("main", 3)
        .assert_head_contains("fix typos")
        .assert(Assertion::BranchMissing("docs".into()))
        .assert(Assertion::ArchiveCount(0))
        .run()
        .unwrap();
}

#[test]
fn test_decisions_come_from_logs_when_not_given() {
    Scenario::new("decisions_from_logs")
        .init()
        .commit_with(
            CommitSpec::new("storage layer")
                .log("rejected Redis: extra service", "Use SQLite", "Fast enough")
                .log("Queries slow", "Add index", "Faster"),
        )
        .assert_head_decisions(&["Use SQLite", "Add index"])
        .commit_with(
            CommitSpec::new("explicit wins")
                .decision("Keep SQLite")
                .log("t", "Use Postgres", "r"),
        )
        .assert_head_decisions(&["Keep SQLite"])
        .run()
        .unwrap();
}

#[test]
fn test_empty_branch_squash() {
    Scenario::new("empty_branch_squash")
        .init()
        .branch("spike")
        .squash_merge("spike")
        .assert(Assertion::SquashedFrom {
            branch: "spike".into(),
            original_commits: 0,
        })
        .assert_head_decisions(&[])
        .assert(Assertion::BranchMissing("spike".into()))
        .run()
        .unwrap();
}
