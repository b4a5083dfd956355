use crate::harness::{Assertion, CommitSpec, Scenario};

#[test]
fn test_status_tracks_file_changes() {
    Scenario::new("status_changes")
        .with_file("src/lib.rs", b"pub fn a() {}")
        .init()
        .assert_uncommitted(false)
        .writes("src/new.rs", b"pub fn p() {}")
        .assert_uncommitted(true)
        .commit("add new module")
        .assert_uncommitted(false)
        .writes("src/lib.rs", b"pub fn a() -> u8 { 1 }")
        .assert_uncommitted(true)
        .commit("change a")
        .deletes("src/new.rs")
        .assert_uncommitted(true)
        .assert(Assertion::Custom(Box::new(|engine| {
            let changed = engine.changed_files()?;
            anyhow::ensure!(changed == vec!["src/new.rs".to_string()], "changed: {:?}", changed);
            Ok(())
        })))
        .run()
        .unwrap();
}

#[test]
fn test_staged_logs_attach_to_next_commit() {
    Scenario::new("staged_logs")
        .init()
        .stage_ota("Need caching", "Add LRU cache", "p99 halved")
        .stage_ota("rejected Redis: another service", "Keep it in-process", "Simple")
        .assert(Assertion::PendingOtaLogs(2))
        .commit_with(CommitSpec::new("caching").with_staged())
        .assert(Assertion::PendingOtaLogs(0))
        .assert_head_decisions(&["Add LRU cache", "Keep it in-process"])
        .assert(Assertion::Custom(Box::new(|engine| {
            let head = engine.log(None, 1)?.pop().ok_or_else(|| anyhow::anyhow!("no head"))?;
            anyhow::ensure!(head.ota_logs.len() == 2, "{} logs", head.ota_logs.len());
            anyhow::ensure!(head.insights() == vec!["p99 halved", "Simple"]);
            Ok(())
        })))
        .run()
        .unwrap();
}

#[test]
fn test_commit_without_staged_leaves_them() {
    Scenario::new("staged_left_alone")
        .init()
        .stage_ota("t", "a", "r")
        .commit("unrelated")
        .assert(Assertion::PendingOtaLogs(1))
        .run()
        .unwrap();
}

#[test]
fn test_cleanup_removes_old_temp_files() {
    Scenario::new("temp_cleanup")
        .init()
        .stage_ota("t", "a", "r")
        .cleanup_temp(24)
        .assert(Assertion::PendingOtaLogs(1))
        .wait_hours(48)
        .cleanup_temp(24)
        .assert(Assertion::PendingOtaLogs(0))
        .run()
        .unwrap();
}
