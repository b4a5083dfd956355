use crate::harness::{Assertion, CommitSpec, ErrorMatch, Scenario};

#[test]
fn test_state_survives_reopen() {
    Scenario::new("reopen")
        .init()
        .branch("dev")
        .checkout("dev")
        .commit_with(CommitSpec::new("dev work").decision("Use X"))
        .reopen()
        .assert_on_branch("dev")
        .assert_commit_count("dev", 2)
        .assert_head_decisions(&["Use X"])
        .checkout("main")
        .squash_merge("dev")
        .reopen()
        .assert_on_branch("main")
        .assert(Assertion::BranchMissing("dev".into()))
        .assert_head_decisions(&["Use X"])
        .run()
        .unwrap();
}

#[test]
fn test_operations_require_init() {
    Scenario::new("requires_init")
        .commit("too early")
        .fails_with(ErrorMatch::NotInitialized)
        .branch("dev")
        .fails_with(ErrorMatch::NotInitialized)
        .stage_ota("t", "a", "r")
        .fails_with(ErrorMatch::NotInitialized)
        .assert_on_branch("main")
        .init()
        .commit("now fine")
        .assert_commit_count("main", 2)
        .run()
        .unwrap();
}

#[test]
fn test_init_twice_changes_nothing() {
    Scenario::new("init_twice")
        .init()
        .commit("first")
        .branch("dev")
        .init()
        .reopen()
        .init()
        .assert_commit_count("main", 2)
        .assert(Assertion::BranchExists("dev".into()))
        .assert_head_contains("first")
        .run()
        .unwrap();
}
