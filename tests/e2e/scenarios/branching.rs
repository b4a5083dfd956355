use crate::harness::{Assertion, ErrorMatch, Scenario};

#[test]
fn test_branch_is_a_copy() {
    Scenario::new("branch_copy")
        .init()
        .branch("dev")
        .assert_on_branch("main")
        .commit("main moves on")
        .commit("and again")
        .assert_commit_count("main", 3)
        .assert_commit_count("dev", 1)
        .checkout("dev")
        .commit("dev work")
        .assert_commit_count("dev", 2)
        .assert_commit_count("main", 3)
        .run()
        .unwrap();
}

#[test]
fn test_branch_from_other_branch() {
    Scenario::new("branch_from")
        .init()
        .branch("dev")
        .checkout("dev")
        .commit("dev 1")
        .checkout("main")
        .branch_from("dev-child", "dev")
        .assert_commit_count("dev-child", 2)
        .branch_from("orphan", "ghost")
        .fails_with(ErrorMatch::BranchNotFound)
        .assert(Assertion::BranchMissing("orphan".into()))
        .run()
        .unwrap();
}

#[test]
fn test_branch_name_rules() {
    Scenario::new("branch_names")
        .init()
        .branch("team/alice/feature")
        .assert(Assertion::BranchExists("team/alice/feature".into()))
        .branch("team/alice/feature")
        .fails_with(ErrorMatch::BranchAlreadyExists)
        .branch("../outside")
        .fails_with(ErrorMatch::InvalidBranchName)
        .branch("a\\b")
        .fails_with(ErrorMatch::InvalidBranchName)
        .branch("")
        .fails_with(ErrorMatch::InvalidBranchName)
        .branch("team/alice")
        .fails_with(ErrorMatch::InvalidBranchName)
        .checkout("nowhere")
        .fails_with(ErrorMatch::BranchNotFound)
        .assert_on_branch("main")
        .run()
        .unwrap();
}

#[test]
fn test_delete_branch_rules() {
    Scenario::new("delete_branch")
        .init()
        .branch("feature/old")
        .checkout("feature/old")
        .commit("abandoned idea")
        .delete_branch("feature/old")
        .fails_with(ErrorMatch::ActiveBranchDeletion)
        .checkout("main")
        .delete_branch("main")
        .fails_with(ErrorMatch::ProtectedBranch)
        .delete_branch("feature/old")
        .assert(Assertion::BranchMissing("feature/old".into()))
        .assert(Assertion::BranchStorageRemoved("feature".into()))
        .assert(Assertion::ArchiveCount(0))
        .delete_branch("feature/old")
        .fails_with(ErrorMatch::BranchNotFound)
        .run()
        .unwrap();
}

#[test]
fn test_merging_main_is_refused_cleanly() {
    Scenario::new("merge_main")
        .init()
        .branch("dev")
        .checkout("dev")
        .squash_merge("main")
        .fails_with(ErrorMatch::ProtectedBranch)
        .simple_merge("main")
        .fails_with(ErrorMatch::ProtectedBranch)
        .assert(Assertion::BranchExists("main".into()))
        .assert_commit_count("dev", 1)
        .assert(Assertion::ArchiveCount(0))
        .run()
        .unwrap();
}
