use std::time::Duration;

use super::assertions::{Assertion, ErrorMatch};

/// One reasoning log given inline in a scenario
#[derive(Debug, Clone)]
pub struct LogSpec {
    pub thought: String,
    pub action: String,
    pub result: String,
}

/// All possible actions in a test scenario
#[derive(Debug)]
pub enum ScenarioStep {
    // Repository
    Init,
    CreateBranch {
        name: String,
        from: Option<String>,
    },
    Checkout {
        name: String,
    },
    DeleteBranch {
        name: String,
    },

    // Work in the project
    WriteFile {
        path: String,
        content: Vec<u8>,
    },
    DeleteFile {
        path: String,
    },
    StageOta {
        log: LogSpec,
    },

    // History
    Commit {
        message: String,
        decisions: Option<Vec<String>>,
        logs: Vec<LogSpec>,
        use_staged: bool,
    },
    Merge {
        branch: String,
        squash: bool,
    },

    // Time and process control
    Wait {
        duration: Duration,
    },
    CleanupTemp {
        max_age_hours: u64,
    },
    Reopen,

    // Expected failures
    ExpectError {
        step: Box<ScenarioStep>,
        error: ErrorMatch,
    },

    // Assertions (can be interspersed)
    Assert {
        assertion: Assertion,
    },
}
