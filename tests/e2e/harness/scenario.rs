use super::assertions::{Assertion, ErrorMatch};
use super::runner::ScenarioRunner;
use super::steps::{LogSpec, ScenarioStep};
use std::collections::HashMap;
use std::time::Duration;

/// Fluent DSL for building test scenarios
pub struct Scenario {
    name: String,
    fixture: Option<String>,
    initial_files: HashMap<String, Vec<u8>>,
    steps: Vec<ScenarioStep>,
}

/// Builds a commit step
#[derive(Debug, Default)]
pub struct CommitSpec {
    message: String,
    decisions: Option<Vec<String>>,
    logs: Vec<LogSpec>,
    use_staged: bool,
}

impl CommitSpec {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            ..Self::default()
        }
    }

    pub fn decision(mut self, decision: &str) -> Self {
        self.decisions
            .get_or_insert_with(Vec::new)
            .push(decision.to_string());
        self
    }

    pub fn log(mut self, thought: &str, action: &str, result: &str) -> Self {
        self.logs.push(log_spec(thought, action, result));
        self
    }

    pub fn with_staged(mut self) -> Self {
        self.use_staged = true;
        self
    }

    fn into_step(self) -> ScenarioStep {
        ScenarioStep::Commit {
            message: self.message,
            decisions: self.decisions,
            logs: self.logs,
            use_staged: self.use_staged,
        }
    }
}

fn log_spec(thought: &str, action: &str, result: &str) -> LogSpec {
    LogSpec {
        thought: thought.to_string(),
        action: action.to_string(),
        result: result.to_string(),
    }
}

impl Scenario {
    /// Create a new scenario with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fixture: None,
            initial_files: HashMap::new(),
            steps: Vec::new(),
        }
    }

    // ===== Initial setup =====

    /// Add a single tracked file to the initial workspace
    pub fn with_file(mut self, path: &str, content: &[u8]) -> Self {
        self.initial_files
            .insert(path.to_string(), content.to_vec());
        self
    }

    /// Start from `tests/fixtures/<name>`; every fixture file is tracked
    pub fn from_fixture(mut self, fixture_name: &str) -> Self {
        self.fixture = Some(fixture_name.to_string());
        self
    }

    // ===== Repository =====

    /// Run `init`
    pub fn init(mut self) -> Self {
        self.steps.push(ScenarioStep::Init);
        self
    }

    /// Create a branch from the current branch
    pub fn branch(mut self, name: &str) -> Self {
        self.steps.push(ScenarioStep::CreateBranch {
            name: name.to_string(),
            from: None,
        });
        self
    }

    /// Create a branch from another branch
    pub fn branch_from(mut self, name: &str, from: &str) -> Self {
        self.steps.push(ScenarioStep::CreateBranch {
            name: name.to_string(),
            from: Some(from.to_string()),
        });
        self
    }

    /// Check a branch out
    pub fn checkout(mut self, name: &str) -> Self {
        self.steps.push(ScenarioStep::Checkout {
            name: name.to_string(),
        });
        self
    }

    /// Delete a branch
    pub fn delete_branch(mut self, name: &str) -> Self {
        self.steps.push(ScenarioStep::DeleteBranch {
            name: name.to_string(),
        });
        self
    }

    // ===== Project work =====

    /// Write and track a project file
    pub fn writes(mut self, path: &str, content: &[u8]) -> Self {
        self.steps.push(ScenarioStep::WriteFile {
            path: path.to_string(),
            content: content.to_vec(),
        });
        self
    }

    /// Delete and untrack a project file
    pub fn deletes(mut self, path: &str) -> Self {
        self.steps.push(ScenarioStep::DeleteFile {
            path: path.to_string(),
        });
        self
    }

    /// Stage a reasoning log
    pub fn stage_ota(mut self, thought: &str, action: &str, result: &str) -> Self {
        self.steps.push(ScenarioStep::StageOta {
            log: log_spec(thought, action, result),
        });
        self
    }

    // ===== History =====

    /// Commit with a message only
    pub fn commit(self, message: &str) -> Self {
        self.commit_with(CommitSpec::new(message))
    }

    /// Commit with decisions, logs or staged logs
    pub fn commit_with(mut self, spec: CommitSpec) -> Self {
        self.steps.push(spec.into_step());
        self
    }

    /// Squash-merge a branch into the current one
    pub fn squash_merge(mut self, branch: &str) -> Self {
        self.steps.push(ScenarioStep::Merge {
            branch: branch.to_string(),
            squash: true,
        });
        self
    }

    /// Merge a branch by copying its commits
    pub fn simple_merge(mut self, branch: &str) -> Self {
        self.steps.push(ScenarioStep::Merge {
            branch: branch.to_string(),
            squash: false,
        });
        self
    }

    // ===== Time and process control =====

    /// Wait for N hours
    pub fn wait_hours(mut self, hours: u64) -> Self {
        self.steps.push(ScenarioStep::Wait {
            duration: Duration::from_secs(hours * 3600),
        });
        self
    }

    /// Remove temp files older than N hours
    pub fn cleanup_temp(mut self, max_age_hours: u64) -> Self {
        self.steps.push(ScenarioStep::CleanupTemp { max_age_hours });
        self
    }

    /// Drop the engine and open the repository again from disk
    pub fn reopen(mut self) -> Self {
        self.steps.push(ScenarioStep::Reopen);
        self
    }

    // ===== Expected failures =====

    /// The previously added step must fail with `error`
    pub fn fails_with(mut self, error: ErrorMatch) -> Self {
        if let Some(step) = self.steps.pop() {
            self.steps.push(ScenarioStep::ExpectError {
                step: Box::new(step),
                error,
            });
        }
        self
    }

    // ===== Assertions =====

    /// Add a general assertion
    pub fn assert(mut self, assertion: Assertion) -> Self {
        self.steps.push(ScenarioStep::Assert { assertion });
        self
    }

    /// Assert the checked-out branch
    pub fn assert_on_branch(self, branch: &str) -> Self {
        self.assert(Assertion::CurrentBranch(branch.to_string()))
    }

    /// Assert commit count of a branch
    pub fn assert_commit_count(self, branch: &str, count: usize) -> Self {
        self.assert(Assertion::CommitCount {
            branch: branch.to_string(),
            count,
        })
    }

    /// Assert the current head's message contains text
    pub fn assert_head_contains(self, text: &str) -> Self {
        self.assert(Assertion::HeadMessageContains(text.to_string()))
    }

    /// Assert the current head's decisions
    pub fn assert_head_decisions(self, decisions: &[&str]) -> Self {
        self.assert(Assertion::HeadDecisions(
            decisions.iter().map(|d| d.to_string()).collect(),
        ))
    }

    /// Assert `status` reports (or does not report) changes
    pub fn assert_uncommitted(self, changed: bool) -> Self {
        self.assert(Assertion::UncommittedChanges(changed))
    }

    // ===== Execution =====

    /// Execute the scenario and return results
    pub fn run(self) -> ScenarioResult {
        let runner = match &self.fixture {
            Some(fixture) => ScenarioRunner::from_fixture(fixture),
            None => ScenarioRunner::new(self.initial_files.clone()),
        };
        let mut runner = match runner {
            Ok(r) => r,
            Err(e) => {
                return ScenarioResult {
                    name: self.name.clone(),
                    success: false,
                    steps_executed: 0,
                    failure_step: Some(0),
                    error: Some(format!("Failed to create runner: {}", e)),
                }
            }
        };

        match runner.execute(&self.steps) {
            Ok(()) => ScenarioResult {
                name: self.name,
                success: true,
                steps_executed: self.steps.len(),
                failure_step: None,
                error: None,
            },
            Err(e) => {
                let failure_step = runner.current_step();
                ScenarioResult {
                    name: self.name,
                    success: false,
                    steps_executed: failure_step,
                    failure_step: Some(failure_step),
                    error: Some(format!("{:?}", e)),
                }
            }
        }
    }
}

/// Result of running a scenario
#[derive(Debug)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub steps_executed: usize,
    pub failure_step: Option<usize>,
    pub error: Option<String>,
}

impl ScenarioResult {
    /// Unwrap the result, panicking if it failed
    pub fn unwrap(self) {
        if !self.success {
            panic!(
                "Scenario '{}' failed at step {}: {}",
                self.name,
                self.failure_step.unwrap_or(0),
                self.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
    }

    /// Expect the result to be successful
    pub fn expect(self, msg: &str) {
        if !self.success {
            panic!(
                "{}: Scenario '{}' failed at step {}: {}",
                msg,
                self.name,
                self.failure_step.unwrap_or(0),
                self.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
    }
}
