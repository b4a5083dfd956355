use super::assertions::{Assertion, ErrorMatch};
use super::clock::MockClock;
use super::steps::{LogSpec, ScenarioStep};
use super::workspace::TestWorkspace;
use anyhow::{anyhow, bail, Context, Result};
use gitctx_core::{CommitRequest, ContextEngine, ContextError, MemoryReporter, OtaLog, BRANCHES_DIR};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Executes scenarios against a real engine in a temp directory
pub struct ScenarioRunner {
    workspace: TestWorkspace,
    engine: Option<ContextEngine>,
    clock: MockClock,
    reporter: MemoryReporter,
    current_step: usize,
}

impl ScenarioRunner {
    /// Create a new runner with initial files
    pub fn new(initial_files: HashMap<String, Vec<u8>>) -> Result<Self> {
        Self::with_workspace(TestWorkspace::with_files(initial_files)?)
    }

    /// Create a new runner from a fixture directory
    pub fn from_fixture(name: &str) -> Result<Self> {
        Self::with_workspace(TestWorkspace::from_fixture(name)?)
    }

    fn with_workspace(workspace: TestWorkspace) -> Result<Self> {
        let clock = MockClock::new();
        let reporter = MemoryReporter::new();
        let engine = build_engine(&workspace, &clock, &reporter)?;

        Ok(Self {
            workspace,
            engine: Some(engine),
            clock,
            reporter,
            current_step: 0,
        })
    }

    /// Get current step number
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Notices emitted so far
    pub fn reporter(&self) -> &MemoryReporter {
        &self.reporter
    }

    /// Execute all steps in sequence
    pub fn execute(&mut self, steps: &[ScenarioStep]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            self.current_step = i;
            self.execute_step(step)
                .with_context(|| format!("Step {}: {:?}", i, step))?;
        }
        Ok(())
    }

    fn engine(&mut self) -> Result<&mut ContextEngine> {
        self.engine
            .as_mut()
            .ok_or_else(|| anyhow!("engine not available"))
    }

    /// Execute a single step
    fn execute_step(&mut self, step: &ScenarioStep) -> Result<()> {
        match step {
            ScenarioStep::Init => {
                self.engine()?.init()?;
                Ok(())
            }
            ScenarioStep::CreateBranch { name, from } => {
                Ok(self.engine()?.branch(name, from.as_deref())?)
            }
            ScenarioStep::Checkout { name } => Ok(self.engine()?.checkout(name)?),
            ScenarioStep::DeleteBranch { name } => Ok(self.engine()?.delete_branch(name)?),

            ScenarioStep::WriteFile { path, content } => self.workspace.write_file(path, content),
            ScenarioStep::DeleteFile { path } => self.workspace.delete_file(path),
            ScenarioStep::StageOta { log } => {
                self.engine()?.stage_ota(&to_log(log))?;
                Ok(())
            }

            ScenarioStep::Commit {
                message,
                decisions,
                logs,
                use_staged,
            } => self.handle_commit(message, decisions.as_deref(), logs, *use_staged),
            ScenarioStep::Merge { branch, squash } => {
                self.engine()?.merge(branch, *squash)?;
                Ok(())
            }

            ScenarioStep::Wait { duration } => self.handle_wait(*duration),
            ScenarioStep::CleanupTemp { max_age_hours } => {
                self.engine()?.cleanup_temp(*max_age_hours)?;
                Ok(())
            }
            ScenarioStep::Reopen => self.handle_reopen(),

            ScenarioStep::ExpectError { step, error } => self.handle_expect_error(step, error),
            ScenarioStep::Assert { assertion } => self.handle_assertion(assertion),
        }
    }

    // ===== Action handlers =====

    fn handle_commit(
        &mut self,
        message: &str,
        decisions: Option<&[String]>,
        logs: &[LogSpec],
        use_staged: bool,
    ) -> Result<()> {
        let mut request =
            CommitRequest::new(message).ota_logs(logs.iter().map(to_log).collect());
        if let Some(decisions) = decisions {
            request = request.decisions(decisions.iter().cloned());
        }
        if use_staged {
            request = request.use_staged();
        }
        self.engine()?.commit(request)?;
        Ok(())
    }

    fn handle_wait(&mut self, duration: Duration) -> Result<()> {
        self.clock.advance(duration);
        Ok(())
    }

    fn handle_reopen(&mut self) -> Result<()> {
        // Drop the cached index along with the engine
        self.engine = None;
        self.engine = Some(build_engine(&self.workspace, &self.clock, &self.reporter)?);
        Ok(())
    }

    fn handle_expect_error(&mut self, step: &ScenarioStep, expected: &ErrorMatch) -> Result<()> {
        match self.execute_step(step) {
            Ok(()) => bail!("expected {:?}, but the step succeeded", expected),
            Err(e) => match e.downcast_ref::<ContextError>() {
                Some(actual) if expected.matches(actual) => {
                    // A failed mutation leaves the cache possibly stale
                    self.engine()?.reload();
                    Ok(())
                }
                _ => Err(e.context(format!("expected {:?}", expected))),
            },
        }
    }

    // ===== Assertions =====

    fn handle_assertion(&mut self, assertion: &Assertion) -> Result<()> {
        match assertion {
            Assertion::CurrentBranch(expected) => {
                let actual = self.engine()?.current_branch()?;
                if &actual != expected {
                    bail!("current branch is {:?}, expected {:?}", actual, expected);
                }
                Ok(())
            }
            Assertion::BranchExists(name) => {
                if !self.branch_names()?.contains(name) {
                    bail!("branch {:?} does not exist", name);
                }
                Ok(())
            }
            Assertion::BranchMissing(name) => {
                if self.branch_names()?.contains(name) {
                    bail!("branch {:?} still exists", name);
                }
                Ok(())
            }
            Assertion::BranchStorageRemoved(name) => {
                let dir = self.workspace.context_dir().join(BRANCHES_DIR).join(name);
                if dir.exists() {
                    bail!("branch storage {} still exists", dir.display());
                }
                Ok(())
            }
            Assertion::CommitCount { branch, count } => {
                let actual = self.engine()?.commit_ids(branch)?.len();
                if actual != *count {
                    bail!("{} has {} commits, expected {}", branch, actual, count);
                }
                Ok(())
            }
            Assertion::HeadMessageContains(text) => {
                let status = self.engine()?.status()?;
                let message = status
                    .latest_commit
                    .ok_or_else(|| anyhow!("current branch has no readable head"))?;
                if !message.contains(text.as_str()) {
                    bail!("head message {:?} does not contain {:?}", message, text);
                }
                Ok(())
            }
            Assertion::HeadDecisions(expected) => {
                let head = self.head()?;
                if &head.decisions != expected {
                    bail!("head decisions {:?}, expected {:?}", head.decisions, expected);
                }
                Ok(())
            }
            Assertion::SquashedFrom {
                branch,
                original_commits,
            } => {
                let head = self.head()?;
                let meta = head
                    .squash_metadata()
                    .ok_or_else(|| anyhow!("head {} is not a squash commit", head.id))?;
                if &meta.source_branch != branch || meta.original_commits != *original_commits {
                    bail!(
                        "head squashed {} commit(s) from {:?}, expected {} from {:?}",
                        meta.original_commits,
                        meta.source_branch,
                        original_commits,
                        branch
                    );
                }
                Ok(())
            }
            Assertion::UncommittedChanges(expected) => {
                let actual = self.engine()?.status()?.uncommitted_changes;
                if actual != *expected {
                    bail!("uncommitted_changes is {}, expected {}", actual, expected);
                }
                Ok(())
            }
            Assertion::PendingOtaLogs(expected) => {
                let actual = self.engine()?.status()?.pending_ota_logs;
                if actual != *expected {
                    bail!("{} staged logs, expected {}", actual, expected);
                }
                Ok(())
            }
            Assertion::ArchiveCount(expected) => {
                let actual = self.engine()?.archives()?.len();
                if actual != *expected {
                    bail!("{} archives, expected {}", actual, expected);
                }
                Ok(())
            }
            Assertion::Custom(f) => f(self.engine()?),
        }
    }

    fn branch_names(&mut self) -> Result<Vec<String>> {
        Ok(self
            .engine()?
            .branches()?
            .into_iter()
            .map(|b| b.name)
            .collect())
    }

    /// Newest commit document stored on the current branch
    fn head(&mut self) -> Result<gitctx_core::Commit> {
        self.engine()?
            .log(None, 1)?
            .pop()
            .ok_or_else(|| anyhow!("no commit stored on the current branch"))
    }
}

fn build_engine(
    workspace: &TestWorkspace,
    clock: &MockClock,
    reporter: &MemoryReporter,
) -> Result<ContextEngine> {
    Ok(workspace
        .engine()?
        .with_time_provider(clock.as_provider())
        .with_reporter(Arc::new(reporter.clone())))
}

fn to_log(spec: &LogSpec) -> OtaLog {
    OtaLog::new(&spec.thought, &spec.action, &spec.result, vec![])
}
