//! CLI commands.

pub mod branch;
pub mod commit;
pub mod init;
pub mod log;
pub mod maintenance;
pub mod merge;
pub mod ota;
pub mod status;

use anyhow::Result;
use gitctx_core::{ContextEngine, EngineOptions};
use std::path::Path;
use tracing::debug;

/// Opens the context repository under `repo`.
pub fn open(repo: &Path) -> Result<ContextEngine> {
    let engine = ContextEngine::open(repo, EngineOptions::default())?;
    debug!(
        context_dir = %engine.context_dir().display(),
        provider = engine.provider_name(),
        "opened context repository"
    );
    Ok(engine)
}

/// Local time for display.
pub fn local_time(at: chrono::DateTime<chrono::Utc>) -> String {
    at.with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
