//! Pipeline context for managing dependencies

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::build::{CommandRunner, ProcessRunner};
use crate::config::{AdapterConfig, BuildOptions};
use crate::error::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::progress::{LoggingHandler, ProgressEvent, ProgressHandler, Stage};

/// Context that owns all dependencies of a pipeline run
pub struct PipelineContext {
    /// File system abstraction
    pub file_system: Arc<dyn FileSystem>,

    /// Subprocess boundary for builds and introspection
    pub runner: Arc<dyn CommandRunner>,

    pub progress: Arc<dyn ProgressHandler>,

    pub config: AdapterConfig,

    /// Build root: where the adapter runs and `.apphosting` is written
    pub root: PathBuf,
}

impl PipelineContext {
    pub fn new(
        file_system: Arc<dyn FileSystem>,
        runner: Arc<dyn CommandRunner>,
        progress: Arc<dyn ProgressHandler>,
        config: AdapterConfig,
        root: PathBuf,
    ) -> Self {
        Self {
            file_system,
            runner,
            progress,
            config,
            root,
        }
    }

    /// Real file system, real processes and log-based progress
    pub fn system(config: AdapterConfig, root: PathBuf) -> Self {
        Self::new(
            Arc::new(RealFileSystem::new()),
            Arc::new(ProcessRunner::new()),
            Arc::new(LoggingHandler),
            config,
            root,
        )
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.file_system.as_ref()
    }

    pub fn build_options(&self) -> BuildOptions {
        self.config.build_options()
    }

    pub fn emit(&self, event: ProgressEvent) {
        self.progress.on_progress(&event);
    }

    /// Runs one stage, reporting its start and duration
    pub fn stage<T>(&self, stage: Stage, run: impl FnOnce() -> Result<T>) -> Result<T> {
        self.emit(ProgressEvent::StageStarted { stage });
        let start = Instant::now();
        let value = run()?;
        self.emit(ProgressEvent::StageComplete {
            stage,
            duration: start.elapsed(),
        });
        Ok(value)
    }

    pub fn skip(&self, stage: Stage, reason: impl Into<String>) {
        self.emit(ProgressEvent::StageSkipped {
            stage,
            reason: reason.into(),
        });
    }
}
