//! Progress handler trait and events

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Pipeline stages, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CheckBuildConditions,
    OverrideConfig,
    Build,
    ResolveOutputPaths,
    GenerateServer,
    CopyResources,
    InjectRouteOverrides,
    WriteDescriptor,
    ValidateOutput,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::CheckBuildConditions => "check-build-conditions",
            Stage::OverrideConfig => "override-config",
            Stage::Build => "build",
            Stage::ResolveOutputPaths => "resolve-output-paths",
            Stage::GenerateServer => "generate-server",
            Stage::CopyResources => "copy-resources",
            Stage::InjectRouteOverrides => "inject-route-overrides",
            Stage::WriteDescriptor => "write-descriptor",
            Stage::ValidateOutput => "validate-output",
        };
        f.write_str(name)
    }
}

/// Events emitted while a pipeline runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Pipeline started for a framework
    Started { framework: String, root: PathBuf },

    StageStarted { stage: Stage },

    StageComplete { stage: Stage, duration: Duration },

    /// Stage did nothing, e.g. config override without a config file
    StageSkipped { stage: Stage, reason: String },

    /// Build manifest parsed; counts of tool-reported diagnostics
    ManifestParsed { errors: usize, warnings: usize },

    /// Pipeline finished and the bundle validated
    Completed {
        descriptor: PathBuf,
        total_time: Duration,
    },

    Failed { error: String },
}

/// Trait for handling progress events
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
