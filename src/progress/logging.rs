//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, error, info};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { framework, root } => {
                info!(framework = %framework, root = %root.display(), "Starting adapter build");
            }
            ProgressEvent::StageStarted { stage } => {
                debug!(stage = %stage, "Starting stage");
            }
            ProgressEvent::StageComplete { stage, duration } => {
                debug!(
                    stage = %stage,
                    duration_ms = duration.as_millis(),
                    "Stage complete"
                );
            }
            ProgressEvent::StageSkipped { stage, reason } => {
                info!(stage = %stage, reason = %reason, "Stage skipped");
            }
            ProgressEvent::ManifestParsed { errors, warnings } => {
                debug!(errors, warnings, "Build manifest parsed");
            }
            ProgressEvent::Completed {
                descriptor,
                total_time,
            } => {
                info!(
                    descriptor = %descriptor.display(),
                    total_time_ms = total_time.as_millis(),
                    "Output bundle ready"
                );
            }
            ProgressEvent::Failed { error } => {
                error!(error = %error, "Adapter build failed");
            }
        }
    }
}
