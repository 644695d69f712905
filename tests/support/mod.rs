//! Shared helpers for pipeline integration tests
#![allow(dead_code)]

use apphosting_adapter::build::ScriptedRunner;
use apphosting_adapter::config::AdapterConfig;
use apphosting_adapter::fs::MockFileSystem;
use apphosting_adapter::pipeline::PipelineContext;
use apphosting_adapter::progress::{ProgressEvent, ProgressHandler};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const ADAPTER_PACKAGE: &str = "/adapter/package.json";

/// Records stage transitions as `start:<stage>`, `done:<stage>`, `skip:<stage>`
#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn saw(&self, event: &str) -> bool {
        self.events().iter().any(|e| e == event)
    }
}

impl ProgressHandler for RecordingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        let name = match event {
            ProgressEvent::Started { framework, .. } => format!("started:{}", framework),
            ProgressEvent::StageStarted { stage } => format!("start:{}", stage),
            ProgressEvent::StageComplete { stage, .. } => format!("done:{}", stage),
            ProgressEvent::StageSkipped { stage, .. } => format!("skip:{}", stage),
            ProgressEvent::ManifestParsed { errors, warnings } => {
                format!("manifest:{}:{}", errors, warnings)
            }
            ProgressEvent::Completed { .. } => "completed".to_string(),
            ProgressEvent::Failed { .. } => "failed".to_string(),
        };
        self.events.lock().unwrap().push(name);
    }
}

pub fn config(root: &Path, framework_version: &str) -> AdapterConfig {
    AdapterConfig {
        framework_version: framework_version.to_string(),
        monorepo_command: None,
        monorepo_project: None,
        monorepo_build_args: vec![],
        project_directory: root.to_path_buf(),
        adapter_package_json: PathBuf::from(ADAPTER_PACKAGE),
        log_level: "info".to_string(),
    }
}

pub fn add_adapter_package(fs: &MockFileSystem, name: &str, version: &str) {
    fs.add_file(
        ADAPTER_PACKAGE,
        &format!(r#"{{"name": "{}", "version": "{}"}}"#, name, version),
    );
}

pub fn context(
    fs: &Arc<MockFileSystem>,
    runner: &Arc<ScriptedRunner>,
    handler: &Arc<RecordingHandler>,
    config: AdapterConfig,
    root: &Path,
) -> PipelineContext {
    PipelineContext::new(
        fs.clone(),
        runner.clone(),
        handler.clone(),
        config,
        root.to_path_buf(),
    )
}
