//! Angular build-condition checks
//!
//! Only the application builder emits the JSON build manifest the pipeline
//! relies on, so the configured builder is checked before building. The check
//! is best effort: when the builder cannot be determined the build proceeds and
//! any later failure speaks for itself.

use crate::build::{CommandOutput, CommandRunner, Invocation};
use crate::config::BuildOptions;
use crate::error::{AdapterError, Result};
use crate::fs::FileSystem;
use crate::probe::{Capability, ProbeChain};
use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Builders that produce a build manifest
pub const ALLOWED_BUILDERS: &[&str] = &[
    "@angular-devkit/build-angular:application",
    "@angular/build:application",
    "@analogjs/platform:vite",
];

/// Env var that makes the application builder print its manifest as JSON
pub const BUILD_LOGS_JSON_ENV: (&str, &str) = ("NG_BUILD_LOGS_JSON", "1");

const WORKSPACE_SCRIPT: &str = include_str!("../../assets/angular_workspace.cjs");

pub fn is_allowed_builder(builder: &str) -> bool {
    ALLOWED_BUILDERS.contains(&builder)
}

fn unsupported_builder(builder: &str) -> AdapterError {
    AdapterError::UnsupportedBuilder {
        builder: builder.to_string(),
        allowed: ALLOWED_BUILDERS.iter().map(|b| b.to_string()).collect(),
    }
}

/// An application project and the builder of its `build` target
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkspaceApplication {
    pub name: String,
    #[serde(default)]
    pub builder: Option<String>,
}

/// Fails unless the project is built with an allowed builder
///
/// Nx projects are asked through `nx show project`; standalone workspaces are
/// probed through the Angular workspace API, then `angular.json`.
pub fn check_build_conditions(
    fs: &dyn FileSystem,
    runner: &dyn CommandRunner,
    opts: &BuildOptions,
) -> Result<()> {
    if opts.is_nx() {
        let project = opts.project_name.as_deref().unwrap_or_default();
        return match nx_builder_capability(runner, &opts.project_directory, project)
            .log_unknown("nx build executor")
        {
            Capability::Unsupported(builder) => Err(unsupported_builder(&builder)),
            Capability::Supported | Capability::Unknown(_) => Ok(()),
        };
    }

    let root = opts.project_directory.as_path();
    let probed = ProbeChain::new("angular builder")
        .probe("workspace-api", || workspace_api_applications(runner, root))
        .probe("angular.json", || angular_json_applications(fs, root))
        .run();

    let Some(probed) = probed else {
        info!("Could not determine the Angular builder, skipping builder check");
        return Ok(());
    };

    let application = single_application(probed.value)?;
    match application.builder.as_deref() {
        Some(builder) if is_allowed_builder(builder) => {
            debug!(project = %application.name, builder, source = probed.probe, "Angular builder supported");
            Ok(())
        }
        Some(builder) => Err(unsupported_builder(builder)),
        None => {
            info!(project = %application.name, "Application has no build target, skipping builder check");
            Ok(())
        }
    }
}

fn single_application(mut applications: Vec<WorkspaceApplication>) -> Result<WorkspaceApplication> {
    if applications.len() == 1 {
        if let Some(app) = applications.pop() {
            return Ok(app);
        }
    }
    Err(AdapterError::AmbiguousApplication {
        applications: applications.into_iter().map(|a| a.name).collect(),
    })
}

/// Queries Nx for the executor of `<project>:build`
pub fn nx_builder_capability(runner: &dyn CommandRunner, cwd: &Path, project: &str) -> Capability {
    let invocation = Invocation::new("npx", cwd).args(["nx", "show", "project", project, "--json"]);
    let output = match runner.run(&invocation) {
        Ok(output) => output,
        Err(e) => return Capability::Unknown(e.to_string()),
    };

    match nx_build_executor(&output) {
        Some(executor) if is_allowed_builder(&executor) => Capability::Supported,
        Some(executor) => Capability::Unsupported(executor),
        None => Capability::Unknown(format!(
            "no targets.build.executor in `{}` output",
            invocation.command_line()
        )),
    }
}

fn nx_build_executor(output: &CommandOutput) -> Option<String> {
    let value: Value = output.json().ok()?;
    value
        .pointer("/targets/build/executor")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Asks the Angular workspace API installed in the project, via `node`
fn workspace_api_applications(
    runner: &dyn CommandRunner,
    root: &Path,
) -> anyhow::Result<Option<Vec<WorkspaceApplication>>> {
    let invocation = Invocation::new("node", root).args(["-e", WORKSPACE_SCRIPT]);
    let applications = runner
        .run(&invocation)?
        .json()
        .context("workspace API returned malformed project list")?;
    Ok(Some(applications))
}

#[derive(Debug, Deserialize)]
struct AngularJson {
    #[serde(default)]
    projects: BTreeMap<String, AngularJsonProject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AngularJsonProject {
    #[serde(default)]
    project_type: Option<String>,
    #[serde(default, alias = "targets")]
    architect: BTreeMap<String, AngularJsonTarget>,
}

#[derive(Debug, Deserialize)]
struct AngularJsonTarget {
    #[serde(default)]
    builder: Option<String>,
}

/// Reads application projects straight from `angular.json`
fn angular_json_applications(
    fs: &dyn FileSystem,
    root: &Path,
) -> anyhow::Result<Option<Vec<WorkspaceApplication>>> {
    let path = root.join("angular.json");
    if !fs.is_file(&path) {
        return Ok(None);
    }

    let content = fs.read_to_string(&path)?;
    let workspace: AngularJson = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let applications = workspace
        .projects
        .into_iter()
        .filter(|(_, project)| project.project_type.as_deref() == Some("application"))
        .map(|(name, project)| WorkspaceApplication {
            builder: project.architect.get("build").and_then(|t| t.builder.clone()),
            name,
        })
        .collect();
    Ok(Some(applications))
}
