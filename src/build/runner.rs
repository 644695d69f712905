use crate::error::{AdapterError, Result};
use crate::manifest::extract_manifest_output;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, trace};

/// Longest stdout or stderr excerpt carried in a `BuildFailed` error
const MAX_OUTPUT_EXCERPT: usize = 4096;

/// A command line to run, with extra environment for the child only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub envs: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Buffered output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Parses stdout as JSON, falling back to the outermost `{...}` when the
    /// tool printed banner lines around it
    pub fn json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        match serde_json::from_str(self.stdout.trim()) {
            Ok(value) => Ok(value),
            Err(direct) => {
                let embedded = extract_manifest_output(&self.stdout)
                    .map_err(|_| anyhow::anyhow!("stdout is not JSON: {}", direct))?;
                serde_json::from_str(&embedded).context("stdout holds no valid JSON object")
            }
        }
    }
}

pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion. A non-zero exit is an `AdapterError::BuildFailed`.
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let command_line = invocation.command_line();
        debug!(command = %command_line, cwd = %invocation.cwd.display(), "Running command");

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(invocation.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| AdapterError::BuildFailed {
                command: command_line.clone(),
                status: format!("failed to spawn: {}", e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        trace!(command = %command_line, stdout_bytes = stdout.len(), stderr_bytes = stderr.len(), "Command finished");

        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            debug!(target: "apphosting_adapter::build::stdout", "{}", line);
        }
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!(target: "apphosting_adapter::build::stderr", "{}", line);
        }

        if !output.status.success() {
            return Err(AdapterError::BuildFailed {
                command: command_line,
                status: failure_status(&output.status.to_string(), &stdout, &stderr),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

/// Exit status followed by the tails of both streams, skipping empty ones
fn failure_status(status: &str, stdout: &str, stderr: &str) -> String {
    let mut message = status.to_string();
    for (name, stream) in [("stderr", stderr), ("stdout", stdout)] {
        let excerpt = tail_excerpt(stream);
        if !excerpt.trim().is_empty() {
            message.push_str(&format!("\n--- {} ---\n{}", name, excerpt));
        }
    }
    message
}

fn tail_excerpt(output: &str) -> &str {
    let trimmed = output.trim_end();
    if trimmed.len() <= MAX_OUTPUT_EXCERPT {
        return trimmed;
    }
    let mut start = trimmed.len() - MAX_OUTPUT_EXCERPT;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    &trimmed[start..]
}
