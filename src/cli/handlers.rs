//! Subcommand handlers
//!
//! Each handler returns the process exit code: 0 on success, 1 on any error.

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use super::commands::{BuildArgs, DescribeArgs};
use super::output::OutputFormatter;
use crate::bundle::{descriptor_path, read_descriptor};
use crate::config::AdapterConfig;
use crate::fs::RealFileSystem;
use crate::pipeline::{AngularPipeline, NextJsPipeline, PipelineContext};

pub fn handle_angular(args: &BuildArgs) -> i32 {
    report(run_angular(args))
}

pub fn handle_nextjs(args: &BuildArgs) -> i32 {
    report(run_nextjs(args))
}

pub fn handle_describe(args: &DescribeArgs) -> i32 {
    match describe(args) {
        Ok(output) => {
            print!("{}", output);
            0
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn report(result: Result<PathBuf>) -> i32 {
    match result {
        Ok(descriptor) => {
            info!(descriptor = %descriptor.display(), "Bundle complete");
            0
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn run_angular(args: &BuildArgs) -> Result<PathBuf> {
    let ctx = context(args)?;
    let opts = AngularPipeline::new(&ctx)
        .run()
        .context("Angular adapter build failed")?;
    Ok(opts.bundle_descriptor_path)
}

fn run_nextjs(args: &BuildArgs) -> Result<PathBuf> {
    let ctx = context(args)?;
    let opts = NextJsPipeline::new(&ctx)
        .run()
        .context("Next.js adapter build failed")?;
    Ok(opts.bundle.bundle_descriptor_path)
}

fn resolve_root(root: Option<&Path>) -> Result<PathBuf> {
    let cwd = env::current_dir().context("Failed to get current directory")?;
    let root = match root {
        Some(root) => cwd.join(root),
        None => cwd,
    };
    root.canonicalize()
        .with_context(|| format!("Build root does not exist: {}", root.display()))
}

fn context(args: &BuildArgs) -> Result<PipelineContext> {
    let root = resolve_root(args.root.as_deref())?;
    debug!(root = %root.display(), "Resolved build root");

    let mut config = AdapterConfig::from_env_in(&root);
    if let Some(version) = &args.framework_version {
        config.framework_version = version.clone();
    }
    if let Some(package) = &args.adapter_package {
        config.adapter_package_json = root.join(package);
    }
    config
        .validate()
        .context("Invalid adapter configuration, check environment variables and arguments")?;
    debug!(?config, "Adapter configuration");

    Ok(PipelineContext::system(config, root))
}

fn describe(args: &DescribeArgs) -> Result<String> {
    let root = resolve_root(args.path.as_deref())?;
    let path = descriptor_path(&root);
    let descriptor = read_descriptor(&RealFileSystem::new(), &path)
        .with_context(|| format!("No readable bundle descriptor at {}", path.display()))?;
    OutputFormatter::new(args.format.into()).format(&descriptor)
}
