//! Next.js pipeline
//!
//! load config -> override + validate (only if a config file exists) -> build ->
//! resolve standalone paths -> route overrides -> copy resources ->
//! descriptor -> validate

use super::context::PipelineContext;
use crate::build::Invocation;
use crate::bundle::{
    assemble_descriptor, write_descriptor, AdapterPackage, BundleValidator, Framework,
};
use crate::error::Result;
use crate::frameworks::nextjs::{
    add_route_overrides, copy_resources, override_next_config, populate_next_output_bundle_options,
    validate_next_config_override, ConfigLoader, ConfigOverride, NextOutputBundleOptions,
    NodeConfigLoader, BUILD_ENV,
};
use crate::progress::{ProgressEvent, Stage};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub struct NextJsPipeline<'a> {
    ctx: &'a PipelineContext,
    loader: Arc<dyn ConfigLoader>,
}

impl<'a> NextJsPipeline<'a> {
    /// Loads configs through `node` with the context's runner
    pub fn new(ctx: &'a PipelineContext) -> Self {
        let loader = Arc::new(NodeConfigLoader::new(ctx.runner.clone()));
        Self::with_loader(ctx, loader)
    }

    pub fn with_loader(ctx: &'a PipelineContext, loader: Arc<dyn ConfigLoader>) -> Self {
        Self { ctx, loader }
    }

    pub fn run(&self) -> Result<NextOutputBundleOptions> {
        let start = Instant::now();
        self.ctx.emit(ProgressEvent::Started {
            framework: Framework::NextJs.to_string(),
            root: self.ctx.root.clone(),
        });

        match self.execute() {
            Ok(opts) => {
                self.ctx.emit(ProgressEvent::Completed {
                    descriptor: opts.bundle.bundle_descriptor_path.clone(),
                    total_time: start.elapsed(),
                });
                Ok(opts)
            }
            Err(e) => {
                self.ctx.emit(ProgressEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn execute(&self) -> Result<NextOutputBundleOptions> {
        let ctx = self.ctx;
        let fs = ctx.fs();
        let root = ctx.root.as_path();
        let build_options = ctx.build_options();
        let project_dir = build_options.project_directory.as_path();

        let original = self.loader.load(project_dir)?;

        // Next reports a file name even when the project has no config
        let config_path = root.join(&original.config_file_name);
        if fs.is_file(&config_path) {
            ctx.stage(Stage::OverrideConfig, || {
                let config_override = ConfigOverride::hosting();
                override_next_config(fs, root, &original.config_file_name, &config_override)?;
                validate_next_config_override(
                    fs,
                    self.loader.as_ref(),
                    root,
                    project_dir,
                    &original.config_file_name,
                    &config_override,
                )
            })?;
        } else {
            ctx.skip(
                Stage::OverrideConfig,
                format!("no {} in {}", original.config_file_name, root.display()),
            );
        }

        ctx.stage(Stage::Build, || {
            let invocation = BUILD_ENV.iter().fold(
                Invocation::new(&build_options.build_command, root)
                    .args(build_options.build_args.iter().cloned()),
                |invocation, (key, value)| invocation.env(*key, *value),
            );
            info!(command = %invocation.command_line(), "Running Next.js build");
            ctx.runner.run(&invocation).map(|_| ())
        })?;

        let package = AdapterPackage::load(fs, &ctx.config.adapter_package_json)?;
        let next_build_dir = project_dir.join(&original.dist_dir);

        let opts = ctx.stage(Stage::ResolveOutputPaths, || {
            Ok(populate_next_output_bundle_options(
                root,
                project_dir,
                &next_build_dir,
                &original.dist_dir,
            ))
        })?;

        ctx.stage(Stage::InjectRouteOverrides, || {
            add_route_overrides(
                fs,
                &opts.output_directory_app_path,
                &original.dist_dir,
                &package.version,
            )
            .map(|_| ())
        })?;

        ctx.stage(Stage::CopyResources, || {
            copy_resources(fs, project_dir, &next_build_dir, &opts)
        })?;

        ctx.stage(Stage::WriteDescriptor, || {
            let descriptor = assemble_descriptor(
                &opts.bundle,
                root,
                Framework::NextJs,
                &ctx.config.framework_version,
                &package,
            )
            .with_server_app(root, &opts.output_directory_app_path);
            write_descriptor(fs, &opts.bundle.bundle_descriptor_path, &descriptor)
        })?;

        ctx.stage(Stage::ValidateOutput, || {
            BundleValidator::new()
                .with_build_directory(&opts.output_directory_base_path)
                .with_build_directory(&next_build_dir)
                .validate(fs, &opts.bundle)
        })?;

        Ok(opts)
    }
}
