//! Angular pipeline
//!
//! check builder -> build -> extract manifest -> resolve paths ->
//! synthesize server (client-only builds) -> descriptor -> validate

use super::context::PipelineContext;
use crate::build::Invocation;
use crate::bundle::{
    assemble_descriptor, generate_server, populate_output_bundle_options, write_descriptor,
    AdapterPackage, BundleValidator, Framework, OutputBundleOptions,
};
use crate::error::{AdapterError, Result};
use crate::frameworks::angular::{check_build_conditions, BUILD_LOGS_JSON_ENV};
use crate::manifest::{extract_manifest_output, parse_build_manifest, BuildManifest};
use crate::progress::{ProgressEvent, Stage};
use std::time::Instant;
use tracing::{error, info};

pub struct AngularPipeline<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> AngularPipeline<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self { ctx }
    }

    /// Runs every stage; the returned options point at a validated bundle
    pub fn run(&self) -> Result<OutputBundleOptions> {
        let start = Instant::now();
        self.ctx.emit(ProgressEvent::Started {
            framework: Framework::Angular.to_string(),
            root: self.ctx.root.clone(),
        });

        match self.execute() {
            Ok(opts) => {
                self.ctx.emit(ProgressEvent::Completed {
                    descriptor: opts.bundle_descriptor_path.clone(),
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

    fn execute(&self) -> Result<OutputBundleOptions> {
        let ctx = self.ctx;
        let fs = ctx.fs();
        let build_options = ctx.build_options();

        ctx.stage(Stage::CheckBuildConditions, || {
            check_build_conditions(fs, ctx.runner.as_ref(), &build_options)
        })?;

        let stdout = ctx.stage(Stage::Build, || {
            let (key, value) = BUILD_LOGS_JSON_ENV;
            let invocation = Invocation::new(&build_options.build_command, &ctx.root)
                .args(build_options.build_args.iter().cloned())
                .env(key, value);
            info!(command = %invocation.command_line(), "Running Angular build");

            let output = ctx.runner.run(&invocation)?;
            if output.stdout.trim().is_empty() {
                return Err(AdapterError::NoBuildOutput);
            }
            Ok(output.stdout)
        })?;

        let opts = ctx.stage(Stage::ResolveOutputPaths, || {
            let manifest = self.read_manifest(&stdout)?;
            populate_output_bundle_options(&ctx.root, &manifest.output_paths)
        })?;

        if opts.needs_server_generated {
            ctx.stage(Stage::GenerateServer, || generate_server(fs, &opts))?;
        } else {
            ctx.skip(Stage::GenerateServer, "build produced a server");
        }

        ctx.stage(Stage::WriteDescriptor, || {
            let package = AdapterPackage::load(fs, &ctx.config.adapter_package_json)?;
            let descriptor = assemble_descriptor(
                &opts,
                &ctx.root,
                Framework::Angular,
                &ctx.config.framework_version,
                &package,
            );
            write_descriptor(fs, &opts.bundle_descriptor_path, &descriptor)
        })?;

        ctx.stage(Stage::ValidateOutput, || {
            BundleValidator::new().validate(fs, &opts)
        })?;

        Ok(opts)
    }

    /// Extracts and parses the manifest; tool-reported diagnostics are logged only
    fn read_manifest(&self, stdout: &str) -> Result<BuildManifest> {
        let manifest = parse_build_manifest(&extract_manifest_output(stdout)?)?;

        for diagnostic in &manifest.errors {
            error!("{}", diagnostic);
        }
        for diagnostic in &manifest.warnings {
            info!("{}", diagnostic);
        }
        self.ctx.emit(ProgressEvent::ManifestParsed {
            errors: manifest.errors.len(),
            warnings: manifest.warnings.len(),
        });
        Ok(manifest)
    }
}
