//! Output formatting for the deployment descriptor
//!
//! YAML reproduces the on-disk document, JSON suits scripts and the human
//! format is a short summary for build logs.

use anyhow::{Context, Result};
use std::fmt::Write;

use crate::bundle::{Availability, OutputBundleConfig};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format, same shape as bundle.yaml
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, descriptor: &OutputBundleConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(descriptor)
                .context("Failed to serialize descriptor to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(descriptor).context("Failed to serialize descriptor to YAML")
            }
            OutputFormat::Human => Ok(self.format_human(descriptor)),
        }
    }

    fn format_human(&self, descriptor: &OutputBundleConfig) -> String {
        let mut out = String::new();
        let metadata = &descriptor.metadata;

        let _ = writeln!(out, "Bundle descriptor ({})", descriptor.version);
        let _ = writeln!(
            out,
            "  Framework:   {} {}",
            metadata.framework, metadata.framework_version
        );
        let _ = writeln!(
            out,
            "  Adapter:     {} {}",
            metadata.adapter_package_name, metadata.adapter_version
        );
        let _ = writeln!(out, "  Run command: {}", descriptor.run_config.run_command);

        let env = &descriptor.run_config.environment_variables;
        if env.is_empty() {
            let _ = writeln!(out, "  Environment: (none)");
        } else {
            let _ = writeln!(out, "  Environment:");
            for var in env {
                let availability = var
                    .availability
                    .iter()
                    .map(|a| match a {
                        Availability::Build => "build",
                        Availability::Runtime => "runtime",
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(out, "    {}={} [{}]", var.variable, var.value, availability);
            }
        }

        if let Some(files) = &descriptor.output_files {
            let _ = writeln!(out, "  Server files:");
            for include in &files.server_app.include {
                let _ = writeln!(out, "    {}", include);
            }
        }
        out
    }
}
