use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Turns framework build output into a hosting-ready bundle
#[derive(Parser, Debug)]
#[command(
    name = "apphosting-adapter",
    about = "Turns framework build output into a hosting-ready bundle",
    version,
    long_about = "apphosting-adapter runs a framework's production build, locates or \
                  synthesizes its server entrypoint and writes a versioned deployment \
                  descriptor to .apphosting/bundle.yaml. Build settings come from the \
                  environment (FRAMEWORK_VERSION, MONOREPO_COMMAND, MONOREPO_PROJECT, \
                  MONOREPO_BUILD_ARGS, GOOGLE_BUILDABLE)."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Build an Angular application and bundle its output",
        long_about = "Checks that the project uses a supported application builder, runs \
                      the build with JSON build logs, reads the build manifest from its \
                      output and assembles the bundle. Client-side rendered apps get a \
                      generated static server.\n\n\
                      Examples:\n  \
                      apphosting-adapter angular\n  \
                      FRAMEWORK_VERSION=17.3.2 apphosting-adapter angular --root /workspace"
    )]
    Angular(BuildArgs),

    #[command(
        about = "Build a Next.js application and bundle its standalone output",
        long_about = "Overrides next.config to force standalone output (when the project has \
                      a config file), validates the override, runs the build and completes \
                      the standalone tree with static assets and route overrides.\n\n\
                      Examples:\n  \
                      apphosting-adapter nextjs\n  \
                      MONOREPO_COMMAND=nx MONOREPO_PROJECT=web apphosting-adapter nextjs"
    )]
    Nextjs(BuildArgs),

    #[command(
        about = "Print the deployment descriptor of a built bundle",
        long_about = "Reads .apphosting/bundle.yaml under the given directory.\n\n\
                      Examples:\n  \
                      apphosting-adapter describe\n  \
                      apphosting-adapter describe /workspace --format json"
    )]
    Describe(DescribeArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(
        long,
        value_name = "DIR",
        help = "Build root (defaults to current directory)"
    )]
    pub root: Option<PathBuf>,

    #[arg(
        long,
        value_name = "VERSION",
        help = "Framework release, overrides FRAMEWORK_VERSION"
    )]
    pub framework_version: Option<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Adapter package.json, overrides APPHOSTING_ADAPTER_PACKAGE"
    )]
    pub adapter_package: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct DescribeArgs {
    #[arg(
        value_name = "PATH",
        help = "Build root containing .apphosting (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "yaml",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
