use apphosting_adapter::cli::commands::{CliArgs, Commands};
use apphosting_adapter::cli::handlers::{handle_angular, handle_describe, handle_nextjs};
use apphosting_adapter::util::logging::{config_from_env, init_logging, parse_level};
use apphosting_adapter::VERSION;

use clap::Parser;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("apphosting-adapter v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Angular(build_args) => handle_angular(build_args),
        Commands::Nextjs(build_args) => handle_nextjs(build_args),
        Commands::Describe(describe_args) => handle_describe(describe_args),
    };

    std::process::exit(exit_code);
}

/// `--log-level` beats `-v`/`-q`, which beat `APPHOSTING_LOG_LEVEL`
fn init_logging_from_args(args: &CliArgs) {
    let mut config = config_from_env();

    if let Some(level_str) = &args.log_level {
        config.level = parse_level(level_str);
    } else if args.verbose {
        config.level = Level::DEBUG;
    } else if args.quiet {
        config.level = Level::ERROR;
    }

    init_logging(config);
}
