use protogate::cli::commands::{CliArgs, Commands};
use protogate::cli::handlers::{handle_build, handle_plan};
use protogate::util::logging::{init_logging, json_from_env, LoggingConfig};
use protogate::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("protogate v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Build(build_args) => handle_build(build_args, args.quiet).await,
        Commands::Plan(plan_args) => handle_plan(plan_args).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = LoggingConfig::level_from_flags(args.log_level.as_deref(), args.verbose, args.quiet);
    let config = if json_from_env() {
        LoggingConfig::json(level)
    } else {
        LoggingConfig::with_level(level)
    };
    init_logging(config);
}
