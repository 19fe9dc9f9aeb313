use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Rebuilds and publishes gRPC gateway images for changed proto folders
#[derive(Parser, Debug)]
#[command(
    name = "protogate",
    about = "Rebuilds and publishes gRPC gateway images for changed proto folders",
    version,
    author,
    long_about = "protogate decides which proto folders need a new gateway image (forced, \
                  never published, or changed in the last commit), generates the gateway \
                  sources with a protocol compiler, wires every discovered service into the \
                  gateway entrypoint and publishes the image under a timestamped and a \
                  floating -latest tag."
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
        about = "Build and publish gateway images for folders that need it",
        long_about = "Decides per folder whether a rebuild is needed, then generates, \
                      synthesizes and publishes the gateway image.\n\n\
                      Examples:\n  \
                      protogate build --proto-folder protos/users --repo-folder . \
                      --docker-repository registry.example.com/gateway\n  \
                      protogate build --proto-folder protos/users --proto-folder protos/orders \
                      --repo-folder . --docker-repository registry.example.com/gateway --rebuild-all"
    )]
    Build(BuildArgs),

    #[command(
        about = "Show rebuild decisions without building anything",
        long_about = "Runs only the rebuild decision for every folder and prints it.\n\n\
                      Examples:\n  \
                      protogate plan --proto-folder protos/users --repo-folder . \
                      --docker-repository registry.example.com/gateway --format json"
    )]
    Plan(PlanArgs),
}

/// Flags shared by `build` and `plan`
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    #[arg(
        long = "proto-folder",
        value_name = "FOLDER",
        required = true,
        num_args = 1..,
        help = "Proto folders relative to the repository (repeatable, or several after one flag)"
    )]
    pub proto_folders: Vec<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Repository root")]
    pub repo_folder: PathBuf,

    #[arg(
        long,
        value_name = "REPO",
        help = "Docker repository images are pushed to"
    )]
    pub docker_repository: String,

    #[arg(
        long,
        value_name = "PREFIX",
        help = "Tag prefix (overrides PROTOGATE_TAG_PREFIX)"
    )]
    pub tag_prefix: Option<String>,

    #[arg(long, help = "Rebuild every folder regardless of changes")]
    pub rebuild_all: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub target: TargetArgs,
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
