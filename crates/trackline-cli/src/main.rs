mod cmd_children;
mod cmd_compare;
mod cmd_list;
mod cmd_status;
mod host;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "trackline")]
#[command(about = "Inspect how local branches relate to their upstreams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Log debug events to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List local branches with their tracking status
    List {
        #[command(flatten)]
        repo: host::RepoArgs,
    },
    /// Show the tracking status of one branch
    Status {
        #[command(flatten)]
        target: host::TargetArgs,
    },
    /// List the commits and files a branch is ahead or behind by
    Children {
        #[command(flatten)]
        target: host::TargetArgs,

        #[command(flatten)]
        view: host::ViewArgs,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Show the file comparison for a branch's delta
    Compare {
        #[command(flatten)]
        target: host::TargetArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = host::Output {
        json: cli.json,
        pretty: cli.pretty,
    };

    match cli.command {
        Commands::List { repo } => cmd_list::run(repo, output),
        Commands::Status { target } => cmd_status::run(target, output),
        Commands::Children {
            target,
            view,
            pages,
        } => cmd_children::run(target, view, pages, output).await,
        Commands::Compare { target } => cmd_compare::run(target, output).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
