//! repolist - list repository contents and their disk usage.
//!
//! Usage:
//!   repolist list <URL> [PATH]         List files and directories
//!   repolist disk-usage <URL> [PATH]   Show sizes, rolled up per directory
//!   repolist --help                    Show help

mod listing;

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use repolist_core::DisplayOptions;
use repolist_render::{ColorTable, EntryFormatter};

use crate::listing::Target;

#[derive(Parser)]
#[command(
    name = "repolist",
    version,
    about = "List repository contents and disk usage",
    long_about = "repolist lists the files and directories of a repository, \
                  including versioned outputs that are declared but not \
                  present in the working copy.\n\n\
                  Use `list` to browse and `disk-usage` to see where space goes."
)]
struct Cli {
    /// Print debug diagnostics to standard error
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct TargetArgs {
    /// Location of the repository
    url: String,

    /// Path within the repository to list
    path: Option<String>,

    /// Show only versioned outputs
    #[arg(long)]
    dvc_only: bool,

    /// Git revision (e.g. SHA, branch, tag)
    #[arg(long, value_name = "COMMIT")]
    rev: Option<String>,

    /// Do not style paths with LS_COLORS
    #[arg(long)]
    no_color: bool,
}

impl TargetArgs {
    fn target(&self) -> Target<'_> {
        Target {
            url: &self.url,
            path: self.path.as_deref(),
            rev: self.rev.as_deref(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List repository contents, including tracked outputs
    #[command(visible_alias = "ls")]
    List {
        #[command(flatten)]
        target: TargetArgs,

        /// Recursively list files
        #[arg(short = 'R', long)]
        recursive: bool,

        /// Show output in JSON format
        #[arg(long, visible_alias = "show-json")]
        json: bool,
    },

    /// List repository contents with disk usage
    #[command(visible_alias = "du")]
    DiskUsage {
        #[command(flatten)]
        target: TargetArgs,

        /// Recursively list files
        #[arg(short = 'R', long)]
        recursive: bool,

        /// Roll sizes up to this many path components
        #[arg(
            short = 'd',
            long,
            value_parser = clap::value_parser!(u32).range(1..),
            conflicts_with = "recursive"
        )]
        max_depth: Option<u32>,

        /// Display only a total disk usage
        #[arg(short, long)]
        summarize: bool,

        /// Show disk usage in human readable form
        #[arg(short = 'H', long)]
        human_readable: bool,

        /// Show output in JSON format
        #[arg(long)]
        show_json: bool,
    },
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let (target, options) = match &cli.command {
        Command::List {
            target,
            recursive,
            json,
        } => {
            let options = DisplayOptions::builder()
                .recursive(*recursive)
                .dvc_only(target.dvc_only)
                .json_output(*json)
                .colorized(!target.no_color)
                .build()
                .context("Invalid options")?;
            (target, options)
        }
        Command::DiskUsage {
            target,
            recursive,
            max_depth,
            summarize,
            human_readable,
            show_json,
        } => {
            let options = DisplayOptions::builder()
                .recursive(*recursive)
                .dvc_only(target.dvc_only)
                .with_size(true)
                .human_readable(*human_readable)
                .summarize(*summarize)
                .json_output(*show_json)
                .max_depth(*max_depth)
                .colorized(!target.no_color)
                .build()
                .context("Invalid options")?;
            (target, options)
        }
    };

    let ls_colors = std::env::var("LS_COLORS").ok();
    let formatter = EntryFormatter::new(ColorTable::from_sources(None, ls_colors.as_deref()));

    let ok = listing::run(target.target(), &options, &formatter, |output| {
        println!("{output}")
    });
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Send diagnostics to standard error, filtered by `RUST_LOG`.
fn init_tracing(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_new("debug")?
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
    Ok(())
}
