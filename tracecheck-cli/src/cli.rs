use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Check that requirements trace to tasks and research claims trace to sources"
)]
pub struct Cli {
    /// Specification directory containing the documents
    #[clap(long, default_value = ".", global = true)]
    pub path: PathBuf,

    /// Show debug logging on stderr
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Only log errors
    #[clap(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that every acceptance criterion is covered by a task
    Validate {
        /// Print a JSON summary instead of the console report
        #[clap(long)]
        json: bool,

        /// Criterion extraction mode (strict or lenient)
        #[clap(long)]
        mode: Option<String>,

        /// Blueprint file name
        #[clap(long)]
        blueprint: Option<String>,

        /// Requirements file name
        #[clap(long)]
        requirements: Option<String>,

        /// Tasks file name
        #[clap(long)]
        tasks: Option<String>,
    },

    /// Print the traceability matrix and audit research citations
    Trace {
        /// Print a JSON summary instead of the markdown report
        #[clap(long)]
        json: bool,

        /// Criterion extraction mode (strict or lenient)
        #[clap(long)]
        mode: Option<String>,

        /// Requirements file name
        #[clap(long)]
        requirements: Option<String>,

        /// Tasks file name
        #[clap(long)]
        tasks: Option<String>,

        /// Research file name
        #[clap(long)]
        research: Option<String>,

        /// Number of uncited claims to list before truncating
        #[clap(long)]
        max_claims: Option<usize>,
    },

    /// Write a default tracecheck.yaml into the specification directory
    InitConfig,
}
