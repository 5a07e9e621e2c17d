use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docstash",
    about = "docstash: deduplicating, content-addressed document store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Debug-level logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML config file; --engine, --storage, --depth and --width override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of shard directory levels
    #[arg(long, global = true)]
    pub depth: Option<usize>,

    /// Hex characters per shard directory name
    #[arg(long, global = true)]
    pub width: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the metadata schema
    Createdb(CreatedbArgs),
    /// Compare object counts of the content store and the metadata index
    Checkstorage(LocationArgs),
    /// Ingest every eligible file under a directory
    Addfiles(AddfilesArgs),
    /// Show the indexed digests of one object
    Show(ShowArgs),
    /// Remove one object from both stores
    Delete(DeleteArgs),
}

#[derive(Args, Clone, Debug, Default)]
pub struct CreatedbArgs {
    /// Metadata index connection, e.g. sqlite:///files.sqlite
    #[arg(long)]
    pub engine: Option<String>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct LocationArgs {
    /// Metadata index connection, e.g. sqlite:///files.sqlite
    #[arg(long)]
    pub engine: Option<String>,
    /// Content store root directory
    #[arg(long)]
    pub storage: Option<PathBuf>,
}

#[derive(Args)]
pub struct AddfilesArgs {
    #[command(flatten)]
    pub location: LocationArgs,
    /// Directory to ingest recursively
    #[arg(long)]
    pub samples: PathBuf,
    /// Stop at the first file that fails
    #[arg(long)]
    pub fail_fast: bool,
    /// Extension given to newly stored objects
    #[arg(long)]
    pub extension: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub location: LocationArgs,
    /// Primary digest (hex)
    pub digest: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub location: LocationArgs,
    /// Primary digest (hex)
    pub digest: String,
}
