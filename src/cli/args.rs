//! Argument structs for the `grove` subcommands.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Explorer root (the directory holding config.json and the source tree)
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Index this subdirectory instead of the configured source tree
    #[arg(long)]
    pub source: Option<String>,

    /// Emit the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Term to match against file names, by sound
    pub term: String,

    /// Explorer root
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Emit matches as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ZipArgs {
    /// Explorer root
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Archive path (defaults to `<root basename>.zip` inside the root)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct FeedArgs {
    /// Explorer root
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Public URL of the explorer, embedded in feed links
    #[arg(long, default_value = "http://localhost/")]
    pub url: String,
}

#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Bare name to look up, extension optional
    pub name: String,

    /// Directory to resolve against
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Comma-separated suffixes to try, in order; later hits shadow earlier
    /// ones and an empty element means the bare name
    #[arg(long, default_value = ",.txt,.md")]
    pub ext: String,
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Requested path relative to the root (empty for the index itself)
    #[arg(default_value = "")]
    pub path: String,

    /// Raw query string, e.g. `s=hello`, `zip`, `feed`, `d`, `raw`
    #[arg(long, short, default_value = "")]
    pub query: String,

    /// Explorer root
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Public URL of the explorer, embedded in feed links
    #[arg(long, default_value = "http://localhost/")]
    pub url: String,
}

#[derive(Parser, Debug)]
pub struct LsArgs {
    /// Explorer root
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Subdirectory to list, relative to the root
    pub path: Option<String>,
}
