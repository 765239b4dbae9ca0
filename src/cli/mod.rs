//! Command-line interface: argument parsing, logging setup and dispatch.

pub mod args;

use std::io::Write;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::ExplorerError;
use crate::index::build_manifest;
use crate::resolve::{list_directory, resolve, sorted_entries};
use crate::request::{RequestContext, respond};
use crate::{archive, feed};
use args::{FeedArgs, GetArgs, LsArgs, ResolveArgs, SearchArgs, StatsArgs, ZipArgs};
use grove::{StatsReport, base_name, friendly_date, fuzzy, humanize_size};

#[derive(Parser, Debug)]
#[command(name = "grove", version, about = "Directory tree explorer: index, search, archive, feed")]
struct Cli {
    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index the source tree and report aggregate statistics
    Stats(StatsArgs),
    /// Fuzzy-search file names by sound
    Search(SearchArgs),
    /// Build the whole-tree zip archive
    Zip(ZipArgs),
    /// Render (or serve the cached) RSS feed
    Feed(FeedArgs),
    /// Evaluate one request against the root, body to stdout
    Get(GetArgs),
    /// Resolve a bare name against a directory listing
    Resolve(ResolveArgs),
    /// List one directory level
    Ls(LsArgs),
}

pub fn run() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Stats(args) => cmd_stats(args),
        Commands::Search(args) => cmd_search(args),
        Commands::Zip(args) => cmd_zip(args),
        Commands::Feed(args) => cmd_feed(args),
        Commands::Get(args) => cmd_get(args),
        Commands::Resolve(args) => cmd_resolve(args),
        Commands::Ls(args) => cmd_ls(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn loaded_config(dir: &PathBuf) -> Config {
    let mut config = Config::load(dir);
    config.expand_placeholders(dir, &dir.display().to_string());
    config
}

fn source_tree(dir: &PathBuf, config: &Config, over: &Option<String>) -> PathBuf {
    match over {
        Some(name) => dir.join(name),
        None => config.source_dir(dir),
    }
}

fn cmd_stats(args: StatsArgs) -> Result<(), ExplorerError> {
    let config = loaded_config(&args.dir);
    let source = source_tree(&args.dir, &config, &args.source);
    let manifest = build_manifest(&source, &config.exclusions());
    let report = StatsReport::from_manifest(&manifest);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", config.title);
    println!("  source:   {}", source.display());
    println!("  entries:  {}", report.file_count);
    println!("  size:     {}", report.total_size_human);
    if report.freshest_modified > 0 {
        println!(
            "  updated:  {}",
            friendly_date(report.freshest_modified, now_secs())
        );
    }
    if !report.extension_histogram.is_empty() {
        println!("  by extension:");
        for (extension, bytes) in &report.extension_histogram {
            println!("    {:<12} {}", extension, humanize_size(*bytes, 1));
        }
    }
    Ok(())
}

fn cmd_search(args: SearchArgs) -> Result<(), ExplorerError> {
    let config = loaded_config(&args.dir);
    let source = config.source_dir(&args.dir);
    let manifest = build_manifest(&source, &config.exclusions());
    let matches = fuzzy::search(&args.term, &manifest.entries);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }
    for m in &matches {
        println!("{}", m.path);
    }
    eprintln!("{} match(es) for '{}'", matches.len(), args.term);
    Ok(())
}

fn cmd_zip(args: ZipArgs) -> Result<(), ExplorerError> {
    let config = loaded_config(&args.dir);
    let source = config.source_dir(&args.dir);
    let manifest = build_manifest(&source, &config.exclusions());

    let archive_path = args.output.unwrap_or_else(|| {
        args.dir
            .join(format!("{}.zip", base_name(&args.dir.display().to_string())))
    });
    let paths: Vec<String> = manifest.entries.iter().map(|e| e.relative_path.clone()).collect();
    archive::build_archive(&paths, &archive_path, &source)?;
    if archive_path.exists() {
        println!("{}", archive_path.display());
        Ok(())
    } else {
        Err(ExplorerError::NotFound(format!(
            "nothing to archive under {}",
            source.display()
        )))
    }
}

fn cmd_feed(args: FeedArgs) -> Result<(), ExplorerError> {
    let config = loaded_config(&args.dir);
    let source = config.source_dir(&args.dir);
    let manifest = build_manifest(&source, &config.exclusions());
    let bytes = feed::feed_bytes(&manifest, &args.dir.join("feed.rss"), &args.url, &config)?;
    std::io::stdout().write_all(&bytes)?;
    Ok(())
}

fn cmd_get(args: GetArgs) -> Result<(), ExplorerError> {
    let config = loaded_config(&args.dir);
    let ctx = RequestContext::new(&args.path, &args.query, &args.url);
    let response = respond(&ctx, &args.dir, &config)?;

    eprintln!("HTTP {}", response.status);
    for (name, value) in &response.headers {
        eprintln!("{name}: {value}");
    }
    std::io::stdout().write_all(&response.body)?;
    Ok(())
}

fn cmd_resolve(args: ResolveArgs) -> Result<(), ExplorerError> {
    let config = loaded_config(&args.dir);
    let candidates: Vec<&str> = args.ext.split(',').collect();
    let index = list_directory(&args.dir, &config.exclusions());
    match resolve(&args.name, &index, &candidates, &args.dir) {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => Err(ExplorerError::NotFound(format!(
            "'{}' in {}",
            args.name,
            args.dir.display()
        ))),
    }
}

fn cmd_ls(args: LsArgs) -> Result<(), ExplorerError> {
    let config = loaded_config(&args.dir);
    let target = match &args.path {
        Some(path) => args.dir.join(path.trim_matches('/')),
        None => config.source_dir(&args.dir),
    };
    if !target.is_dir() {
        return Err(ExplorerError::NotFound(target.display().to_string()));
    }

    let now = now_secs();
    for entry in sorted_entries(&list_directory(&target, &config.exclusions())) {
        let kind = if entry.is_dir { "d" } else { "f" };
        let size = if entry.is_dir {
            String::from("-")
        } else {
            humanize_size(entry.size, 1)
        };
        println!(
            "{kind} {size:>10}  {:<20} {}",
            friendly_date(entry.modified, now),
            entry.name
        );
    }
    Ok(())
}
