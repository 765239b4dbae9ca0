//! grove: a directory tree explorer.
//!
//! Indexes a source tree, answers phonetic fuzzy searches over file names,
//! and materializes two cached artifacts: a whole-tree zip archive and an
//! RSS feed announcing the latest change.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod archive;
mod cli;
mod config;
mod error;
mod feed;
mod index;
mod request;
mod resolve;

fn main() {
    cli::run();
}
