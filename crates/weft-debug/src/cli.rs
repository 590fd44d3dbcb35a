//! CLI definitions for weft.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "weft",
    version,
    about = "Inspect syntax trees and incremental reparses of the bracket language",
    after_help = "Examples:\n  weft tree notes.txt\n  weft tree notes.txt --stop 120\n  weft edit notes.txt --at 10 --delete 2 --insert \"{ x }\" --tree"
)]
pub struct Cli {
    /// Show debug logging from the parser.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// Configuration file (defaults to weft.toml next to the input).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a file and print its tree.
    Tree {
        /// Input file.
        file: PathBuf,
        /// Stop tokenizing at this byte offset.
        #[arg(long, value_name = "OFFSET")]
        stop: Option<u32>,
    },
    /// Parse a file, apply one edit, reparse and report what was reused.
    Edit {
        /// Input file.
        file: PathBuf,
        /// Byte offset of the edit.
        #[arg(long, value_name = "OFFSET")]
        at: u32,
        /// Number of bytes removed at the offset.
        #[arg(long, default_value = "0")]
        delete: u32,
        /// Text inserted at the offset.
        #[arg(long, default_value = "")]
        insert: String,
        /// Print the reparsed tree after the report.
        #[arg(long)]
        tree: bool,
    },
}
