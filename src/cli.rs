//! Command-line interface definition for Coursemate

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ask questions about a folder of course documents
#[derive(Debug, Parser)]
#[command(name = "coursemate", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, global = true, default_value = "coursemate.yaml")]
    pub config: PathBuf,

    /// Folder of course documents to index at startup
    #[arg(long, global = true, default_value = "docs")]
    pub docs: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse and index the document folder, then report what was loaded
    Ingest,

    /// Ask a single question and print the answer with its sources
    Ask {
        /// The question to ask
        question: String,

        /// Continue an existing session instead of starting a new one
        #[arg(long)]
        session: Option<String>,
    },

    /// Interactive question-answering session
    Chat,
}
