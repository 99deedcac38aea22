use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jotpad")]
#[command(about = "Short text notes from the command line, online or in offline demo mode")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use the hosted notes API instead of the offline demo store
    #[arg(long, global = true, requires = "user")]
    pub online: bool,

    /// Owner id for online mode
    #[arg(long, global = true, value_name = "UID")]
    pub user: Option<String>,

    /// Directory holding the offline demo data
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Path to config.json
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note title
        #[arg(short, long, default_value = "")]
        title: String,
        /// Note content (read from stdin when omitted and piped)
        content: Vec<String>,
    },
    /// List notes, most recently touched first
    List {
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search note titles and content
    Search {
        /// Search query
        query: String,
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing note; opens $EDITOR when no field is given
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New content
        #[arg(short, long)]
        content: Option<String>,
    },
    /// Delete an existing note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Erase the offline demo data and reseed the welcome notes
    Reset,
    /// Print the note list every time it changes (Ctrl-C to stop)
    Watch,
}
