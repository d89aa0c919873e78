use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "searchengine")]
#[command(about = "Search albums and bands", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $SEARCHENGINE_CONFIG or config/searchengine.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search album titles once and print the results
    Search {
        /// Words to search for
        #[arg(required = true, num_args = 1..)]
        word: Vec<String>,
    },

    /// Show the band that released an album
    Album { id: u64 },

    /// Show a band's details and discography
    Band { id: u64 },

    /// Print the last stored search results
    History,

    /// Read the search box from stdin, one line per edit
    Interactive,
}
