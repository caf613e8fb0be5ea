//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Offline-first itinerary sync
///
/// Reads itineraries through the local cache, revalidating against the API
/// when online. Configuration comes from TRIPSYNC_* variables and the TOML
/// file named by TRIPSYNC_CONFIG_FILE.
#[derive(Parser, Debug)]
#[command(name = "tripsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Cache database path (overrides configuration)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch an itinerary, serving the cache when offline
    Get {
        id: String,

        /// Revalidate even if the cached copy is fresh
        #[arg(short, long)]
        force: bool,
    },

    /// Edit a cached itinerary at a dotted path
    Patch {
        id: String,

        /// Dotted path, e.g. days.0.activities.2.title
        path: String,

        /// New value as JSON; bare words are taken as strings
        value: String,
    },

    /// List cached itinerary ids
    List,

    /// Remove one cached itinerary
    Remove { id: String },

    /// Show cache statistics
    Stats,

    /// Evict hard-expired entries
    Cleanup,

    /// Remove every cached itinerary
    Clear,
}
