//! Command-line interface for firetrack.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// firetrack - Friendly Fire movie catalog builder
///
/// Scrapes the podcast's episode list, enriches each movie with IMDb data
/// and streaming availability, and writes the catalog the site reads.
#[derive(Parser, Debug)]
#[command(name = "firetrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Resolve from cache and the previous catalog only; no API calls
    #[arg(long, global = true)]
    pub skip_apis: bool,

    /// Keep cached or previous streaming options instead of fetching
    #[arg(long, global = true)]
    pub skip_streaming: bool,

    /// Reuse the last known episode list instead of scraping
    #[arg(long, global = true)]
    pub skip_scraping: bool,

    /// Config file (default: firetrack.toml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for movies.json and metadata.json
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline (default)
    Run,

    /// Merge host ratings from a CSV export into the catalog
    Ratings {
        /// CSV with Title (or Name), Year, AR, BR, JR, Rating columns
        csv: PathBuf,

        /// Catalog to update (default: <output_dir>/movies.json)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Show the report without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a config file with default values
    Init {
        /// Destination (default: firetrack.toml)
        #[arg(default_value = "firetrack.toml")]
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_combine() {
        let cli = Cli::parse_from(["firetrack", "--skip-apis", "--skip-scraping"]);
        assert!(cli.skip_apis);
        assert!(cli.skip_scraping);
        assert!(!cli.skip_streaming);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_ratings_subcommand() {
        let cli = Cli::parse_from([
            "firetrack",
            "ratings",
            "ratings.csv",
            "--dry-run",
            "--catalog",
            "site/movies.json",
        ]);

        match cli.command {
            Some(Commands::Ratings {
                csv,
                catalog,
                dry_run,
            }) => {
                assert_eq!(csv, PathBuf::from("ratings.csv"));
                assert_eq!(catalog, Some(PathBuf::from("site/movies.json")));
                assert!(dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
