use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use storyscout::cli::{degree, geo, ingest, show};
use storyscout::config::Config;
use storyscout::fetch::HttpFeedClient;
use storyscout::pipeline::Pacer;
use storyscout::store::LocationTarget;

#[derive(Parser)]
#[command(name = "storyscout")]
#[command(about = "Story ingestion, deduplication and mention-graph discovery")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "storyscout.yaml")]
    config: String,

    /// Disable the randomized delay between requests
    #[arg(long, global = true)]
    no_delay: bool,

    /// Print every story and enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest the stories of one or more users
    Users {
        /// User IDs
        #[arg(required = true)]
        ids: Vec<String>,

        /// Save unseen stories to a batch file
        #[arg(long)]
        save: bool,
    },

    /// List followed accounts from the reel tray
    Tray {
        /// Also ingest the stories of every listed account
        #[arg(long)]
        ingest: bool,

        /// Save unseen stories to a batch file (with --ingest)
        #[arg(long)]
        save: bool,
    },

    /// Ingest the stories of a place, looked up by name
    Location {
        /// Place name
        name: String,

        /// Save unseen stories to a batch file
        #[arg(long)]
        save: bool,
    },

    /// Record users seen at geotagged locations
    Geo {
        /// Locations as ID:LABEL
        #[arg(required = true)]
        locations: Vec<LocationTarget>,
    },

    /// Run one degree of mention discovery
    Degree {
        /// Seed the graph before expanding
        #[arg(long)]
        init: bool,

        /// Seed user ID (repeatable, with --init)
        #[arg(long = "seed")]
        seeds: Vec<String>,

        /// Save unseen stories to a batch file
        #[arg(long)]
        save: bool,
    },

    /// Show a user's profile
    Whois {
        /// User ID
        user_id: String,
    },

    /// Print a single-story snapshot
    Show {
        /// Snapshot file
        path: PathBuf,
    },

    /// Extract one story from a batch file into a snapshot
    Snapshot {
        /// Batch file
        batch: PathBuf,
        /// Media ID to extract
        media_id: String,
        /// Output snapshot path
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "storyscout=debug"
    } else {
        "storyscout=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    // Load config
    let mut config = Config::load(&cli.config)?;
    if cli.no_delay {
        config.pacing.enabled = false;
    }
    if cli.verbose {
        config.verbose = true;
    }

    let pacer = Pacer::new(&config.pacing);

    // Only commands that talk to the platform build a client
    let client = || HttpFeedClient::new(&config.client);

    match cli.command {
        Commands::Users { ids, save } => {
            ingest::users(&config, &client()?, &pacer, ids, save)?;
        }
        Commands::Tray { ingest: all, save } => {
            ingest::tray(&config, &client()?, &pacer, all, save)?;
        }
        Commands::Location { name, save } => {
            ingest::location(&config, &client()?, &pacer, &name, save)?;
        }
        Commands::Geo { locations } => {
            geo::run(&config, &client()?, &pacer, locations)?;
        }
        Commands::Degree { init, seeds, save } => {
            degree::run(&config, &client()?, &pacer, init, seeds, save)?;
        }
        Commands::Whois { user_id } => {
            show::whois(&client()?, &user_id)?;
        }
        Commands::Show { path } => {
            show::show(&path)?;
        }
        Commands::Snapshot {
            batch,
            media_id,
            out,
        } => {
            show::snapshot(&batch, &media_id, &out)?;
        }
    }

    Ok(())
}
