use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use podscout::feed;
use podscout::storage::{Database, DatabaseError, Episode, FeedSource};

#[derive(Parser, Debug)]
#[command(
    name = "podscout",
    about = "Discover podcast RSS feeds and build a local episode library"
)]
struct Args {
    /// SQLite database file (defaults to $DB_FILE, then podcasts.db)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search a web page for podcast RSS feeds
    Discover {
        /// Page URL to search
        url: String,
    },
    /// Fetch a feed and store its episodes
    Ingest {
        /// Feed URL to ingest
        feed_url: String,
    },
    /// Re-ingest every stored feed source
    Refresh,
    /// List the most recent episodes
    Episodes {
        /// Maximum number of episodes to show
        #[arg(long, default_value_t = 10)]
        limit: i64,
        /// Print as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List stored feed sources
    Sources {
        /// Print as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn db_path(args: &Args) -> PathBuf {
    args.db
        .clone()
        .or_else(|| std::env::var_os("DB_FILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("podcasts.db"))
}

fn format_date(epoch: i64) -> String {
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

fn print_episodes(episodes: &[Episode]) {
    for episode in episodes {
        println!(
            "{}  {}\n    {}\n    {}",
            format_date(episode.pub_date),
            episode.title,
            episode.audio_url,
            episode.feed_url,
        );
    }
}

fn print_sources(sources: &[FeedSource]) {
    for source in sources {
        let updated = source
            .last_updated
            .map(format_date)
            .unwrap_or_else(|| "never".to_owned());
        println!("{}  (last updated {})", source.url, updated);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let path = db_path(&args);
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;

    let db = match Database::open(path_str).await {
        Ok(db) => db,
        Err(e @ DatabaseError::InstanceLocked) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    let client = reqwest::Client::builder()
        .user_agent(concat!("podscout/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    match args.command {
        Command::Discover { url } => {
            let feeds = feed::discover(&client, &url).await;
            if feeds.is_empty() {
                println!("No podcast feeds found at {}", url);
            } else {
                println!("Found {} podcast feed(s):", feeds.len());
                for feed_url in feeds {
                    println!("{}", feed_url);
                }
            }
        }
        Command::Ingest { feed_url } => match feed::ingest(&db, &client, &feed_url).await {
            Ok(count) => println!("Ingested {} episode(s) from {}", count, feed_url),
            Err(e) => {
                eprintln!("Failed to ingest {}: {}", feed_url, e);
                std::process::exit(1);
            }
        },
        Command::Refresh => {
            let outcomes = feed::refresh_all(&db, &client)
                .await
                .context("Failed to list feed sources")?;
            if outcomes.is_empty() {
                println!("No feed sources stored.");
            }
            for outcome in outcomes {
                match outcome.result {
                    Ok(count) => println!("Updated {} ({} episodes)", outcome.feed_url, count),
                    Err(e) => println!("Failed {} ({})", outcome.feed_url, e),
                }
            }
        }
        Command::Episodes { limit, json } => {
            let episodes = db
                .recent_episodes(limit)
                .await
                .context("Failed to query episodes")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&episodes)?);
            } else if episodes.is_empty() {
                println!("No episodes stored.");
            } else {
                print_episodes(&episodes);
            }
        }
        Command::Sources { json } => {
            let sources = db
                .list_sources()
                .await
                .context("Failed to query sources")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sources)?);
            } else if sources.is_empty() {
                println!("No feed sources stored.");
            } else {
                print_sources(&sources);
            }
        }
    }

    Ok(())
}
