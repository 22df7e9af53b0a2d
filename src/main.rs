use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use maze_indexer::{
    ConsoleSelector, Episode, IndexerClient, IndexerConfig, IndexerError, ScheduleEntry, Show,
    ShowParts,
};
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "maze-indexer")]
#[command(version, about = "Look up TV show metadata on TVmaze", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Preferred metadata language
    #[arg(long, global = true)]
    language: Option<String>,

    /// File episodes by DVD order where available
    #[arg(long, global = true)]
    dvd_order: bool,

    /// Do not read or write the response cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Directory for the response cache
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Proxy for all requests, e.g. http://localhost:3128
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Ask which show to use when a search is ambiguous
    #[arg(short, long, global = true)]
    interactive: bool,

    /// TOML configuration file, command line flags take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List shows matching a name
    Search { name: String },

    /// Print a show, optionally with episodes, cast and artwork
    Show {
        /// Show name, resolved through a search
        #[arg(required_unless_present = "id")]
        name: Option<String>,

        /// TVmaze show id, skips the search
        #[arg(long, conflicts_with = "name")]
        id: Option<u64>,

        #[arg(long)]
        episodes: bool,

        #[arg(long)]
        cast: bool,

        #[arg(long)]
        art: bool,
    },

    /// Print one episode, or a single field of it
    Episode {
        name: String,
        season: u32,
        episode: u32,
        field: Option<String>,
    },

    /// List the episodes of a show aired on a date (YYYY-MM-DD)
    Aired { name: String, date: NaiveDate },

    /// List episodes airing on a day
    Schedule {
        /// ISO 3166-1 country code
        #[arg(long, default_value = "US")]
        country: String,

        /// Day to list (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// All known future episodes instead of a single day
        #[arg(long)]
        full: bool,
    },
}

fn load_config(cli: &Cli) -> Result<IndexerConfig, IndexerError> {
    let mut config = match cli.config {
        Some(ref path) => IndexerConfig::from_toml_file(path)?,
        None => IndexerConfig::default(),
    };

    if let Some(ref language) = cli.language {
        config.language = language.clone();
    }
    if cli.dvd_order {
        config.dvd_order = true;
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }
    if let Some(ref dir) = cli.cache_dir {
        config.cache.location = Some(dir.clone());
    }
    if let Some(ref proxy) = cli.proxy {
        config.proxy = Some(proxy.clone());
    }

    Ok(config)
}

/// Renders upstream HTML summaries as plain text
fn plain_text(html: &str) -> String {
    nanohtml2text::html2text(html).trim().to_string()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn print_show(show: &Show) {
    println!("{}", show);
    println!("  Id: {}", show.id());
    if let Some(network) = show.network() {
        println!("  Network: {}", network);
    }
    if let Some(first_aired) = show.first_aired() {
        println!("  First aired: {}", first_aired);
    }
    let genres = show.genres();
    if !genres.is_empty() {
        println!("  Genres: {}", genres.join(", "));
    }
    if let (Some(days), Some(time)) = (show.airs_day_of_week(), show.airs_time()) {
        println!("  Airs: {} at {}", days, time);
    }
    if let Some(runtime) = show.runtime() {
        println!("  Runtime: {} min", runtime);
    }
    if let Some(imdb) = show.imdb_id() {
        println!("  IMDb: {}", imdb);
    }
    if let Some(overview) = show.overview() {
        println!("\n{}\n", plain_text(overview));
    }

    for warning in show.warnings() {
        println!("  Skipped field {}", warning);
    }

    if show.parts().episodes {
        for season in show.seasons() {
            println!("Season {} ({} episodes)", season.number(), season.len());
            for episode in season.episodes() {
                println!("  {}  [{}]", episode, episode.first_aired().unwrap_or("TBA"));
            }
        }
    }

    if show.parts().actors {
        println!("\nCast:");
        for actor in show.actors() {
            println!(
                "  {} as {}",
                actor.name.as_deref().unwrap_or("Unknown"),
                actor.role.as_deref().unwrap_or("Unknown")
            );
        }
    }

    if show.parts().banners {
        println!("\nArtwork:");
        for banner in show.banners() {
            let main = if banner.main { " (main)" } else { "" };
            println!("  {} {}{}: {}", banner.kind, banner.resolution, main, banner.url);
        }
    }
}

fn print_episode(episode: &Episode) {
    println!("{}", episode);
    for (name, value) in episode.fields() {
        if value.is_null() {
            continue;
        }
        let text = match (name.as_str(), value) {
            ("summary", Value::String(html)) => plain_text(html),
            _ => display_value(value),
        };
        println!("  {}: {}", name, text);
    }
}

fn print_schedule_entry(entry: &ScheduleEntry) {
    let show = entry
        .show
        .as_ref()
        .and_then(|show| show.name())
        .unwrap_or("Unknown show");
    println!(
        "{}  {} S{:02}E{:02} - {}",
        entry.airstamp().unwrap_or("TBA"),
        show,
        entry.season_number().unwrap_or(0),
        entry.episode_number().unwrap_or(0),
        entry.name().unwrap_or("TBA")
    );
}

fn run(cli: Cli) -> Result<(), IndexerError> {
    let config = load_config(&cli)?;

    let mut builder = IndexerClient::builder().config(config);
    if cli.interactive {
        builder = builder.selector(Arc::new(ConsoleSelector));
    }
    let client = builder.build()?;

    match cli.command {
        Command::Search { name } => {
            let candidates = client.search_shows(&name)?;
            if candidates.is_empty() {
                println!("No shows found for '{}'.", name);
            }
            for candidate in candidates {
                println!("{:>8}  {}", candidate.id(), candidate);
            }
        }
        Command::Show {
            name,
            id,
            episodes,
            cast,
            art,
        } => {
            let parts = ShowParts {
                episodes,
                actors: cast,
                banners: art,
            };
            let id = match id {
                Some(id) => id,
                None => client.resolve_show(&name.unwrap_or_default())?.id(),
            };
            print_show(&*client.get_show(id, parts)?);
        }
        Command::Episode {
            name,
            season,
            episode,
            field,
        } => {
            let show = client.by_name(&name)?;
            let episode = show.episode(season, episode)?;
            match field {
                Some(field) => println!("{}", display_value(episode.get(&field)?)),
                None => print_episode(episode),
            }
        }
        Command::Aired { name, date } => {
            let show = client.by_name(&name)?;
            for episode in show.aired_on(date)? {
                println!("{}", episode);
            }
        }
        Command::Schedule {
            country,
            date,
            full,
        } => {
            let entries = if full {
                client.full_schedule()?
            } else {
                let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
                client.schedule(&country, date)?
            };
            if entries.is_empty() {
                println!("Nothing scheduled.");
            }
            for entry in &entries {
                print_schedule_entry(entry);
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "maze_indexer=debug"
    } else {
        "maze_indexer=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
