use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use preview::LandingConfig;
use tools::{ResolveRequest, prepare_style_text, resolve_report};
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect iBurn landing-page links")]
struct Args {
    /// JSON file overriding the landing page configuration
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show everything the landing page derives from a query string
    Resolve {
        /// Entity type the page was served for (pin, event, art, camp, ...)
        #[arg(long = "type")]
        entity_type: String,

        /// Browser user agent, used to pick the trigger steps
        #[arg(long, default_value = "")]
        user_agent: String,

        /// Full page URL; defaults to https://iburn.app/<type>/?<query>
        #[arg(long)]
        page_url: Option<String>,

        /// Query string, with or without the leading `?`
        query: String,
    },

    /// Print a style document rewritten for the given page origin
    Style {
        file: PathBuf,

        #[arg(long, default_value = "https://iburn.app")]
        origin: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => LandingConfig::from_json(&fs::read_to_string(path)?)?,
        None => LandingConfig::default(),
    };

    match args.command {
        Command::Resolve {
            entity_type,
            user_agent,
            page_url,
            query,
        } => {
            let query = query.trim_start_matches('?');
            let page_url = page_url.unwrap_or_else(|| default_page_url(&entity_type, query));
            let origin = Url::parse(&page_url)?.origin().ascii_serialization();
            info!(%page_url, "resolving link");

            let report = resolve_report(
                &ResolveRequest {
                    entity_type: &entity_type,
                    query,
                    page_url: &page_url,
                    origin: &origin,
                    user_agent: &user_agent,
                },
                &config,
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Style { file, origin } => {
            let raw = fs::read_to_string(&file)?;
            let style = prepare_style_text(&raw, &origin)?;
            println!("{}", serde_json::to_string_pretty(&style)?);
        }
    }

    Ok(())
}

fn default_page_url(entity_type: &str, query: &str) -> String {
    if query.is_empty() {
        format!("https://iburn.app/{entity_type}/")
    } else {
        format!("https://iburn.app/{entity_type}/?{query}")
    }
}
