use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;

use legacy_redirect::config::load_config;
use legacy_redirect::table::{Category, FileSource, RedirectTable, TableProvider};
use legacy_redirect::Resolver;

#[derive(Parser)]
#[command(name = "redirect-cli")]
#[command(about = "Offline tooling for the legacy redirect edge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one request target and print the action as JSON
    Resolve {
        #[arg(short, long, default_value = "legacy-redirect.toml")]
        config: PathBuf,

        /// Read the redirect table from this file instead of the configured location
        #[arg(short, long)]
        table: Option<PathBuf>,

        /// Request target, e.g. "/?p=42"
        target: String,
    },
    /// Parse a redirect table file and print its entry counts
    CheckTable { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { config, table, target } => {
            let config = load_config(&config)?;
            let fetch_timeout = Duration::from_millis(config.redirect.fetch_timeout_ms);
            let provider = match table {
                Some(path) => TableProvider::new(Arc::new(FileSource::new(path)), fetch_timeout),
                None => TableProvider::from_location(&config.redirect.table, fetch_timeout)?,
            };

            let resolver = Resolver::new(config.redirect, Arc::new(provider));
            let (path, query) = split_target(&target);
            let action = resolver.resolve(path, query).await;
            println!("{}", serde_json::to_string_pretty(&action)?);
        }
        Commands::CheckTable { file } => {
            let bytes = tokio::fs::read(&file).await?;
            match RedirectTable::from_slice(&bytes) {
                Ok(table) => println!("{}", serde_json::to_string_pretty(&summary(&table))?),
                Err(e) => {
                    eprintln!("Error: {}: {}", file.display(), e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn split_target(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (if path.is_empty() { "/" } else { path }, query),
        None => (target, ""),
    }
}

fn summary(table: &RedirectTable) -> serde_json::Value {
    let mut counts = serde_json::Map::new();
    for category in Category::ALL {
        counts.insert(category.as_str().to_string(), json!(table.len(category)));
    }
    json!({
        "entries": table.total_entries(),
        "categories": counts,
    })
}
