//! dgcontent - query the DG Content API from the command line
//!
//! Reads configuration from the environment (and `.env`), runs one command and
//! prints the result as JSON.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use dgcontent::cli::{Cli, Command};
use dgcontent::{ContentCache, ContentClient, FileCache, MemoryCache};

/// Sets up log output on stderr, controlled by `RUST_LOG` (default `warn`)
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Cache backend requested on the command line, if it overrides the default
fn cache_override(cli: &Cli) -> Option<Arc<dyn ContentCache>> {
    if cli.no_cache {
        return Some(Arc::new(MemoryCache::new()));
    }
    let dir = cli.cache_dir.as_ref()?;
    Some(Arc::new(FileCache::with_dir(dir.clone())))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = match cache_override(&cli) {
        Some(cache) => ContentClient::from_env_with_cache(cache)?,
        None => ContentClient::from_env()?,
    };

    if let Some(ttl) = cli.cache_ttl {
        client.set_cache_ttl(ttl)?;
    }
    client.set_process_result(!cli.no_process);

    match &cli.command {
        Command::Posts(args) => {
            let filters = args.to_filters()?;
            print_json(&client.list_posts(&filters).await?)?;
        }
        Command::Post(args) => {
            print_json(&client.get_post(&args.to_lookup()).await?)?;
        }
        Command::Categories { website_only } => {
            print_json(&client.list_categories(*website_only).await?)?;
        }
        Command::Stat { kind, id, count } => {
            print_json(&client.record_stat(*kind, id, *count).await?)?;
        }
        Command::ClearCache => {
            let removed = client.clear_cache()?;
            println!("Removed {} cached entries", removed);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env file is fine; real environment variables still apply
    let _ = dotenv::dotenv();
    init_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
