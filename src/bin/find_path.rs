use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use wikipath::cache::EmbeddingCache;
use wikipath::embeddings::OpenAIEmbedder;
use wikipath::fetch::HttpPageFetcher;
use wikipath::server::types::FindPathReply;
use wikipath::{Config, SearchController, SearchOutcome};

#[derive(Parser, Debug)]
#[command(name = "find-path")]
#[command(about = "Find a chain of article links from START to FINISH")]
struct Args {
    /// Article URL to start from
    start: String,

    /// Article URL to reach
    finish: String,

    /// Override search.timeout_secs from config.toml
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the result as JSON (same shape as the HTTP API)
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();
    let config = Config::load()?;

    let api_key = std::env::var(&config.embeddings.api_key_env)
        .with_context(|| format!("Environment variable {} not set", config.embeddings.api_key_env))?;
    let mut embedder = OpenAIEmbedder::new(api_key, &config.embeddings)?;
    if config.embeddings.cache_capacity > 0 {
        embedder = embedder.with_cache(Arc::new(EmbeddingCache::new(config.embeddings.cache_capacity)));
    }
    let fetcher = HttpPageFetcher::new(&config.fetcher)?;

    let budget = args
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.search_timeout());
    let controller = SearchController::new(Arc::new(fetcher), Arc::new(embedder), budget);

    let outcome = controller.find_path(&args.start, &args.finish).await?;
    let found = outcome.is_success();

    if args.json {
        let json = match FindPathReply::from(outcome) {
            FindPathReply::Found(body) => serde_json::to_string_pretty(&body)?,
            FindPathReply::NotFound(body) => serde_json::to_string_pretty(&body)?,
        };
        println!("{}", json);
    } else {
        print_outcome(&args.start, &args.finish, outcome);
    }

    if !found {
        std::process::exit(1);
    }
    Ok(())
}

fn print_outcome(start: &str, finish: &str, outcome: SearchOutcome) {
    println!("\n{} -> {}", start, finish);
    match outcome {
        SearchOutcome::Success { path, diagnostics } => {
            println!("Found a path with {} links:", path.len().saturating_sub(1));
            for (i, url) in path.iter().enumerate() {
                println!("  {}. {}", i + 1, url);
            }
            println!(
                "\n{:.2}s, {} pages discovered, {} expanded",
                diagnostics.elapsed.as_secs_f64(),
                diagnostics.discovered,
                diagnostics.expansions
            );
        }
        SearchOutcome::Failure { reason, diagnostics } => {
            println!("No path found ({}): {}", reason, reason.message());
            println!(
                "{:.2}s, {} pages discovered, {} expanded, {} skipped",
                diagnostics.elapsed.as_secs_f64(),
                diagnostics.discovered,
                diagnostics.expansions,
                diagnostics.skipped
            );
        }
    }
}
