use anyhow::Result;
use std::sync::Arc;
use wikipath::cache::EmbeddingCache;
use wikipath::embeddings::OpenAIEmbedder;
use wikipath::fetch::HttpPageFetcher;
use wikipath::search::{LogMirror, SearchController};
use wikipath::server::HttpServer;
use wikipath::Config;

/// Build a configured embedder with an optional LRU page-embedding cache.
fn build_embedder(config: &Config) -> Result<OpenAIEmbedder> {
    let api_key = std::env::var(&config.embeddings.api_key_env).map_err(|_| {
        anyhow::anyhow!(
            "Environment variable {} not set. Set it in your .env file or as an environment variable.",
            config.embeddings.api_key_env
        )
    })?;

    let embedder = OpenAIEmbedder::new(api_key, &config.embeddings)?;
    if config.embeddings.cache_capacity > 0 {
        Ok(embedder.with_cache(Arc::new(EmbeddingCache::new(config.embeddings.cache_capacity))))
    } else {
        Ok(embedder)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("verify");

    match command {
        "serve" => run_http_server().await?,
        "verify" => run_verification()?,
        other => anyhow::bail!("Unknown command '{}'. Usage: wikipath [serve|verify]", other),
    }

    Ok(())
}

async fn run_http_server() -> Result<()> {
    log::info!("Starting Wikipath HTTP server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    let fetcher = HttpPageFetcher::new(&config.fetcher)?;
    let embedder = build_embedder(&config)?;

    let mirror = Arc::new(LogMirror::new());
    let controller = SearchController::new(
        Arc::new(fetcher),
        Arc::new(embedder),
        config.search_timeout(),
    )
    .with_mirror(Arc::clone(&mirror));

    let server = HttpServer::new(&config, Arc::new(controller), mirror);
    server
        .run(&config.http_server.host, config.http_server.port)
        .await?;

    Ok(())
}

/// Load configuration and report the effective settings
fn run_verification() -> Result<()> {
    log::info!("Starting Wikipath v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    log::info!("Configuration loaded successfully");
    log::info!("Search timeout: {}s", config.search.timeout_secs);
    log::info!("Article prefix: {}", config.fetcher.article_prefix);
    log::info!("Embedding model: {} via {}", config.embeddings.model, config.embeddings.api_base);

    if std::env::var(&config.embeddings.api_key_env).is_err() {
        log::warn!("Environment variable {} is not set", config.embeddings.api_key_env);
    }

    let index = config.static_dir().join("index.html");
    if index.is_file() {
        log::info!("Static client: {}", index.display());
    } else {
        log::warn!("Static client not found at {}", index.display());
    }

    log::info!(
        "Ready to serve on {}:{}",
        config.http_server.host,
        config.http_server.port
    );
    Ok(())
}
