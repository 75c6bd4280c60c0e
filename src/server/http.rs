use crate::config::Config;
use crate::error::{Result, WikipathError};
use crate::search::{LogMirror, SearchController};
use crate::server::rate_limit::RateLimiter;
use crate::server::types::{FindPathFailure, FindPathReply, FindPathRequest};
use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::{stream, Stream, StreamExt};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    controller: Arc<SearchController>,
    mirror: Arc<LogMirror>,
    limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(controller: Arc<SearchController>, mirror: Arc<LogMirror>, limiter: RateLimiter) -> Self {
        Self {
            controller,
            mirror,
            limiter: Arc::new(limiter),
        }
    }
}

/// HTTP front end for the path finder
pub struct HttpServer {
    state: AppState,
    static_dir: PathBuf,
    allowed_origins: Vec<String>,
}

impl HttpServer {
    /// `controller` must already be attached to `mirror` for `/logs` to see its events.
    pub fn new(config: &Config, controller: Arc<SearchController>, mirror: Arc<LogMirror>) -> Self {
        let limiter = RateLimiter::per_minute(config.http_server.rate_limit_per_minute);
        Self {
            state: AppState::new(controller, mirror, limiter),
            static_dir: config.static_dir().to_path_buf(),
            allowed_origins: config.http_server.allowed_origins.clone(),
        }
    }

    /// Run the HTTP server until it fails
    pub async fn run(&self, host: &str, port: u16) -> Result<()> {
        let app = self.router();
        let addr = format!("{}:{}", host, port);

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            WikipathError::Config(format!(
                "Failed to bind to {}: {}. Set http_server.port in config.toml to use a different port.",
                addr, e
            ))
        })?;

        log::info!("Listening on http://{}", addr);
        log::info!("Path finder endpoint: http://{}/find_path", addr);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|e| WikipathError::Io(std::io::Error::other(format!("HTTP server error: {}", e))))?;

        Ok(())
    }

    pub fn router(&self) -> Router {
        router(self.state.clone(), &self.static_dir, &self.allowed_origins)
    }
}

/// Build the axum router
pub fn router(state: AppState, static_dir: &Path, allowed_origins: &[String]) -> Router {
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/find_path", post(handle_find_path))
        .route("/logs", get(handle_logs))
        .route("/health", get(handle_health))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Handle `POST /find_path`
async fn handle_find_path(
    State(state): State<AppState>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    body: axum::body::Bytes,
) -> Response {
    if !state.limiter.check(client.ip()) {
        log::warn!("Rate limit exceeded for {}", client.ip());
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(FindPathFailure::bare("Rate limit exceeded, try again later")),
        )
            .into_response();
    }

    let request: FindPathRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(FindPathFailure::bare(
                    WikipathError::InvalidInput(format!("Invalid JSON: {}", e)).to_string(),
                )),
            )
                .into_response();
        }
    };

    for (field, value) in [("start", &request.start), ("finish", &request.finish)] {
        if !is_http_url(value) {
            return (
                StatusCode::BAD_REQUEST,
                Json(FindPathFailure::bare(
                    WikipathError::InvalidInput(format!("'{}' is not a valid URL: {}", field, value))
                        .to_string(),
                )),
            )
                .into_response();
        }
    }

    match state.controller.find_path(&request.start, &request.finish).await {
        Ok(outcome) => match FindPathReply::from(outcome) {
            FindPathReply::Found(body) => (StatusCode::OK, Json(body)).into_response(),
            FindPathReply::NotFound(body) => {
                log::error!("Search failed: {}", body.error);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        },
        Err(e) => {
            log::error!("Search aborted: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FindPathFailure::bare(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Handle `GET /logs`: every mirrored message so far, then new ones as they arrive
async fn handle_logs(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (backlog, receiver) = state.mirror.subscribe();

    let live = BroadcastStream::new(receiver).filter_map(|message| async move {
        match message {
            Ok(message) => Some(message),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                log::warn!("Log stream subscriber lagged, {} messages dropped", skipped);
                None
            }
        }
    });

    let events = stream::iter(backlog)
        .chain(live)
        .map(|message| std::result::Result::<Event, Infallible>::Ok(Event::default().data(message)));

    let keepalive = KeepAlive::new()
        .interval(Duration::from_secs(15))
        .text("ping");

    Sse::new(events).keep_alive(keepalive)
}

/// Handle health check endpoint
async fn handle_health(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "wikipath",
            "version": env!("CARGO_PKG_VERSION"),
            "search_timeout_secs": state.controller.time_budget().as_secs_f64(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::Embedder;
    use crate::fetch::PageFetcher;
    use crate::server::types::FindPathResponse;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;
    use std::collections::HashMap;
    use tower::ServiceExt;

    struct MapFetcher(HashMap<&'static str, Vec<&'static str>>);

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            if url.ends_with("/Missing") {
                return Err(WikipathError::Fetch(format!("{} returned 404 Not Found", url)));
            }
            Ok(url.to_string())
        }

        fn extract_links(&self, _page_text: &str, base_url: &str) -> Vec<String> {
            self.0
                .get(base_url)
                .map(|links| links.iter().map(|s| s.to_string()).collect())
                .unwrap_or_default()
        }
    }

    struct FlatEmbedder;

    #[async_trait]
    impl Embedder for FlatEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
    }

    const START: &str = "https://en.wikipedia.org/wiki/Start";
    const MIDDLE: &str = "https://en.wikipedia.org/wiki/Middle";
    const FINISH: &str = "https://en.wikipedia.org/wiki/Finish";
    const ISLAND: &str = "https://en.wikipedia.org/wiki/Island";

    fn app(rate_limit: u32) -> (Router, Arc<LogMirror>) {
        let mut graph = HashMap::new();
        graph.insert(START, vec![MIDDLE]);
        graph.insert(MIDDLE, vec![FINISH]);
        let mirror = Arc::new(LogMirror::new());
        let controller = SearchController::new(
            Arc::new(MapFetcher(graph)),
            Arc::new(FlatEmbedder),
            Duration::from_secs(30),
        )
        .with_mirror(Arc::clone(&mirror));
        let state = AppState::new(
            Arc::new(controller),
            Arc::clone(&mirror),
            RateLimiter::per_minute(rate_limit),
        );
        let router = router(state, Path::new("client"), &[])
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        (router, mirror)
    }

    fn find_path_request(start: &str, finish: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/find_path")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"start": start, "finish": finish}).to_string(),
            ))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_find_path_success() {
        let (app, mirror) = app(5);
        let response = app.oneshot(find_path_request(START, FINISH)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: FindPathResponse = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(body.path, vec![START, MIDDLE, FINISH]);
        assert_eq!(body.discovered, 1);
        assert!(body.time >= 0.0);
        assert_eq!(body.logs, mirror.subscribe().0);
    }

    #[tokio::test]
    async fn test_find_path_exhausted_is_error_with_diagnostics() {
        let (app, _) = app(5);
        let response = app.oneshot(find_path_request(START, ISLAND)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["reason"], "exhausted");
        assert_eq!(body["discovered"], 2);
        assert!(body.get("path").is_none());
        assert!(!body["logs"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_failure_is_error_without_logs() {
        let (app, _) = app(5);
        let missing = "https://en.wikipedia.org/wiki/Missing";
        let response = app.oneshot(find_path_request(START, missing)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("Seed error"));
        assert_eq!(body["logs"], serde_json::json!([]));
        assert_eq!(body["discovered"], 0);
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let (app, _) = app(5);
        let request = Request::builder()
            .method("POST")
            .uri("/find_path")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_url_is_bad_request() {
        let (app, _) = app(5);
        let response = app.oneshot(find_path_request("Start", FINISH)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("'start'"));
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let (app, _) = app(1);
        let first = app
            .clone()
            .oneshot(find_path_request(START, FINISH))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(find_path_request(START, FINISH)).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(5);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["search_timeout_secs"], 30.0);
    }

    #[tokio::test]
    async fn test_logs_is_event_stream() {
        let (app, _) = app(5);
        let response = app
            .oneshot(Request::builder().uri("/logs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/event-stream"));
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url(START));
        assert!(!is_http_url("ftp://en.wikipedia.org/wiki/Start"));
        assert!(!is_http_url("Start"));
    }
}
