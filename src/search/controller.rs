//! Best-first path search over live article links.
//!
//! The controller seeds the frontier with the start page, then repeatedly
//! expands the frontier node closest to the finish page until the finish page
//! shows up among the links, the frontier runs dry, or the time budget is
//! spent. Every terminal state carries the same diagnostics: the event log,
//! elapsed time and the number of discovered pages.

use crate::embeddings::Embedder;
use crate::error::{Result, WikipathError};
use crate::fetch::PageFetcher;
use crate::search::discovery::DiscoverySet;
use crate::search::event_log::{EventLog, LogMirror};
use crate::search::frontier::{Frontier, Node};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Time source for the budget check.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Why a search ended without a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Timeout,
    Exhausted,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::Exhausted => "exhausted",
        }
    }

    /// Message shown to API clients
    pub fn message(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "Search exceeded time limit.",
            FailureReason::Exhausted => "No path found: every reachable page was explored.",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostics attached to every outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub log: Vec<String>,
    pub elapsed: Duration,
    /// Size of the discovery set when the search stopped
    pub discovered: usize,
    /// Frontier nodes popped and expanded
    pub expansions: usize,
    /// Nodes pushed to the frontier, start node excluded
    pub enqueued: usize,
    /// Candidates dropped after a fetch or embedding failure
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Success {
        path: Vec<String>,
        diagnostics: Diagnostics,
    },
    Failure {
        reason: FailureReason,
        diagnostics: Diagnostics,
    },
}

impl SearchOutcome {
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            SearchOutcome::Success { diagnostics, .. } => diagnostics,
            SearchOutcome::Failure { diagnostics, .. } => diagnostics,
        }
    }

    pub fn path(&self) -> Option<&[String]> {
        match self {
            SearchOutcome::Success { path, .. } => Some(path),
            SearchOutcome::Failure { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Success { .. })
    }
}

/// Mutable state of one search invocation. Never shared.
struct SearchRun {
    log: EventLog,
    started: Instant,
    frontier: Frontier,
    discovery: DiscoverySet,
    expansions: usize,
    enqueued: usize,
    skipped: usize,
}

impl SearchRun {
    fn diagnostics(self, elapsed: Duration) -> Diagnostics {
        Diagnostics {
            log: self.log.into_messages(),
            elapsed,
            discovered: self.discovery.len(),
            expansions: self.expansions,
            enqueued: self.enqueued,
            skipped: self.skipped,
        }
    }
}

/// Drives the seed / expand / score / enqueue loop.
pub struct SearchController {
    fetcher: Arc<dyn PageFetcher>,
    embedder: Arc<dyn Embedder>,
    time_budget: Duration,
    mirror: Option<Arc<LogMirror>>,
    clock: Arc<dyn Clock>,
}

impl SearchController {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        embedder: Arc<dyn Embedder>,
        time_budget: Duration,
    ) -> Self {
        Self {
            fetcher,
            embedder,
            time_budget,
            mirror: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Mirror every event into a shared, streamable log
    pub fn with_mirror(mut self, mirror: Arc<LogMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn time_budget(&self) -> Duration {
        self.time_budget
    }

    /// Search for a chain of links from `start` to `finish`.
    ///
    /// Returns `Err(WikipathError::Seed)` only when the start or finish page
    /// cannot be fetched or embedded. Timeouts and exhaustion are ordinary
    /// `SearchOutcome::Failure` values.
    ///
    /// Links back to `start` are never followed, so a successful path holds no
    /// URL twice. `start` itself is not counted in `Diagnostics::discovered`.
    pub async fn find_path(&self, start: &str, finish: &str) -> Result<SearchOutcome> {
        let search_id = Uuid::new_v4().to_string();
        let mut run = SearchRun {
            log: EventLog::new(search_id, self.mirror.clone()),
            started: self.clock.now(),
            frontier: Frontier::new(),
            discovery: DiscoverySet::new(),
            expansions: 0,
            enqueued: 0,
            skipped: 0,
        };

        run.log.info(format!("Searching for a path from {} to {}", start, finish));

        if start == finish {
            run.log.info(format!("Start page is the finish page: {}", start));
            return Ok(self.succeed(run, vec![start.to_string()]));
        }

        let target = self.seed_embedding(&mut run, finish, "finish").await?;
        let start_embedding = self.seed_embedding(&mut run, start, "start").await?;
        run.frontier.push(Node::root(start, start_embedding));

        loop {
            let elapsed = self.elapsed(&run);
            if elapsed >= self.time_budget {
                run.log.info(format!(
                    "Search exceeded time limit of {} seconds.",
                    self.time_budget.as_secs_f64()
                ));
                return Ok(self.fail(run, FailureReason::Timeout, elapsed));
            }

            if run.frontier.is_empty() {
                run.log.info("Frontier exhausted without reaching the finish page.");
                let elapsed = self.elapsed(&run);
                return Ok(self.fail(run, FailureReason::Exhausted, elapsed));
            }

            let node = run
                .frontier
                .pop_best(&target, |a, b| self.embedder.similarity(a, b))?;

            if let Some(path) = self.expand(&mut run, &node, start, finish).await {
                return Ok(self.succeed(run, path));
            }
        }
    }

    /// Fetch and embed a seed page; any failure aborts the search.
    async fn seed_embedding(&self, run: &mut SearchRun, url: &str, role: &str) -> Result<Vec<f32>> {
        run.log.info(format!("Fetching {} page: {}", role, url));
        let embedding = self
            .fetch_and_embed(url)
            .await
            .map_err(|e| WikipathError::seed(url, &e))?;
        run.log.info(format!("Embedded {} page: {}", role, url));
        Ok(embedding)
    }

    async fn fetch_and_embed(&self, url: &str) -> Result<Vec<f32>> {
        let text = self.fetcher.fetch(url).await?;
        self.embedder.embed(&text).await
    }

    /// Expand one node. Returns the full path if the finish page is among its links.
    async fn expand(
        &self,
        run: &mut SearchRun,
        node: &Node,
        start: &str,
        finish: &str,
    ) -> Option<Vec<String>> {
        run.expansions += 1;
        run.log.info(format!("Fetching page: {}", node.url));

        let page = match self.fetcher.fetch(&node.url).await {
            Ok(page) => page,
            Err(e) => {
                run.log.warn(format!("Could not expand {}: {}", node.url, e));
                return None;
            }
        };
        run.log.info(format!("Finished fetching page: {}", node.url));

        let links = self.fetcher.extract_links(&page, &node.url);
        run.log.info(format!("Found {} links on page: {}", links.len(), node.url));

        // The start page never enters the discovery set; links back to it are dropped here.
        let candidates: Vec<&str> = run
            .discovery
            .undiscovered(&links)
            .into_iter()
            .filter(|url| *url != start)
            .collect();

        for candidate in candidates {
            if candidate == finish {
                run.log.info(format!("Found finish page: {}", candidate));
                let mut path = node.path.clone();
                path.push(candidate.to_string());
                return Some(path);
            }

            run.discovery.add(candidate);
            match self.fetch_and_embed(candidate).await {
                Ok(embedding) => {
                    run.log.info(format!(
                        "Adding link to queue: {} (depth {})",
                        candidate,
                        node.depth() + 1
                    ));
                    run.frontier.push(node.child(candidate, embedding));
                    run.enqueued += 1;
                }
                Err(e) => {
                    run.log.warn(format!("Skipping {}: {}", candidate, e));
                    run.skipped += 1;
                }
            }
        }

        None
    }

    fn elapsed(&self, run: &SearchRun) -> Duration {
        self.clock.now().saturating_duration_since(run.started)
    }

    fn summarize(run: &mut SearchRun, elapsed: Duration) {
        run.log
            .info(format!("Search took {:.2} seconds.", elapsed.as_secs_f64()));
        run.log
            .info(format!("Discovered pages: {}", run.discovery.len()));
    }

    fn succeed(&self, mut run: SearchRun, path: Vec<String>) -> SearchOutcome {
        let elapsed = self.elapsed(&run);
        Self::summarize(&mut run, elapsed);
        SearchOutcome::Success {
            path,
            diagnostics: run.diagnostics(elapsed),
        }
    }

    fn fail(&self, mut run: SearchRun, reason: FailureReason, elapsed: Duration) -> SearchOutcome {
        Self::summarize(&mut run, elapsed);
        SearchOutcome::Failure {
            reason,
            diagnostics: run.diagnostics(elapsed),
        }
    }
}
