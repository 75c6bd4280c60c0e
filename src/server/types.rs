use crate::search::{Diagnostics, SearchOutcome};
use serde::{Deserialize, Serialize};

/// Body of `POST /find_path`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FindPathRequest {
    pub start: String,
    pub finish: String,
}

/// Successful search
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FindPathResponse {
    pub path: Vec<String>,
    pub logs: Vec<String>,
    /// Seconds
    pub time: f64,
    pub discovered: usize,
}

/// Failed search: same diagnostics, no path
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FindPathFailure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub logs: Vec<String>,
    pub time: f64,
    pub discovered: usize,
}

impl FindPathFailure {
    /// Failure before any diagnostics exist (seed errors, invalid requests)
    pub fn bare(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            reason: None,
            logs: Vec::new(),
            time: 0.0,
            discovered: 0,
        }
    }
}

/// Wire form of a search outcome
pub enum FindPathReply {
    Found(FindPathResponse),
    NotFound(FindPathFailure),
}

impl From<SearchOutcome> for FindPathReply {
    fn from(outcome: SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::Success { path, diagnostics } => {
                let Diagnostics { log, elapsed, discovered, .. } = diagnostics;
                FindPathReply::Found(FindPathResponse {
                    path,
                    logs: log,
                    time: elapsed.as_secs_f64(),
                    discovered,
                })
            }
            SearchOutcome::Failure { reason, diagnostics } => {
                let Diagnostics { log, elapsed, discovered, .. } = diagnostics;
                FindPathReply::NotFound(FindPathFailure {
                    error: reason.message().to_string(),
                    reason: Some(reason.as_str().to_string()),
                    logs: log,
                    time: elapsed.as_secs_f64(),
                    discovered,
                })
            }
        }
    }
}
