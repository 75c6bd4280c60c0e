pub mod cache;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod fetch;
pub mod search;
pub mod server;

pub use config::Config;
pub use error::{Result, WikipathError};
pub use search::{FailureReason, SearchController, SearchOutcome};
