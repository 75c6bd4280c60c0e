use thiserror::Error;

/// Main error type for Wikipath
#[derive(Error, Debug)]
pub enum WikipathError {
    /// A page could not be retrieved (network failure or non-success status)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Embedding API errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Start or finish page could not be fetched or embedded
    #[error("Seed error: {0}")]
    Seed(String),

    /// `pop_best` was called on an empty frontier
    #[error("Frontier is empty")]
    EmptyFrontier,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system / socket I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl WikipathError {
    /// Wrap a collaborator failure on the start or finish page.
    pub fn seed(page: &str, source: &WikipathError) -> Self {
        WikipathError::Seed(format!("{}: {}", page, source))
    }
}

/// Convenient Result type using WikipathError
pub type Result<T> = std::result::Result<T, WikipathError>;
