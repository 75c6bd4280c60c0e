pub mod http;
pub mod rate_limit;
pub mod types;

pub use http::{router, AppState, HttpServer};
pub use rate_limit::RateLimiter;
pub use types::{FindPathFailure, FindPathRequest, FindPathResponse};
