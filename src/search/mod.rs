pub mod controller;
pub mod discovery;
pub mod event_log;
pub mod frontier;

pub use controller::{Clock, Diagnostics, FailureReason, SearchController, SearchOutcome, SystemClock};
pub use discovery::DiscoverySet;
pub use event_log::{EventLog, LogMirror};
pub use frontier::{Frontier, Node};
