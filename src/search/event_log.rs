//! Human-readable search trace.
//!
//! Each search owns an [`EventLog`]. When a [`LogMirror`] is attached, every
//! message is also appended to the mirror, which outlives individual searches
//! and feeds the `/logs` stream. Messages are never reordered or deduplicated.

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

const MIRROR_CHANNEL_CAPACITY: usize = 1024;

/// Process-wide append-only log shared between concurrent searches.
pub struct LogMirror {
    entries: Mutex<Vec<String>>,
    sender: broadcast::Sender<String>,
}

impl LogMirror {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(MIRROR_CHANNEL_CAPACITY);
        Self {
            entries: Mutex::new(Vec::new()),
            sender,
        }
    }

    /// Append one message and notify live subscribers.
    pub fn append(&self, message: String) {
        let mut entries = self.entries.lock().unwrap();
        // Sending under the lock keeps broadcast order identical to buffer order.
        let _ = self.sender.send(message.clone());
        entries.push(message);
    }

    /// Snapshot of everything appended so far plus a receiver for what follows.
    ///
    /// Taken under one lock, so no message is missed or seen twice between the two.
    pub fn subscribe(&self) -> (Vec<String>, broadcast::Receiver<String>) {
        let entries = self.entries.lock().unwrap();
        (entries.clone(), self.sender.subscribe())
    }
}

impl Default for LogMirror {
    fn default() -> Self {
        Self::new()
    }
}

/// Trace of a single search invocation.
pub struct EventLog {
    search_id: String,
    messages: Vec<String>,
    mirror: Option<Arc<LogMirror>>,
}

impl EventLog {
    pub fn new(search_id: impl Into<String>, mirror: Option<Arc<LogMirror>>) -> Self {
        Self {
            search_id: search_id.into(),
            messages: Vec::new(),
            mirror,
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("[{}] {}", self.search_id, message);
        self.push(message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = format!("Warning: {}", message.into());
        log::warn!("[{}] {}", self.search_id, message);
        self.push(message);
    }

    fn push(&mut self, message: String) {
        if let Some(mirror) = &self.mirror {
            mirror.append(message.clone());
        }
        self.messages.push(message);
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_without_mirror() {
        let mut log = EventLog::new("t", None);
        log.info("one");
        log.warn("two");
        assert_eq!(log.into_messages(), vec!["one", "Warning: two"]);
    }

    #[test]
    fn test_mirror_receives_in_order() {
        let mirror = Arc::new(LogMirror::new());
        let mut first = EventLog::new("a", Some(Arc::clone(&mirror)));
        let mut second = EventLog::new("b", Some(Arc::clone(&mirror)));
        first.info("a1");
        second.info("b1");
        first.info("a2");
        assert_eq!(mirror.subscribe().0, vec!["a1", "b1", "a2"]);
        assert_eq!(first.into_messages(), vec!["a1", "a2"]);
        assert_eq!(second.into_messages(), vec!["b1"]);
    }

    #[test]
    fn test_subscribe_sees_backlog_then_live() {
        let mirror = LogMirror::new();
        mirror.append("old".to_string());
        let (backlog, mut rx) = mirror.subscribe();
        mirror.append("new".to_string());
        assert_eq!(backlog, vec!["old"]);
        assert_eq!(rx.try_recv().unwrap(), "new");
        assert!(rx.try_recv().is_err());
        assert_eq!(mirror.subscribe().0, vec!["old", "new"]);
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let mirror = Arc::new(LogMirror::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let mirror = Arc::clone(&mirror);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        mirror.append(format!("{}-{}", t, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let entries = mirror.subscribe().0;
        assert_eq!(entries.len(), 200);
        for t in 0..4 {
            let own: Vec<_> = entries.iter().filter(|e| e.starts_with(&format!("{}-", t))).collect();
            let expected: Vec<String> = (0..50).map(|i| format!("{}-{}", t, i)).collect();
            assert_eq!(own, expected.iter().collect::<Vec<_>>());
        }
    }
}
