//! Per-client sliding-window rate limiting for search requests.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Windows {
    hits: HashMap<IpAddr, VecDeque<Instant>>,
    last_sweep: Instant,
}

/// Allows at most `limit` requests per client within `window`.
///
/// Clients with no request inside the window are dropped once per window.
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    state: Mutex<Windows>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit as usize,
            window,
            state: Mutex::new(Windows {
                hits: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Record a request and report whether it is allowed.
    pub fn check(&self, client: IpAddr) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap();
        let window = self.window;

        if now.saturating_duration_since(state.last_sweep) >= window {
            state.hits.retain(|_, hits| {
                hits.back()
                    .is_some_and(|t| now.saturating_duration_since(*t) < window)
            });
            state.last_sweep = now;
        }

        let hits = state.hits.entry(client).or_default();
        while let Some(oldest) = hits.front() {
            if now.saturating_duration_since(*oldest) >= window {
                hits.pop_front();
            } else {
                break;
            }
        }

        if hits.len() >= self.limit {
            return false;
        }
        hits.push_back(now);
        true
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.state.lock().unwrap().hits.len()
    }
}
