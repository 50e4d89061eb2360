use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Fixed-window in-memory rate limiter for credential endpoints.
///
/// Keys are caller-supplied (client address or address+account); windows
/// reset lazily on access, so stale entries cost one map slot until their
/// key is touched again.
#[derive(Debug)]
pub struct LoginRateLimiter {
    max_attempts: u32,
    window: Duration,
    windows: DashMap<String, WindowState>,
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    started: Instant,
    attempts: u32,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            windows: DashMap::new(),
        }
    }

    /// Records one attempt for `key`. Returns false when the window's
    /// budget is exhausted.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert(WindowState {
            started: now,
            attempts: 0,
        });

        if now.duration_since(entry.started) > self.window {
            entry.started = now;
            entry.attempts = 0;
        }

        entry.attempts += 1;
        entry.attempts <= self.max_attempts
    }

    /// Clears the window for `key`, e.g. after a successful login.
    pub fn reset(&self, key: &str) {
        self.windows.remove(key);
    }
}
