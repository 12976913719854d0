//! Message limiter
//!
//! Keeps track of how many messages were sent within the last hour. The window
//! is rolling: every budget check looks back exactly one hour from "now" and
//! forgets everything that is at least that old.
//!
//! ```text
//!          purged              counted
//!   ──────────┤◄──────────── 1 hour ────────────►│
//!           now-1h                              now
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::trace;

/// Length of the rolling window.
pub fn window() -> Duration {
    Duration::hours(1)
}

/// Sliding one-hour budget for outgoing messages.
#[derive(Debug, Clone)]
pub struct MessageLimiter {
    limit: usize,
    sent_count: usize,
    sent_log: BTreeMap<DateTime<Utc>, usize>,
}

impl MessageLimiter {
    /// Create a limiter that allows `limit` messages per rolling hour.
    ///
    /// A limit of `0` never allows sending.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            sent_count: 0,
            sent_log: BTreeMap::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Messages counted in the window as of the last purge.
    pub fn sent_count(&self) -> usize {
        self.sent_count
    }

    /// Check whether there is budget left to send a message right now.
    pub fn can_send(&mut self) -> bool {
        self.can_send_at(Utc::now())
    }

    /// Same as [`MessageLimiter::can_send`], evaluated at `now`.
    pub fn can_send_at(&mut self, now: DateTime<Utc>) -> bool {
        self.purge(now);
        self.sent_count < self.limit
    }

    /// Record that `count` messages were just sent.
    pub fn update(&mut self, count: usize) {
        self.update_at(Utc::now(), count);
    }

    /// Same as [`MessageLimiter::update`], recorded at `now`.
    pub fn update_at(&mut self, now: DateTime<Utc>, count: usize) {
        if count == 0 {
            return;
        }

        self.sent_count += count;
        *self.sent_log.entry(now).or_default() += count;
        trace!("recorded {count} message(s), {} in window", self.sent_count);
    }

    fn purge(&mut self, now: DateTime<Utc>) {
        let window = window();
        let mut purged = 0;

        self.sent_log.retain(|timestamp, count| {
            // an entry exactly one hour old is already out of the window
            let keep = now - *timestamp < window;
            if !keep {
                purged += *count;
            }
            keep
        });

        if purged > 0 {
            trace!("purged {purged} message(s) older than {window}");
            self.sent_count -= purged;
        }
    }
}
