// Chunk: docs/chunks/file_change_events - Debounce, suppression and reconnect state
//!
//! The watcher's state machine, without any I/O.
//!
//! ```text
//! Idle ──start──▶ Watching ──delete/rename/revoke──▶ Reconnecting
//!   │                ▲                                  │    │
//!   └─attach failed──┼──────────────────────────────────┘    │
//!                    └────────── probe succeeded ◀───────────┘
//!                                                            │
//!                  Stopped ◀── attempts exhausted / stop ────┘
//! ```
//!
//! Writes arm a debounce deadline; each new write pushes it out, so a burst
//! produces one notification. When the deadline passes, a pending
//! suppression swallows the notification instead.
//!
//! Time is passed in by the driver, which makes every transition testable
//! with synthetic `Instant`s. The driver owns the real watch handle and acts
//! on the [`WatchAction`]s returned by [`WatchSession::poll`].

use std::time::{Duration, Instant};

use crate::config::WatchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Not started yet.
    Idle,
    /// A live watch is attached to the target.
    Watching,
    /// The target vanished; probing for it every reconnect interval.
    Reconnecting {
        /// Ticks taken so far in this cycle.
        attempts: u32,
        next_probe: Instant,
    },
    /// Terminal until the owner starts a new session.
    Stopped,
}

/// Work the driver must carry out after a [`WatchSession::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    /// Attach a fresh live watch to the target.
    Reattach,
    /// Invoke the change callback.
    Notify,
}

pub struct WatchSession {
    state: WatchState,
    /// When the pending debounced notification fires.
    debounce_deadline: Option<Instant>,
    /// Upcoming self-writes whose notifications must be swallowed.
    suppress_count: u32,
    debounce: Duration,
    reconnect_interval: Duration,
    max_attempts: u32,
}

impl WatchSession {
    pub fn new(config: &WatchConfig) -> Self {
        Self {
            state: WatchState::Idle,
            debounce_deadline: None,
            suppress_count: 0,
            debounce: config.debounce(),
            reconnect_interval: config.reconnect_interval(),
            max_attempts: config.max_reconnect_attempts,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn suppress_count(&self) -> u32 {
        self.suppress_count
    }

    /// Attempts taken in the current reconnect cycle, zero outside one.
    pub fn reconnect_attempts(&self) -> u32 {
        match self.state {
            WatchState::Reconnecting { attempts, .. } => attempts,
            _ => 0,
        }
    }

    pub fn has_pending_debounce(&self) -> bool {
        self.debounce_deadline.is_some()
    }

    /// Leaves `Idle`. `attached` says whether the initial watch succeeded.
    pub fn start(&mut self, attached: bool, now: Instant) {
        if self.state != WatchState::Idle {
            return;
        }
        if attached {
            self.state = WatchState::Watching;
        } else {
            self.begin_reconnect(now);
        }
    }

    /// A write landed on the target. Replaces any pending debounce deadline.
    pub fn record_write(&mut self, now: Instant) {
        if self.state == WatchState::Watching {
            self.debounce_deadline = Some(now + self.debounce);
        }
    }

    /// The live watch is gone (target deleted, renamed, or watch revoked).
    pub fn detach(&mut self, now: Instant) {
        if self.state == WatchState::Watching {
            self.begin_reconnect(now);
        }
    }

    /// Swallow the next debounced notification.
    pub fn suppress_next(&mut self) {
        self.suppress_count = self.suppress_count.saturating_add(1);
    }

    /// Cancels everything. Idempotent.
    pub fn stop(&mut self) {
        self.state = WatchState::Stopped;
        self.debounce_deadline = None;
    }

    /// The earliest instant at which [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let reconnect = match self.state {
            WatchState::Reconnecting { next_probe, .. } => Some(next_probe),
            _ => None,
        };
        match (self.debounce_deadline, reconnect) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fires whatever timers are due at `now`.
    ///
    /// `probe` is called at most once, only when a reconnect tick is due and
    /// attempts remain; it should report whether the target can be opened.
    pub fn poll(&mut self, now: Instant, probe: impl FnOnce() -> bool) -> Vec<WatchAction> {
        let mut actions = Vec::new();

        if let Some(deadline) = self.debounce_deadline {
            if now >= deadline {
                self.debounce_deadline = None;
                if self.suppress_count > 0 {
                    self.suppress_count -= 1;
                    tracing::trace!(remaining = self.suppress_count, "suppressed self-triggered change");
                } else {
                    actions.push(WatchAction::Notify);
                }
            }
        }

        if let WatchState::Reconnecting {
            attempts,
            next_probe,
        } = self.state
        {
            if now >= next_probe {
                let attempts = attempts + 1;
                if attempts > self.max_attempts {
                    // No callback on give-up; the owner just stops hearing from us.
                    tracing::warn!(attempts = self.max_attempts, "target did not reappear, watcher giving up");
                    self.stop();
                } else if probe() {
                    tracing::info!(attempts, "target reappeared, reattaching");
                    self.state = WatchState::Watching;
                    actions.push(WatchAction::Reattach);
                    actions.push(WatchAction::Notify);
                } else {
                    self.state = WatchState::Reconnecting {
                        attempts,
                        next_probe: now + self.reconnect_interval,
                    };
                }
            }
        }

        actions
    }

    fn begin_reconnect(&mut self, now: Instant) {
        tracing::debug!("target detached, reconnecting");
        self.state = WatchState::Reconnecting {
            attempts: 0,
            next_probe: now + self.reconnect_interval,
        };
    }
}
