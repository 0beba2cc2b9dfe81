//! Shared types used by the monitor driver.

use std::fmt;
use std::time::Duration;

use alerts::{NOTIFY_GROUP, Reason};
use chrono::{DateTime, Utc};
use common::logger::TraceId;
use market::{Market, Quote};

/// Timing knobs for the driver.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Period between scheduled passes.
    pub interval: Duration,

    /// Pause between consecutive quote fetches inside one pass, to stay
    /// under provider rate limits.
    pub symbol_delay: Duration,

    /// Group tag attached to every notification.
    pub notify_group: String,
}

impl MonitorConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_symbol_delay(mut self, delay: Duration) -> Self {
        self.symbol_delay = delay;
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            symbol_delay: Duration::from_millis(200),
            notify_group: NOTIFY_GROUP.to_string(),
        }
    }
}

/// Why a pass was run.
///
/// The initial pass evaluates every rule regardless of market hours so the
/// user gets one snapshot at startup. Scheduled passes skip closed markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Initial,
    Scheduled,
}

impl PassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassKind::Initial => "initial",
            PassKind::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the notification for one evaluated symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum NotifyOutcome {
    /// Nothing newly triggered.
    NotNeeded,
    /// Something newly triggered but no transport is configured.
    Disabled,
    Sent,
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum SymbolOutcome {
    /// Market closed on a scheduled pass; no request was made.
    MarketClosed { next_open: DateTime<Utc> },

    /// Quote fetch failed; trigger state for the symbol is untouched.
    FetchFailed { error: String },

    /// Trigger state could not be updated; nothing was notified.
    StoreFailed { error: String },

    Evaluated {
        quote: Quote,
        /// Every condition currently satisfied, in evaluation order.
        reasons: Vec<Reason>,
        /// Subset of `reasons` that were not satisfied on the previous pass.
        newly: Vec<Reason>,
        notify: NotifyOutcome,
    },
}

#[derive(Debug, Clone)]
pub struct SymbolReport {
    pub symbol: String,
    pub label: String,
    pub market: Market,
    pub outcome: SymbolOutcome,
}

impl SymbolReport {
    pub fn is_newly_triggered(&self) -> bool {
        matches!(&self.outcome, SymbolOutcome::Evaluated { newly, .. } if !newly.is_empty())
    }
}

/// Summary of one pass over the rule set, in rule order.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub trace_id: TraceId,
    pub kind: PassKind,
    pub started_at: DateTime<Utc>,
    pub symbols: Vec<SymbolReport>,
}

impl PassReport {
    pub fn evaluated(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::Evaluated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::MarketClosed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                SymbolOutcome::FetchFailed { .. } | SymbolOutcome::StoreFailed { .. }
            )
        })
    }

    pub fn notifications_sent(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                SymbolOutcome::Evaluated {
                    notify: NotifyOutcome::Sent,
                    ..
                }
            )
        })
    }

    pub fn symbol(&self, symbol: &str) -> Option<&SymbolReport> {
        self.symbols.iter().find(|s| s.symbol == symbol)
    }

    fn count(&self, pred: impl Fn(&SymbolOutcome) -> bool) -> usize {
        self.symbols.iter().filter(|s| pred(&s.outcome)).count()
    }
}

/// Progress events emitted by [`crate::MonitorEngine::run`] for display.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    Pass(PassReport),

    /// Every market referenced by the rules is closed; the driver sleeps
    /// until `next_open`.
    Paused {
        market: Market,
        next_open: DateTime<Utc>,
    },

    /// Rule set replaced by a reload.
    Reloaded { rules: usize },
}
