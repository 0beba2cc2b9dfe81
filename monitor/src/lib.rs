//! Poll/notify driver.
//!
//! [`engine::MonitorEngine`] runs evaluation passes over the active rule
//! set: it gates symbols on their market calendar, fetches quotes, runs the
//! edge-triggered evaluator against the trigger store and forwards newly
//! crossed conditions to the notifier. [`engine::MonitorEngine::run`] wraps
//! that in the tick / market-closed wait / hot-reload / shutdown loop.

pub mod clock;
pub mod engine;
pub mod shutdown;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use engine::MonitorEngine;
pub use types::{MonitorConfig, MonitorEvent, NotifyOutcome, PassKind, PassReport, SymbolOutcome, SymbolReport};
