//! Alert rules and their edge-triggered evaluation.
//!
//! A [`rule::Rule`] declares per-symbol thresholds. The
//! [`evaluator::Evaluator`] turns a rule plus a fresh quote into the set of
//! conditions that currently hold, and a [`store::TriggerStore`] remembers
//! that set between passes so only false→true transitions notify.

pub mod evaluator;
pub mod notify;
pub mod rule;
pub mod store;

pub use evaluator::{Condition, Evaluator, Reason, TriggerResult};
pub use notify::{NOTIFY_GROUP, Notification, Notifier, SendError};
pub use rule::{Rule, RuleSet};
pub use store::{InMemoryTriggerStore, TriggerStore};
