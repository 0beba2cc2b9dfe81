//! Edge-triggered rule evaluation.
//!
//! [`Evaluator::evaluate`] is pure: it reports which of the rule's four
//! thresholds hold for a quote, always in the order price-above,
//! price-below, change-above, change-below. Deciding which of those are
//! *new* is a set difference against the previous pass, see
//! [`TriggerResult::newly_triggered`].

use std::collections::HashSet;
use std::fmt;

use market::Quote;

use crate::notify::Notification;
use crate::rule::Rule;

/// One threshold of a rule, carrying its configured value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    PriceAbove(f64),
    PriceBelow(f64),
    ChangeAbove(f64),
    ChangeBelow(f64),
}

impl Condition {
    /// Stable identity used for dedup between passes.
    ///
    /// Depends only on the condition and its threshold, never on the quote,
    /// so a condition that keeps holding while the price moves keeps the
    /// same key.
    pub fn key(&self) -> String {
        self.to_string()
    }

    fn holds(&self, quote: &Quote) -> bool {
        match *self {
            Condition::PriceAbove(t) => quote.current_price > t,
            Condition::PriceBelow(t) => quote.current_price < t,
            Condition::ChangeAbove(t) => quote.percent_change > t,
            Condition::ChangeBelow(t) => quote.percent_change < t,
        }
    }

    fn describe(&self, quote: &Quote) -> String {
        match *self {
            Condition::PriceAbove(t) => {
                format!("price ${:.2} above ${:.2}", quote.current_price, t)
            }
            Condition::PriceBelow(t) => {
                format!("price ${:.2} below ${:.2}", quote.current_price, t)
            }
            Condition::ChangeAbove(t) => {
                format!("change {:.2}% above {:.2}%", quote.percent_change, t)
            }
            Condition::ChangeBelow(t) => {
                format!("change {:.2}% below {:.2}%", quote.percent_change, t)
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::PriceAbove(t) => write!(f, "price > {t}"),
            Condition::PriceBelow(t) => write!(f, "price < {t}"),
            Condition::ChangeAbove(t) => write!(f, "change% > {t}"),
            Condition::ChangeBelow(t) => write!(f, "change% < {t}"),
        }
    }
}

/// A satisfied condition plus its human-readable explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reason {
    pub condition: Condition,
    pub message: String,
}

impl Reason {
    pub fn key(&self) -> String {
        self.condition.key()
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of evaluating one rule against one quote.
#[derive(Debug, Clone)]
pub struct TriggerResult<'a> {
    pub rule: &'a Rule,
    pub quote: &'a Quote,
    /// Empty when no condition holds.
    pub reasons: Vec<Reason>,
}

impl<'a> TriggerResult<'a> {
    pub fn triggered(&self) -> bool {
        !self.reasons.is_empty()
    }

    /// Keys of every condition currently satisfied.
    pub fn condition_keys(&self) -> HashSet<String> {
        self.reasons.iter().map(Reason::key).collect()
    }

    /// Reasons that were not satisfied on the previous pass, in evaluation order.
    pub fn newly_triggered(&self, previous: &HashSet<String>) -> Vec<&Reason> {
        self.reasons
            .iter()
            .filter(|r| !previous.contains(&r.key()))
            .collect()
    }

    /// Bundles the given reasons into a single push notification.
    pub fn notification(&self, reasons: &[&Reason], group: &str) -> Notification {
        let title = format!("📊 {} alert", self.rule.label());

        let mut body = format!(
            "Price: ${:.2} ({}{:.2}%)\n",
            self.quote.current_price,
            self.quote.sign(),
            self.quote.percent_change
        );
        for reason in reasons {
            body.push_str(&format!("⚠️ {}\n", reason.message));
        }

        Notification {
            title,
            body,
            group: group.to_string(),
        }
    }
}

/// Stateless rule evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate<'a>(&self, rule: &'a Rule, quote: &'a Quote) -> TriggerResult<'a> {
        let candidates = [
            rule.price_above.map(Condition::PriceAbove),
            rule.price_below.map(Condition::PriceBelow),
            rule.change_above.map(Condition::ChangeAbove),
            rule.change_below.map(Condition::ChangeBelow),
        ];

        let reasons = candidates
            .into_iter()
            .flatten()
            .filter(|c| c.holds(quote))
            .map(|c| Reason {
                condition: c,
                message: c.describe(quote),
            })
            .collect();

        TriggerResult {
            rule,
            quote,
            reasons,
        }
    }
}
