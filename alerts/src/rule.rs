use std::collections::HashSet;

use market::Market;
use serde::{Deserialize, Serialize};

/// Alert thresholds for one symbol. Every threshold is optional; a rule with
/// none set is still tracked (e.g. created for a holding) but never fires.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rule {
    pub symbol: String,

    #[serde(default)]
    pub market: Market,

    /// Optional human-friendly name shown next to the symbol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Fires when price > threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_above: Option<f64>,

    /// Fires when price < threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_below: Option<f64>,

    /// Fires when percent change > threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_above: Option<f64>,

    /// Fires when percent change < threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_below: Option<f64>,
}

impl Rule {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.market = market;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn price_above(mut self, threshold: f64) -> Self {
        self.price_above = Some(threshold);
        self
    }

    pub fn price_below(mut self, threshold: f64) -> Self {
        self.price_below = Some(threshold);
        self
    }

    pub fn change_above(mut self, threshold: f64) -> Self {
        self.change_above = Some(threshold);
        self
    }

    pub fn change_below(mut self, threshold: f64) -> Self {
        self.change_below = Some(threshold);
        self
    }

    /// Display name, ignoring an empty string.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// `SYMBOL (Name)` or just `SYMBOL`.
    pub fn label(&self) -> String {
        match self.display_name() {
            Some(name) => format!("{} ({})", self.symbol, name),
            None => self.symbol.clone(),
        }
    }

    pub fn has_thresholds(&self) -> bool {
        self.price_above.is_some()
            || self.price_below.is_some()
            || self.change_above.is_some()
            || self.change_below.is_some()
    }
}

/// Ordered rule collection with unique symbols.
///
/// Adding a rule for a symbol that already exists replaces it in place, so
/// the last write wins while evaluation order stays stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut set = Self::default();
        for rule in rules {
            set.upsert(rule);
        }
        set
    }

    /// Insert or replace by symbol. Returns `true` if an existing rule was replaced.
    pub fn upsert(&mut self, rule: Rule) -> bool {
        match self.rules.iter_mut().find(|r| r.symbol == rule.symbol) {
            Some(existing) => {
                *existing = rule;
                true
            }
            None => {
                self.rules.push(rule);
                false
            }
        }
    }

    pub fn remove(&mut self, symbol: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.symbol != symbol);
        self.rules.len() != before
    }

    pub fn get(&self, symbol: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.symbol == symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Distinct markets referenced by the rules.
    pub fn markets(&self) -> HashSet<Market> {
        self.rules.iter().map(|r| r.market).collect()
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        RuleSet::new(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_symbols_keep_last_write_in_first_position() {
        let set = RuleSet::new(vec![
            Rule::new("AAPL").price_above(200.0),
            Rule::new("TSLA").change_below(-5.0),
            Rule::new("AAPL").price_above(250.0),
        ]);

        let symbols: Vec<_> = set.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "TSLA"]);
        assert_eq!(set.get("AAPL").unwrap().price_above, Some(250.0));
    }

    #[test]
    fn remove_reports_presence() {
        let mut set = RuleSet::new(vec![Rule::new("AAPL")]);
        assert!(set.remove("AAPL"));
        assert!(!set.remove("AAPL"));
        assert!(set.is_empty());
    }

    #[test]
    fn label_skips_empty_names() {
        assert_eq!(Rule::new("AAPL").with_name("Apple").label(), "AAPL (Apple)");
        assert_eq!(Rule::new("AAPL").with_name("").label(), "AAPL");
    }

    #[test]
    fn yaml_defaults_unknown_market_to_us() {
        let rule: Rule = serde_yaml::from_str("symbol: AAPL\nprice_above: 200\n").unwrap();
        assert_eq!(rule.market, Market::Us);
        assert_eq!(rule.price_above, Some(200.0));
        assert!(rule.has_thresholds());

        let rule: Rule = serde_yaml::from_str("symbol: BTC-USD\nmarket: crypto\n").unwrap();
        assert_eq!(rule.market, Market::Crypto);
        assert!(!rule.has_thresholds());

        let rule: Rule = serde_yaml::from_str("symbol: X\nmarket: LSE\n").unwrap();
        assert_eq!(rule.market, Market::Us);
    }

    #[test]
    fn markets_are_distinct() {
        let set = RuleSet::new(vec![
            Rule::new("AAPL"),
            Rule::new("MSFT"),
            Rule::new("600519.SS").with_market(Market::Cn),
        ]);
        let markets = set.markets();
        assert_eq!(markets.len(), 2);
        assert!(markets.contains(&Market::Cn));
    }
}
