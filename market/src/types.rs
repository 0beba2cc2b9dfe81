use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Exchange / venue tag. Decides which trading calendar applies and which
/// quote backend serves a symbol.
///
/// Parsing never fails: an empty or unknown tag maps to `Us`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Market {
    #[default]
    Us,
    Cn,
    Hk,
    Tw,
    Crypto,
    Forex,
}

impl Market {
    pub const ALL: [Market; 6] = [
        Market::Us,
        Market::Cn,
        Market::Hk,
        Market::Tw,
        Market::Crypto,
        Market::Forex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Us => "US",
            Market::Cn => "CN",
            Market::Hk => "HK",
            Market::Tw => "TW",
            Market::Crypto => "CRYPTO",
            Market::Forex => "FOREX",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "CN" => Market::Cn,
            "HK" => Market::Hk,
            "TW" => Market::Tw,
            "CRYPTO" => Market::Crypto,
            "FOREX" => Market::Forex,
            _ => Market::Us,
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Market::from_tag(s))
    }
}

impl From<String> for Market {
    fn from(tag: String) -> Self {
        Market::from_tag(&tag)
    }
}

impl From<Market> for String {
    fn from(market: Market) -> Self {
        market.as_str().to_string()
    }
}

/// One point-in-time snapshot of a symbol, as returned by a quote backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub current_price: f64,
    /// Absolute change versus the previous close.
    pub change: f64,
    /// Percent change versus the previous close (e.g. `-5.2` means -5.2%).
    pub percent_change: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub previous_close: f64,
    /// Epoch seconds of the last trade the provider reported.
    pub timestamp: i64,
}

impl Quote {
    /// The change figures are only meaningful against a known previous close.
    pub fn change_known(&self) -> bool {
        self.previous_close > 0.0
    }

    /// `"+"` for non-negative percent change, empty otherwise.
    pub fn sign(&self) -> &'static str {
        if self.percent_change >= 0.0 { "+" } else { "" }
    }

    /// Multi-line human readable summary used by one-shot lookups.
    pub fn summary(&self, name: Option<&str>) -> String {
        let display = match name {
            Some(n) if !n.is_empty() => format!("{} ({})", self.symbol, n),
            _ => self.symbol.clone(),
        };

        let change = if self.change_known() {
            format!(
                "{}${:.2} ({}{:.2}%)",
                self.sign(),
                self.change,
                self.sign(),
                self.percent_change
            )
        } else {
            "unknown (no previous close)".to_string()
        };

        format!(
            "📈 {}\n   Price:  ${:.2}\n   Change: {}\n   Today:  ${:.2} ~ ${:.2}",
            display, self.current_price, change, self.low, self.high
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(price: f64, pct: f64, prev: f64) -> Quote {
        Quote {
            symbol: "AAPL".into(),
            current_price: price,
            change: price - prev,
            percent_change: pct,
            open: 0.0,
            high: price + 1.0,
            low: price - 1.0,
            previous_close: prev,
            timestamp: 0,
        }
    }

    #[test]
    fn unknown_tags_default_to_us() {
        assert_eq!(Market::from_tag(""), Market::Us);
        assert_eq!(Market::from_tag("NASDAQ"), Market::Us);
        assert_eq!(Market::from_tag("crypto"), Market::Crypto);
        assert_eq!(Market::from_tag(" hk "), Market::Hk);
    }

    #[test]
    fn tag_round_trips_through_display() {
        for m in Market::ALL {
            assert_eq!(m.to_string().parse::<Market>().unwrap(), m);
        }
    }

    #[test]
    fn summary_marks_missing_previous_close() {
        let q = quote(10.0, 0.0, 0.0);
        assert!(q.summary(None).contains("unknown"));

        let q = quote(110.0, 10.0, 100.0);
        let s = q.summary(Some("Apple"));
        assert!(s.contains("AAPL (Apple)"));
        assert!(s.contains("+$10.00 (+10.00%)"));
    }
}
