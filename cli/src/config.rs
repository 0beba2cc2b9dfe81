//! User configuration persisted as YAML (`~/.pricewatch.yaml` by default).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use adapters::bark::DEFAULT_SERVER_URL;
use alerts::{Rule, RuleSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_FILE_NAME: &str = ".pricewatch.yaml";
pub const DEFAULT_INTERVAL_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {details}")]
    Parse { path: PathBuf, details: String },

    #[error("unable to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinnhubSection {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarkSection {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub key: String,
}

impl Default for BarkSection {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            key: String::new(),
        }
    }
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

const fn default_interval() -> i64 {
    DEFAULT_INTERVAL_SECS
}

/// A position the user holds. Averaged on repeated adds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: f64,
    pub cost_price: f64,
}

impl Holding {
    pub fn total_cost(&self) -> f64 {
        self.quantity * self.cost_price
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub finnhub: FinnhubSection,

    #[serde(default)]
    pub bark: BarkSection,

    /// Seconds between scheduled passes. Non-positive values mean the default.
    #[serde(default = "default_interval")]
    pub interval: i64,

    #[serde(default)]
    pub rules: Vec<Rule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holdings: Vec<Holding>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            finnhub: FinnhubSection::default(),
            bark: BarkSection::default(),
            interval: DEFAULT_INTERVAL_SECS,
            rules: Vec::new(),
            holdings: Vec::new(),
        }
    }
}

/// `$HOME/.pricewatch.yaml`, or the bare file name when `HOME` is unset.
pub fn default_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(DEFAULT_FILE_NAME),
        _ => PathBuf::from(DEFAULT_FILE_NAME),
    }
}

impl AppConfig {
    /// Loads `path`; a missing file yields the default (empty) config.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        // An empty file deserializes to YAML null.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut cfg: AppConfig =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;
        cfg.normalize();
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, yaml).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn normalize(&mut self) {
        if self.interval <= 0 {
            self.interval = DEFAULT_INTERVAL_SECS;
        }
        if self.bark.server_url.trim().is_empty() {
            self.bark.server_url = default_server_url();
        }
    }

    pub fn interval(&self) -> Duration {
        let secs = if self.interval > 0 {
            self.interval
        } else {
            DEFAULT_INTERVAL_SECS
        };
        Duration::from_secs(secs.unsigned_abs())
    }

    /// Rules as the driver sees them: deduplicated by symbol, last write wins.
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new(self.rules.iter().cloned())
    }

    /// Replaces the rule with the same symbol, else appends. Returns `true`
    /// when an existing rule was replaced.
    pub fn add_rule(&mut self, rule: Rule) -> bool {
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

    pub fn remove_rule(&mut self, symbol: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.symbol != symbol);
        self.rules.len() != before
    }

    pub fn rule(&self, symbol: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.symbol == symbol)
    }

    pub fn add_holding(&mut self, holding: Holding) {
        match self.holdings.iter_mut().find(|h| h.symbol == holding.symbol) {
            Some(existing) => *existing = holding,
            None => self.holdings.push(holding),
        }
    }

    pub fn remove_holding(&mut self, symbol: &str) -> bool {
        let before = self.holdings.len();
        self.holdings.retain(|h| h.symbol != symbol);
        self.holdings.len() != before
    }

    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.symbol == symbol)
    }

    /// Adds to an existing position at a weighted average cost, or opens a
    /// new one. Returns the resulting holding.
    pub fn add_position(&mut self, symbol: &str, quantity: f64, cost_price: f64) -> Holding {
        let holding = match self.holding(symbol) {
            Some(existing) => {
                let total_qty = existing.quantity + quantity;
                let total_cost = existing.total_cost() + quantity * cost_price;
                Holding {
                    symbol: symbol.to_string(),
                    quantity: total_qty,
                    cost_price: total_cost / total_qty,
                }
            }
            None => Holding {
                symbol: symbol.to_string(),
                quantity,
                cost_price,
            },
        };

        self.add_holding(holding.clone());
        holding
    }
}
