//! Config hot reload by polling the file's modification time.
//!
//! A change is only acted on once the mtime has been stable for one full
//! poll period, so an editor's multi-step save produces a single reload.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use alerts::RuleSet;
use monitor::shutdown::requested as shutdown_requested;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

pub const DEFAULT_POLL: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
struct Debounce {
    last_loaded: Option<SystemTime>,
    pending: Option<SystemTime>,
}

impl Debounce {
    fn new(initial: Option<SystemTime>) -> Self {
        Self {
            last_loaded: initial,
            pending: None,
        }
    }

    /// Feeds one observation; returns `true` when a reload should happen now.
    fn observe(&mut self, mtime: SystemTime) -> bool {
        if self.last_loaded == Some(mtime) {
            self.pending = None;
            return false;
        }

        if self.pending == Some(mtime) {
            self.last_loaded = Some(mtime);
            self.pending = None;
            return true;
        }

        self.pending = Some(mtime);
        false
    }
}

pub struct ConfigWatcher {
    path: PathBuf,
    poll: Duration,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            poll: DEFAULT_POLL,
        }
    }

    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    fn mtime(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    /// Sends the new rule set on every settled change until `shutdown`
    /// turns `true` or the receiver is dropped. A file that fails to load keeps
    /// the previous rules active.
    pub async fn run(self, tx: mpsc::Sender<RuleSet>, mut shutdown: watch::Receiver<bool>) {
        let mut debounce = Debounce::new(self.mtime());
        let mut ticker = tokio::time::interval(self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(path = %self.path.display(), poll_ms = self.poll.as_millis(), "config watcher started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_requested(&mut shutdown) => break,
            }

            let Some(mtime) = self.mtime() else {
                debug!(path = %self.path.display(), "config file not readable; keeping current rules");
                continue;
            };

            if !debounce.observe(mtime) {
                continue;
            }

            match AppConfig::load_from(&self.path) {
                Ok(cfg) => {
                    let rules = cfg.rule_set();
                    info!(rules = rules.len(), "config changed; reloading rules");
                    if tx.send(rules).await.is_err() {
                        debug!("reload receiver gone");
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "config reload failed; keeping current rules"),
            }
        }
    }
}
