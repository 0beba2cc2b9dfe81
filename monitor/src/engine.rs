//! The monitor driver.
//!
//! A pass walks the rule set in order and, for each rule:
//!   1. Skips it if its market is closed (scheduled passes only).
//!   2. Fetches a quote. On failure the symbol's trigger state is untouched.
//!   3. Evaluates the rule and swaps the satisfied condition keys into the store.
//!   4. Sends one bundled notification for the newly satisfied conditions.
//!
//! [`MonitorEngine::run`] repeats passes on a fixed interval, sleeps through
//! periods where every referenced market is closed, applies rule reloads
//! between passes and stops on the shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use alerts::{Evaluator, Notifier, Reason, Rule, RuleSet, TriggerResult, TriggerStore};
use chrono::{DateTime, Utc};
use common::logger::{TraceId, pass_span, symbol_span};
use market::{Market, QuoteSource, calendar};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{Instrument, Span, debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::shutdown::requested as shutdown_requested;
use crate::types::{
    MonitorConfig, MonitorEvent, NotifyOutcome, PassKind, PassReport, SymbolOutcome, SymbolReport,
};

enum Wake {
    Opened,
    Reloaded,
    Shutdown,
}

pub struct MonitorEngine<S: TriggerStore> {
    cfg: MonitorConfig,
    quotes: Arc<dyn QuoteSource>,
    notifier: Option<Arc<dyn Notifier>>,
    store: Arc<S>,
    rules: RwLock<RuleSet>,
    clock: Arc<dyn Clock>,
    evaluator: Evaluator,
    events: Option<mpsc::Sender<MonitorEvent>>,
}

impl<S: TriggerStore> MonitorEngine<S> {
    pub fn new(
        cfg: MonitorConfig,
        rules: RuleSet,
        quotes: Arc<dyn QuoteSource>,
        store: Arc<S>,
    ) -> Self {
        Self {
            cfg,
            quotes,
            notifier: None,
            store,
            rules: RwLock::new(rules),
            clock: Arc::new(SystemClock),
            evaluator: Evaluator::new(),
            events: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Progress events are delivered best effort; a full channel drops them.
    pub fn with_events(mut self, events: mpsc::Sender<MonitorEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn rules(&self) -> RuleSet {
        self.rules.read().await.clone()
    }

    /// Swaps in a new rule set. Trigger state is kept, so a condition that
    /// was already satisfied before the reload does not fire again.
    pub async fn replace_rules(&self, rules: RuleSet) {
        let count = rules.len();
        *self.rules.write().await = rules;
        info!(rules = count, "rule set replaced");
    }

    /// Runs one pass over a snapshot of the current rule set.
    pub async fn run_pass(&self, kind: PassKind) -> PassReport {
        let trace_id = TraceId::new();
        let span = pass_span(kind.as_str(), &trace_id);

        async move {
            let rules = self.rules().await;
            Span::current().record("rules", rules.len());

            let started_at = self.clock.now();
            let mut symbols = Vec::with_capacity(rules.len());
            let mut fetched = false;

            for rule in rules.iter() {
                let outcome = self
                    .check_rule(rule, kind, &mut fetched)
                    .instrument(symbol_span(&rule.symbol))
                    .await;

                symbols.push(SymbolReport {
                    symbol: rule.symbol.clone(),
                    label: rule.label(),
                    market: rule.market,
                    outcome,
                });
            }

            let report = PassReport {
                trace_id,
                kind,
                started_at,
                symbols,
            };

            info!(
                evaluated = report.evaluated(),
                skipped = report.skipped(),
                failed = report.failed(),
                notified = report.notifications_sent(),
                "pass complete"
            );

            report
        }
        .instrument(span)
        .await
    }

    async fn check_rule(&self, rule: &Rule, kind: PassKind, fetched: &mut bool) -> SymbolOutcome {
        let now = self.clock.now();
        if kind == PassKind::Scheduled && !calendar::is_open(rule.market, now) {
            let next_open = calendar::next_open(rule.market, now);
            debug!(market = %rule.market, %next_open, "market closed; skipping");
            return SymbolOutcome::MarketClosed { next_open };
        }

        if *fetched && !self.cfg.symbol_delay.is_zero() {
            tokio::time::sleep(self.cfg.symbol_delay).await;
        }
        *fetched = true;

        let quote = match self.quotes.fetch_quote(&rule.symbol, rule.market).await {
            Ok(q) => q,
            Err(e) => {
                warn!(error = %e, "quote fetch failed");
                return SymbolOutcome::FetchFailed {
                    error: e.to_string(),
                };
            }
        };

        let result = self.evaluator.evaluate(rule, &quote);

        let previous = match self.store.swap(&rule.symbol, result.condition_keys()).await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "trigger state update failed");
                return SymbolOutcome::StoreFailed {
                    error: format!("{e:#}"),
                };
            }
        };

        let newly = result.newly_triggered(&previous);
        let notify = if newly.is_empty() {
            NotifyOutcome::NotNeeded
        } else {
            info!(
                conditions = newly.len(),
                price = quote.current_price,
                "alert triggered"
            );
            self.notify(&result, &newly).await
        };

        let newly: Vec<Reason> = newly.into_iter().cloned().collect();
        let TriggerResult { reasons, .. } = result;

        SymbolOutcome::Evaluated {
            quote,
            reasons,
            newly,
            notify,
        }
    }

    async fn notify(&self, result: &TriggerResult<'_>, newly: &[&Reason]) -> NotifyOutcome {
        let Some(notifier) = self.notifier.as_ref().filter(|n| n.is_configured()) else {
            debug!("no notifier configured; skipping push");
            return NotifyOutcome::Disabled;
        };

        let notification = result.notification(newly, &self.cfg.notify_group);
        match notifier.deliver(&notification).await {
            Ok(()) => {
                info!("notification sent");
                NotifyOutcome::Sent
            }
            Err(e) => {
                warn!(error = %e, "notification failed");
                NotifyOutcome::Failed(e.to_string())
            }
        }
    }

    /// Earliest reopening among the rules' markets, or `None` while at least
    /// one of them is open (or there are no rules).
    async fn all_closed_until(&self) -> Option<(Market, DateTime<Utc>)> {
        let markets = self.rules.read().await.markets();
        let now = self.clock.now();

        if markets.is_empty() || markets.iter().any(|m| calendar::is_open(*m, now)) {
            return None;
        }

        markets
            .into_iter()
            .map(|m| (m, calendar::next_open(m, now)))
            .min_by_key(|(_, at)| *at)
    }

    /// Main loop. Runs an initial pass immediately, then one pass per
    /// interval until `shutdown` turns `true` (or its sender is dropped).
    ///
    /// A pass in progress is abandoned on shutdown; nothing is rolled back
    /// since each symbol's state is swapped atomically.
    pub async fn run(
        &self,
        mut reloads: mpsc::Receiver<RuleSet>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let period = if self.cfg.interval.is_zero() {
            MonitorConfig::default().interval
        } else {
            self.cfg.interval
        };

        info!(interval_secs = period.as_secs(), "monitor started");

        if *shutdown.borrow() {
            return;
        }

        if !self.pass_or_shutdown(PassKind::Initial, &mut shutdown).await {
            info!("monitor stopped");
            return;
        }

        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if let Some((market, next_open)) = self.all_closed_until().await {
                match self
                    .wait_for_open(market, next_open, &mut reloads, &mut shutdown)
                    .await
                {
                    Wake::Shutdown => break,
                    Wake::Reloaded => continue,
                    Wake::Opened => {
                        if self.all_closed_until().await.is_some() {
                            continue;
                        }
                        if !self.pass_or_shutdown(PassKind::Scheduled, &mut shutdown).await {
                            break;
                        }
                        ticker.reset();
                        continue;
                    }
                }
            }

            tokio::select! {
                _ = ticker.tick() => {
                    if !self.pass_or_shutdown(PassKind::Scheduled, &mut shutdown).await {
                        break;
                    }
                }
                Some(rules) = reloads.recv() => {
                    self.apply_reload(rules).await;
                }
                _ = shutdown_requested(&mut shutdown) => break,
            }
        }

        info!("monitor stopped");
    }

    /// Returns `false` if shutdown arrived before the pass finished.
    async fn pass_or_shutdown(&self, kind: PassKind, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            report = self.run_pass(kind) => {
                self.emit(MonitorEvent::Pass(report));
                true
            }
            _ = shutdown_requested(shutdown) => {
                info!(kind = %kind, "shutdown during pass; remaining symbols abandoned");
                false
            }
        }
    }

    async fn wait_for_open(
        &self,
        market: Market,
        next_open: DateTime<Utc>,
        reloads: &mut mpsc::Receiver<RuleSet>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Wake {
        let wait = (next_open - self.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO);

        info!(
            market = %market,
            %next_open,
            wait_secs = wait.as_secs(),
            "all markets closed; pausing until next open"
        );
        self.emit(MonitorEvent::Paused { market, next_open });

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                info!(market = %market, "market open; resuming");
                Wake::Opened
            }
            Some(rules) = reloads.recv() => {
                self.apply_reload(rules).await;
                Wake::Reloaded
            }
            _ = shutdown_requested(shutdown) => Wake::Shutdown,
        }
    }

    async fn apply_reload(&self, rules: RuleSet) {
        let count = rules.len();
        self.replace_rules(rules).await;
        self.emit(MonitorEvent::Reloaded { rules: count });
    }

    fn emit(&self, event: MonitorEvent) {
        let Some(tx) = &self.events else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("event channel full; dropping event"),
            Err(TrySendError::Closed(_)) => debug!("event receiver gone"),
        }
    }
}
