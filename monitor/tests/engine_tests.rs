mod mock_source;

use std::sync::Arc;
use std::time::Duration;

use alerts::{InMemoryTriggerStore, Rule, RuleSet, TriggerStore};
use market::Market;
use monitor::{
    MonitorConfig, MonitorEngine, MonitorEvent, NotifyOutcome, PassKind, PassReport, SymbolOutcome,
};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use mock_clock::{FixedClock, TokioClock, utc};
use mock_notifier::RecordingNotifier;
use mock_source::ScriptedSource;

fn cfg() -> MonitorConfig {
    MonitorConfig::default().with_symbol_delay(Duration::ZERO)
}

struct Harness {
    source: Arc<ScriptedSource>,
    notifier: Arc<RecordingNotifier>,
    engine: MonitorEngine<InMemoryTriggerStore>,
}

fn harness(rules: Vec<Rule>, clock: Arc<dyn monitor::Clock>, notifier: RecordingNotifier) -> Harness {
    let source = Arc::new(ScriptedSource::new());
    let notifier = Arc::new(notifier);
    let engine = MonitorEngine::new(
        cfg(),
        RuleSet::new(rules),
        source.clone(),
        Arc::new(InMemoryTriggerStore::new()),
    )
    .with_notifier(notifier.clone())
    .with_clock(clock);

    Harness {
        source,
        notifier,
        engine,
    }
}

fn notify_of(report: &PassReport, symbol: &str) -> Option<NotifyOutcome> {
    match &report.symbol(symbol)?.outcome {
        SymbolOutcome::Evaluated { notify, .. } => Some(notify.clone()),
        _ => None,
    }
}

// Tuesday 11:00 New York time.
fn us_open() -> Arc<dyn monitor::Clock> {
    Arc::new(FixedClock(utc(2024, 6, 4, 15, 0)))
}

// Saturday.
fn us_weekend() -> Arc<dyn monitor::Clock> {
    Arc::new(FixedClock(utc(2024, 6, 1, 12, 0)))
}

#[tokio::test]
async fn initial_pass_ignores_market_hours_scheduled_pass_skips() {
    let h = harness(
        vec![Rule::new("AAPL").price_above(100.0)],
        us_weekend(),
        RecordingNotifier::new(),
    );
    h.source.push_quote("AAPL", 150.0, 1.0);

    let first = h.engine.run_pass(PassKind::Initial).await;
    assert_eq!(first.evaluated(), 1);
    assert_eq!(notify_of(&first, "AAPL"), Some(NotifyOutcome::Sent));

    let second = h.engine.run_pass(PassKind::Scheduled).await;
    assert_eq!(second.skipped(), 1);
    assert!(matches!(
        second.symbol("AAPL").unwrap().outcome,
        SymbolOutcome::MarketClosed { next_open } if next_open == utc(2024, 6, 3, 13, 30)
    ));

    assert_eq!(h.source.calls(), vec!["AAPL"]);
    assert_eq!(h.notifier.attempts().len(), 1);
}

#[tokio::test]
async fn fetch_failure_keeps_state_and_spares_other_symbols() {
    let h = harness(
        vec![
            Rule::new("AAPL").price_above(200.0),
            Rule::new("TSLA").change_below(-5.0),
        ],
        us_open(),
        RecordingNotifier::new(),
    );

    h.source.push_quote("AAPL", 205.0, 0.5);
    h.source.push_quote("TSLA", 180.0, -6.0);
    let p1 = h.engine.run_pass(PassKind::Scheduled).await;
    assert_eq!(p1.notifications_sent(), 2);

    h.source.push_error("AAPL");
    h.source.push_quote("TSLA", 175.0, -7.0);
    let p2 = h.engine.run_pass(PassKind::Scheduled).await;
    assert!(matches!(
        p2.symbol("AAPL").unwrap().outcome,
        SymbolOutcome::FetchFailed { .. }
    ));
    assert_eq!(notify_of(&p2, "TSLA"), Some(NotifyOutcome::NotNeeded));

    let kept = h.engine.store().get("AAPL").await.unwrap();
    assert!(kept.contains("price > 200"));

    // Still above: the failed pass must not have re-armed the condition.
    h.source.push_quote("AAPL", 206.0, 0.6);
    h.source.push_quote("TSLA", 175.0, -7.0);
    let p3 = h.engine.run_pass(PassKind::Scheduled).await;
    assert_eq!(notify_of(&p3, "AAPL"), Some(NotifyOutcome::NotNeeded));

    assert_eq!(h.notifier.attempts().len(), 2);
}

#[tokio::test]
async fn new_conditions_are_bundled_into_one_notification() {
    let h = harness(
        vec![
            Rule::new("AAPL")
                .with_name("Apple")
                .price_above(100.0)
                .change_above(1.0),
        ],
        us_open(),
        RecordingNotifier::new(),
    );
    h.source.push_quote("AAPL", 150.0, 2.0);
    h.source.push_quote("AAPL", 152.0, 2.5);

    let report = h.engine.run_pass(PassKind::Scheduled).await;
    assert!(report.symbol("AAPL").unwrap().is_newly_triggered());

    let attempts = h.notifier.attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].title, "📊 AAPL (Apple) alert");
    assert_eq!(attempts[0].body.matches("⚠️").count(), 2);
    assert_eq!(attempts[0].group, "pricewatch");

    match &report.symbol("AAPL").unwrap().outcome {
        SymbolOutcome::Evaluated { reasons, newly, .. } => {
            assert_eq!(reasons.len(), 2);
            assert_eq!(newly.len(), 2);
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let again = h.engine.run_pass(PassKind::Scheduled).await;
    assert!(!again.symbol("AAPL").unwrap().is_newly_triggered());
    assert_eq!(h.notifier.attempts().len(), 1);
}

#[tokio::test]
async fn failed_send_does_not_rearm() {
    let h = harness(
        vec![Rule::new("AAPL").price_above(100.0)],
        us_open(),
        RecordingNotifier::failing(),
    );

    h.source.push_quote("AAPL", 150.0, 1.0);
    let p1 = h.engine.run_pass(PassKind::Scheduled).await;
    assert!(matches!(
        notify_of(&p1, "AAPL"),
        Some(NotifyOutcome::Failed(_))
    ));

    h.source.push_quote("AAPL", 151.0, 1.0);
    let p2 = h.engine.run_pass(PassKind::Scheduled).await;
    assert_eq!(notify_of(&p2, "AAPL"), Some(NotifyOutcome::NotNeeded));

    assert_eq!(h.notifier.attempts().len(), 1);
}

#[tokio::test]
async fn missing_notifier_still_records_state() {
    let source = Arc::new(ScriptedSource::new());
    let engine = MonitorEngine::new(
        cfg(),
        RuleSet::new(vec![Rule::new("AAPL").price_above(100.0)]),
        source.clone(),
        Arc::new(InMemoryTriggerStore::new()),
    )
    .with_clock(us_open());

    source.push_quote("AAPL", 150.0, 1.0);
    let report = engine.run_pass(PassKind::Scheduled).await;

    assert_eq!(notify_of(&report, "AAPL"), Some(NotifyOutcome::Disabled));
    assert!(!engine.store().get("AAPL").await.unwrap().is_empty());
}

#[tokio::test]
async fn reload_keeps_trigger_state() {
    let h = harness(
        vec![Rule::new("AAPL").price_above(100.0)],
        us_open(),
        RecordingNotifier::new(),
    );

    h.source.push_quote("AAPL", 150.0, 1.0);
    h.engine.run_pass(PassKind::Scheduled).await;

    h.engine
        .replace_rules(RuleSet::new(vec![
            Rule::new("AAPL").price_above(100.0),
            Rule::new("MSFT").price_above(300.0),
        ]))
        .await;

    h.source.push_quote("AAPL", 152.0, 1.0);
    h.source.push_quote("MSFT", 310.0, 1.0);
    let report = h.engine.run_pass(PassKind::Scheduled).await;

    assert_eq!(notify_of(&report, "AAPL"), Some(NotifyOutcome::NotNeeded));
    assert_eq!(notify_of(&report, "MSFT"), Some(NotifyOutcome::Sent));
}

#[tokio::test]
async fn pass_follows_rule_order() {
    let h = harness(
        vec![Rule::new("MSFT"), Rule::new("AAPL"), Rule::new("NVDA")],
        us_open(),
        RecordingNotifier::new(),
    );
    for s in ["MSFT", "AAPL", "NVDA"] {
        h.source.push_quote(s, 100.0, 0.0);
    }

    let report = h.engine.run_pass(PassKind::Scheduled).await;
    let order: Vec<_> = report.symbols.iter().map(|s| s.symbol.as_str()).collect();

    assert_eq!(order, vec!["MSFT", "AAPL", "NVDA"]);
    assert_eq!(h.source.calls(), vec!["MSFT", "AAPL", "NVDA"]);
}

async fn next_event(rx: &mut mpsc::Receiver<MonitorEvent>) -> MonitorEvent {
    rx.recv().await.expect("event channel closed")
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_closed_market_wait() {
    let (events_tx, mut events) = mpsc::channel(16);
    let (_reload_tx, reload_rx) = mpsc::channel(4);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let source = Arc::new(ScriptedSource::new());
    source.push_quote("AAPL", 150.0, 1.0);

    let engine = MonitorEngine::new(
        cfg(),
        RuleSet::new(vec![Rule::new("AAPL").price_above(100.0)]),
        source,
        Arc::new(InMemoryTriggerStore::new()),
    )
    .with_clock(Arc::new(TokioClock::starting_at(utc(2024, 6, 1, 12, 0))))
    .with_events(events_tx);

    let handle = tokio::spawn(async move { engine.run(reload_rx, shutdown_rx).await });

    assert!(matches!(next_event(&mut events).await, MonitorEvent::Pass(r) if r.kind == PassKind::Initial));
    assert!(matches!(
        next_event(&mut events).await,
        MonitorEvent::Paused { market: Market::Us, next_open } if next_open == utc(2024, 6, 3, 13, 30)
    ));

    let before = Instant::now();
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    assert!(before.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn wakes_at_open_and_runs_a_pass() {
    let (events_tx, mut events) = mpsc::channel(16);
    let (_reload_tx, reload_rx) = mpsc::channel(4);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let source = Arc::new(ScriptedSource::new());
    source.push_quote("AAPL", 150.0, 1.0);
    source.push_quote("AAPL", 151.0, 1.0);

    // Sunday evening UTC; New York opens Monday 13:30 UTC.
    let engine = MonitorEngine::new(
        cfg(),
        RuleSet::new(vec![Rule::new("AAPL").price_above(100.0)]),
        source.clone(),
        Arc::new(InMemoryTriggerStore::new()),
    )
    .with_clock(Arc::new(TokioClock::starting_at(utc(2024, 6, 2, 23, 0))))
    .with_events(events_tx);

    let handle = tokio::spawn(async move { engine.run(reload_rx, shutdown_rx).await });

    assert!(matches!(next_event(&mut events).await, MonitorEvent::Pass(_)));
    assert!(matches!(next_event(&mut events).await, MonitorEvent::Paused { .. }));

    match next_event(&mut events).await {
        MonitorEvent::Pass(report) => {
            assert_eq!(report.kind, PassKind::Scheduled);
            assert_eq!(report.evaluated(), 1);
            assert!(report.started_at >= utc(2024, 6, 3, 13, 30));
            assert_eq!(notify_of(&report, "AAPL"), Some(NotifyOutcome::NotNeeded));
        }
        other => panic!("unexpected event {other:?}"),
    }

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
    assert_eq!(source.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn reload_during_wait_resumes_open_markets() {
    let (events_tx, mut events) = mpsc::channel(16);
    let (reload_tx, reload_rx) = mpsc::channel(4);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let source = Arc::new(ScriptedSource::new());
    source.push_quote("AAPL", 150.0, 1.0);
    source.push_quote("BTC-USD", 65000.0, 3.0);

    let engine = MonitorEngine::new(
        cfg(),
        RuleSet::new(vec![Rule::new("AAPL")]),
        source.clone(),
        Arc::new(InMemoryTriggerStore::new()),
    )
    .with_clock(Arc::new(TokioClock::starting_at(utc(2024, 6, 1, 12, 0))))
    .with_events(events_tx);

    let handle = tokio::spawn(async move { engine.run(reload_rx, shutdown_rx).await });

    assert!(matches!(next_event(&mut events).await, MonitorEvent::Pass(_)));
    assert!(matches!(next_event(&mut events).await, MonitorEvent::Paused { .. }));

    reload_tx
        .send(RuleSet::new(vec![
            Rule::new("AAPL"),
            Rule::new("BTC-USD").with_market(Market::Crypto).change_above(2.0),
        ]))
        .await
        .unwrap();

    assert!(matches!(next_event(&mut events).await, MonitorEvent::Reloaded { rules: 2 }));

    match next_event(&mut events).await {
        MonitorEvent::Pass(report) => {
            assert_eq!(report.kind, PassKind::Scheduled);
            assert!(matches!(
                report.symbol("AAPL").unwrap().outcome,
                SymbolOutcome::MarketClosed { .. }
            ));
            assert_eq!(notify_of(&report, "BTC-USD"), Some(NotifyOutcome::Disabled));
        }
        other => panic!("unexpected event {other:?}"),
    }

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
    assert_eq!(source.calls(), vec!["AAPL", "BTC-USD"]);
}

fn three_symbol_engine(
    source: Arc<ScriptedSource>,
    events: mpsc::Sender<MonitorEvent>,
) -> MonitorEngine<InMemoryTriggerStore> {
    for symbol in ["AAPL", "MSFT", "TSLA"] {
        source.push_quote(symbol, 150.0, 1.0);
    }

    MonitorEngine::new(
        MonitorConfig::default().with_symbol_delay(Duration::from_secs(10)),
        RuleSet::new(vec![
            Rule::new("AAPL").price_above(100.0),
            Rule::new("MSFT").price_above(100.0),
            Rule::new("TSLA").price_above(100.0),
        ]),
        source,
        Arc::new(InMemoryTriggerStore::new()),
    )
    .with_clock(us_open())
    .with_events(events)
}

#[tokio::test(start_paused = true)]
async fn shutdown_abandons_the_rest_of_a_pass() {
    let (events_tx, mut events) = mpsc::channel(16);
    let (_reload_tx, reload_rx) = mpsc::channel(4);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let source = Arc::new(ScriptedSource::new());
    let engine = three_symbol_engine(source.clone(), events_tx);
    let handle = tokio::spawn(async move { engine.run(reload_rx, shutdown_rx).await });

    // AAPL is fetched at once; MSFT waits out the 10s delay.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(source.calls(), vec!["AAPL"]);

    let before = Instant::now();
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    assert!(before.elapsed() < Duration::from_secs(1));
    assert_eq!(source.calls(), vec!["AAPL"]);
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn publishing_false_does_not_stop_the_driver() {
    let (events_tx, mut events) = mpsc::channel(16);
    let (_reload_tx, reload_rx) = mpsc::channel(4);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let source = Arc::new(ScriptedSource::new());
    let engine = three_symbol_engine(source.clone(), events_tx);
    let handle = tokio::spawn(async move { engine.run(reload_rx, shutdown_rx).await });

    tokio::time::sleep(Duration::from_secs(5)).await;
    shutdown_tx.send(false).unwrap();

    match next_event(&mut events).await {
        MonitorEvent::Pass(report) => {
            assert_eq!(report.kind, PassKind::Initial);
            assert_eq!(report.evaluated(), 3);
        }
        other => panic!("expected a pass, got {other:?}"),
    }
    assert_eq!(source.calls(), vec!["AAPL", "MSFT", "TSLA"]);
    assert!(!handle.is_finished());

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}
