//! Human-readable status lines for watch mode (stdout, not logs).

use chrono::{DateTime, Local, Utc};
use market::Quote;
use monitor::{MonitorEvent, NotifyOutcome, PassReport, SymbolOutcome, SymbolReport};

pub const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

pub fn event_lines(event: &MonitorEvent, now: DateTime<Utc>) -> Vec<String> {
    match event {
        MonitorEvent::Pass(report) => pass_lines(report),
        MonitorEvent::Paused { market, next_open } => vec![format!(
            "💤 {market} market closed; resuming at {} (in {})",
            local(next_open),
            human_duration(*next_open - now)
        )],
        MonitorEvent::Reloaded { rules } => vec![format!("🔄 Config reloaded: {rules} rule(s)")],
    }
}

pub fn pass_lines(report: &PassReport) -> Vec<String> {
    let mut lines = vec![format!(
        "[{}] {} check, {} symbol(s)",
        report.started_at.with_timezone(&Local).format("%H:%M:%S"),
        report.kind,
        report.symbols.len()
    )];
    for s in &report.symbols {
        lines.extend(symbol_lines(s));
    }
    lines
}

fn symbol_lines(s: &SymbolReport) -> Vec<String> {
    match &s.outcome {
        SymbolOutcome::MarketClosed { next_open } => {
            vec![format!("⏸  {} market closed, opens {}", s.label, local(next_open))]
        }
        SymbolOutcome::FetchFailed { error } => {
            vec![format!("❌ {} fetch failed: {error}", s.label)]
        }
        SymbolOutcome::StoreFailed { error } => {
            vec![format!("❌ {} state update failed: {error}", s.label)]
        }
        SymbolOutcome::Evaluated {
            quote,
            reasons,
            newly,
            notify,
        } => {
            let icon = if s.is_newly_triggered() {
                "🔔"
            } else if !reasons.is_empty() {
                "⚠️"
            } else {
                "✓"
            };

            let mut lines = vec![format!("{icon} {} {}", s.label, price_text(quote))];
            for r in reasons {
                let marker = if newly.contains(r) { "🆕" } else { "→" };
                lines.push(format!("   {marker} {}", r.message));
            }

            match notify {
                NotifyOutcome::Failed(e) => lines.push(format!("   ⚠️ notification failed: {e}")),
                NotifyOutcome::Disabled => lines.push("   (push not configured)".to_string()),
                NotifyOutcome::Sent | NotifyOutcome::NotNeeded => {}
            }
            lines
        }
    }
}

fn price_text(q: &Quote) -> String {
    if q.change_known() {
        format!("${:.2} ({}{:.2}%)", q.current_price, q.sign(), q.percent_change)
    } else {
        format!("${:.2} (change unknown)", q.current_price)
    }
}

fn local(t: &DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%a %Y-%m-%d %H:%M").to_string()
}

pub fn human_duration(d: chrono::Duration) -> String {
    let mins = d.num_minutes().max(0);
    let (h, m) = (mins / 60, mins % 60);
    if h > 0 { format!("{h}h {m}m") } else { format!("{m}m") }
}
