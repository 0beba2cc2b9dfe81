use tracing::{Span, field};

use super::TraceId;

/// Root span for one evaluation pass over the rule set.
pub fn pass_span(kind: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "pass",
        kind = %kind,
        trace_id = %trace_id,
        rules = field::Empty
    )
}

/// Child span for the work done on a single symbol inside a pass.
pub fn symbol_span(symbol: &str) -> Span {
    tracing::debug_span!("symbol", symbol = %symbol)
}
