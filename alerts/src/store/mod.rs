mod memory;

use std::collections::HashSet;

pub use memory::InMemoryTriggerStore;

/// Per-symbol memory of which conditions held on the last evaluated pass.
///
/// Implementations must make `swap` atomic per symbol: two callers racing on
/// the same symbol may not interleave their read and write.
#[async_trait::async_trait]
pub trait TriggerStore: Send + Sync {
    /// Replaces the stored set for `symbol` with `current` and returns the
    /// previous set (empty if the symbol was never stored).
    async fn swap(&self, symbol: &str, current: HashSet<String>) -> anyhow::Result<HashSet<String>>;

    /// Current stored set for `symbol`, empty if absent.
    async fn get(&self, symbol: &str) -> anyhow::Result<HashSet<String>>;
}
