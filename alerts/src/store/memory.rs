use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::TriggerStore;

/// Process-lifetime trigger memory. Nothing survives a restart.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTriggerStore {
    map: Arc<Mutex<HashMap<String, HashSet<String>>>>,
}

impl InMemoryTriggerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of symbols with a stored entry (possibly empty).
    pub async fn len(&self) -> usize {
        self.map.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.map.lock().await.is_empty()
    }

    pub async fn contains_symbol(&self, symbol: &str) -> bool {
        self.map.lock().await.contains_key(symbol)
    }
}

#[async_trait]
impl TriggerStore for InMemoryTriggerStore {
    async fn swap(&self, symbol: &str, current: HashSet<String>) -> anyhow::Result<HashSet<String>> {
        let previous = self.map.lock().await.insert(symbol.to_string(), current);
        Ok(previous.unwrap_or_default())
    }

    async fn get(&self, symbol: &str) -> anyhow::Result<HashSet<String>> {
        Ok(self.map.lock().await.get(symbol).cloned().unwrap_or_default())
    }
}
