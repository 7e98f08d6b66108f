//! Heap configuration.

use serde::Deserialize;

/// Default heap budget (64MB)
pub const DEFAULT_HEAP_LIMIT: usize = 64 * 1024 * 1024;

/// Configuration for the runtime heap.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Maximum number of bytes the heap may hold
    pub heap_limit_bytes: usize,
    /// Whether an exhausted allocation triggers one collection and a retry
    pub collect_on_exhaustion: bool,
}

impl Default for HeapConfig {
    fn default() -> Self {
        HeapConfig {
            heap_limit_bytes: DEFAULT_HEAP_LIMIT,
            collect_on_exhaustion: true,
        }
    }
}

impl HeapConfig {
    /// Sets the heap byte limit.
    pub fn with_heap_limit(mut self, bytes: usize) -> Self {
        self.heap_limit_bytes = bytes;
        self
    }

    /// Enables or disables collect-and-retry on exhaustion.
    pub fn with_collect_on_exhaustion(mut self, enabled: bool) -> Self {
        self.collect_on_exhaustion = enabled;
        self
    }
}
