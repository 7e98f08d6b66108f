//! Runtime configuration.

use crate::error::{ObjectError, ObjectResult};
use crate::structure::{MAX_SPECIFIC_FUNCTION_THRASH_COUNT, MAX_TRANSITION_LENGTH};
use core_types::JsError;
use memory_manager::HeapConfig;
use serde::Deserialize;

/// Tuning knobs for a [`Runtime`](crate::Runtime).
///
/// # Example
///
/// ```
/// use object_model::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json(r#"{ "max_transition_length": 8 }"#).unwrap();
/// assert_eq!(config.max_transition_length, 8);
/// assert_eq!(config.max_specific_function_thrash_count, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Heap budget and exhaustion policy
    pub heap: HeapConfig,
    /// Add-property chain length after which a dictionary is used instead
    pub max_transition_length: u32,
    /// Despecializations after which specific values are no longer recorded
    pub max_specific_function_thrash_count: u8,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            heap: HeapConfig::default(),
            max_transition_length: MAX_TRANSITION_LENGTH,
            max_specific_function_thrash_count: MAX_SPECIFIC_FUNCTION_THRASH_COUNT,
        }
    }
}

impl RuntimeConfig {
    /// Parses a JSON configuration; missing fields take their defaults.
    pub fn from_json(text: &str) -> ObjectResult<Self> {
        serde_json::from_str(text).map_err(|e| {
            ObjectError::Exception(JsError::internal(format!("invalid runtime config: {}", e)))
        })
    }

    /// Sets the heap configuration.
    pub fn with_heap(mut self, heap: HeapConfig) -> Self {
        self.heap = heap;
        self
    }

    /// Sets the transition chain bound.
    pub fn with_max_transition_length(mut self, length: u32) -> Self {
        self.max_transition_length = length;
        self
    }
}
