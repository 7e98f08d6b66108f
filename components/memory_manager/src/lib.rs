//! Memory Manager - heap accounting, cell arenas and tracing
//!
//! This component provides:
//! - Byte-budget allocation that reports exhaustion instead of aborting
//! - Index-addressed arenas for objects and structures
//! - The `Trace` contract and a mark-phase collector
//! - Heap configuration

pub mod allocator;
pub mod arena;
pub mod config;
pub mod trace;

// Re-export main types
pub use allocator::{Allocation, Allocator, BudgetAllocator};
pub use arena::Arena;
pub use config::{HeapConfig, DEFAULT_HEAP_LIMIT};
pub use trace::{CellRef, Collector, GcStats, HeapGraph, MarkBitmap, MarkBits, Trace, Tracer};
