//! Allocation accounting.
//!
//! Cells themselves are stored in [`Arena`](crate::Arena)s; the allocator
//! decides whether the heap may grow by a given number of bytes. Exhaustion is
//! reported as `None` so callers can collect and retry, or surface an
//! out-of-memory condition, instead of aborting the process.

/// A successful reservation of heap bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// Number of bytes reserved
    pub size: usize,
}

/// Source of heap memory for the runtime.
pub trait Allocator {
    /// Reserves `size` bytes, or returns `None` when the heap is exhausted.
    fn allocate(&mut self, size: usize) -> Option<Allocation>;

    /// Returns `size` bytes to the allocator after cells were freed.
    fn release(&mut self, size: usize);

    /// Bytes currently reserved.
    fn bytes_in_use(&self) -> usize;
}

/// Allocator that enforces a fixed byte budget.
///
/// # Example
///
/// ```
/// use memory_manager::{Allocator, BudgetAllocator};
///
/// let mut allocator = BudgetAllocator::new(128);
/// assert!(allocator.allocate(100).is_some());
/// assert!(allocator.allocate(100).is_none());
/// allocator.release(100);
/// assert!(allocator.allocate(100).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct BudgetAllocator {
    limit: usize,
    used: usize,
    peak: usize,
    failures: usize,
}

impl BudgetAllocator {
    /// Creates an allocator that allows at most `limit` bytes in use.
    pub fn new(limit: usize) -> Self {
        BudgetAllocator {
            limit,
            used: 0,
            peak: 0,
            failures: 0,
        }
    }

    /// The configured byte limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Highest number of bytes ever in use.
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Number of refused allocation requests.
    pub fn failures(&self) -> usize {
        self.failures
    }
}

impl Allocator for BudgetAllocator {
    fn allocate(&mut self, size: usize) -> Option<Allocation> {
        match self.used.checked_add(size) {
            Some(total) if total <= self.limit => {
                self.used = total;
                self.peak = self.peak.max(total);
                Some(Allocation { size })
            }
            _ => {
                self.failures += 1;
                None
            }
        }
    }

    fn release(&mut self, size: usize) {
        self.used = self.used.saturating_sub(size);
    }

    fn bytes_in_use(&self) -> usize {
        self.used
    }
}
