//! Scoped Buffers - Tracked allocations for training and inference
//!
//! Every batch matrix created inside a classifier method is wrapped in a
//! `ScopedBuffer`. The owning classifier counts live buffers; the count
//! drops when the buffer goes out of scope, on success, error or
//! cancellation alike.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// TRACKER
// ============================================================================

/// Live-buffer counter, shared by every buffer a classifier hands out
#[derive(Debug, Clone, Default)]
pub struct BufferTracker {
    live: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl BufferTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `value` until the returned guard drops
    pub fn track<T>(&self, value: T) -> ScopedBuffer<T> {
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        ScopedBuffer {
            value,
            live: Arc::clone(&self.live),
        }
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> BufferStatus {
        BufferStatus {
            live: self.live(),
            peak: self.peak.load(Ordering::SeqCst),
        }
    }
}

/// Buffer usage snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferStatus {
    pub live: usize,
    pub peak: usize,
}

// ============================================================================
// SCOPED BUFFER
// ============================================================================

#[derive(Debug)]
pub struct ScopedBuffer<T> {
    value: T,
    live: Arc<AtomicUsize>,
}

impl<T> Deref for ScopedBuffer<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for ScopedBuffer<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T> Drop for ScopedBuffer<T> {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_returns_to_zero() {
        let tracker = BufferTracker::new();
        {
            let a = tracker.track(vec![1.0f32; 4]);
            let b = tracker.track(vec![2.0f32; 4]);
            assert_eq!(tracker.live(), 2);
            assert_eq!(a.len() + b.len(), 8);
        }
        assert_eq!(tracker.live(), 0);
        assert_eq!(tracker.status().peak, 2);
    }

    #[test]
    fn test_released_on_early_return() {
        fn fails(tracker: &BufferTracker) -> Result<(), String> {
            let _buffer = tracker.track([0u8; 16]);
            Err("boom".to_string())
        }

        let tracker = BufferTracker::new();
        assert!(fails(&tracker).is_err());
        assert_eq!(tracker.live(), 0);
    }
}
