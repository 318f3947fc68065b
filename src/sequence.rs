//! # Sequence Allocator
//!
//! Issues production-order numbers from a single store counter. Allocation is
//! one atomic increment-and-read on the store, never a read followed by a
//! write, so concurrent callers in this process or any other always receive
//! distinct values.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

use crate::constants::{defaults, store::ORDER_NUMBER_COUNTER};
use crate::error::{FloorError, FloorResult};
use crate::store::EntityStore;

/// Render a counter value zero-padded to at least `min_width` digits.
///
/// Values wider than `min_width` are rendered in full, never truncated.
pub fn format_order_number(value: i64, min_width: usize) -> String {
    format!("{value:0min_width$}")
}

pub struct SequenceAllocator {
    store: Arc<dyn EntityStore>,
    counter_key: String,
    min_width: usize,
    /// Highest value this allocator has handed out, for the monotonic check
    last_issued: AtomicI64,
}

impl std::fmt::Debug for SequenceAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceAllocator")
            .field("counter_key", &self.counter_key)
            .field("min_width", &self.min_width)
            .field("last_issued", &self.last_issued.load(Ordering::Relaxed))
            .finish()
    }
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self::with_counter(store, ORDER_NUMBER_COUNTER, defaults::ORDER_NUMBER_MIN_WIDTH)
    }

    pub fn with_counter(
        store: Arc<dyn EntityStore>,
        counter_key: impl Into<String>,
        min_width: usize,
    ) -> Self {
        Self {
            store,
            counter_key: counter_key.into(),
            min_width: min_width.max(1),
            last_issued: AtomicI64::new(0),
        }
    }

    pub fn counter_key(&self) -> &str {
        &self.counter_key
    }

    /// Allocate the next order number.
    ///
    /// Fails with [`FloorError::AllocationError`] when the counter store is
    /// unreachable or hands back a value that is not strictly greater than
    /// every value this allocator issued before.
    pub async fn allocate_next_order_number(&self) -> FloorResult<String> {
        let floor = self.last_issued.load(Ordering::Acquire);

        let value = self
            .store
            .increment_and_get(&self.counter_key)
            .await
            .map_err(|err| {
                error!(counter = %self.counter_key, error = %err, "order number counter unreachable");
                FloorError::AllocationError(err.to_string())
            })?;

        if value < 1 || value <= floor {
            error!(
                counter = %self.counter_key,
                value,
                last_issued = floor,
                "order number counter went backwards"
            );
            return Err(FloorError::AllocationError(format!(
                "counter {} returned non-monotonic value {value} (last issued {floor})",
                self.counter_key
            )));
        }

        self.last_issued.fetch_max(value, Ordering::AcqRel);
        let number = format_order_number(value, self.min_width);
        debug!(counter = %self.counter_key, number = %number, "allocated order number");
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryEntityStore;

    #[test]
    fn test_format_pads_to_width() {
        assert_eq!(format_order_number(1, 4), "0001");
        assert_eq!(format_order_number(42, 4), "0042");
        assert_eq!(format_order_number(9_999, 4), "9999");
    }

    #[test]
    fn test_format_grows_past_width() {
        assert_eq!(format_order_number(10_000, 4), "10000");
        assert_eq!(format_order_number(123_456, 4), "123456");
    }

    #[tokio::test]
    async fn test_first_allocation_seeds_at_one() {
        let store = Arc::new(InMemoryEntityStore::new());
        let allocator = SequenceAllocator::new(store);
        assert_eq!(allocator.allocate_next_order_number().await.unwrap(), "0001");
        assert_eq!(allocator.allocate_next_order_number().await.unwrap(), "0002");
    }

    #[tokio::test]
    async fn test_counter_reset_is_rejected() {
        let store = Arc::new(InMemoryEntityStore::new());
        let allocator = SequenceAllocator::new(store.clone());
        store.seed_counter(ORDER_NUMBER_COUNTER, 50);
        assert_eq!(allocator.allocate_next_order_number().await.unwrap(), "0051");

        store.seed_counter(ORDER_NUMBER_COUNTER, 0);
        let err = allocator.allocate_next_order_number().await.unwrap_err();
        assert!(matches!(err, FloorError::AllocationError(_)));
    }
}
