//! Optional thread-local cache of byte buffers, keyed by power-of-two size.
//!
//! Encode/decode calls churn through short-lived chunk buffers; when caching
//! is enabled the buffers are parked here between calls instead of going back
//! to the allocator. Thread-local storage means no locking. The cache is
//! bounded per bucket, so a single oversized burst cannot pin memory.

use std::cell::RefCell;

/// Smallest cached buffer size (log2).
const MIN_SHIFT: u32 = 6;
/// Largest cached buffer size (log2): 1 MiB.
const MAX_SHIFT: u32 = 20;
/// Buffers retained per size bucket.
const PER_BUCKET: usize = 4;

const BUCKETS: usize = (MAX_SHIFT - MIN_SHIFT + 1) as usize;

thread_local! {
    static POOL: RefCell<[Vec<Vec<u8>>; BUCKETS]> = RefCell::new(core::array::from_fn(|_| Vec::new()));
}

fn bucket_of(capacity: usize) -> Option<usize> {
    let shift = capacity.next_power_of_two().trailing_zeros();
    if (MIN_SHIFT..=MAX_SHIFT).contains(&shift) {
        Some((shift - MIN_SHIFT) as usize)
    } else {
        None
    }
}

/// Returns an empty buffer with capacity at least `capacity`. Cache hits
/// require `enabled`; otherwise this is a plain allocation.
pub fn acquire(capacity: usize, enabled: bool) -> Vec<u8> {
    if enabled {
        if let Some(bucket) = bucket_of(capacity) {
            let cached = POOL.with(|pool| pool.borrow_mut()[bucket].pop());
            if let Some(buf) = cached {
                debug_assert!(buf.capacity() >= capacity);
                return buf;
            }
            return Vec::with_capacity(capacity.next_power_of_two());
        }
    }
    Vec::with_capacity(capacity)
}

/// Hands a buffer back to the cache. No-op when caching is disabled or the
/// buffer's size has no bucket.
pub fn release(mut buf: Vec<u8>, enabled: bool) {
    if !enabled {
        return;
    }
    if !buf.capacity().is_power_of_two() {
        return;
    }
    if let Some(bucket) = bucket_of(buf.capacity()) {
        buf.clear();
        POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            if pool[bucket].len() < PER_BUCKET {
                pool[bucket].push(buf);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_release_round_trip() {
        let buf = acquire(1024, true);
        assert!(buf.capacity() >= 1024);
        let cap = buf.capacity();
        release(buf, true);
        let again = acquire(1024, true);
        assert_eq!(again.capacity(), cap);
        assert!(again.is_empty());
    }

    #[test]
    fn disabled_cache_always_allocates() {
        release(Vec::with_capacity(1024), false);
        let buf = acquire(1024, false);
        assert_eq!(buf.capacity(), 1024);
    }
}
