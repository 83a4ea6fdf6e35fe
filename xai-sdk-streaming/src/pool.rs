//! Process-wide pool of reusable text builders.
//!
//! Streamed text fields are appended into pooled `String`s instead of the
//! canonical field so long streams do not pay for repeated reallocation of
//! a string that is also being read. Builders are cleared on return, and
//! oversized builders are dropped to keep the pool bounded.

use parking_lot::Mutex;

/// Maximum number of idle builders kept in the pool.
pub const MAX_POOLED_BUILDERS: usize = 64;

/// Builders whose capacity exceeds this are dropped instead of pooled.
pub const MAX_BUILDER_CAPACITY: usize = 1 << 20;

static POOL: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// Take an empty builder with at least `min_capacity` bytes reserved.
pub fn acquire(min_capacity: usize) -> String {
    let mut builder = POOL.lock().pop().unwrap_or_default();
    builder.clear();
    builder.reserve(min_capacity);
    builder
}

/// Return a builder to the pool.
///
/// Returns `true` if the builder was kept for reuse.
pub fn release(mut builder: String) -> bool {
    let capacity = builder.capacity();
    if capacity == 0 || capacity > MAX_BUILDER_CAPACITY {
        return false;
    }
    builder.clear();

    let mut pool = POOL.lock();
    if pool.len() >= MAX_POOLED_BUILDERS {
        return false;
    }
    pool.push(builder);
    true
}

/// Number of idle builders currently pooled.
pub fn idle() -> usize {
    POOL.lock().len()
}
