//! Identity wrapper for recreated GPU resources.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A resource paired with a process-unique id.
///
/// Texture views are recreated on every resize; bind groups built from them
/// must be rebuilt too. Passes cache the id of the view a bind group was
/// built against and compare on prepare, which catches recreation without
/// comparing wgpu handles.
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    inner: T,
    id: u64,
}

impl<T> Tracked<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            id: next_id(),
        }
    }

    /// The unique id, usable as a bind group cache key.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_assigns_distinct_ids() {
        let a = Tracked::new(1u32);
        let b = Tracked::new(1u32);
        assert_ne!(a.id(), b.id());
        assert_eq!(*a, *b);
    }
}
