//! Explicit memoization for local layer resolution.
use super::Resolution;

/// Per-process memo of the last resolution result.
///
/// There is no TTL and no invalidation heuristic: callers that just mutated
/// the filesystem must [`clear`](Self::clear) before the next
/// [`resolve`](super::LocalResolver::resolve) to observe the change.
#[derive(Debug, Default)]
pub struct PathCache {
    entry: Option<Resolution>,
}

impl PathCache {
    /// Create an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self { entry: None }
    }

    /// Return the memoized resolution, if any.
    #[must_use]
    pub const fn get(&self) -> Option<&Resolution> {
        self.entry.as_ref()
    }

    /// Memoize a resolution, replacing any previous entry.
    pub fn set(&mut self, resolution: Resolution) {
        self.entry = Some(resolution);
    }

    /// Drop the memoized entry.
    pub fn clear(&mut self) {
        self.entry = None;
    }
}
