//! Core identifier types for the hub.
//!
//! All IDs are lightweight Copy types using newtype pattern for type safety.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a hub (one root plus its context table).
///
/// Context handles carry the id of the hub that created them so a handle
/// from one hub is never resolved against another hub's table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct HubId(pub u64);

/// Handle for an execution context (table index within its hub).
///
/// Stable for the lifetime of the hub; a dead context keeps its id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ContextId {
    hub: HubId,
    index: usize,
}

static HUB_COUNTER: AtomicU64 = AtomicU64::new(1);

impl HubId {
    /// Create a fresh unique HubId.
    pub fn fresh() -> Self {
        HubId(HUB_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl ContextId {
    pub(crate) fn new(hub: HubId, index: usize) -> Self {
        ContextId { hub, index }
    }

    pub fn hub(&self) -> HubId {
        self.hub
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The root context always occupies slot 0.
    pub fn is_root(&self) -> bool {
        self.index == 0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "context#{}.{}", self.hub.raw(), self.index)
    }
}
