use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// Single static counter for all scene objects
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of a scene object, preserved through snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub fn generate_id() -> ObjectId {
    ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::SeqCst))
}

/// Make sure ids handed out later never collide with `id` (used after loading a snapshot)
pub fn reserve_past(id: ObjectId) {
    NEXT_OBJECT_ID.fetch_max(id.0 + 1, Ordering::SeqCst);
}
