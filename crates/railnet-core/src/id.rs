use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Handle to a node in a [`TrackGraph`](crate::graph::TrackGraph) arena.
    ///
    /// Ports store these instead of references, so the cyclic track graph has
    /// a single owner.
    pub struct NodeId;
}

/// Externally assigned identifier of a track piece. Unique within a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
