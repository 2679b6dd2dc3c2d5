use crate::direction::Direction;
use crate::id::{NodeId, TrackId};
use crate::node::{Node, NodeError, Port};
use crate::stand::SwitchStand;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("track id {0} is already in use")]
    DuplicateTrackId(TrackId),
    #[error(transparent)]
    Node(#[from] NodeError),
}

// ---------------------------------------------------------------------------
// TrackGraph
// ---------------------------------------------------------------------------

/// The arena owning every node of a track layout.
///
/// Nodes refer to each other through [`NodeId`] handles stored in their
/// ports; the graph is the only owner. Removing a node clears every port
/// that pointed at it, so a handle held in a port is always live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackGraph {
    nodes: SlotMap<NodeId, Node>,
    by_track: BTreeMap<TrackId, NodeId>,
}

impl TrackGraph {
    /// Create a new, empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    /// Add a node. Its [`TrackId`] must not be in use.
    ///
    /// # Examples
    ///
    /// ```
    /// use railnet_core::graph::TrackGraph;
    /// use railnet_core::id::TrackId;
    /// use railnet_core::node::Node;
    ///
    /// let mut graph = TrackGraph::new();
    /// let id = graph.add_node(Node::block(TrackId(1))).unwrap();
    /// assert_eq!(graph.lookup(TrackId(1)), Some(id));
    /// ```
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        let track = node.id();
        if self.by_track.contains_key(&track) {
            return Err(GraphError::DuplicateTrackId(track));
        }
        log::debug!("add {} {}", node.kind().name(), track);
        let id = self.nodes.insert(node);
        self.by_track.insert(track, id);
        Ok(id)
    }

    /// Remove a node, clearing every port that referred to it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let node = self.nodes.remove(id).ok_or(GraphError::NodeNotFound(id))?;
        self.by_track.remove(&node.id());
        // One-sided ports may hold `id` without a back-reference.
        for (_, other) in self.nodes.iter_mut() {
            other.unlink(id);
        }
        log::debug!("remove {} {}", node.kind().name(), node.id());
        Ok(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Find a node by its external id.
    pub fn lookup(&self, track: TrackId) -> Option<NodeId> {
        self.by_track.get(&track).copied()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over all node ids and their nodes.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    fn get(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(id).ok_or(GraphError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes.get_mut(id).ok_or(GraphError::NodeNotFound(id))
    }

    fn ensure_live(&self, neighbor: Option<NodeId>) -> Result<(), GraphError> {
        match neighbor {
            Some(id) if !self.nodes.contains_key(id) => Err(GraphError::NodeNotFound(id)),
            _ => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Wiring
    // -----------------------------------------------------------------------

    /// Bind `neighbor` to the port of `node` serving `direction` (one side only).
    pub fn set_junction(
        &mut self,
        node: NodeId,
        direction: Direction,
        neighbor: Option<NodeId>,
    ) -> Result<(), GraphError> {
        self.ensure_live(neighbor)?;
        self.get_mut(node)?.set_junction(direction, neighbor)?;
        Ok(())
    }

    /// Neighbour of `node` at `direction`.
    pub fn junction(
        &self,
        node: NodeId,
        direction: Direction,
    ) -> Result<Option<NodeId>, GraphError> {
        Ok(self.get(node)?.junction(direction)?)
    }

    /// Bind `neighbor` to a named port of `node` (one side only).
    pub fn set_port(
        &mut self,
        node: NodeId,
        port: Port,
        neighbor: Option<NodeId>,
    ) -> Result<(), GraphError> {
        self.ensure_live(neighbor)?;
        self.get_mut(node)?.set_port(port, neighbor)?;
        Ok(())
    }

    /// Wire two nodes to each other, addressing each side by direction.
    ///
    /// Both ports are validated before either is written.
    pub fn link(
        &mut self,
        a: NodeId,
        a_direction: Direction,
        b: NodeId,
        b_direction: Direction,
    ) -> Result<(), GraphError> {
        let a_port = self.get(a)?.port_at(a_direction)?;
        let b_port = self.get(b)?.port_at(b_direction)?;
        self.link_ports(a, a_port, b, b_port)
    }

    /// Wire two nodes to each other, addressing each side by port.
    pub fn link_ports(
        &mut self,
        a: NodeId,
        a_port: Port,
        b: NodeId,
        b_port: Port,
    ) -> Result<(), GraphError> {
        self.get(a)?.port(a_port)?;
        self.get(b)?.port(b_port)?;
        self.detach(a, a_port, b)?;
        self.detach(b, b_port, a)?;
        self.get_mut(a)?.set_port(a_port, Some(b))?;
        self.get_mut(b)?.set_port(b_port, Some(a))?;
        log::debug!("link {:?}.{:?} <-> {:?}.{:?}", a, a_port, b, b_port);
        Ok(())
    }

    /// Before `port` of `node` is rewired to `replacement`, clear the
    /// back-reference held by its current neighbour.
    fn detach(
        &mut self,
        node: NodeId,
        port: Port,
        replacement: NodeId,
    ) -> Result<(), GraphError> {
        let Some(previous) = self.get(node)?.port(port)? else {
            return Ok(());
        };
        if previous == replacement {
            return Ok(());
        }
        if let Some(other) = self.nodes.get_mut(previous) {
            if let Some(back) = other.port_of(node) {
                other.set_port(back, None)?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Where a train at `node`, having arrived from `from`, continues.
    pub fn route(&self, node: NodeId, from: NodeId) -> Result<Option<NodeId>, GraphError> {
        Ok(self.get(node)?.route(from)?)
    }

    /// Set the stand of `node`.
    pub fn turn(&mut self, node: NodeId, stand: SwitchStand) -> Result<(), GraphError> {
        self.get_mut(node)?.turn(stand);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
