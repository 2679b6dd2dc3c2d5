//! Following a route through the track graph.
//!
//! A trace repeatedly applies each node's routing function, the way a train
//! would move through the layout with the switches as they currently stand.
//! Blocked and unwired continuations end the trace; they are outcomes, not
//! errors.

use crate::graph::{GraphError, TrackGraph};
use crate::id::NodeId;
use crate::node::Port;
use std::collections::BTreeSet;

/// Why a trace stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEnd {
    /// The arrival port at `at` is not on the active path.
    Blocked { at: NodeId },
    /// The active exit `port` of `at` has nothing wired to it.
    DeadEnd { at: NodeId, port: Port },
    /// The route came back to a (previous, current) pair already visited.
    Looped,
    /// The step limit was reached first.
    LimitReached,
}

/// The nodes visited by a trace, in order, starting with the start node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub nodes: Vec<NodeId>,
    pub end: TraceEnd,
}

impl Trace {
    /// The last node reached.
    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl TrackGraph {
    /// Follow the route starting at `start`, having arrived from `from`.
    ///
    /// At most `limit` nodes are visited.
    ///
    /// # Examples
    ///
    /// ```
    /// use railnet_core::direction::Direction;
    /// use railnet_core::graph::TrackGraph;
    /// use railnet_core::id::TrackId;
    /// use railnet_core::node::Node;
    /// use railnet_core::trace::TraceEnd;
    ///
    /// let mut graph = TrackGraph::new();
    /// let a = graph.add_node(Node::block(TrackId(1))).unwrap();
    /// let b = graph.add_node(Node::block(TrackId(2))).unwrap();
    /// graph.link(a, Direction::Top, b, Direction::Bottom).unwrap();
    ///
    /// let trace = graph.trace(b, a, 10).unwrap();
    /// assert_eq!(trace.nodes, vec![b]);
    /// assert!(matches!(trace.end, TraceEnd::DeadEnd { .. }));
    /// ```
    pub fn trace(&self, start: NodeId, from: NodeId, limit: usize) -> Result<Trace, GraphError> {
        let mut nodes = Vec::new();
        let mut seen: BTreeSet<(NodeId, NodeId)> = BTreeSet::new();
        let (mut previous, mut current) = (from, start);

        loop {
            if nodes.len() >= limit {
                return Ok(Trace {
                    nodes,
                    end: TraceEnd::LimitReached,
                });
            }
            if !seen.insert((previous, current)) {
                return Ok(Trace {
                    nodes,
                    end: TraceEnd::Looped,
                });
            }
            nodes.push(current);

            let node = self
                .node(current)
                .ok_or(GraphError::NodeNotFound(current))?;
            let Some(port) = node.route_port(previous)? else {
                return Ok(Trace {
                    nodes,
                    end: TraceEnd::Blocked { at: current },
                });
            };
            let Some(next) = node.port(port)? else {
                return Ok(Trace {
                    nodes,
                    end: TraceEnd::DeadEnd { at: current, port },
                });
            };

            previous = current;
            current = next;
        }
    }
}
