//! Railnet Core -- junction routing for model-railway track layouts.
//!
//! This crate models how track pieces connect and how a train moving
//! through a piece continues, given the current position of its switch.
//!
//! # Layers
//!
//! 1. **Direction** -- the eight compass points around a piece as single
//!    bits, with circular rotation and half-turn complement.
//! 2. **Symbol** -- rotation-invariant classification of a piece's junction
//!    pattern against a fixed catalog of shapes, plus open-junction
//!    bookkeeping used while wiring a layout.
//! 3. **Node** -- the graph vertex. Four variants (block, simple switch,
//!    three-way switch, crossover switch) each own named ports and a
//!    stand-dependent routing table.
//! 4. **TrackGraph** -- the arena owning all nodes; ports hold [`id::NodeId`]
//!    handles into it, so the cyclic graph has one owner.
//!
//! # Routing
//!
//! ```rust
//! use railnet_core::direction::Direction;
//! use railnet_core::graph::TrackGraph;
//! use railnet_core::id::TrackId;
//! use railnet_core::node::{Hand, Node};
//! use railnet_core::stand::SwitchStand;
//!
//! let mut graph = TrackGraph::new();
//! let a = graph.add_node(Node::block(TrackId(1))).unwrap();
//! let s = graph
//!     .add_node(Node::simple_switch(TrackId(2), Hand::Right, SwitchStand::Straight1))
//!     .unwrap();
//! let b = graph.add_node(Node::block(TrackId(3))).unwrap();
//! let c = graph.add_node(Node::block(TrackId(4))).unwrap();
//! graph.link(a, Direction::Top, s, Direction::Bottom).unwrap();
//! graph.link(s, Direction::Top, b, Direction::Bottom).unwrap();
//! graph.link(s, Direction::TopRight, c, Direction::BottomLeft).unwrap();
//!
//! assert_eq!(graph.route(s, a).unwrap(), Some(b));
//! assert_eq!(graph.route(s, c).unwrap(), None); // inactive branch
//!
//! graph.turn(s, SwitchStand::Bend1).unwrap();
//! assert_eq!(graph.route(s, a).unwrap(), Some(c));
//! ```

pub mod direction;
pub mod graph;
pub mod id;
pub mod node;
pub mod stand;
pub mod symbol;
pub mod trace;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
