//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::direction::Direction;
use crate::graph::TrackGraph;
use crate::id::{NodeId, TrackId};
use crate::node::{Hand, Node};
use crate::stand::SwitchStand;
use flexi_logger::{LogSpecBuilder, Logger, LoggerHandle};
use log::LevelFilter;
use parking_lot::{Mutex, const_mutex};

// ===========================================================================
// Logging
// ===========================================================================

/// Keeps the first logger alive; later calls are no-ops.
static LOGGER_HANDLE: Mutex<Option<LoggerHandle>> = const_mutex(None);

/// Start `flexi_logger` once for the whole test binary.
///
/// `cargo test` runs tests in parallel but only one logger can be installed.
pub fn init_test_logging() {
    let handle = &mut *LOGGER_HANDLE.lock();
    if handle.is_none() {
        let mut builder = LogSpecBuilder::new();
        let _ = builder
            .default(LevelFilter::Warn)
            .module("railnet_core", LevelFilter::Debug)
            .module("railnet_layout", LevelFilter::Debug);
        *handle = Logger::with(builder.finalize())
            .log_to_stderr()
            .start()
            .ok();
    }
}

// ===========================================================================
// Node builders
// ===========================================================================

pub fn add_block(graph: &mut TrackGraph, id: u32) -> NodeId {
    graph
        .add_node(Node::block(TrackId(id)))
        .expect("add block")
}

pub fn add_right_switch(graph: &mut TrackGraph, id: u32, stand: SwitchStand) -> NodeId {
    graph
        .add_node(Node::simple_switch(TrackId(id), Hand::Right, stand))
        .expect("add right switch")
}

pub fn add_left_switch(graph: &mut TrackGraph, id: u32, stand: SwitchStand) -> NodeId {
    graph
        .add_node(Node::simple_switch(TrackId(id), Hand::Left, stand))
        .expect("add left switch")
}

pub fn add_three_way_switch(graph: &mut TrackGraph, id: u32, stand: SwitchStand) -> NodeId {
    graph
        .add_node(Node::three_way_switch(TrackId(id), stand))
        .expect("add three-way switch")
}

pub fn add_cross_over_switch(graph: &mut TrackGraph, id: u32, stand: SwitchStand) -> NodeId {
    graph
        .add_node(Node::cross_over_switch(TrackId(id), stand))
        .expect("add crossover switch")
}

// ===========================================================================
// Layout builders
// ===========================================================================

/// A vertical line of `length` blocks, each linked top to bottom.
pub fn build_line(graph: &mut TrackGraph, first_id: u32, length: u32) -> Vec<NodeId> {
    let nodes: Vec<NodeId> = (0..length)
        .map(|i| add_block(graph, first_id + i))
        .collect();
    for pair in nodes.windows(2) {
        graph
            .link(pair[0], Direction::Top, pair[1], Direction::Bottom)
            .expect("link line");
    }
    nodes
}

/// A closed ring of `length` blocks (at least 2).
pub fn build_ring(graph: &mut TrackGraph, first_id: u32, length: u32) -> Vec<NodeId> {
    let nodes = build_line(graph, first_id, length);
    if let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) {
        graph
            .link(last, Direction::Top, first, Direction::Bottom)
            .expect("close ring");
    }
    nodes
}
