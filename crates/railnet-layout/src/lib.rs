//! Grid layout of track pieces.
//!
//! A [`Layout`] places classified [`Symbol`]s on a sparse 2D grid, creates
//! the matching nodes in a [`TrackGraph`], and wires each rail end to the
//! complementary rail end of the neighbouring cell.
//!
//! Pieces may be drawn in any rotation. When a switch is placed, its
//! physical junction directions are mapped onto the canonical ports of the
//! node by the rotation that takes the placed symbol back to the catalog
//! shape.

use railnet_core::direction::Direction;
use railnet_core::graph::{GraphError, TrackGraph};
use railnet_core::id::{NodeId, TrackId};
use railnet_core::node::{Node, NodeError, NodeKind, Port};
use railnet_core::stand::SwitchStand;
use railnet_core::symbol::{Shape, Symbol, SymbolError};
use railnet_core::trace::Trace;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use std::collections::BTreeMap;

pub mod config;
pub use config::{ConfigError, LayoutConfig};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A cell on the layout grid. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell in `direction`.
    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &GridPosition) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }
}

/// Which node and port serve one physical rail end of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileJunction {
    pub direction: Direction,
    pub node: NodeId,
    pub port: Port,
}

/// A placed track piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    symbol: Symbol,
    junctions: Vec<TileJunction>,
}

impl Tile {
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn junctions(&self) -> &[TileJunction] {
        &self.junctions
    }

    /// The junction at a physical direction.
    pub fn junction(&self, direction: Direction) -> Option<&TileJunction> {
        self.junctions.iter().find(|j| j.direction == direction)
    }

    /// Nodes on this tile, without duplicates, in junction order.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = Vec::new();
        for junction in &self.junctions {
            if !nodes.contains(&junction.node) {
                nodes.push(junction.node);
            }
        }
        nodes
    }
}

/// Outcome of a wiring pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WiringReport {
    /// Number of junction pairs linked.
    pub linked: usize,
    /// Rail ends with no partner in the neighbouring cell.
    pub dangling: Vec<(GridPosition, Direction)>,
}

/// Errors from layout operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("cannot place an empty symbol at {0:?}")]
    EmptySymbol(GridPosition),
    #[error("position {0:?} is occupied")]
    Occupied(GridPosition),
    #[error("nothing is placed at {0:?}")]
    NotPlaced(GridPosition),
    #[error("no rail end at {direction} of {position:?}")]
    NoJunction {
        position: GridPosition,
        direction: Direction,
    },
    #[error("rail end at {direction} of {position:?} is not wired")]
    Unwired {
        position: GridPosition,
        direction: Direction,
    },
    #[error("{} rail end(s) left unconnected", .0.len())]
    Dangling(Vec<(GridPosition, Direction)>),
    #[error(transparent)]
    Symbol(#[from] SymbolError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl From<NodeError> for LayoutError {
    fn from(err: NodeError) -> Self {
        LayoutError::Graph(GraphError::Node(err))
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Track pieces on a grid, together with the graph of their nodes.
///
/// Maintains a bidirectional mapping:
/// - `tiles`: position -> placed piece (and the nodes serving its rail ends)
/// - `positions`: node -> position of its tile
#[derive(Debug)]
pub struct Layout {
    config: LayoutConfig,
    graph: TrackGraph,
    tiles: BTreeMap<GridPosition, Tile>,
    positions: SecondaryMap<NodeId, GridPosition>,
    next_track_id: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

impl Layout {
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            next_track_id: config.first_track_id,
            config,
            graph: TrackGraph::new(),
            tiles: BTreeMap::new(),
            positions: SecondaryMap::new(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// The track graph built from the placed pieces.
    pub fn graph(&self) -> &TrackGraph {
        &self.graph
    }

    // -- Placement --

    /// Place a piece. Returns the nodes created for it.
    pub fn place(
        &mut self,
        position: GridPosition,
        symbol: Symbol,
    ) -> Result<Vec<NodeId>, LayoutError> {
        if !symbol.is_symbol() {
            return Err(LayoutError::EmptySymbol(position));
        }
        if self.tiles.contains_key(&position) {
            return Err(LayoutError::Occupied(position));
        }
        let shape = symbol
            .shape()
            .ok_or(SymbolError::InvalidSymbol(symbol.fixed().bits()))?;

        let mut symbol = symbol;
        symbol.reset();

        let junctions = match NodeKind::for_shape(shape) {
            Some(kind) if kind.is_switch() => self.place_switch(&symbol, shape, kind)?,
            Some(kind) => {
                let node = self.add_node(kind)?;
                let directions: Vec<Direction> = symbol.fixed().directions().collect();
                block_junctions(node, &directions)
            }
            None => self.place_crossing(&symbol)?,
        };

        let tile = Tile { symbol, junctions };
        let nodes = tile.nodes();
        for node in &nodes {
            self.positions.insert(*node, position);
        }
        log::debug!(
            "placed {:?} at ({}, {}) as {} node(s)",
            shape,
            position.x,
            position.y,
            nodes.len()
        );
        self.tiles.insert(position, tile);
        Ok(nodes)
    }

    /// Map each physical rail end onto the canonical port it corresponds to.
    fn place_switch(
        &mut self,
        symbol: &Symbol,
        shape: Shape,
        kind: NodeKind,
    ) -> Result<Vec<TileJunction>, LayoutError> {
        let steps = symbol.distance_to(&Symbol::of_shape(shape))?;
        let ports = symbol
            .fixed()
            .directions()
            .map(|direction| {
                let canonical = direction.rotate_forward(steps);
                kind.junctions()
                    .port_at(canonical)
                    .map(|port| (direction, port))
                    .ok_or(NodeError::InvalidDirection {
                        kind: kind.name(),
                        direction: canonical,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let node = self.add_node(kind)?;
        Ok(ports
            .into_iter()
            .map(|(direction, port)| TileJunction {
                direction,
                node,
                port,
            })
            .collect())
    }

    /// A plain crossing is two independent straight blocks.
    fn place_crossing(&mut self, symbol: &Symbol) -> Result<Vec<TileJunction>, LayoutError> {
        let first = symbol.next_open_junction(Direction::Top);
        let mut junctions = Vec::with_capacity(4);
        for start in [first, first.rotate_forward(2)] {
            let node = self.add_node(NodeKind::block())?;
            junctions.extend(block_junctions(node, &[start, start.complement()]));
        }
        Ok(junctions)
    }

    fn add_node(&mut self, kind: NodeKind) -> Result<NodeId, LayoutError> {
        while self.graph.lookup(TrackId(self.next_track_id)).is_some() {
            self.next_track_id = self.next_track_id.wrapping_add(1);
        }
        let id = TrackId(self.next_track_id);
        self.next_track_id = self.next_track_id.wrapping_add(1);
        let stand = if kind.is_switch() {
            self.config.default_stand
        } else {
            SwitchStand::default()
        };
        Ok(self.graph.add_node(Node::with_stand(id, kind, stand))?)
    }

    /// Remove the piece at a position, and its nodes from the graph.
    pub fn remove(&mut self, position: GridPosition) -> Result<Tile, LayoutError> {
        let tile = self
            .tiles
            .remove(&position)
            .ok_or(LayoutError::NotPlaced(position))?;
        for node in tile.nodes() {
            self.positions.remove(node);
            self.graph.remove_node(node)?;
        }
        Ok(tile)
    }

    // -- Queries --

    pub fn tile_at(&self, position: GridPosition) -> Option<&Tile> {
        self.tiles.get(&position)
    }

    pub fn is_occupied(&self, position: GridPosition) -> bool {
        self.tiles.contains_key(&position)
    }

    /// The node serving the rail end at `direction` of a cell.
    pub fn node_toward(&self, position: GridPosition, direction: Direction) -> Option<NodeId> {
        self.tiles
            .get(&position)?
            .junction(direction)
            .map(|j| j.node)
    }

    pub fn position_of(&self, node: NodeId) -> Option<GridPosition> {
        self.positions.get(node).copied()
    }

    /// Junctions of a tile not consumed by the last wiring pass.
    pub fn open_junctions(&self, position: GridPosition) -> Option<Vec<Direction>> {
        self.tiles
            .get(&position)
            .map(|tile| tile.symbol.open().directions().collect())
    }

    /// Cells whose piece has no rail end on its upstream side.
    pub fn start_positions(&self) -> Vec<GridPosition> {
        self.tiles
            .iter()
            .filter(|(_, tile)| tile.symbol.is_start_symbol())
            .map(|(pos, _)| *pos)
            .collect()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    // -- Wiring --

    /// Link every rail end to the complementary rail end of its neighbour.
    ///
    /// All tiles are re-opened first, so the pass can be repeated after
    /// pieces are added or removed. Rail ends without a partner are cleared
    /// and reported.
    pub fn wire(&mut self) -> Result<WiringReport, LayoutError> {
        for tile in self.tiles.values_mut() {
            tile.symbol.reset();
        }

        let positions: Vec<GridPosition> = self.tiles.keys().copied().collect();
        let mut report = WiringReport::default();

        for position in &positions {
            let Some(tile) = self.tiles.get(position) else {
                continue;
            };
            let open: Vec<TileJunction> = tile
                .junctions
                .iter()
                .filter(|j| tile.symbol.is_open_junction_set(j.direction))
                .copied()
                .collect();

            for here in open {
                let facing = here.direction.complement();
                let neighbor_position = position.step(here.direction);
                let there = self
                    .tiles
                    .get(&neighbor_position)
                    .filter(|t| t.symbol.is_open_junction_set(facing))
                    .and_then(|t| t.junction(facing).copied());

                match there {
                    Some(there) => {
                        self.graph
                            .link_ports(here.node, here.port, there.node, there.port)?;
                        self.consume(*position, here.direction)?;
                        self.consume(neighbor_position, facing)?;
                        report.linked += 1;
                    }
                    None => {
                        self.graph.set_port(here.node, here.port, None)?;
                    }
                }
            }
        }

        for (position, tile) in &self.tiles {
            let mut remaining = tile.symbol;
            while remaining.has_open_junctions_left() {
                let direction = remaining.next_open_junction(Direction::Top);
                remaining.remove_junction(direction)?;
                log::warn!(
                    "rail end {} at ({}, {}) has no partner",
                    direction,
                    position.x,
                    position.y
                );
                report.dangling.push((*position, direction));
            }
        }

        if self.config.strict_wiring && !report.dangling.is_empty() {
            return Err(LayoutError::Dangling(report.dangling));
        }
        Ok(report)
    }

    fn consume(&mut self, position: GridPosition, direction: Direction) -> Result<(), LayoutError> {
        let tile = self
            .tiles
            .get_mut(&position)
            .ok_or(LayoutError::NotPlaced(position))?;
        tile.symbol.remove_junction(direction)?;
        Ok(())
    }

    // -- Operation --

    /// Turn every switch on a tile. Returns how many nodes were turned.
    pub fn turn(
        &mut self,
        position: GridPosition,
        stand: SwitchStand,
    ) -> Result<usize, LayoutError> {
        let tile = self
            .tiles
            .get(&position)
            .ok_or(LayoutError::NotPlaced(position))?;
        let switches: Vec<NodeId> = tile
            .nodes()
            .into_iter()
            .filter(|node| {
                self.graph
                    .node(*node)
                    .is_some_and(|n| n.kind().is_switch())
            })
            .collect();
        for node in &switches {
            self.graph.turn(*node, stand)?;
        }
        Ok(switches.len())
    }

    /// Follow the route entering the piece at `position` through its rail
    /// end at `entry`, coming from whatever is wired there.
    pub fn trace(
        &self,
        position: GridPosition,
        entry: Direction,
        limit: usize,
    ) -> Result<Trace, LayoutError> {
        let tile = self
            .tiles
            .get(&position)
            .ok_or(LayoutError::NotPlaced(position))?;
        let here = tile.junction(entry).ok_or(LayoutError::NoJunction {
            position,
            direction: entry,
        })?;
        let node = self
            .graph
            .node(here.node)
            .ok_or(GraphError::NodeNotFound(here.node))?;
        let from = node.port(here.port)?.ok_or(LayoutError::Unwired {
            position,
            direction: entry,
        })?;
        Ok(self.graph.trace(here.node, from, limit)?)
    }
}

/// Assign block ports to rail ends. The compass sides of a block decide the
/// port; a bend with both ends on the same side falls back to `In` for the
/// first end clockwise from `Top` and `Out` for the other.
fn block_junctions(node: NodeId, directions: &[Direction]) -> Vec<TileJunction> {
    let block = NodeKind::block();
    let by_side: Vec<Option<Port>> = directions
        .iter()
        .map(|d| block.junctions().port_at(*d))
        .collect();
    let ports: Vec<Port> = match by_side.as_slice() {
        [Some(port)] => vec![*port],
        [Some(a), Some(b)] if a != b => vec![*a, *b],
        _ => [Port::In, Port::Out]
            .into_iter()
            .take(directions.len())
            .collect(),
    };
    directions
        .iter()
        .zip(ports)
        .map(|(direction, port)| TileJunction {
            direction: *direction,
            node,
            port,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use railnet_core::direction::DirectionSet;
    use railnet_core::node::Hand;
    use railnet_core::trace::TraceEnd;

    fn pos(x: i32, y: i32) -> GridPosition {
        GridPosition::new(x, y)
    }

    fn symbol(directions: &[Direction]) -> Symbol {
        Symbol::new(directions.iter().copied().collect::<DirectionSet>()).unwrap()
    }

    #[test]
    fn grid_position_step() {
        assert_eq!(pos(2, 2).step(Direction::Top), pos(2, 1));
        assert_eq!(pos(2, 2).step(Direction::BottomLeft), pos(1, 3));
        assert_eq!(pos(2, 2).step(Direction::Unset), pos(2, 2));
    }

    #[test]
    fn grid_position_manhattan_distance() {
        assert_eq!(pos(0, 0).manhattan_distance(&pos(3, -4)), 7);
    }

    #[test]
    fn place_straight_creates_one_block() {
        let mut layout = Layout::new();
        let nodes = layout.place(pos(0, 0), Symbol::STRAIGHT).unwrap();
        assert_eq!(nodes.len(), 1);
        let tile = layout.tile_at(pos(0, 0)).unwrap();
        assert_eq!(tile.junctions().len(), 2);
        assert_eq!(tile.junction(Direction::Top).unwrap().port, Port::Out);
        assert_eq!(tile.junction(Direction::Bottom).unwrap().port, Port::In);
        assert_eq!(layout.position_of(nodes[0]), Some(pos(0, 0)));
        assert_eq!(
            layout.graph().node(nodes[0]).map(Node::id),
            Some(TrackId(1))
        );
    }

    #[test]
    fn bend_on_one_side_falls_back_to_clockwise_order() {
        let mut layout = Layout::new();
        layout.place(pos(0, 0), Symbol::BEND).unwrap();
        let tile = layout.tile_at(pos(0, 0)).unwrap();
        assert_eq!(tile.junction(Direction::Top).unwrap().port, Port::In);
        assert_eq!(tile.junction(Direction::BottomRight).unwrap().port, Port::Out);
    }

    #[test]
    fn place_empty_symbol_fails() {
        let mut layout = Layout::new();
        assert_eq!(
            layout.place(pos(0, 0), Symbol::EMPTY),
            Err(LayoutError::EmptySymbol(pos(0, 0)))
        );
    }

    #[test]
    fn place_occupied_fails() {
        let mut layout = Layout::new();
        layout.place(pos(0, 0), Symbol::STRAIGHT).unwrap();
        assert_eq!(
            layout.place(pos(0, 0), Symbol::END),
            Err(LayoutError::Occupied(pos(0, 0)))
        );
        assert_eq!(layout.graph().node_count(), 1);
    }

    #[test]
    fn rotated_switch_maps_to_canonical_ports() {
        let mut layout = Layout::new();
        // A right switch turned a quarter clockwise: in at the left,
        // straight out at the right, bend out at the bottom right.
        let placed = Symbol::RIGHT_SWITCH.rotated(2);
        assert_eq!(
            placed.fixed(),
            DirectionSet::RIGHT | DirectionSet::LEFT | DirectionSet::BOTTOM_RIGHT
        );
        let nodes = layout.place(pos(0, 0), placed).unwrap();
        let tile = layout.tile_at(pos(0, 0)).unwrap();
        assert_eq!(tile.junction(Direction::Left).unwrap().port, Port::In);
        assert_eq!(tile.junction(Direction::Right).unwrap().port, Port::OutStraight);
        assert_eq!(tile.junction(Direction::BottomRight).unwrap().port, Port::OutBend);
        assert!(matches!(
            layout.graph().node(nodes[0]).unwrap().kind(),
            NodeKind::SimpleSwitch(ports) if ports.hand() == Hand::Right
        ));
    }

    #[test]
    fn crossing_becomes_two_blocks() {
        let mut layout = Layout::new();
        let nodes = layout.place(pos(0, 0), Symbol::CROSS_OVER).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(layout.node_toward(pos(0, 0), Direction::Top), Some(nodes[0]));
        assert_eq!(layout.node_toward(pos(0, 0), Direction::Bottom), Some(nodes[0]));
        assert_eq!(layout.node_toward(pos(0, 0), Direction::Right), Some(nodes[1]));
        assert_eq!(layout.node_toward(pos(0, 0), Direction::Left), Some(nodes[1]));
    }

    #[test]
    fn switches_take_configured_stand() {
        let config = LayoutConfig {
            default_stand: SwitchStand::Bend2,
            first_track_id: 50,
            strict_wiring: false,
        };
        let mut layout = Layout::with_config(config);
        let nodes = layout.place(pos(0, 0), Symbol::THREE_WAY_SWITCH).unwrap();
        let node = layout.graph().node(nodes[0]).unwrap();
        assert_eq!(node.stand(), SwitchStand::Bend2);
        assert_eq!(node.id(), TrackId(50));
    }

    #[test]
    fn wire_links_neighbours_and_reports_dangling() {
        let mut layout = Layout::new();
        let lower = layout.place(pos(0, 1), Symbol::STRAIGHT).unwrap()[0];
        let upper = layout.place(pos(0, 0), Symbol::STRAIGHT).unwrap()[0];

        let report = layout.wire().unwrap();
        assert_eq!(report.linked, 1);
        assert_eq!(
            report.dangling,
            vec![(pos(0, 0), Direction::Top), (pos(0, 1), Direction::Bottom)]
        );
        assert_eq!(layout.graph().route(upper, lower).unwrap(), None);
        assert_eq!(layout.open_junctions(pos(0, 0)), Some(vec![Direction::Top]));
    }

    #[test]
    fn wire_ignores_mismatched_neighbour() {
        let mut layout = Layout::new();
        layout.place(pos(0, 0), Symbol::STRAIGHT).unwrap();
        // Horizontal straight below: no rail end facing up.
        layout.place(pos(0, 1), Symbol::STRAIGHT.rotated(2)).unwrap();
        let report = layout.wire().unwrap();
        assert_eq!(report.linked, 0);
        assert_eq!(report.dangling.len(), 4);
    }

    #[test]
    fn strict_wiring_fails_on_dangling() {
        let mut layout = Layout::with_config(LayoutConfig {
            strict_wiring: true,
            ..LayoutConfig::default()
        });
        layout.place(pos(0, 0), Symbol::END).unwrap();
        assert_eq!(
            layout.wire(),
            Err(LayoutError::Dangling(vec![(pos(0, 0), Direction::Top)]))
        );
    }

    #[test]
    fn remove_unlinks_and_frees_cell() {
        let mut layout = Layout::new();
        let lower = layout.place(pos(0, 1), Symbol::END).unwrap()[0];
        layout.place(pos(0, 0), symbol(&[Direction::Bottom])).unwrap();
        assert_eq!(layout.wire().unwrap().linked, 1);

        let removed = layout.remove(pos(0, 0)).unwrap();
        assert!(removed.symbol().is_end());
        assert!(!layout.is_occupied(pos(0, 0)));
        assert_eq!(layout.graph().junction(lower, Direction::Top), Ok(None));
        assert_eq!(layout.graph().node(lower).unwrap().neighbors().count(), 0);
        assert_eq!(layout.remove(pos(0, 0)), Err(LayoutError::NotPlaced(pos(0, 0))));
    }

    #[test]
    fn start_positions_have_no_upstream_end() {
        let mut layout = Layout::new();
        layout.place(pos(0, 0), Symbol::END.rotated(2)).unwrap();
        layout.place(pos(1, 0), Symbol::STRAIGHT.rotated(2)).unwrap();
        assert_eq!(layout.start_positions(), vec![pos(0, 0)]);
    }

    #[test]
    fn turn_only_counts_switches() {
        let mut layout = Layout::new();
        layout.place(pos(0, 0), Symbol::STRAIGHT).unwrap();
        let switch = layout.place(pos(1, 0), Symbol::LEFT_SWITCH).unwrap()[0];
        assert_eq!(layout.turn(pos(0, 0), SwitchStand::Bend1), Ok(0));
        assert_eq!(layout.turn(pos(1, 0), SwitchStand::Bend1), Ok(1));
        assert_eq!(
            layout.graph().node(switch).map(Node::stand),
            Some(SwitchStand::Bend1)
        );
    }

    #[test]
    fn trace_from_position() {
        let mut layout = Layout::new();
        layout.place(pos(0, 2), Symbol::END).unwrap();
        layout.place(pos(0, 1), Symbol::STRAIGHT).unwrap();
        layout.place(pos(0, 0), Symbol::STRAIGHT).unwrap();
        layout.wire().unwrap();

        let trace = layout.trace(pos(0, 1), Direction::Bottom, 10).unwrap();
        assert_eq!(trace.len(), 2);
        assert!(matches!(trace.end, TraceEnd::DeadEnd { .. }));

        assert_eq!(
            layout.trace(pos(0, 0), Direction::Top, 10),
            Err(LayoutError::Unwired {
                position: pos(0, 0),
                direction: Direction::Top
            })
        );
        assert_eq!(
            layout.trace(pos(0, 0), Direction::Left, 10),
            Err(LayoutError::NoJunction {
                position: pos(0, 0),
                direction: Direction::Left
            })
        );
    }
}
