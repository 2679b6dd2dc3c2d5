//! Track nodes and their state-dependent routing.
//!
//! A [`Node`] is one vertex of the track graph. Its [`NodeKind`] fixes how
//! many named [`Port`]s it has, which compass directions each port serves,
//! and the routing table that decides, for the current [`SwitchStand`],
//! where a train arriving through one port leaves.
//!
//! Ports hold [`NodeId`] handles into the owning arena rather than
//! references, so neighbours can point at each other freely.
//!
//! # Routing
//!
//! Arriving through a port that is not on the active path is not an error:
//! the route query answers `Ok(None)` and the caller treats it as a dead end.
//! Only asking about a neighbour that is not wired to any port fails.

use crate::direction::Direction;
use crate::id::{NodeId, TrackId};
use crate::stand::SwitchStand;
use crate::symbol::Shape;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from port wiring and routing queries on a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("{kind} has no port at {direction}")]
    InvalidDirection {
        kind: &'static str,
        direction: Direction,
    },
    #[error("{kind} has no port {port:?}")]
    InvalidPort { kind: &'static str, port: Port },
    #[error("node {0:?} is not wired to any port")]
    InvalidNeighbor(NodeId),
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// A named attachment point of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Port {
    /// Block entry side.
    In,
    /// Block exit side.
    Out,
    OutStraight,
    OutBend,
    OutBendLeft,
    OutBendRight,
    OutTop,
    OutRight,
    InBottom,
    InLeft,
}

/// Which side the diverging track of a simple switch leaves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

/// The capability every node variant provides: port lookup by direction,
/// port storage, and the routing table.
pub trait Junctions {
    /// Ports of this variant, in storage order.
    fn ports(&self) -> &'static [Port];

    fn slots(&self) -> &[Option<NodeId>];

    fn slots_mut(&mut self) -> &mut [Option<NodeId>];

    /// The port serving a compass direction, if this variant has one there.
    fn port_at(&self, direction: Direction) -> Option<Port>;

    /// Where a train arriving through `from` leaves, for the given stand.
    /// `None` means `from` is not on the active path.
    fn route(&self, from: Port, stand: SwitchStand) -> Option<Port>;

    fn slot(&self, port: Port) -> Option<&Option<NodeId>> {
        let index = self.ports().iter().position(|p| *p == port)?;
        self.slots().get(index)
    }

    fn slot_mut(&mut self, port: Port) -> Option<&mut Option<NodeId>> {
        let index = self.ports().iter().position(|p| *p == port)?;
        self.slots_mut().get_mut(index)
    }

    /// The first port wired to `neighbor`.
    fn port_of(&self, neighbor: NodeId) -> Option<Port> {
        self.ports()
            .iter()
            .zip(self.slots())
            .find(|(_, slot)| **slot == Some(neighbor))
            .map(|(port, _)| *port)
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// Plain track: straight, bend or buffer stop. Routing ignores the stand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPorts {
    slots: [Option<NodeId>; 2],
}

impl Junctions for BlockPorts {
    fn ports(&self) -> &'static [Port] {
        &[Port::In, Port::Out]
    }

    fn slots(&self) -> &[Option<NodeId>] {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut [Option<NodeId>] {
        &mut self.slots
    }

    fn port_at(&self, direction: Direction) -> Option<Port> {
        match direction {
            Direction::Bottom | Direction::BottomLeft | Direction::Left | Direction::TopLeft => {
                Some(Port::In)
            }
            Direction::Top | Direction::TopRight | Direction::Right | Direction::BottomRight => {
                Some(Port::Out)
            }
            Direction::Unset => None,
        }
    }

    fn route(&self, from: Port, _stand: SwitchStand) -> Option<Port> {
        match from {
            Port::In => Some(Port::Out),
            Port::Out => Some(Port::In),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Simple switch
// ---------------------------------------------------------------------------

/// Two-way points: in at the bottom, straight out at the top, the bend on
/// the left or right diagonal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleSwitchPorts {
    hand: Hand,
    slots: [Option<NodeId>; 3],
}

impl SimpleSwitchPorts {
    pub fn new(hand: Hand) -> Self {
        Self {
            hand,
            slots: [None; 3],
        }
    }

    pub fn hand(&self) -> Hand {
        self.hand
    }
}

impl Junctions for SimpleSwitchPorts {
    fn ports(&self) -> &'static [Port] {
        &[Port::In, Port::OutStraight, Port::OutBend]
    }

    fn slots(&self) -> &[Option<NodeId>] {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut [Option<NodeId>] {
        &mut self.slots
    }

    fn port_at(&self, direction: Direction) -> Option<Port> {
        match (direction, self.hand) {
            (Direction::Bottom, _) => Some(Port::In),
            (Direction::Top, _) => Some(Port::OutStraight),
            (Direction::TopLeft, Hand::Left) | (Direction::TopRight, Hand::Right) => {
                Some(Port::OutBend)
            }
            _ => None,
        }
    }

    fn route(&self, from: Port, stand: SwitchStand) -> Option<Port> {
        match from {
            Port::In if stand.is_straight() => Some(Port::OutStraight),
            Port::In => Some(Port::OutBend),
            Port::OutStraight => stand.is_straight().then_some(Port::In),
            Port::OutBend => stand.is_bend().then_some(Port::In),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Three-way switch
// ---------------------------------------------------------------------------

/// Points with a straight track and bends to both diagonals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreeWayPorts {
    slots: [Option<NodeId>; 4],
}

impl Junctions for ThreeWayPorts {
    fn ports(&self) -> &'static [Port] {
        &[
            Port::In,
            Port::OutStraight,
            Port::OutBendLeft,
            Port::OutBendRight,
        ]
    }

    fn slots(&self) -> &[Option<NodeId>] {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut [Option<NodeId>] {
        &mut self.slots
    }

    fn port_at(&self, direction: Direction) -> Option<Port> {
        match direction {
            Direction::Bottom => Some(Port::In),
            Direction::Top => Some(Port::OutStraight),
            Direction::TopLeft => Some(Port::OutBendLeft),
            Direction::TopRight => Some(Port::OutBendRight),
            _ => None,
        }
    }

    fn route(&self, from: Port, stand: SwitchStand) -> Option<Port> {
        match from {
            Port::In => Some(match stand {
                SwitchStand::Bend2 => Port::OutBendLeft,
                SwitchStand::Bend1 => Port::OutBendRight,
                SwitchStand::Straight1 | SwitchStand::Straight2 => Port::OutStraight,
            }),
            Port::OutBendLeft => (stand == SwitchStand::Bend2).then_some(Port::In),
            Port::OutBendRight => (stand == SwitchStand::Bend1).then_some(Port::In),
            Port::OutStraight => stand.is_straight().then_some(Port::In),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Crossover switch
// ---------------------------------------------------------------------------

/// Double slip: two inputs and two outputs, exactly one pair connected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossOverPorts {
    slots: [Option<NodeId>; 4],
}

impl CrossOverPorts {
    /// The (input, output) pair the stand connects.
    pub fn active_pair(stand: SwitchStand) -> (Port, Port) {
        let active_in = if stand.is_bend() {
            Port::OutTop
        } else {
            Port::OutRight
        };
        let active_out = match stand {
            SwitchStand::Bend1 | SwitchStand::Straight1 => Port::InBottom,
            SwitchStand::Bend2 | SwitchStand::Straight2 => Port::InLeft,
        };
        (active_in, active_out)
    }
}

impl Junctions for CrossOverPorts {
    fn ports(&self) -> &'static [Port] {
        &[Port::OutTop, Port::OutRight, Port::InBottom, Port::InLeft]
    }

    fn slots(&self) -> &[Option<NodeId>] {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut [Option<NodeId>] {
        &mut self.slots
    }

    fn port_at(&self, direction: Direction) -> Option<Port> {
        match direction {
            Direction::Top => Some(Port::OutTop),
            Direction::TopRight | Direction::Right => Some(Port::OutRight),
            Direction::Bottom => Some(Port::InBottom),
            Direction::BottomLeft | Direction::Left => Some(Port::InLeft),
            _ => None,
        }
    }

    fn route(&self, from: Port, stand: SwitchStand) -> Option<Port> {
        let (active_in, active_out) = Self::active_pair(stand);
        if from == active_in {
            Some(active_out)
        } else if from == active_out {
            Some(active_in)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// The closed set of node variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Block(BlockPorts),
    SimpleSwitch(SimpleSwitchPorts),
    ThreeWaySwitch(ThreeWayPorts),
    CrossOverSwitch(CrossOverPorts),
}

impl NodeKind {
    pub fn block() -> Self {
        NodeKind::Block(BlockPorts::default())
    }

    pub fn simple_switch(hand: Hand) -> Self {
        NodeKind::SimpleSwitch(SimpleSwitchPorts::new(hand))
    }

    pub fn three_way_switch() -> Self {
        NodeKind::ThreeWaySwitch(ThreeWayPorts::default())
    }

    pub fn cross_over_switch() -> Self {
        NodeKind::CrossOverSwitch(CrossOverPorts::default())
    }

    /// The variant modelling a catalog shape. A plain crossover has no
    /// single-node model (it is two independent blocks).
    pub fn for_shape(shape: Shape) -> Option<Self> {
        match shape {
            Shape::End | Shape::Straight | Shape::Bend => Some(Self::block()),
            Shape::LeftSwitch => Some(Self::simple_switch(Hand::Left)),
            Shape::RightSwitch => Some(Self::simple_switch(Hand::Right)),
            Shape::ThreeWaySwitch => Some(Self::three_way_switch()),
            Shape::CrossOverSwitch => Some(Self::cross_over_switch()),
            Shape::CrossOver => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Block(_) => "block",
            NodeKind::SimpleSwitch(_) => "simple switch",
            NodeKind::ThreeWaySwitch(_) => "three-way switch",
            NodeKind::CrossOverSwitch(_) => "crossover switch",
        }
    }

    pub fn is_switch(&self) -> bool {
        !matches!(self, NodeKind::Block(_))
    }

    pub fn junctions(&self) -> &dyn Junctions {
        match self {
            NodeKind::Block(ports) => ports,
            NodeKind::SimpleSwitch(ports) => ports,
            NodeKind::ThreeWaySwitch(ports) => ports,
            NodeKind::CrossOverSwitch(ports) => ports,
        }
    }

    pub fn junctions_mut(&mut self) -> &mut dyn Junctions {
        match self {
            NodeKind::Block(ports) => ports,
            NodeKind::SimpleSwitch(ports) => ports,
            NodeKind::ThreeWaySwitch(ports) => ports,
            NodeKind::CrossOverSwitch(ports) => ports,
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A vertex of the track graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    id: TrackId,
    stand: SwitchStand,
    kind: NodeKind,
}

impl Node {
    pub fn new(id: TrackId, kind: NodeKind) -> Self {
        Self::with_stand(id, kind, SwitchStand::default())
    }

    pub fn with_stand(id: TrackId, kind: NodeKind, stand: SwitchStand) -> Self {
        Self { id, stand, kind }
    }

    pub fn block(id: TrackId) -> Self {
        Self::new(id, NodeKind::block())
    }

    pub fn simple_switch(id: TrackId, hand: Hand, stand: SwitchStand) -> Self {
        Self::with_stand(id, NodeKind::simple_switch(hand), stand)
    }

    pub fn three_way_switch(id: TrackId, stand: SwitchStand) -> Self {
        Self::with_stand(id, NodeKind::three_way_switch(), stand)
    }

    pub fn cross_over_switch(id: TrackId, stand: SwitchStand) -> Self {
        Self::with_stand(id, NodeKind::cross_over_switch(), stand)
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn stand(&self) -> SwitchStand {
        self.stand
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Set the switch stand. Accepted on every variant.
    pub fn turn(&mut self, stand: SwitchStand) {
        if stand != self.stand {
            log::debug!(
                "{} {}: {:?} -> {:?}",
                self.kind.name(),
                self.id,
                self.stand,
                stand
            );
        }
        self.stand = stand;
    }

    // -- Wiring --

    /// The port serving `direction`.
    pub fn port_at(&self, direction: Direction) -> Result<Port, NodeError> {
        self.kind
            .junctions()
            .port_at(direction)
            .ok_or(NodeError::InvalidDirection {
                kind: self.kind.name(),
                direction,
            })
    }

    /// Bind (or clear) the neighbour on the port serving `direction`.
    pub fn set_junction(
        &mut self,
        direction: Direction,
        neighbor: Option<NodeId>,
    ) -> Result<(), NodeError> {
        let port = self.port_at(direction)?;
        self.set_port(port, neighbor)
    }

    /// Neighbour on the port serving `direction`. Independent of the stand.
    pub fn junction(&self, direction: Direction) -> Result<Option<NodeId>, NodeError> {
        let port = self.port_at(direction)?;
        self.port(port)
    }

    /// Bind (or clear) the neighbour on a named port.
    pub fn set_port(&mut self, port: Port, neighbor: Option<NodeId>) -> Result<(), NodeError> {
        let kind = self.kind.name();
        let slot = self
            .kind
            .junctions_mut()
            .slot_mut(port)
            .ok_or(NodeError::InvalidPort { kind, port })?;
        *slot = neighbor;
        Ok(())
    }

    /// Neighbour on a named port.
    pub fn port(&self, port: Port) -> Result<Option<NodeId>, NodeError> {
        self.kind
            .junctions()
            .slot(port)
            .copied()
            .ok_or(NodeError::InvalidPort {
                kind: self.kind.name(),
                port,
            })
    }

    /// The port `neighbor` is wired to, if any.
    pub fn port_of(&self, neighbor: NodeId) -> Option<Port> {
        self.kind.junctions().port_of(neighbor)
    }

    /// Every wired port with its neighbour.
    pub fn neighbors(&self) -> impl Iterator<Item = (Port, NodeId)> + '_ {
        let junctions = self.kind.junctions();
        junctions
            .ports()
            .iter()
            .zip(junctions.slots())
            .filter_map(|(port, slot)| slot.map(|neighbor| (*port, neighbor)))
    }

    /// Clear every port pointing at `neighbor`. Returns how many were cleared.
    pub fn unlink(&mut self, neighbor: NodeId) -> usize {
        let mut cleared = 0;
        for slot in self.kind.junctions_mut().slots_mut() {
            if *slot == Some(neighbor) {
                *slot = None;
                cleared += 1;
            }
        }
        cleared
    }

    // -- Routing --

    /// The outgoing port for a train arriving from `from`, under the current
    /// stand. `Ok(None)` means the arrival port is not on the active path.
    pub fn route_port(&self, from: NodeId) -> Result<Option<Port>, NodeError> {
        let junctions = self.kind.junctions();
        let arrival = junctions
            .port_of(from)
            .ok_or(NodeError::InvalidNeighbor(from))?;
        let departure = junctions.route(arrival, self.stand);
        log::trace!(
            "{} {} at {:?}: {:?} -> {:?}",
            self.kind.name(),
            self.id,
            self.stand,
            arrival,
            departure
        );
        Ok(departure)
    }

    /// The neighbour a train arriving from `from` continues to.
    ///
    /// `Ok(None)` when the route is currently blocked or the outgoing port
    /// is not wired.
    pub fn route(&self, from: NodeId) -> Result<Option<NodeId>, NodeError> {
        Ok(match self.route_port(from)? {
            Some(port) => self.port(port)?,
            None => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
