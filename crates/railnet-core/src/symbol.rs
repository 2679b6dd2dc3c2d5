//! Rotation-invariant classification of track-piece connectivity.
//!
//! A [`Symbol`] records which of a piece's eight compass slots carry a rail
//! end (`fixed`) and which of those are still unconsumed during a layout
//! pass (`open`). Classification compares `fixed` against every rotation of
//! each catalog [`Shape`], so a piece is recognised no matter which way it is
//! drawn.
//!
//! # Catalog
//!
//! | Shape | Unrotated pattern | Rotations tried |
//! |---|---|---|
//! | [`Shape::End`] | TOP | 8 |
//! | [`Shape::Straight`] | TOP, BOTTOM | 4 |
//! | [`Shape::Bend`] | TOP, BOTTOM_RIGHT | 8 |
//! | [`Shape::CrossOver`] | TOP, RIGHT, BOTTOM, LEFT | 2 |
//! | [`Shape::LeftSwitch`] | TOP, BOTTOM, TOP_LEFT | 8 |
//! | [`Shape::RightSwitch`] | TOP, BOTTOM, TOP_RIGHT | 8 |
//! | [`Shape::ThreeWaySwitch`] | TOP, BOTTOM, TOP_LEFT, TOP_RIGHT | 8 |
//! | [`Shape::CrossOverSwitch`] | TOP, BOTTOM, TOP_RIGHT, BOTTOM_LEFT | 4 |

use crate::direction::{Direction, DirectionSet};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from symbol construction and open-junction bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("pattern {0:#010b} matches no known track shape")]
    InvalidSymbol(u8),
    #[error("no rotation maps {from:#010b} onto {to:#010b}")]
    NoMatch { from: u8, to: u8 },
    #[error("junction {0} is not open")]
    JunctionNotSet(Direction),
}

// ---------------------------------------------------------------------------
// Shape catalog
// ---------------------------------------------------------------------------

/// A canonical track-piece shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// Buffer stop.
    End,
    Straight,
    Bend,
    /// Two straights crossing without a switch.
    CrossOver,
    LeftSwitch,
    RightSwitch,
    ThreeWaySwitch,
    CrossOverSwitch,
}

impl Shape {
    /// Every catalog entry.
    pub const ALL: [Shape; 8] = [
        Shape::End,
        Shape::Straight,
        Shape::Bend,
        Shape::CrossOver,
        Shape::LeftSwitch,
        Shape::RightSwitch,
        Shape::ThreeWaySwitch,
        Shape::CrossOverSwitch,
    ];

    /// The unrotated junction pattern.
    pub const fn pattern(self) -> DirectionSet {
        match self {
            Shape::End => DirectionSet::TOP,
            Shape::Straight => DirectionSet::TOP.union(DirectionSet::BOTTOM),
            Shape::Bend => DirectionSet::TOP.union(DirectionSet::BOTTOM_RIGHT),
            Shape::CrossOver => DirectionSet::TOP
                .union(DirectionSet::RIGHT)
                .union(DirectionSet::BOTTOM)
                .union(DirectionSet::LEFT),
            Shape::LeftSwitch => DirectionSet::TOP
                .union(DirectionSet::BOTTOM)
                .union(DirectionSet::TOP_LEFT),
            Shape::RightSwitch => DirectionSet::TOP
                .union(DirectionSet::BOTTOM)
                .union(DirectionSet::TOP_RIGHT),
            Shape::ThreeWaySwitch => DirectionSet::TOP
                .union(DirectionSet::BOTTOM)
                .union(DirectionSet::TOP_LEFT)
                .union(DirectionSet::TOP_RIGHT),
            Shape::CrossOverSwitch => DirectionSet::TOP
                .union(DirectionSet::BOTTOM)
                .union(DirectionSet::TOP_RIGHT)
                .union(DirectionSet::BOTTOM_LEFT),
        }
    }

    /// How many forward rotations are distinct for this shape.
    pub const fn rotation_period(self) -> u32 {
        match self {
            Shape::CrossOver => 2,
            Shape::Straight | Shape::CrossOverSwitch => 4,
            Shape::End
            | Shape::Bend
            | Shape::LeftSwitch
            | Shape::RightSwitch
            | Shape::ThreeWaySwitch => 8,
        }
    }

    /// Whether `mask` equals some rotation of this shape's pattern.
    pub fn matches(self, mask: DirectionSet) -> bool {
        let pattern = self.pattern();
        (0..self.rotation_period()).any(|steps| pattern.rotate_forward(steps) == mask)
    }

    pub fn is_switch(self) -> bool {
        matches!(
            self,
            Shape::LeftSwitch | Shape::RightSwitch | Shape::ThreeWaySwitch | Shape::CrossOverSwitch
        )
    }
}

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// Fixed connectivity of a track piece plus its still-open junctions.
///
/// `open` is always a subset of `fixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Symbol {
    fixed: DirectionSet,
    open: DirectionSet,
}

impl Symbol {
    pub const EMPTY: Symbol = Symbol::canonical(DirectionSet::empty());
    pub const END: Symbol = Symbol::canonical(Shape::End.pattern());
    pub const STRAIGHT: Symbol = Symbol::canonical(Shape::Straight.pattern());
    pub const BEND: Symbol = Symbol::canonical(Shape::Bend.pattern());
    pub const CROSS_OVER: Symbol = Symbol::canonical(Shape::CrossOver.pattern());
    pub const LEFT_SWITCH: Symbol = Symbol::canonical(Shape::LeftSwitch.pattern());
    pub const RIGHT_SWITCH: Symbol = Symbol::canonical(Shape::RightSwitch.pattern());
    pub const THREE_WAY_SWITCH: Symbol = Symbol::canonical(Shape::ThreeWaySwitch.pattern());
    pub const CROSS_OVER_SWITCH: Symbol = Symbol::canonical(Shape::CrossOverSwitch.pattern());

    /// Build a catalog symbol without validation.
    const fn canonical(fixed: DirectionSet) -> Symbol {
        Symbol { fixed, open: fixed }
    }

    /// Create a symbol from a junction mask.
    ///
    /// The empty mask is accepted (a cell with no track); any other mask must
    /// be a rotation of a catalog shape.
    pub fn new(fixed: DirectionSet) -> Result<Symbol, SymbolError> {
        let symbol = Symbol::canonical(fixed);
        if symbol.is_symbol() && !symbol.is_valid_symbol() {
            return Err(SymbolError::InvalidSymbol(fixed.bits()));
        }
        Ok(symbol)
    }

    /// The canonical symbol for a shape.
    pub fn of_shape(shape: Shape) -> Symbol {
        Symbol::canonical(shape.pattern())
    }

    /// The permanent junction pattern.
    pub fn fixed(&self) -> DirectionSet {
        self.fixed
    }

    /// Junctions not yet consumed in the current pass.
    pub fn open(&self) -> DirectionSet {
        self.open
    }

    pub fn junction_count(&self) -> u32 {
        self.fixed.bits().count_ones()
    }

    pub fn open_junction_count(&self) -> u32 {
        self.open.bits().count_ones()
    }

    pub fn is_junction_set(&self, direction: Direction) -> bool {
        self.fixed.contains_direction(direction)
    }

    pub fn is_open_junction_set(&self, direction: Direction) -> bool {
        self.open.contains_direction(direction)
    }

    /// Whether every direction in `junctions` is part of the piece.
    pub fn are_junctions_set(&self, junctions: DirectionSet) -> bool {
        self.fixed.contains(junctions)
    }

    /// Whether every direction in `junctions` is still open.
    pub fn are_open_junctions_set(&self, junctions: DirectionSet) -> bool {
        self.open.contains(junctions)
    }

    /// A copy with both masks rotated clockwise by `steps`.
    pub fn rotated(&self, steps: u32) -> Symbol {
        Symbol {
            fixed: self.fixed.rotate_forward(steps),
            open: self.open.rotate_forward(steps),
        }
    }

    /// A copy with both masks rotated counter-clockwise by `steps`.
    pub fn rotated_backward(&self, steps: u32) -> Symbol {
        Symbol {
            fixed: self.fixed.rotate_backward(steps),
            open: self.open.rotate_backward(steps),
        }
    }

    // -- Classification --

    /// Whether `fixed` is a rotation of `shape`.
    pub fn classify(&self, shape: Shape) -> bool {
        shape.matches(self.fixed)
    }

    /// The catalog shape this symbol belongs to, if any.
    pub fn shape(&self) -> Option<Shape> {
        Shape::ALL.into_iter().find(|shape| self.classify(*shape))
    }

    /// Whether any junction is set at all.
    pub fn is_symbol(&self) -> bool {
        !self.fixed.is_empty()
    }

    pub fn is_end(&self) -> bool {
        self.classify(Shape::End)
    }

    pub fn is_straight(&self) -> bool {
        self.classify(Shape::Straight)
    }

    pub fn is_cross_over(&self) -> bool {
        self.classify(Shape::CrossOver)
    }

    pub fn is_bend(&self) -> bool {
        self.classify(Shape::Bend)
    }

    /// Plain track: straight, crossover, bend or buffer stop.
    pub fn is_track(&self) -> bool {
        self.is_straight() || self.is_cross_over() || self.is_bend() || self.is_end()
    }

    pub fn is_cross_over_switch(&self) -> bool {
        self.classify(Shape::CrossOverSwitch)
    }

    pub fn is_left_switch(&self) -> bool {
        self.classify(Shape::LeftSwitch)
    }

    pub fn is_right_switch(&self) -> bool {
        self.classify(Shape::RightSwitch)
    }

    pub fn is_simple_switch(&self) -> bool {
        self.is_left_switch() || self.is_right_switch()
    }

    pub fn is_three_way_switch(&self) -> bool {
        self.classify(Shape::ThreeWaySwitch)
    }

    pub fn is_switch(&self) -> bool {
        self.is_cross_over_switch() || self.is_simple_switch() || self.is_three_way_switch()
    }

    pub fn is_valid_symbol(&self) -> bool {
        self.is_track() || self.is_switch()
    }

    /// True when the piece has no junction on its upstream side
    /// (LEFT, TOP_LEFT, TOP, TOP_RIGHT). Layout traversal is seeded here.
    pub fn is_start_symbol(&self) -> bool {
        let upstream = DirectionSet::LEFT
            | DirectionSet::TOP_LEFT
            | DirectionSet::TOP
            | DirectionSet::TOP_RIGHT;
        !self.fixed.intersects(upstream)
    }

    /// Smallest clockwise rotation (0..=7) that turns this symbol's pattern
    /// into `other`'s.
    pub fn distance_to(&self, other: &Symbol) -> Result<u32, SymbolError> {
        (0..8)
            .find(|steps| self.fixed.rotate_forward(*steps) == other.fixed)
            .ok_or(SymbolError::NoMatch {
                from: self.fixed.bits(),
                to: other.fixed.bits(),
            })
    }

    // -- Open-junction bookkeeping --

    /// First junction of the piece scanning clockwise from `start`
    /// (inclusive), whether open or not.
    pub fn next_junction(&self, start: Direction) -> Direction {
        first_clockwise(self.fixed, start)
    }

    /// First open junction found scanning clockwise from `start` (inclusive).
    ///
    /// `Unset` as start scans from `Top`. Returns `Unset` when nothing is open.
    pub fn next_open_junction(&self, start: Direction) -> Direction {
        first_clockwise(self.open, start)
    }

    /// Mark an open junction as consumed.
    pub fn remove_junction(&mut self, direction: Direction) -> Result<(), SymbolError> {
        if !self.open.contains_direction(direction) {
            return Err(SymbolError::JunctionNotSet(direction));
        }
        self.open.remove(DirectionSet::from(direction));
        Ok(())
    }

    /// Re-open every junction.
    pub fn reset(&mut self) {
        self.open = self.fixed;
    }

    pub fn has_open_junctions_left(&self) -> bool {
        !self.open.is_empty()
    }
}

fn first_clockwise(mask: DirectionSet, start: Direction) -> Direction {
    let start = if start == Direction::Unset {
        Direction::Top
    } else {
        start
    };
    (0..8)
        .map(|steps| start.rotate_forward(steps))
        .find(|d| mask.contains_direction(*d))
        .unwrap_or(Direction::Unset)
}

impl TryFrom<u8> for Symbol {
    type Error = SymbolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Symbol::new(DirectionSet::from_bits_retain(value))
    }
}

/// Serialises the fixed pattern only; a deserialised symbol starts fully open.
impl From<Symbol> for u8 {
    fn from(symbol: Symbol) -> Self {
        symbol.fixed.bits()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
