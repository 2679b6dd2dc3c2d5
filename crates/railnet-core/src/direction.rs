//! Compass directions around a track piece.
//!
//! A track piece sits in one grid cell and can have a rail end at each of
//! eight compass points. Each point is a single bit in a byte, laid out
//! clockwise starting at [`Direction::Top`]. Rotating a direction is a
//! circular shift of that byte, which is what makes symbol classification
//! independent of how a piece is drawn.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from constructing a [`Direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DirectionError {
    #[error("invalid direction value: {0:#04x}")]
    InvalidDirection(u8),
}

// ---------------------------------------------------------------------------
// Bit rotation
// ---------------------------------------------------------------------------

/// Rotate an 8-bit ring of junction flags clockwise by `steps` positions.
///
/// The shift happens in 16 bits and is masked back down so the wraparound
/// never depends on integer overflow behaviour.
fn rotate_bits_forward(bits: u8, steps: u32) -> u8 {
    let n = steps % 8;
    if n == 0 {
        return bits;
    }
    let wide = u16::from(bits);
    (((wide << n) | (wide >> (8 - n))) & 0xFF) as u8
}

/// Rotate an 8-bit ring of junction flags counter-clockwise.
fn rotate_bits_backward(bits: u8, steps: u32) -> u8 {
    rotate_bits_forward(bits, 8 - steps % 8)
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// One of the eight compass points of a track piece, or [`Direction::Unset`].
///
/// Every value other than `Unset` holds exactly one bit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Direction {
    #[default]
    Unset = 0,
    Top = 1,
    TopRight = 2,
    Right = 4,
    BottomRight = 8,
    Bottom = 16,
    BottomLeft = 32,
    Left = 64,
    TopLeft = 128,
}

/// How an outbound direction relates to the straight continuation of an
/// inbound one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bend {
    /// Farther than one compass step from straight; not buildable as one piece.
    Invalid,
    Straight,
    LeftBend,
    RightBend,
}

impl Direction {
    /// The eight set directions, clockwise from `Top`.
    pub const ALL: [Direction; 8] = [
        Direction::Top,
        Direction::TopRight,
        Direction::Right,
        Direction::BottomRight,
        Direction::Bottom,
        Direction::BottomLeft,
        Direction::Left,
        Direction::TopLeft,
    ];

    /// The raw single-bit value.
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Map a raw value that is known to be legal. Only called on results of
    /// rotating a legal value, which stay legal.
    fn from_bits_unchecked(bits: u8) -> Direction {
        Direction::try_from(bits).unwrap_or(Direction::Unset)
    }

    /// Rotate clockwise by `steps` compass points (taken modulo 8).
    pub fn rotate_forward(self, steps: u32) -> Direction {
        Self::from_bits_unchecked(rotate_bits_forward(self.bits(), steps))
    }

    /// Rotate counter-clockwise by `steps` compass points (taken modulo 8).
    pub fn rotate_backward(self, steps: u32) -> Direction {
        Self::from_bits_unchecked(rotate_bits_backward(self.bits(), steps))
    }

    /// The geometrically opposite point (a half turn). `Unset` stays `Unset`.
    pub fn complement(self) -> Direction {
        self.rotate_forward(4)
    }

    /// Classify an exit direction relative to `self` as the entry direction.
    ///
    /// A train entering at `self` continues straight towards the complement;
    /// a joint may deviate by at most one compass step either way.
    pub fn classify_bend(self, outbound: Direction) -> Bend {
        if self == Direction::Unset || outbound == Direction::Unset {
            return Bend::Invalid;
        }
        let straight = self.complement();
        if outbound == straight {
            Bend::Straight
        } else if outbound == straight.rotate_forward(1) {
            Bend::RightBend
        } else if outbound == straight.rotate_backward(1) {
            Bend::LeftBend
        } else {
            Bend::Invalid
        }
    }

    /// Unit grid step towards this direction. `y` grows downwards.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Unset => (0, 0),
            Direction::Top => (0, -1),
            Direction::TopRight => (1, -1),
            Direction::Right => (1, 0),
            Direction::BottomRight => (1, 1),
            Direction::Bottom => (0, 1),
            Direction::BottomLeft => (-1, 1),
            Direction::Left => (-1, 0),
            Direction::TopLeft => (-1, -1),
        }
    }

    /// The canonical diagnostic name.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Unset => "UNSET",
            Direction::Top => "TOP",
            Direction::TopRight => "TOP_RIGHT",
            Direction::Right => "RIGHT",
            Direction::BottomRight => "BOTTOM_RIGHT",
            Direction::Bottom => "BOTTOM",
            Direction::BottomLeft => "BOTTOM_LEFT",
            Direction::Left => "LEFT",
            Direction::TopLeft => "TOP_LEFT",
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = DirectionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::Unset),
            1 => Ok(Direction::Top),
            2 => Ok(Direction::TopRight),
            4 => Ok(Direction::Right),
            8 => Ok(Direction::BottomRight),
            16 => Ok(Direction::Bottom),
            32 => Ok(Direction::BottomLeft),
            64 => Ok(Direction::Left),
            128 => Ok(Direction::TopLeft),
            other => Err(DirectionError::InvalidDirection(other)),
        }
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> u8 {
        direction.bits()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// DirectionSet
// ---------------------------------------------------------------------------

bitflags! {
    /// A set of compass points, using the same bits as [`Direction`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DirectionSet: u8 {
        const TOP          = 1 << 0;
        const TOP_RIGHT    = 1 << 1;
        const RIGHT        = 1 << 2;
        const BOTTOM_RIGHT = 1 << 3;
        const BOTTOM       = 1 << 4;
        const BOTTOM_LEFT  = 1 << 5;
        const LEFT         = 1 << 6;
        const TOP_LEFT     = 1 << 7;
    }
}

impl DirectionSet {
    /// The single-element set for a direction. `Unset` gives the empty set.
    pub fn from_direction(direction: Direction) -> Self {
        Self::from_bits_retain(direction.bits())
    }

    /// Whether `direction` is in the set. `Unset` is never contained.
    pub fn contains_direction(self, direction: Direction) -> bool {
        direction != Direction::Unset && self.bits() & direction.bits() != 0
    }

    /// Rotate every member clockwise by `steps` compass points.
    pub fn rotate_forward(self, steps: u32) -> Self {
        Self::from_bits_retain(rotate_bits_forward(self.bits(), steps))
    }

    /// Rotate every member counter-clockwise by `steps` compass points.
    pub fn rotate_backward(self, steps: u32) -> Self {
        Self::from_bits_retain(rotate_bits_backward(self.bits(), steps))
    }

    /// Members in clockwise order starting at `Top`.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |d| self.contains_direction(*d))
    }
}

impl From<Direction> for DirectionSet {
    fn from(direction: Direction) -> Self {
        Self::from_direction(direction)
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        iter.into_iter()
            .fold(DirectionSet::empty(), |set, d| set | DirectionSet::from(d))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
