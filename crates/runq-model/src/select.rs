use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("unrecognized position '{0}', expected 'front', 'back' or an integer")]
pub struct PositionParseError(String);

/// A position within the queue.
///
/// Integer indices are zero-based from the front; negative indices count
/// from the back (`-1` is the back element). The external encoding stays
/// string-based (`"front"`, `"back"` or an integer literal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Front,
    Back,
    Index(i64),
}

impl Position {
    /// Resolve to an absolute index for a queue of `len` items.
    ///
    /// The result may still fall outside `0..len` for out-of-range indices;
    /// range checks belong to the caller.
    pub fn resolved(&self, len: usize) -> i64 {
        let len = len as i64;
        match self {
            Position::Front => 0,
            Position::Back => len - 1,
            Position::Index(i) if *i < 0 => len + i,
            Position::Index(i) => *i,
        }
    }
}

impl From<i64> for Position {
    fn from(index: i64) -> Self {
        Position::Index(index)
    }
}

impl FromStr for Position {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(Position::Front),
            "back" => Ok(Position::Back),
            other => other
                .parse::<i64>()
                .map(Position::Index)
                .map_err(|_| PositionParseError(other.to_string())),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Front => f.write_str("front"),
            Position::Back => f.write_str("back"),
            Position::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Selects an existing item, either by queue position or by UID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Select {
    Pos(Position),
    Uid(String),
}

impl Select {
    pub fn uid(uid: impl Into<String>) -> Self {
        Select::Uid(uid.into())
    }
}

impl Default for Select {
    fn default() -> Self {
        Select::Pos(Position::Back)
    }
}

impl From<Position> for Select {
    fn from(pos: Position) -> Self {
        Select::Pos(pos)
    }
}

/// Placement target for insertion or reordering.
///
/// Exactly one placement mode exists per value, so the ambiguous parameter
/// combinations of a loosely typed API (position plus UID, before plus
/// after) cannot be expressed at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Place {
    Pos(Position),
    /// Insert immediately before the item with this UID.
    Before(String),
    /// Insert immediately after the item with this UID.
    After(String),
}

impl Place {
    pub fn before(uid: impl Into<String>) -> Self {
        Place::Before(uid.into())
    }

    pub fn after(uid: impl Into<String>) -> Self {
        Place::After(uid.into())
    }
}

impl Default for Place {
    fn default() -> Self {
        Place::Pos(Position::Back)
    }
}

impl From<Position> for Place {
    fn from(pos: Position) -> Self {
        Place::Pos(pos)
    }
}
