use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn toggle(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Which side of a reference node something lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Before,
    After,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }

    pub fn position(self) -> Position {
        match self {
            Direction::Left | Direction::Up => Position::Before,
            Direction::Right | Direction::Down => Position::After,
        }
    }

    /// Sibling index one step from `index` among `len` siblings, if any.
    pub fn step(self, index: usize, len: usize) -> Option<usize> {
        match self.position() {
            Position::Before => index.checked_sub(1),
            Position::After => Some(index + 1).filter(|&i| i < len),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid direction: {0:?}")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(ParseDirectionError(s.to_owned())),
        }
    }
}

/// How a node lays out its children.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// Placeholder layout of the root and workspace levels.
    Root,
    #[default]
    HSplit,
    VSplit,
    Stacked,
    Tabbed,
    /// Laid out like [`LayoutKind::HSplit`].
    Preset,
}

impl LayoutKind {
    pub fn from_orientation(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => LayoutKind::HSplit,
            Orientation::Vertical => LayoutKind::VSplit,
        }
    }

    /// Axis along which navigation moves between children.
    pub fn orientation(self) -> Option<Orientation> {
        match self {
            LayoutKind::Root => None,
            LayoutKind::HSplit | LayoutKind::Tabbed | LayoutKind::Preset => {
                Some(Orientation::Horizontal)
            }
            LayoutKind::VSplit | LayoutKind::Stacked => Some(Orientation::Vertical),
        }
    }

    pub fn is_split(self) -> bool { matches!(self, LayoutKind::HSplit | LayoutKind::VSplit) }

    pub fn is_stacked(self) -> bool { self == LayoutKind::Stacked }

    pub fn is_group(self) -> bool { matches!(self, LayoutKind::Stacked | LayoutKind::Tabbed) }
}
