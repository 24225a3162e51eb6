//! Integer pixel geometry shared by the engine and the host.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self { Point { x, y } }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn center(&self) -> Point { Point::new(self.x + self.width / 2, self.y + self.height / 2) }

    /// Offset of `point` relative to this rect's origin.
    pub fn relative(&self, point: Point) -> Point { Point::new(point.x - self.x, point.y - self.y) }

    /// Translates a relative offset back into this rect, clamped to its bounds.
    pub fn absolute_clamped(&self, offset: Point) -> Point {
        Point::new(
            self.x + offset.x.clamp(0, self.width.max(0)),
            self.y + offset.y.clamp(0, self.height.max(0)),
        )
    }
}
