use serde::{Deserialize, Serialize};

use crate::Point2D;

/// Snapshot of a single live track, as published to the points output
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackedPoint2D {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub health: i32,
}

impl TrackedPoint2D {
    pub fn new(id: usize, position: Point2D, health: i32) -> Self {
        TrackedPoint2D {
            id,
            x: position.0,
            y: position.1,
            health,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn position(&self) -> Point2D {
        (self.x, self.y)
    }
}
