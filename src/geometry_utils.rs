use crate::Point2D;

pub fn distance_points(a: &Point2D, b: &Point2D) -> f32 {
    let (x1, y1) = *a;
    let (x2, y2) = *b;

    f32::sqrt(f32::powi(x1 - x2, 2) + f32::powi(y1 - y2, 2))
}

pub fn is_finite_point(p: &Point2D) -> bool {
    p.0.is_finite() && p.1.is_finite()
}

/// Pixel-space bounding box of a region, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds2D {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl Bounds2D {
    pub fn at(x: u32, y: u32) -> Self {
        Bounds2D {
            x_min: x,
            y_min: y,
            x_max: x,
            y_max: y,
        }
    }

    pub fn include(&mut self, x: u32, y: u32) {
        self.x_min = self.x_min.min(x);
        self.y_min = self.y_min.min(y);
        self.x_max = self.x_max.max(x);
        self.y_max = self.y_max.max(y);
    }

    pub fn width(&self) -> u32 {
        self.x_max - self.x_min + 1
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min + 1
    }

    /// Centre of the box, using integer halving of width and height
    pub fn centre(&self) -> Point2D {
        (
            (self.x_min + self.width() / 2) as f32,
            (self.y_min + self.height() / 2) as f32,
        )
    }
}
