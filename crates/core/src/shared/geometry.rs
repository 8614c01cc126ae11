/// A 2D point in full-frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned detection box `[x_min, y_min, x_max, y_max]` with its score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub confidence: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64, confidence: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            confidence,
        }
    }

    pub fn width(&self) -> f64 {
        (self.x_max - self.x_min).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y_max - self.y_min).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Shifts the box by `(dx, dy)`, e.g. from ROI-local into full-frame space.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x_min: self.x_min + dx,
            y_min: self.y_min + dy,
            x_max: self.x_max + dx,
            y_max: self.y_max + dy,
            confidence: self.confidence,
        }
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x_min.max(other.x_min);
        let iy1 = self.y_min.max(other.y_min);
        let ix2 = self.x_max.min(other.x_max);
        let iy2 = self.y_max.min(other.y_max);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Grows the box by `padding` px on every side and clips it to the frame.
    ///
    /// Returns `None` when nothing of the box remains inside the frame.
    pub fn padded_within(&self, padding: f64, frame_w: u32, frame_h: u32) -> Option<PixelRect> {
        let x1 = (self.x_min - padding).max(0.0) as u32;
        let y1 = (self.y_min - padding).max(0.0) as u32;
        let x2 = ((self.x_max + padding).max(0.0) as u32).min(frame_w);
        let y2 = ((self.y_max + padding).max(0.0) as u32).min(frame_h);
        PixelRect::from_corners(x1, y1, x2, y2)
    }
}

/// An integer pixel rectangle with a non-zero area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Builds a rect from `[x1, x2) × [y1, y2)`, rejecting empty spans.
    pub fn from_corners(x1: u32, y1: u32, x2: u32, y2: u32) -> Option<Self> {
        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        Some(Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        })
    }

    pub fn x_end(&self) -> u32 {
        self.x + self.width
    }

    pub fn y_end(&self) -> u32 {
        self.y + self.height
    }
}
