use derive_more::{AsRef, Deref, From, Into};
use std::f64::consts::{PI, TAU};

/// Largest angle below a full turn.
const BELOW_TAU: f64 = f64::from_bits(TAU.to_bits() - 1);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        let (dx, dy) = (self.x - other.x, self.y - other.y);
        dx.hypot(dy)
    }

    /// Angle of `self` around `center`, in `[0, 2π)`, growing clockwise on screen.
    pub fn angle_from(&self, center: Point) -> f64 {
        let angle = (self.y - center.y).atan2(self.x - center.x);
        if angle < 0.0 {
            // tiny negatives round up to exactly 2π
            (angle + TAU).min(BELOW_TAU)
        } else {
            angle
        }
    }

    pub fn on_circle(center: Point, radius: f64, angle: f64) -> Self {
        Self::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        )
    }
}

/// Maps a percentage onto the circle: 100% is a full turn.
pub fn value_to_angle(value: f64) -> f64 {
    value * PI / 50.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSegment {
    pub start: f64,
    pub end: f64,
}

impl ArcSegment {
    pub fn mid(&self) -> f64 {
        self.start + (self.end - self.start) / 2.0
    }
}

/// Anchor for a segment's label, tagged with the segment's raw value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// Cumulative end angle of every segment, in input order.
#[derive(Debug, Clone, PartialEq, Default, Deref, From, Into, AsRef)]
pub struct AngleTable(Vec<f64>);

impl AngleTable {
    pub fn last_end(&self) -> f64 {
        self.0.last().copied().unwrap_or(0.0)
    }

    /// True when the table covers the whole circle, up to rounding.
    pub fn is_full_turn(&self, epsilon: f64) -> bool {
        (TAU - self.last_end()).abs() <= epsilon
    }
}

/// Arc ranges and label anchors for one set of values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    pub segments: Vec<ArcSegment>,
    pub angles: AngleTable,
    pub text_points: Vec<TextPoint>,
}

impl Layout {
    /// Lays the values out clockwise from angle 0, each spanning its share of
    /// the circle. Label anchors sit on the ring's centerline at the middle
    /// of each segment.
    pub fn compute(values: &[f64], center: Point, radius: f64) -> Self {
        let mut start = 0.0;
        let mut layout = Self {
            segments: Vec::with_capacity(values.len()),
            angles: AngleTable::default(),
            text_points: Vec::with_capacity(values.len()),
        };

        for &value in values {
            let end = start + value_to_angle(value);
            let segment = ArcSegment { start, end };
            let anchor = Point::on_circle(center, radius, segment.mid());

            layout.segments.push(segment);
            layout.angles.0.push(end);
            layout.text_points.push(TextPoint {
                x: anchor.x,
                y: anchor.y,
                value,
            });

            start = end;
        }

        layout
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
