use super::WRAP_EPSILON;
use super::geometry::{AngleTable, Point};

/// The stroked band of the chart, centered on `radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub center: Point,
    pub radius: f64,
    pub border: f64,
}

impl Ring {
    pub fn new(center: Point, radius: f64, border: f64) -> Self {
        Self {
            center,
            radius,
            border,
        }
    }

    /// Strictly inside the band; both edges count as outside.
    pub fn contains(&self, point: Point) -> bool {
        let distance = point.distance_to(self.center);
        let half = self.border / 2.0;
        distance > self.radius - half && distance < self.radius + half
    }
}

/// First segment whose end angle is strictly greater than `angle`.
///
/// Angles at or past the last end angle miss, except when the table spans the
/// full circle: there the only way past the last entry is float rounding at
/// the 2π wrap, so the last segment is returned.
pub fn segment_at(angles: &AngleTable, angle: f64) -> Option<usize> {
    angles
        .iter()
        .position(|&end| end > angle)
        .or_else(|| {
            (!angles.is_empty() && angles.is_full_turn(WRAP_EPSILON)).then(|| angles.len() - 1)
        })
}

/// Resolves a pointer to the segment under it, or `None` when it misses.
pub fn hit_test(ring: &Ring, angles: &AngleTable, point: Point) -> Option<usize> {
    if !ring.contains(point) {
        return None;
    }
    segment_at(angles, point.angle_from(ring.center))
}
