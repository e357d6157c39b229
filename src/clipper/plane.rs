use crate::math::Vec3;

/// A plane defined by a point on the plane and its unit normal.
/// The normal points toward the "inside" (kept) half-space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    /// The normal is normalized on construction.
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    /// Signed distance from `position` to the plane.
    /// Positive = inside (same side as normal), Negative = outside.
    pub fn signed_distance(&self, position: Vec3) -> f32 {
        (position - self.point).dot(self.normal)
    }

    /// Parameter along `start -> end` at which the segment meets the plane,
    /// given the endpoints' signed distances.
    pub fn intersection(d_start: f32, d_end: f32) -> f32 {
        d_start / (d_start - d_end)
    }
}
