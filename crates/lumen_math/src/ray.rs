use crate::Vec3;

/// A ray in 3D space with origin, direction, and time.
///
/// Represents the half-line `origin + t * direction`. The direction is not
/// necessarily normalized. `time` lies in `[0, 1)` and selects where moving
/// geometry sits when the ray is traced (motion blur).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub time: f32,
}

impl Ray {
    /// Create a new ray.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, time: f32) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    /// Get the point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// The same ray with its origin moved by `offset`.
    #[inline]
    pub fn offset(&self, offset: Vec3) -> Ray {
        Ray::new(self.origin + offset, self.direction, self.time)
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z, 0.0)
    }
}
