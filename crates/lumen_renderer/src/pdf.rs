//! Probability densities over directions, for importance sampling.
//!
//! Each PDF pairs a sampler (`generate`) with the density it samples from
//! (`value`), measured per unit solid angle. They are cheap, built per
//! sample and dropped right after.

use crate::sampling::{gen_f32, random_cosine_direction, random_unit_vector};
use crate::Hittable;
use lumen_math::{Onb, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

/// A sampleable distribution over directions.
pub trait Pdf {
    /// Density of `direction` (non-negative).
    fn value(&self, direction: Vec3) -> f32;

    /// Draw a direction from this distribution.
    fn generate(&self, rng: &mut dyn RngCore) -> Vec3;
}

/// Uniform density over the whole sphere of directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpherePdf;

impl SpherePdf {
    pub fn new() -> Self {
        Self
    }
}

impl Pdf for SpherePdf {
    fn value(&self, _direction: Vec3) -> f32 {
        1.0 / (4.0 * PI)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        random_unit_vector(rng)
    }
}

/// Cosine-weighted hemisphere around a surface normal.
#[derive(Debug, Clone, Copy)]
pub struct CosinePdf {
    uvw: Onb,
}

impl CosinePdf {
    pub fn new(w: Vec3) -> Self {
        Self {
            uvw: Onb::from_w(w),
        }
    }
}

impl Pdf for CosinePdf {
    fn value(&self, direction: Vec3) -> f32 {
        let cos_theta = direction.normalize().dot(self.uvw.w());
        (cos_theta / PI).max(0.0)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.uvw.local(random_cosine_direction(rng))
    }
}

/// Directions towards a piece of geometry, as seen from `origin`.
///
/// Used to send rays straight at light sources.
pub struct HittablePdf<'a> {
    objects: &'a dyn Hittable,
    origin: Vec3,
}

impl<'a> HittablePdf<'a> {
    pub fn new(objects: &'a dyn Hittable, origin: Vec3) -> Self {
        Self { objects, origin }
    }
}

impl Pdf for HittablePdf<'_> {
    fn value(&self, direction: Vec3) -> f32 {
        self.objects.pdf_value(self.origin, direction)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.objects.random(self.origin, rng)
    }
}

/// Equal-weight mixture of two densities.
pub struct MixturePdf<'a> {
    p: [&'a dyn Pdf; 2],
}

impl<'a> MixturePdf<'a> {
    pub fn new(p0: &'a dyn Pdf, p1: &'a dyn Pdf) -> Self {
        Self { p: [p0, p1] }
    }
}

impl Pdf for MixturePdf<'_> {
    fn value(&self, direction: Vec3) -> f32 {
        0.5 * self.p[0].value(direction) + 0.5 * self.p[1].value(direction)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        if gen_f32(rng) < 0.5 {
            self.p[0].generate(rng)
        } else {
            self.p[1].generate(rng)
        }
    }
}
