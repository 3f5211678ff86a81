//! Sphere primitive for ray tracing, optionally moving for motion blur.

use crate::hittable::{HitRecord, Hittable};
use crate::sampling::random_to_sphere;
use crate::Material;
use lumen_math::{Aabb, Interval, Onb, Ray, Vec3};
use rand::RngCore;
use std::f32::consts::PI;
use std::sync::Arc;

/// A sphere primitive.
///
/// The center is stored as a ray so a moving sphere's position at time
/// `tau` is `center.at(tau)`; a stationary sphere has a zero direction.
///
/// Light sampling (`pdf_value` and `random`) aims at the time-zero center,
/// so spheres used as light-sampling targets should be stationary.
pub struct Sphere {
    center: Ray,
    radius: f32,
    material: Arc<dyn Material>,
    bbox: Aabb,
}

impl Sphere {
    /// Create a stationary sphere.
    pub fn new(center: Vec3, radius: f32, material: Arc<dyn Material>) -> Self {
        let radius = clamp_radius(radius);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center: Ray::new(center, Vec3::ZERO, 0.0),
            radius,
            material,
            bbox,
        }
    }

    /// Create a sphere moving linearly from `center1` at time 0 to
    /// `center2` at time 1.
    pub fn new_moving(
        center1: Vec3,
        center2: Vec3,
        radius: f32,
        material: Arc<dyn Material>,
    ) -> Self {
        let radius = clamp_radius(radius);
        let rvec = Vec3::splat(radius);
        let box1 = Aabb::from_points(center1 - rvec, center1 + rvec);
        let box2 = Aabb::from_points(center2 - rvec, center2 + rvec);

        Self {
            center: Ray::new(center1, center2 - center1, 0.0),
            radius,
            material,
            bbox: Aabb::surrounding(&box1, &box2),
        }
    }

    /// Center of the sphere at the given ray time.
    #[inline]
    pub fn center_at(&self, time: f32) -> Vec3 {
        self.center.at(time)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Get the UV coordinates for a point on the unit sphere.
    ///
    /// `u` is the angle around +Y starting from -X, `v` runs from -Y to +Y.
    fn sphere_uv(p: Vec3) -> (f32, f32) {
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        (phi / (2.0 * PI), theta / PI)
    }
}

fn clamp_radius(radius: f32) -> f32 {
    if radius < 0.0 {
        log::warn!("Negative sphere radius {radius} clamped to zero");
    }
    radius.max(0.0)
}

impl Hittable for Sphere {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let center = self.center_at(ray.time);
        let oc = center - ray.origin;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        // A zero radius yields 0/0 here; the degenerate sphere is a miss
        let outward_normal = (ray.at(root) - center) / self.radius;
        if !outward_normal.is_finite() {
            return None;
        }

        Some(HitRecord::new(
            ray,
            root,
            outward_normal,
            self.material.as_ref(),
            Self::sphere_uv(outward_normal),
        ))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    /// Uniform density over the cone the sphere subtends from `origin`.
    /// Uses the center at time zero, see [`Sphere`].
    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        let ray = Ray::new(origin, direction, 0.0);
        if self.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none() {
            return 0.0;
        }

        let distance_squared = (self.center_at(0.0) - origin).length_squared();
        let radius_squared = self.radius * self.radius;
        if distance_squared <= radius_squared {
            return 0.0;
        }

        let cos_theta_max = (1.0 - radius_squared / distance_squared).sqrt();
        let solid_angle = 2.0 * PI * (1.0 - cos_theta_max);
        if solid_angle <= 0.0 {
            return 0.0;
        }

        1.0 / solid_angle
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let direction = self.center_at(0.0) - origin;
        let distance_squared = direction.length_squared();
        if distance_squared <= self.radius * self.radius {
            return direction;
        }

        let uvw = Onb::from_w(direction);
        uvw.local(random_to_sphere(rng, self.radius, distance_squared))
    }
}
