//! Planar parallelogram primitive and the six-sided box built from it.

use crate::hittable::{HitRecord, Hittable, HittableList};
use crate::sampling::gen_f32;
use crate::Material;
use lumen_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// Rays closer to parallel than this are treated as missing the plane.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A parallelogram spanned by corner `q` and edges `u`, `v`.
pub struct Quad {
    q: Vec3,
    u: Vec3,
    v: Vec3,
    /// `n / (n . n)` with `n = u x v`, for recovering planar coordinates
    w: Vec3,
    normal: Vec3,
    /// Plane constant: `normal . p == d` on the plane
    d: f32,
    area: f32,
    material: Arc<dyn Material>,
    bbox: Aabb,
}

impl Quad {
    pub fn new(q: Vec3, u: Vec3, v: Vec3, material: Arc<dyn Material>) -> Self {
        let n = u.cross(v);
        let area = n.length();
        if area == 0.0 {
            log::warn!("Degenerate quad at {q:?}: edges {u:?} and {v:?} are parallel");
        }
        let normal = n.normalize_or_zero();
        let d = normal.dot(q);
        let w = if area > 0.0 { n / n.dot(n) } else { Vec3::ZERO };

        // Both diagonals, so any edge orientation is covered
        let bbox_diagonal1 = Aabb::from_points(q, q + u + v);
        let bbox_diagonal2 = Aabb::from_points(q + u, q + v);
        let bbox = Aabb::surrounding(&bbox_diagonal1, &bbox_diagonal2);

        Self {
            q,
            u,
            v,
            w,
            normal,
            d,
            area,
            material,
            bbox,
        }
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Planar coordinates `(alpha, beta)` of a point in the quad's plane,
    /// if they fall inside the unit square.
    fn interior(alpha: f32, beta: f32) -> Option<(f32, f32)> {
        let unit = Interval::new(0.0, 1.0);
        if unit.contains(alpha) && unit.contains(beta) {
            Some((alpha, beta))
        } else {
            None
        }
    }
}

impl Hittable for Quad {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let denom = self.normal.dot(ray.direction);

        // Parallel to the plane (or a degenerate quad)
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = (self.d - self.normal.dot(ray.origin)) / denom;
        if !ray_t.contains(t) {
            return None;
        }

        let planar_hitpt = ray.at(t) - self.q;
        let alpha = self.w.dot(planar_hitpt.cross(self.v));
        let beta = self.w.dot(self.u.cross(planar_hitpt));
        let uv = Self::interior(alpha, beta)?;

        Some(HitRecord::new(
            ray,
            t,
            self.normal,
            self.material.as_ref(),
            uv,
        ))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    /// Converts uniform area sampling into solid-angle density.
    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        let ray = Ray::new(origin, direction, 0.0);
        let Some(rec) = self.hit(&ray, Interval::new(0.001, f32::INFINITY)) else {
            return 0.0;
        };

        let distance_squared = rec.t * rec.t * direction.length_squared();
        let cosine = (direction.dot(rec.normal) / direction.length()).abs();

        distance_squared / (cosine * self.area)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let point = self.q + gen_f32(rng) * self.u + gen_f32(rng) * self.v;
        point - origin
    }
}

/// The axis-aligned box with opposite corners `a` and `b`, as six quads
/// whose normals face outward.
pub fn make_box(a: Vec3, b: Vec3, material: Arc<dyn Material>) -> HittableList {
    let mut sides = HittableList::new();

    let min = a.min(b);
    let max = a.max(b);

    let dx = Vec3::new(max.x - min.x, 0.0, 0.0);
    let dy = Vec3::new(0.0, max.y - min.y, 0.0);
    let dz = Vec3::new(0.0, 0.0, max.z - min.z);

    let faces = [
        (Vec3::new(min.x, min.y, max.z), dx, dy),  // front
        (Vec3::new(max.x, min.y, max.z), -dz, dy), // right
        (Vec3::new(max.x, min.y, min.z), -dx, dy), // back
        (Vec3::new(min.x, min.y, min.z), dz, dy),  // left
        (Vec3::new(min.x, max.y, max.z), dx, -dz), // top
        (Vec3::new(min.x, min.y, min.z), dx, dz),  // bottom
    ];

    for (q, u, v) in faces {
        sides.add(Arc::new(Quad::new(q, u, v, material.clone())));
    }

    sides
}
