//! Hittable trait and HitRecord for ray-object intersection.

use crate::sampling::gen_f32;
use crate::Material;
use lumen_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// Record of a ray-object intersection.
///
/// Only lives for the duration of one `hit` call chain; the material is
/// borrowed from the geometry that produced it.
#[derive(Clone, Copy)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: &'a dyn Material,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Surface coordinates
    pub u: f32,
    pub v: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> HitRecord<'a> {
    /// Build a record for a hit at `t`, orienting `outward_normal` against
    /// the ray. `outward_normal` must be unit length.
    pub fn new(
        ray: &Ray,
        t: f32,
        outward_normal: Vec3,
        material: &'a dyn Material,
        (u, v): (f32, f32),
    ) -> Self {
        let front_face = ray.direction.dot(outward_normal) < 0.0;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };

        Self {
            p: ray.at(t),
            normal,
            material,
            t,
            u,
            v,
            front_face,
        }
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Find the closest intersection with parameter inside `ray_t`.
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>>;

    /// Axis-aligned bounding box, computed once when the object is built.
    fn bounding_box(&self) -> Aabb;

    /// Solid-angle density of sampling `direction` from `origin` with
    /// [`Hittable::random`]. Objects that cannot be sampled report zero.
    fn pdf_value(&self, _origin: Vec3, _direction: Vec3) -> f32 {
        0.0
    }

    /// A direction from `origin` towards a random point on the object.
    fn random(&self, _origin: Vec3, _rng: &mut dyn RngCore) -> Vec3 {
        Vec3::X
    }
}

/// A list of hittable objects, searched linearly.
#[derive(Clone)]
pub struct HittableList {
    objects: Vec<Arc<dyn Hittable>>,
    bbox: Aabb,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bbox: Aabb::EMPTY,
        }
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: Arc<dyn Hittable>) {
        self.bbox = Aabb::surrounding(&self.bbox, &object.bounding_box());
        self.objects.push(object);
    }

    /// The objects in insertion order.
    pub fn objects(&self) -> &[Arc<dyn Hittable>] {
        &self.objects
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for HittableList {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Arc<dyn Hittable>>> for HittableList {
    fn from(objects: Vec<Arc<dyn Hittable>>) -> Self {
        let mut list = Self::new();
        for object in objects {
            list.add(object);
        }
        list
    }
}

impl Hittable for HittableList {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let mut closest: Option<HitRecord<'a>> = None;

        for object in &self.objects {
            let max = closest.map_or(ray_t.max, |rec| rec.t);
            if let Some(rec) = object.hit(ray, Interval::new(ray_t.min, max)) {
                closest = Some(rec);
            }
        }

        closest
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    /// Equal-weight average over the members.
    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        if self.objects.is_empty() {
            return 0.0;
        }
        let weight = 1.0 / self.objects.len() as f32;
        self.objects
            .iter()
            .map(|object| weight * object.pdf_value(origin, direction))
            .sum()
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        if self.objects.is_empty() {
            return Vec3::X;
        }
        let n = self.objects.len();
        let index = ((gen_f32(rng) * n as f32) as usize).min(n - 1);
        self.objects[index].random(origin, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lambertian, Sphere};

    fn grey() -> Arc<dyn Material> {
        Arc::new(Lambertian::new(Vec3::splat(0.5)))
    }

    #[test]
    fn test_hit_record_faces_ray() {
        let material = Lambertian::new(Vec3::ONE);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 0.0);

        // Outward normal opposing the ray: front face
        let rec = HitRecord::new(&ray, 1.0, Vec3::Z, &material, (0.0, 0.0));
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
        assert_eq!(rec.p, Vec3::new(0.0, 0.0, -1.0));

        // Outward normal along the ray: back face, normal flipped
        let rec = HitRecord::new(&ray, 1.0, -Vec3::Z, &material, (0.0, 0.0));
        assert!(!rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
    }

    #[test]
    fn test_list_returns_closest_hit() {
        let mut list = HittableList::new();
        list.add(Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0, grey())));
        list.add(Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -4.0), 1.0, grey())));

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 0.0);
        let rec = list
            .hit(&ray, Interval::new(0.001, f32::INFINITY))
            .expect("ray should hit the near sphere");

        assert!((rec.t - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_list_bbox_is_union() {
        let a: Arc<dyn Hittable> = Arc::new(Sphere::new(Vec3::ZERO, 1.0, grey()));
        let b: Arc<dyn Hittable> = Arc::new(Sphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0, grey()));
        let list = HittableList::from(vec![a.clone(), b.clone()]);

        assert_eq!(
            list.bounding_box(),
            Aabb::surrounding(&a.bounding_box(), &b.bounding_box())
        );
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_empty_list_misses() {
        let list = HittableList::new();
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 0.0);

        assert!(list.is_empty());
        assert!(list.hit(&ray, Interval::UNIVERSE).is_none());
        assert_eq!(list.pdf_value(Vec3::ZERO, Vec3::X), 0.0);
    }
}
