//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over shared hittables, built once by median split on the
//! longest centroid axis.

use crate::sampling::gen_f32;
use crate::{HitRecord, Hittable, HittableList};
use lumen_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// BVH node - either a branch with two children or a leaf with primitives.
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node with a small number of primitives.
    Leaf {
        objects: Vec<Arc<dyn Hittable>>,
        bbox: Aabb,
    },
    /// Empty node (no objects at all).
    Empty,
}

impl BvhNode {
    /// Create a BVH from a list of hittable objects.
    pub fn new(objects: Vec<Arc<dyn Hittable>>) -> Self {
        if objects.is_empty() {
            return BvhNode::Empty;
        }
        Self::build(objects)
    }

    /// Build a BVH over the members of a list.
    pub fn from_list(list: &HittableList) -> Self {
        Self::new(list.objects().to_vec())
    }

    fn build(mut objects: Vec<Arc<dyn Hittable>>) -> Self {
        let n = objects.len();

        let bounds = objects
            .iter()
            .fold(Aabb::EMPTY, |acc, o| Aabb::surrounding(&acc, &o.bounding_box()));

        if n <= LEAF_MAX_SIZE {
            return BvhNode::Leaf {
                objects,
                bbox: bounds,
            };
        }

        let centroid_bounds = objects.iter().fold(Aabb::EMPTY, |acc, obj| {
            let c = obj.bounding_box().centroid();
            Aabb::surrounding(&acc, &Aabb::from_points(c, c))
        });
        let axis = centroid_bounds.longest_axis();

        objects.sort_unstable_by(|a, b| {
            let a_val = a.bounding_box().centroid()[axis];
            let b_val = b.bounding_box().centroid()[axis];
            a_val.total_cmp(&b_val)
        });

        let right_objects = objects.split_off(n / 2);
        let left = Self::build(objects);
        let right = Self::build(right_objects);

        BvhNode::Branch {
            left: Box::new(left),
            right: Box::new(right),
            bbox: bounds,
        }
    }

    /// Depth of the deepest leaf (an empty tree has depth 0).
    pub fn depth(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

impl Hittable for BvhNode {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        match self {
            BvhNode::Empty => None,

            BvhNode::Leaf { objects, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let mut closest: Option<HitRecord<'a>> = None;
                for obj in objects {
                    let max = closest.map_or(ray_t.max, |rec| rec.t);
                    if let Some(rec) = obj.hit(ray, Interval::new(ray_t.min, max)) {
                        closest = Some(rec);
                    }
                }
                closest
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = left.hit(ray, ray_t);

                // Only check right up to closest hit
                let right_max = hit_left.map_or(ray_t.max, |rec| rec.t);
                let hit_right = right.hit(ray, Interval::new(ray_t.min, right_max));

                hit_right.or(hit_left)
            }
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        let (sum, count) = self.sampling_sum(origin, direction);
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let objects = self.leaves();
        if objects.is_empty() {
            return Vec3::X;
        }
        let n = objects.len();
        let index = ((gen_f32(rng) * n as f32) as usize).min(n - 1);
        objects[index].random(origin, rng)
    }
}

impl BvhNode {
    /// Sum of member densities and the member count, for an equal-weight
    /// average matching `random`.
    fn sampling_sum(&self, origin: Vec3, direction: Vec3) -> (f32, usize) {
        match self {
            BvhNode::Empty => (0.0, 0),
            BvhNode::Leaf { objects, .. } => (
                objects.iter().map(|o| o.pdf_value(origin, direction)).sum(),
                objects.len(),
            ),
            BvhNode::Branch { left, right, .. } => {
                let (a, na) = left.sampling_sum(origin, direction);
                let (b, nb) = right.sampling_sum(origin, direction);
                (a + b, na + nb)
            }
        }
    }

    fn leaves(&self) -> Vec<&Arc<dyn Hittable>> {
        match self {
            BvhNode::Empty => Vec::new(),
            BvhNode::Leaf { objects, .. } => objects.iter().collect(),
            BvhNode::Branch { left, right, .. } => {
                let mut all = left.leaves();
                all.extend(right.leaves());
                all
            }
        }
    }
}
