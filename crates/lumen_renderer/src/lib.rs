//! Lumen renderer - CPU path tracing
//!
//! A Monte Carlo path tracer: spheres and quads with diffuse, metal, glass
//! and emissive materials, importance sampled through direction PDFs, and
//! rendered in parallel buckets to PPM or BMP.

mod bucket;
mod bvh;
mod camera;
mod error;
mod hittable;
mod material;
mod output;
mod pdf;
mod quad;
mod sampling;
mod sphere;
mod translate;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use bvh::BvhNode;
pub use camera::{Camera, CameraConfig};
pub use error::{RenderError, RenderResult};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{Color, Dielectric, DiffuseLight, Lambertian, Material, Metal, ScatterRecord};
pub use output::{bmp_stride, color_to_rgb8, linear_to_gamma, ImageBuffer};
pub use pdf::{CosinePdf, HittablePdf, MixturePdf, Pdf, SpherePdf};
pub use quad::{make_box, Quad};
pub use sampling::{gen_f32, gen_range};
pub use sphere::Sphere;
pub use translate::Translate;

/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Aabb, Interval, Ray, Vec3};
