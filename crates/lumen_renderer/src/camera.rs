//! Camera, ray generation and the recursive radiance estimator.
//!
//! [`CameraConfig`] is the mutable description a scene sets up;
//! [`CameraConfig::initialize`] validates it and derives an immutable
//! [`Camera`], which is the only thing that can render.

use crate::bucket::{generate_buckets, render_bucket, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::error::{RenderError, RenderResult};
use crate::output::ImageBuffer;
use crate::pdf::{HittablePdf, MixturePdf, Pdf};
use crate::sampling::{gen_f32, random_in_unit_disk};
use crate::{Color, Hittable};
use lumen_math::{Interval, Ray, Vec3};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Closest hit distance accepted for secondary rays, to avoid shadow acne.
const RAY_T_MIN: f32 = 0.001;

/// Camera settings. Every field has a default, so a JSON document only
/// needs the fields it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    /// Ratio of image width over height
    pub aspect_ratio: f32,
    /// Rendered image width in pixels
    pub image_width: u32,
    /// Random samples per pixel (rounded down to a square grid)
    pub samples_per_pixel: u32,
    /// Maximum number of ray bounces
    pub max_depth: u32,
    /// Radiance of rays that escape the scene
    pub background: Color,

    /// Vertical field of view in degrees
    pub vfov: f32,
    pub look_from: Vec3,
    pub look_at: Vec3,
    /// Camera-relative "up" direction
    pub vup: Vec3,

    /// Variation angle of rays through each pixel
    pub defocus_angle: f32,
    /// Distance from camera to plane of perfect focus
    pub focus_dist: f32,

    pub seed: u64,
    /// Print a progress line on stderr while rendering
    pub show_progress: bool,
    pub bucket_size: u32,
    /// Where to save the image (`.bmp` or `.ppm`); not saved when `None`
    pub output: Option<PathBuf>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.0,
            image_width: 100,
            samples_per_pixel: 10,
            max_depth: 10,
            background: Color::ZERO,
            vfov: 90.0,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            defocus_angle: 0.0,
            focus_dist: 10.0,
            seed: 0,
            show_progress: false,
            bucket_size: DEFAULT_BUCKET_SIZE,
            output: None,
        }
    }
}

impl CameraConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set image width and aspect ratio; the height is derived.
    pub fn with_resolution(mut self, image_width: u32, aspect_ratio: f32) -> Self {
        self.image_width = image_width;
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples_per_pixel: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self.max_depth = max_depth;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_bucket_size(mut self, bucket_size: u32) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Validate the settings and compute the camera's derived state.
    pub fn initialize(&self) -> RenderResult<Camera> {
        self.validate()?;

        let image_height = ((self.image_width as f32 / self.aspect_ratio) as u32).max(1);
        let sqrt_spp = ((self.samples_per_pixel as f32).sqrt() as u32).max(1);
        let center = self.look_from;

        // Viewport from the actual pixel ratio, not the requested one
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (self.image_width as f32 / image_height as f32);

        let w = (self.look_from - self.look_at).normalize();
        let u = self.vup.cross(w).normalize();
        let v = w.cross(u);

        // Across the horizontal edge, and down the vertical edge
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        let pixel_delta_u = viewport_u / self.image_width as f32;
        let pixel_delta_v = viewport_v / image_height as f32;

        let viewport_upper_left = center - self.focus_dist * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();

        let camera = Camera {
            image_width: self.image_width,
            image_height,
            max_depth: self.max_depth,
            background: self.background,
            center,
            pixel00_loc,
            pixel_delta_u,
            pixel_delta_v,
            u,
            v,
            w,
            defocus_angle: self.defocus_angle,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
            sqrt_spp,
            recip_sqrt_spp: 1.0 / sqrt_spp as f32,
            seed: self.seed,
            show_progress: self.show_progress,
            bucket_size: self.bucket_size,
            output: self.output.clone(),
        };

        log::debug!(
            "Camera initialized: {}x{}, {}x{} strata, center {:?}, pixel00 {:?}",
            camera.image_width,
            camera.image_height,
            sqrt_spp,
            sqrt_spp,
            center,
            pixel00_loc
        );

        Ok(camera)
    }

    fn validate(&self) -> RenderResult<()> {
        let invalid = |msg: String| Err(RenderError::InvalidConfig(msg));

        if self.image_width == 0 {
            return invalid("image_width must be positive".into());
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return invalid(format!("aspect_ratio must be positive, got {}", self.aspect_ratio));
        }
        if self.samples_per_pixel == 0 {
            return invalid("samples_per_pixel must be positive".into());
        }
        if !(self.vfov > 0.0 && self.vfov < 180.0) {
            return invalid(format!("vfov must be in (0, 180) degrees, got {}", self.vfov));
        }
        if !(self.focus_dist.is_finite() && self.focus_dist > 0.0) {
            return invalid(format!("focus_dist must be positive, got {}", self.focus_dist));
        }
        if self.bucket_size == 0 {
            return invalid("bucket_size must be positive".into());
        }

        let view = self.look_from - self.look_at;
        if view.length_squared() == 0.0 {
            return invalid(format!("look_from and look_at coincide at {:?}", self.look_from));
        }
        if self.vup.cross(view).length_squared() == 0.0 {
            return invalid(format!("vup {:?} is parallel to the view direction", self.vup));
        }

        if self.defocus_angle < 0.0 {
            log::warn!(
                "Negative defocus_angle {} disables depth of field",
                self.defocus_angle
            );
        }

        Ok(())
    }
}

/// An initialized camera. Immutable, so it can be shared across the
/// render threads.
#[derive(Debug, Clone)]
pub struct Camera {
    pub image_width: u32,
    pub image_height: u32,
    pub max_depth: u32,
    pub background: Color,

    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_angle: f32,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,

    /// Side of the per-pixel stratification grid
    sqrt_spp: u32,
    recip_sqrt_spp: f32,

    seed: u64,
    show_progress: bool,
    bucket_size: u32,
    output: Option<PathBuf>,
}

impl Camera {
    /// Samples actually taken per pixel (`k * k`).
    pub fn samples_per_pixel(&self) -> u32 {
        self.sqrt_spp * self.sqrt_spp
    }

    /// Camera basis `(u, v, w)`: right, up, and backwards.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }

    /// Render the scene, save it when an output path is configured, and
    /// return the image.
    ///
    /// When `lights` is given, diffuse bounces also sample towards it.
    pub fn render(
        &self,
        world: &dyn Hittable,
        lights: Option<&dyn Hittable>,
    ) -> RenderResult<ImageBuffer> {
        let mut image = ImageBuffer::try_new(self.image_width, self.image_height)?;
        let buckets = generate_buckets(self.image_width, self.image_height, self.bucket_size);

        log::info!(
            "Rendering {}x{} @ {} spp, depth {}, {} buckets",
            self.image_width,
            self.image_height,
            self.samples_per_pixel(),
            self.max_depth,
            buckets.len()
        );

        let progress = Progress::new(image.pixels.len(), self.show_progress);

        let results: Vec<BucketResult> = buckets
            .par_iter()
            .map(|bucket| {
                let result = render_bucket(bucket, self, world, lights);
                progress.advance(bucket.pixel_count());
                result
            })
            .collect();

        for result in results {
            let bucket = result.bucket;
            for (i, color) in result.pixels.into_iter().enumerate() {
                let x = bucket.x + (i as u32 % bucket.width);
                let y = bucket.y + (i as u32 / bucket.width);
                image.set(x, y, color);
            }
        }

        progress.finish();
        log::info!("Render finished in {:.2?}", progress.elapsed());

        if let Some(path) = &self.output {
            image.save(path)?;
        }

        Ok(image)
    }

    /// Average radiance through pixel `(i, j)` over the stratified grid.
    ///
    /// Each pixel draws from its own generator seeded by the camera seed
    /// and the pixel index, so the result does not depend on scheduling.
    pub fn render_pixel(
        &self,
        i: u32,
        j: u32,
        world: &dyn Hittable,
        lights: Option<&dyn Hittable>,
    ) -> Color {
        let pixel_index = j as u64 * self.image_width as u64 + i as u64;
        let mut rng = StdRng::seed_from_u64(pixel_seed(self.seed, pixel_index));

        let mut pixel_color = Color::ZERO;
        for s_j in 0..self.sqrt_spp {
            for s_i in 0..self.sqrt_spp {
                let ray = self.get_ray(i, j, s_i, s_j, &mut rng);
                pixel_color += self.ray_color(&ray, self.max_depth, world, lights, &mut rng);
            }
        }

        pixel_color / self.samples_per_pixel() as f32
    }

    /// A camera ray through a jittered point of stratum `(s_i, s_j)` of
    /// pixel `(i, j)`, from the defocus disk, at a random time.
    pub fn get_ray(&self, i: u32, j: u32, s_i: u32, s_j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = self.sample_square_stratified(s_i, s_j, rng);

        let pixel_sample = self.pixel00_loc
            + (i as f32 + offset.x) * self.pixel_delta_u
            + (j as f32 + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        let ray_direction = pixel_sample - ray_origin;
        let ray_time = gen_f32(rng);

        Ray::new(ray_origin, ray_direction, ray_time)
    }

    /// Offset into `[-0.5, 0.5)^2`, restricted to one cell of the grid.
    fn sample_square_stratified(&self, s_i: u32, s_j: u32, rng: &mut dyn RngCore) -> Vec3 {
        let px = ((s_i as f32 + gen_f32(rng)) * self.recip_sqrt_spp) - 0.5;
        let py = ((s_j as f32 + gen_f32(rng)) * self.recip_sqrt_spp) - 0.5;
        Vec3::new(px, py, 0.0)
    }

    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }

    /// Estimate the radiance arriving along `ray`.
    pub fn ray_color(
        &self,
        ray: &Ray,
        depth: u32,
        world: &dyn Hittable,
        lights: Option<&dyn Hittable>,
        rng: &mut dyn RngCore,
    ) -> Color {
        if depth == 0 {
            return Color::ZERO;
        }

        let Some(rec) = world.hit(ray, Interval::new(RAY_T_MIN, f32::INFINITY)) else {
            return self.background;
        };

        let emission = rec.material.emitted(rec.u, rec.v, rec.p);

        let Some(srec) = rec.material.scatter(ray, &rec, rng) else {
            return emission;
        };

        let (scattered, sample_pdf) = match (lights, rec.material.sampling_pdf(&rec)) {
            (Some(lights), Some(material_pdf)) => {
                let light_pdf = HittablePdf::new(lights, rec.p);
                let mixture = MixturePdf::new(&light_pdf, material_pdf.as_ref());
                let direction = mixture.generate(rng);
                (
                    Ray::new(rec.p, direction, ray.time),
                    mixture.value(direction),
                )
            }
            _ => (srec.scattered, srec.pdf),
        };

        if !(sample_pdf.is_finite() && sample_pdf > 0.0) {
            return emission;
        }

        let scattering_pdf = rec.material.scattering_pdf(ray, &rec, &scattered);
        let incoming = self.ray_color(&scattered, depth - 1, world, lights, rng);

        emission + srec.attenuation * scattering_pdf * incoming / sample_pdf
    }
}

/// Decorrelate per-pixel seeds (golden-ratio increment).
fn pixel_seed(seed: u64, pixel_index: u64) -> u64 {
    seed ^ pixel_index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Finished-pixel counter shared by the render threads.
struct Progress {
    total: usize,
    done: AtomicUsize,
    start: Instant,
    enabled: bool,
}

impl Progress {
    fn new(total: usize, enabled: bool) -> Self {
        Self {
            total,
            done: AtomicUsize::new(0),
            start: Instant::now(),
            enabled,
        }
    }

    fn advance(&self, pixels: usize) {
        let done = self.done.fetch_add(pixels, Ordering::Relaxed) + pixels;
        if !self.enabled || self.total == 0 {
            return;
        }

        let fraction = done as f32 / self.total as f32;
        let elapsed = self.start.elapsed().as_secs_f32();
        let remaining = if fraction > 0.0 {
            elapsed * (1.0 - fraction) / fraction
        } else {
            0.0
        };

        eprint!(
            "\rRendering: {:5.1}% | {:.1}s elapsed | {:.1}s remaining   ",
            100.0 * fraction,
            elapsed,
            remaining
        );
    }

    fn finish(&self) {
        if self.enabled {
            eprintln!("\r{:<60}", "Done.");
        }
    }

    fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
