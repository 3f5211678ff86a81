//! Material trait for surface scattering.

use crate::hittable::HitRecord;
use crate::pdf::{CosinePdf, Pdf};
use crate::sampling::{gen_f32, random_unit_vector};
use lumen_math::{Ray, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

/// Color type alias (linear RGB radiance)
pub type Color = Vec3;

/// Outcome of a successful scatter.
#[derive(Debug, Clone, Copy)]
pub struct ScatterRecord {
    /// Albedo applied to the light arriving along `scattered`
    pub attenuation: Color,
    /// The continuation ray leaving the hit point
    pub scattered: Ray,
    /// Density with which `scattered.direction` was drawn
    pub pdf: f32,
}

/// Trait for materials that describe how light interacts with surfaces.
///
/// The integrator weights every scatter by
/// `attenuation * scattering_pdf / pdf`. Specular lobes are delta
/// distributions; those materials report `1.0` for both densities so the
/// weight reduces to the attenuation.
pub trait Material: Send + Sync {
    /// Light emitted at the given surface coordinates and point.
    /// Most materials return black (no emission).
    fn emitted(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        Color::ZERO
    }

    /// Scatter an incoming ray, or `None` if the ray is absorbed.
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord>;

    /// Density of the material's reflectance in the `scattered` direction.
    fn scattering_pdf(&self, _ray_in: &Ray, _rec: &HitRecord, _scattered: &Ray) -> f32 {
        0.0
    }

    /// The distribution `scatter` samples from, when it can be evaluated for
    /// arbitrary directions. Lets the integrator mix in light sampling.
    fn sampling_pdf(&self, _rec: &HitRecord) -> Option<Box<dyn Pdf>> {
        None
    }
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl Material for Lambertian {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        let pdf = CosinePdf::new(rec.normal);
        let direction = pdf.generate(rng);

        Some(ScatterRecord {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, direction, ray_in.time),
            pdf: pdf.value(direction),
        })
    }

    fn scattering_pdf(&self, _ray_in: &Ray, rec: &HitRecord, scattered: &Ray) -> f32 {
        let cos_theta = rec.normal.dot(scattered.direction.normalize());
        (cos_theta / PI).max(0.0)
    }

    fn sampling_pdf(&self, rec: &HitRecord) -> Option<Box<dyn Pdf>> {
        Some(Box::new(CosinePdf::new(rec.normal)))
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone)]
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        let reflected = reflect(ray_in.direction.normalize(), rec.normal);
        let direction = reflected + self.fuzz * random_unit_vector(rng);

        // Fuzzed below the surface: absorbed
        if direction.dot(rec.normal) <= 0.0 {
            return None;
        }

        Some(ScatterRecord {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, direction, ray_in.time),
            pdf: 1.0,
        })
    }

    fn scattering_pdf(&self, _ray_in: &Ray, _rec: &HitRecord, _scattered: &Ray) -> f32 {
        1.0
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone)]
pub struct Dielectric {
    /// Index of refraction
    ior: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f32) -> Self {
        Self { ior }
    }

    /// Schlick's approximation for reflectance
    fn reflectance(cosine: f32, ior: f32) -> f32 {
        let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        let ratio = if rec.front_face {
            1.0 / self.ior
        } else {
            self.ior
        };

        let unit_direction = ray_in.direction.normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        // Total internal reflection
        let cannot_refract = ratio * sin_theta > 1.0;

        let direction =
            if cannot_refract || Self::reflectance(cos_theta, ratio) > gen_f32(rng) {
                reflect(unit_direction, rec.normal)
            } else {
                refract(unit_direction, rec.normal, ratio)
            };

        Some(ScatterRecord {
            attenuation: Color::ONE,
            scattered: Ray::new(rec.p, direction, ray_in.time),
            pdf: 1.0,
        })
    }

    fn scattering_pdf(&self, _ray_in: &Ray, _rec: &HitRecord, _scattered: &Ray) -> f32 {
        1.0
    }
}

/// Diffuse light emitter.
#[derive(Debug, Clone)]
pub struct DiffuseLight {
    emit: Color,
}

impl DiffuseLight {
    /// Create a new diffuse light with the given emission color.
    pub fn new(emit: Color) -> Self {
        Self { emit }
    }
}

impl Material for DiffuseLight {
    fn scatter(
        &self,
        _ray_in: &Ray,
        _rec: &HitRecord,
        _rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        None
    }

    fn emitted(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        self.emit
    }
}

#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

#[inline]
fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record_facing_up(material: &dyn Material) -> HitRecord<'_> {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0), 0.5);
        HitRecord::new(&ray, 1.0, Vec3::Y, material, (0.0, 0.0))
    }

    #[test]
    fn test_lambertian_scatter_density_matches_scattering_pdf() {
        let material = Lambertian::new(Color::new(0.8, 0.4, 0.2));
        let rec = record_facing_up(&material);
        let ray_in = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0), 0.5);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..100 {
            let scatter = material.scatter(&ray_in, &rec, &mut rng).expect("diffuse always scatters");
            let expected = material.scattering_pdf(&ray_in, &rec, &scatter.scattered);

            assert!(scatter.scattered.direction.dot(Vec3::Y) >= 0.0);
            assert!((scatter.pdf - expected).abs() < 1e-4);
            assert_eq!(scatter.scattered.time, 0.5);
            assert_eq!(scatter.attenuation, Color::new(0.8, 0.4, 0.2));
        }
    }

    #[test]
    fn test_lambertian_below_surface_has_zero_density() {
        let material = Lambertian::new(Color::ONE);
        let rec = record_facing_up(&material);
        let ray_in = Ray::default();
        let below = Ray::new(Vec3::ZERO, Vec3::new(0.3, -1.0, 0.0), 0.0);

        assert_eq!(material.scattering_pdf(&ray_in, &rec, &below), 0.0);
    }

    #[test]
    fn test_mirror_reflects() {
        let material = Metal::new(Color::ONE, 0.0);
        let ray_in = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), 0.0);
        let rec = HitRecord::new(&ray_in, 1.0, Vec3::Y, &material, (0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(3);

        let scatter = material.scatter(&ray_in, &rec, &mut rng).expect("mirror reflects");
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();

        assert!((scatter.scattered.direction - expected).length() < 1e-5);
        assert_eq!(scatter.pdf, 1.0);
    }

    #[test]
    fn test_light_emits_and_absorbs() {
        let material = DiffuseLight::new(Color::new(4.0, 4.0, 4.0));
        let rec = record_facing_up(&material);
        let mut rng = StdRng::seed_from_u64(3);

        assert!(material.scatter(&Ray::default(), &rec, &mut rng).is_none());
        assert_eq!(material.emitted(0.0, 0.0, Vec3::ZERO), Color::new(4.0, 4.0, 4.0));
        assert!(material.sampling_pdf(&rec).is_none());
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let material = Dielectric::new(1.5);
        // Grazing ray leaving the glass
        let ray_in = Ray::new(Vec3::new(-1.0, -0.1, 0.0), Vec3::new(1.0, 0.1, 0.0), 0.0);
        let rec = HitRecord::new(&ray_in, 1.0, Vec3::Y, &material, (0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(3);

        assert!(!rec.front_face);
        let scatter = material.scatter(&ray_in, &rec, &mut rng).expect("glass never absorbs");
        assert!(scatter.scattered.direction.y < 0.0);
    }
}
