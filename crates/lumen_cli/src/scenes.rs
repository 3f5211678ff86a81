//! Preset scenes, each with the camera that frames it.

use crate::settings::SceneKind;
use lumen_math::Vec3;
use lumen_renderer::{
    make_box, BvhNode, CameraConfig, Color, Dielectric, DiffuseLight, Hittable, HittableList,
    Lambertian, Material, Metal, Quad, Sphere, Translate,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Geometry, optional light-sampling targets, and the preset camera.
pub struct Scene {
    pub world: BvhNode,
    pub lights: Option<HittableList>,
    pub camera: CameraConfig,
}

impl Scene {
    pub fn build(kind: SceneKind, seed: u64) -> Self {
        match kind {
            SceneKind::CornellBox => cornell_box(),
            SceneKind::BouncingSpheres => bouncing_spheres(seed),
            SceneKind::Quads => quads(),
        }
    }
}

fn lambertian(r: f32, g: f32, b: f32) -> Arc<dyn Material> {
    Arc::new(Lambertian::new(Color::new(r, g, b)))
}

fn cornell_box() -> Scene {
    let red = lambertian(0.65, 0.05, 0.05);
    let white = lambertian(0.73, 0.73, 0.73);
    let green = lambertian(0.12, 0.45, 0.15);
    let light: Arc<dyn Material> = Arc::new(DiffuseLight::new(Color::splat(15.0)));

    let ceiling_light: Arc<dyn Hittable> = Arc::new(Quad::new(
        Vec3::new(343.0, 554.0, 332.0),
        Vec3::new(-130.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -105.0),
        light,
    ));

    let mut world = HittableList::new();
    world.add(Arc::new(Quad::new(
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        green,
    )));
    world.add(Arc::new(Quad::new(
        Vec3::ZERO,
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        red,
    )));
    world.add(ceiling_light.clone());
    world.add(Arc::new(Quad::new(
        Vec3::ZERO,
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        white.clone(),
    )));
    world.add(Arc::new(Quad::new(
        Vec3::splat(555.0),
        Vec3::new(-555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -555.0),
        white.clone(),
    )));
    world.add(Arc::new(Quad::new(
        Vec3::new(0.0, 0.0, 555.0),
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        white.clone(),
    )));

    let tall_box = make_box(Vec3::ZERO, Vec3::new(165.0, 330.0, 165.0), white.clone());
    world.add(Arc::new(Translate::new(
        Arc::new(tall_box),
        Vec3::new(265.0, 0.0, 295.0),
    )));

    let short_box = make_box(Vec3::ZERO, Vec3::splat(165.0), white);
    world.add(Arc::new(Translate::new(
        Arc::new(short_box),
        Vec3::new(130.0, 0.0, 65.0),
    )));

    let mut lights = HittableList::new();
    lights.add(ceiling_light);

    let camera = CameraConfig::new()
        .with_resolution(600, 1.0)
        .with_quality(64, 50)
        .with_position(
            Vec3::new(278.0, 278.0, -800.0),
            Vec3::new(278.0, 278.0, 0.0),
            Vec3::Y,
        )
        .with_lens(40.0, 0.0, 800.0);

    Scene {
        world: BvhNode::from_list(&world),
        lights: Some(lights),
        camera,
    }
}

fn bouncing_spheres(seed: u64) -> Scene {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = HittableList::new();

    world.add(Arc::new(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        lambertian(0.5, 0.5, 0.5),
    )));

    for a in -11..11 {
        for b in -11..11 {
            let center = Vec3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );

            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let choose_mat: f32 = rng.gen();
            if choose_mat < 0.8 {
                // Diffuse, bouncing during the exposure
                let albedo = Color::new(
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                );
                let center2 = center + Vec3::new(0.0, rng.gen_range(0.0..0.5), 0.0);
                world.add(Arc::new(Sphere::new_moving(
                    center,
                    center2,
                    0.2,
                    Arc::new(Lambertian::new(albedo)),
                )));
            } else if choose_mat < 0.95 {
                let albedo = Color::new(
                    rng.gen_range(0.5..1.0),
                    rng.gen_range(0.5..1.0),
                    rng.gen_range(0.5..1.0),
                );
                let fuzz = rng.gen_range(0.0..0.5);
                world.add(Arc::new(Sphere::new(center, 0.2, Arc::new(Metal::new(albedo, fuzz)))));
            } else {
                world.add(Arc::new(Sphere::new(center, 0.2, Arc::new(Dielectric::new(1.5)))));
            }
        }
    }

    world.add(Arc::new(Sphere::new(
        Vec3::new(0.0, 1.0, 0.0),
        1.0,
        Arc::new(Dielectric::new(1.5)),
    )));
    world.add(Arc::new(Sphere::new(
        Vec3::new(-4.0, 1.0, 0.0),
        1.0,
        lambertian(0.4, 0.2, 0.1),
    )));
    world.add(Arc::new(Sphere::new(
        Vec3::new(4.0, 1.0, 0.0),
        1.0,
        Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.0)),
    )));

    let camera = CameraConfig::new()
        .with_resolution(400, 16.0 / 9.0)
        .with_quality(64, 50)
        .with_background(Color::new(0.7, 0.8, 1.0))
        .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.6, 10.0)
        .with_seed(seed);

    Scene {
        world: BvhNode::from_list(&world),
        lights: None,
        camera,
    }
}

fn quads() -> Scene {
    let mut world = HittableList::new();

    let sides = [
        // left, back, right, upper, lower
        (Vec3::new(-3.0, -2.0, 5.0), Vec3::new(0.0, 0.0, -4.0), Vec3::new(0.0, 4.0, 0.0), (1.0, 0.2, 0.2)),
        (Vec3::new(-2.0, -2.0, 0.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0), (0.2, 1.0, 0.2)),
        (Vec3::new(3.0, -2.0, 1.0), Vec3::new(0.0, 0.0, 4.0), Vec3::new(0.0, 4.0, 0.0), (0.2, 0.2, 1.0)),
        (Vec3::new(-2.0, 3.0, 1.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 4.0), (1.0, 0.5, 0.0)),
        (Vec3::new(-2.0, -3.0, 5.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -4.0), (0.2, 0.8, 0.8)),
    ];
    for (q, u, v, (r, g, b)) in sides {
        world.add(Arc::new(Quad::new(q, u, v, lambertian(r, g, b))));
    }

    let camera = CameraConfig::new()
        .with_resolution(400, 1.0)
        .with_quality(64, 50)
        .with_background(Color::new(0.7, 0.8, 1.0))
        .with_position(Vec3::new(0.0, 0.0, 9.0), Vec3::ZERO, Vec3::Y)
        .with_lens(80.0, 0.0, 9.0);

    Scene {
        world: BvhNode::from_list(&world),
        lights: None,
        camera,
    }
}
