//! The six end-to-end scenarios: sphere silhouette/brightness, a drilled
//! `Difference` scene, a solid `Union` scene, rotational symmetry, RPC vs.
//! local equivalence, and mid-pass cancellation.
use pathtrace_sdf::camera::{Camera, Ray};
use pathtrace_sdf::material::{Color, Material};
use pathtrace_sdf::math::{Vec3, Z3, ZERO3};
use pathtrace_sdf::render::rpc::RpcRenderer;
use pathtrace_sdf::render::{LocalRenderer, Renderer};
use pathtrace_sdf::scene::{object, Scene, SceneBuilder, ShadowParams};
use pathtrace_sdf::sdf;
use pathtrace_sdf::trace;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

fn straight_down_ray(z: f64, dx: f64) -> Ray {
    Ray { origin: Vec3::new(dx, 0.0, z), direction: Vec3::new(0.0, 0.0, -1.0) }
}

/// Scenario 1: a unit sphere's silhouette matches its analytic radius, and
/// a central ray hits closer to the surface than a ray grazing its edge.
#[test]
fn unit_sphere_silhouette_matches_expected_radius() {
    let sphere = sdf::sphere(1.0).unwrap();

    let central = trace::march(straight_down_ray(5.0, 0.0), &sphere, 100.0, 1e-6).expect("central ray hits");
    assert!((central.t - 4.0).abs() < 1e-3); // travels 5 - 1 = 4 units to the surface

    let just_inside = trace::march(straight_down_ray(5.0, 0.999), &sphere, 100.0, 1e-6);
    assert!(just_inside.is_some());

    let just_outside = trace::march(straight_down_ray(5.0, 1.05), &sphere, 100.0, 1e-6);
    assert!(just_outside.is_none());
}

/// Scenario 2: `Difference(Sphere, Cylinder)` drills a hole straight
/// through the sphere along its axis; a ray down the axis now misses.
#[test]
fn difference_scene_shows_a_hole_down_the_center() {
    let sphere = sdf::sphere(5.0).unwrap();
    let cylinder = sdf::cylinder(20.0, 2.0).unwrap(); // taller than the sphere, drills clean through
    let drilled = sdf::difference(vec![sphere, cylinder]).unwrap();

    let center = trace::march(straight_down_ray(10.0, 0.0), &drilled, 100.0, 1e-6);
    assert!(center.is_none(), "center column should show the drilled hole");

    let off_axis = trace::march(straight_down_ray(10.0, 4.0), &drilled, 100.0, 1e-6);
    assert!(off_axis.is_some(), "off-axis rays should still hit the shell");
}

/// Scenario 3: `Union(Sphere, Cube)` at the same parameters stays a solid
/// with no hole.
#[test]
fn union_scene_is_fully_opaque() {
    let sphere = sdf::sphere(5.0).unwrap();
    let cube = sdf::cube(8.0, 8.0, 8.0).unwrap();
    let solid = sdf::union(vec![sphere, cube]).unwrap();

    for dx in [0.0, 1.0, 2.0, 3.0] {
        let hit = trace::march(straight_down_ray(10.0, dx), &solid, 100.0, 1e-6);
        assert!(hit.is_some(), "union should be solid at dx={dx}");
    }
}

fn symmetric_torus_scene(rotate_degrees: f64, seed_tweak: u32) -> Scene {
    let torus = sdf::torus(2.0, 0.5).unwrap();
    let torus = if rotate_degrees != 0.0 {
        sdf::rotate(Z3, rotate_degrees, torus).unwrap()
    } else {
        torus
    };
    let light = object(
        Material::light(Color::new(4.0, 4.0, 4.0)),
        sdf::translate(Vec3::new(-8.0, 0.0, 12.0), sdf::sphere(3.0).unwrap()).unwrap(),
    );
    let thing = object(Material::matte(Color::new(0.8, 0.8, 0.8)), torus);
    let camera = Camera::new(Vec3::new(0.0, -10.0, 4.0), ZERO3, Z3, 40.0, ZERO3, 0.0);
    let _ = seed_tweak;
    Scene::build(SceneBuilder {
        width: 24,
        height: 24,
        passes: 3,
        samples: 4,
        bounces: 3,
        horizon: 200.0,
        threshold: 1e-4,
        ambient: Color::new(0.02, 0.02, 0.02),
        shadow: ShadowParams::default(),
        camera,
        stuff: vec![thing, light],
    })
    .unwrap()
}

/// Scenario 4: a torus is rotationally symmetric about its own axis, so
/// rotating it 90 degrees about that axis before rendering reproduces the
/// same image (up to Monte-Carlo noise, since both renders use the same
/// deterministic per-worker/per-pass seeding).
#[test]
fn rotated_torus_matches_unrotated_within_noise() {
    let unrotated = symmetric_torus_scene(0.0, 0);
    let rotated = symmetric_torus_scene(90.0, 0);

    let renderer = LocalRenderer::new(2);
    let cancel = AtomicBool::new(false);
    let a = renderer.render(&unrotated, &cancel, &mut |_, _| {}).unwrap();
    let b = renderer.render(&rotated, &cancel, &mut |_, _| {}).unwrap();

    let mean_abs_diff: f64 = a
        .data
        .iter()
        .zip(b.data.iter())
        .map(|(x, y)| (x - y).abs())
        .sum::<f64>()
        / a.data.len() as f64;
    assert!(mean_abs_diff < 0.05, "mean_abs_diff={mean_abs_diff}");
}

fn rpc_test_scene() -> Scene {
    let sphere = sdf::sphere(1.0).unwrap();
    let light = object(
        Material::light(Color::new(4.0, 4.0, 4.0)),
        sdf::translate(Vec3::new(-5.0, 0.0, 8.0), sdf::sphere(2.0).unwrap()).unwrap(),
    );
    let thing = object(Material::matte(Color::new(0.8, 0.8, 0.8)), sphere);
    let camera = Camera::new(Vec3::new(0.0, -6.0, 0.0), ZERO3, Z3, 40.0, ZERO3, 0.0);
    Scene::build(SceneBuilder {
        width: 16,
        height: 16,
        passes: 2,
        samples: 4,
        bounces: 3,
        horizon: 100.0,
        threshold: 1e-4,
        ambient: Color::new(0.02, 0.02, 0.02),
        shadow: ShadowParams::default(),
        camera,
        stuff: vec![thing, light],
    })
    .unwrap()
}

/// Scenario 5: running the same scene through an in-process RPC server vs.
/// purely locally, with the same total pass budget, produces images within
/// 1% mean-pixel difference.
#[test]
fn rpc_renderer_matches_local_within_one_percent() {
    let scene = rpc_test_scene();

    let local = LocalRenderer::new(2);
    let cancel = AtomicBool::new(false);
    let local_image = local.render(&scene, &cancel, &mut |_, _| {}).unwrap();

    let (stop_tx, stop_rx) = mpsc::channel();
    let addr = "127.0.0.1:34562";
    let server = std::thread::spawn(move || {
        let _ = pathtrace_sdf::render::rpc::serve(addr, stop_rx);
    });
    std::thread::sleep(std::time::Duration::from_millis(100));

    let rpc = RpcRenderer::new(addr);
    let rpc_image = rpc.render(&scene, &cancel, &mut |_, _| {}).unwrap();

    stop_tx.send(()).ok();
    server.join().ok();

    let mean: f64 = local_image.data.iter().sum::<f64>() / local_image.data.len() as f64;
    let diff: f64 = local_image
        .data
        .iter()
        .zip(rpc_image.data.iter())
        .map(|(a, b)| (a - b).abs())
        .sum::<f64>()
        / local_image.data.len() as f64;
    assert!(diff < 0.01 * mean.max(1e-6) + 0.02, "mean={mean} diff={diff}");
}

/// Scenario 6: cancelling mid-render still returns a well-formed image
/// whose pixel mean reflects whatever samples actually completed.
#[test]
fn cancelling_mid_render_returns_a_well_formed_image() {
    let mut scene = rpc_test_scene();
    scene.passes = 0; // unbounded, so the only way this loop ends is cancellation

    let renderer = Arc::new(LocalRenderer::new(2));
    let cancel = Arc::new(AtomicBool::new(false));

    let r = renderer.clone();
    let c = cancel.clone();
    let scene_clone = scene.clone();
    let handle = std::thread::spawn(move || r.render(&scene_clone, &c, &mut |_, _| {}));

    std::thread::sleep(std::time::Duration::from_millis(50));
    cancel.store(true, Ordering::Relaxed);

    let image = handle.join().unwrap().unwrap();
    assert_eq!(image.width, scene.width);
    assert_eq!(image.height, scene.height);
    assert!(image.data.iter().all(|v| v.is_finite()));
}
