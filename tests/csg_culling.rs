//! Culling-vs-naive fuzzing at the integration level: builds larger, more
//! varied CSG trees than the unit test living alongside `sdf::csg` and
//! checks the bounding-sphere-culled evaluator never disagrees with the
//! always-evaluate reference one.
use pathtrace_sdf::math::Vec3;
use pathtrace_sdf::sdf::{self, Sdf3};
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn random_tree(rng: &mut impl Rng, depth: u32) -> Arc<Sdf3> {
    if depth == 0 || rng.gen_bool(0.35) {
        return match rng.gen_range(0..4) {
            0 => sdf::sphere(rng.gen_range(0.5..6.0)).unwrap(),
            1 => sdf::cube(rng.gen_range(0.5..6.0), rng.gen_range(0.5..6.0), rng.gen_range(0.5..6.0)).unwrap(),
            2 => sdf::cylinder(rng.gen_range(1.0..5.0), rng.gen_range(0.5..3.0)).unwrap(),
            _ => sdf::capsule(rng.gen_range(1.0..5.0), rng.gen_range(0.5..2.0), rng.gen_range(0.5..2.0)).unwrap(),
        };
    }
    let n = rng.gen_range(2..5);
    let children: Vec<_> = (0..n)
        .map(|_| {
            let child = random_tree(rng, depth - 1);
            let offset =
                Vec3::new(rng.gen_range(-8.0..8.0), rng.gen_range(-8.0..8.0), rng.gen_range(-8.0..8.0));
            let translated = sdf::translate(offset, child).unwrap();
            if rng.gen_bool(0.3) {
                sdf::scale(rng.gen_range(0.5..2.0), translated).unwrap()
            } else {
                translated
            }
        })
        .collect();
    match rng.gen_range(0..3) {
        0 => sdf::union(children).unwrap(),
        1 => sdf::difference(children).unwrap(),
        _ => sdf::intersection(children).unwrap(),
    }
}

#[test]
fn culled_evaluator_matches_naive_across_deep_varied_trees() {
    let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(777);
    for _ in 0..30 {
        let tree = random_tree(&mut rng, 4);
        for _ in 0..100 {
            let p = Vec3::new(
                rng.gen_range(-25.0..25.0),
                rng.gen_range(-25.0..25.0),
                rng.gen_range(-25.0..25.0),
            );
            let naive = tree.distance(p);
            let culled = tree.distance_culled(p);
            assert!((naive - culled).abs() < 1e-8, "naive={naive} culled={culled} p={p:?}");
        }
    }
}
