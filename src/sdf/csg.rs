//! N-ary constructive solid geometry: union, difference, intersection, and
//! the bounding-sphere culling that keeps evaluating them sublinear in the
//! number of children.
//!
//! Every combinator here comes in two forms: a `naive_*` function that
//! always evaluates every child (the reference semantics, used to build
//! `Sdf3::distance` and as ground truth in the culling-equivalence tests)
//! and a `culled_*` function that skips a child's distance query whenever
//! its bounding sphere proves the child cannot change the running result.
//! The first child is always evaluated in both forms; culling only ever
//! applies to children after the first, matching spec.md's invariant that
//! the first child is the CSG base.
use super::Sdf3;
use crate::math::Vec3;
use std::sync::Arc;

/// Distance from `p` to a child's bounding sphere; negative when `p` is
/// inside it.
fn sphere_distance(center: Vec3, radius: f64, p: Vec3) -> f64 {
    p.sub(center).len() - radius
}

pub fn naive_union(children: &[Arc<Sdf3>], p: Vec3) -> f64 {
    children.iter().map(|c| c.distance(p)).fold(f64::INFINITY, f64::min)
}

pub fn naive_difference(children: &[Arc<Sdf3>], p: Vec3) -> f64 {
    let mut dist = children[0].distance(p);
    for child in &children[1..] {
        dist = dist.max(-child.distance(p));
    }
    dist
}

pub fn naive_intersection(children: &[Arc<Sdf3>], p: Vec3) -> f64 {
    children.iter().map(|c| c.distance(p)).fold(f64::NEG_INFINITY, f64::max)
}

pub fn culled_union(children: &[Arc<Sdf3>], p: Vec3) -> f64 {
    let mut dist = f64::INFINITY;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            let (c, r) = child.bounding_sphere();
            if sphere_distance(c, r, p) > dist {
                continue;
            }
        }
        dist = dist.min(child.distance_culled(p));
    }
    dist
}

pub fn culled_difference(children: &[Arc<Sdf3>], p: Vec3) -> f64 {
    let mut dist = children[0].distance_culled(p);
    for child in &children[1..] {
        let (c, r) = child.bounding_sphere();
        let bd = sphere_distance(c, r, p);
        if -bd < dist {
            continue;
        }
        dist = dist.max(-child.distance_culled(p));
    }
    dist
}

pub fn culled_intersection(children: &[Arc<Sdf3>], p: Vec3) -> f64 {
    let mut dist = f64::NEG_INFINITY;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            let (c, r) = child.bounding_sphere();
            if sphere_distance(c, r, p) > dist {
                continue;
            }
        }
        dist = dist.max(child.distance_culled(p));
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf;
    use rand::Rng;
    use rand::SeedableRng;

    fn random_csg_tree(rng: &mut impl Rng, depth: u32) -> Arc<Sdf3> {
        if depth == 0 || rng.gen_bool(0.4) {
            return match rng.gen_range(0..3) {
                0 => sdf::sphere(rng.gen_range(1.0..10.0)).unwrap(),
                1 => sdf::cube(
                    rng.gen_range(1.0..10.0),
                    rng.gen_range(1.0..10.0),
                    rng.gen_range(1.0..10.0),
                )
                .unwrap(),
                _ => sdf::torus(rng.gen_range(2.0..8.0), rng.gen_range(0.5..2.0)).unwrap(),
            };
        }
        let n = rng.gen_range(2..4);
        let children: Vec<_> = (0..n)
            .map(|_| {
                let c = random_csg_tree(rng, depth - 1);
                let offset = Vec3::new(
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                );
                sdf::translate(offset, c).unwrap()
            })
            .collect();
        match rng.gen_range(0..3) {
            0 => sdf::union(children).unwrap(),
            1 => sdf::difference(children).unwrap(),
            _ => sdf::intersection(children).unwrap(),
        }
    }

    #[test]
    fn culled_matches_naive_on_random_trees() {
        let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(42);
        for _ in 0..50 {
            let tree = random_csg_tree(&mut rng, 3);
            for _ in 0..50 {
                let p = Vec3::new(
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                );
                let naive = tree.distance(p);
                let culled = tree.distance_culled(p);
                assert!(
                    (naive - culled).abs() < 1e-9,
                    "naive={naive} culled={culled} at {p:?}"
                );
            }
        }
    }
}
