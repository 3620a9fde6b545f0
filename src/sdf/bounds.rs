//! Bounding-sphere construction for composite nodes.
//!
//! The original implementation grows a sphere centered at the centroid of
//! the children's centers by repeatedly adding `1.0` to its radius until all
//! six axis-extreme points of every child sphere are enclosed — correct, but
//! `O(children * growth_iterations)`. Per the redesign notes this crate uses
//! a closed-form "bounding sphere of spheres" merge instead: fold the
//! children's bounding spheres together two at a time, each merge computed
//! in constant time and guaranteed to enclose both inputs exactly.
use crate::math::Vec3;

/// The smallest sphere that is guaranteed to enclose both `a` and `b`.
fn merge(a: (Vec3, f64), b: (Vec3, f64)) -> (Vec3, f64) {
    let (ca, ra) = a;
    let (cb, rb) = b;
    let diff = cb.sub(ca);
    let d = diff.len();

    if d + rb <= ra {
        return (ca, ra);
    }
    if d + ra <= rb {
        return (cb, rb);
    }

    let new_r = (ra + rb + d) * 0.5;
    if d < 1e-12 {
        // concentric (or degenerate-distance) spheres: no direction to grow
        // toward, so keep the existing center and just take the larger radius.
        return (ca, new_r);
    }
    let new_c = ca.add(diff.scale((new_r - ra) / d));
    (new_c, new_r)
}

/// Folds a list of child bounding spheres into one conservative bounding
/// sphere for the composite node. Panics on an empty slice; CSG nodes always
/// have at least one child by construction (`Sdf3::union`/etc. validate
/// this).
pub fn bounding_sphere_of(children: &[(Vec3, f64)]) -> (Vec3, f64) {
    let mut acc = children[0];
    for &c in &children[1..] {
        acc = merge(acc, c);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_encloses_both_inputs() {
        let a = (Vec3::new(0.0, 0.0, 0.0), 1.0);
        let b = (Vec3::new(5.0, 0.0, 0.0), 2.0);
        let (c, r) = merge(a, b);
        assert!(a.1 <= a.0.sub(c).len() + r + 1e-9);
        assert!((a.0.sub(c).len() + a.1) <= r + 1e-9);
        assert!((b.0.sub(c).len() + b.1) <= r + 1e-9);
    }

    #[test]
    fn folding_many_spheres_stays_conservative() {
        let spheres: Vec<(Vec3, f64)> = (0..8)
            .map(|i| (Vec3::new(i as f64 * 3.0, (i % 3) as f64 * 2.0, 0.0), 1.0 + (i as f64) * 0.1))
            .collect();
        let (c, r) = bounding_sphere_of(&spheres);
        for &(sc, sr) in &spheres {
            let d = sc.sub(c).len();
            assert!(d + sr <= r + 1e-6, "child sphere not enclosed: d={d} sr={sr} r={r}");
        }
    }
}
