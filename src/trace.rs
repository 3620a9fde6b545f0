//! Sphere marching: the ray/surface intersector that walks a ray through
//! the scene's combined SDF, plus the central-difference normal estimator
//! and per-hit material lookup that sit on top of it.
use crate::camera::Ray;
use crate::math::Vec3;
use crate::scene::Thing;
use crate::sdf::Sdf3;

/// Maximum number of marching steps before a ray that never converges is
/// treated as a miss (spec.md §4.D: "Maximum iterations bounded... to
/// guarantee termination for grazing rays").
pub const MAX_MARCH_STEPS: u32 = 256;

#[derive(Clone, Copy, Debug)]
pub struct Hit {
    pub t: f64,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Marches `ray` against `root` until the distance drops below
/// `threshold` (a hit) or the accumulated distance exceeds `horizon` or the
/// step budget is exhausted (both misses). Spec.md §4.D's algorithm,
/// verbatim.
pub fn march(ray: Ray, root: &Sdf3, horizon: f64, threshold: f64) -> Option<Hit> {
    let mut t = 0.0;
    for _ in 0..MAX_MARCH_STEPS {
        let p = ray.origin.add(ray.direction.scale(t));
        let d = root.distance_culled(p);
        if d < threshold {
            let normal = estimate_normal(root, p, threshold);
            return Some(Hit { t, point: p, normal });
        }
        t += d;
        if t > horizon {
            return None;
        }
    }
    None
}

/// Central-difference gradient estimate of `root` around `p`, normalized to
/// a unit vector. `eps` is derived from the march threshold so that it
/// scales with the precision the caller is already working at.
pub fn estimate_normal(root: &Sdf3, p: Vec3, threshold: f64) -> Vec3 {
    let eps = (threshold * 0.5).max(1e-6);
    let dx = Vec3::new(eps, 0.0, 0.0);
    let dy = Vec3::new(0.0, eps, 0.0);
    let dz = Vec3::new(0.0, 0.0, eps);
    let grad = Vec3::new(
        root.distance_culled(p.add(dx)) - root.distance_culled(p.sub(dx)),
        root.distance_culled(p.add(dy)) - root.distance_culled(p.sub(dy)),
        root.distance_culled(p.add(dz)) - root.distance_culled(p.sub(dz)),
    );
    grad.unit()
}

/// Finds which `Thing` owns a hit point: the scene is the union of every
/// `Thing`'s own SDF, so the owner is whichever one reports the smallest
/// (closest to zero, i.e. we're standing on it) distance at that point.
/// Spec.md §4.D.
pub fn find_owner<'a>(things: &'a [Thing], point: Vec3) -> &'a Thing {
    things
        .iter()
        .min_by(|a, b| {
            a.sdf
                .distance_culled(point)
                .partial_cmp(&b.sdf.distance_culled(point))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .expect("scene must have at least one Thing")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf;

    #[test]
    fn march_hits_sphere_head_on() {
        let root = sdf::sphere(1.0).unwrap();
        let ray = Ray { origin: Vec3::new(0.0, 0.0, -5.0), direction: Vec3::new(0.0, 0.0, 1.0) };
        let hit = march(ray, &root, 1000.0, 1e-4).expect("should hit");
        assert!((hit.t - 4.0).abs() < 1e-2);
        assert!(hit.normal.z < 0.0);
    }

    #[test]
    fn march_misses_beyond_horizon() {
        let root = sdf::sphere(1.0).unwrap();
        let ray = Ray { origin: Vec3::new(0.0, 0.0, -5.0), direction: Vec3::new(0.0, 1.0, 0.0) };
        assert!(march(ray, &root, 1000.0, 1e-4).is_none());
    }
}
