//! Analytic distance functions for the primitive shapes a scene is built
//! from. Each primitive is a plain data struct; the closed-form distance and
//! bounding-sphere formulas below are what `Sdf3::Primitive` dispatches to.
//!
//! Distances are exact Euclidean for the smooth primitives (sphere, torus,
//! capsule/round-cone) and a conservative max-of-clipped-component
//! underestimate for the flat-faced ones (cube, cylinder, cone, pyramid),
//! matching the convention used throughout Inigo Quilez' distance function
//! articles, which this module's formulas are drawn from.
use crate::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    /// Sphere of the given radius, centered at the origin.
    Sphere { r: f64 },
    /// Axis-aligned box with the given full side lengths.
    Cube { x: f64, y: f64, z: f64 },
    /// Capped cylinder along the Z axis, `h` is the full height.
    Cylinder { h: f64, r: f64 },
    /// Solid cone, apex at `(0,0,h)`, base circle of radius `r` at `z=0`.
    Cone { h: f64, r: f64 },
    /// Torus lying on the XY plane, revolved around Z. `r` is the
    /// major (ring) radius, `thickness` the minor (tube) radius.
    Torus { r: f64, thickness: f64 },
    /// Round cone / capsule from `(0,0,0)` (radius `r1`) to `(0,0,h)`
    /// (radius `r2`), along Z.
    Capsule { h: f64, r1: f64, r2: f64 },
    /// Square pyramid, base half-width `base/2` centered at the origin on
    /// the XY plane, apex at `(0,0,h)`.
    Pyramid { h: f64, base: f64 },
    /// A 2-D SDF swept along Z by `+-h`.
    Extrude { h: f64, profile: Sdf2 },
    /// A 2-D SDF revolved around Z, offset radially by `offset`.
    Revolve { offset: f64, profile: Sdf2 },
}

impl Primitive {
    pub fn distance(&self, p: Vec3) -> f64 {
        match *self {
            Primitive::Sphere { r } => sd_sphere(p, r),
            Primitive::Cube { x, y, z } => sd_cube(p, Vec3::new(x, y, z).scale(0.5)),
            Primitive::Cylinder { h, r } => sd_capped_cylinder(p, h * 0.5, r),
            Primitive::Cone { h, r } => sd_cone(p, r, h),
            Primitive::Torus { r, thickness } => sd_torus(p, r, thickness),
            Primitive::Capsule { h, r1, r2 } => sd_round_cone(p, r1, r2, h),
            Primitive::Pyramid { h, base } => sd_pyramid(p, h, base * 0.5),
            Primitive::Extrude { h, ref profile } => {
                let d2 = profile.distance(Vec2::new(p.x, p.y));
                let w = Vec2::new(d2, p.z.abs() - h);
                w.x.max(w.y).min(0.0) + w.max(Vec2::new(0.0, 0.0)).len()
            }
            Primitive::Revolve { offset, ref profile } => {
                let radial = Vec2::new(p.x, p.y).len() - offset;
                profile.distance(Vec2::new(radial, p.z))
            }
        }
    }

    /// Conservative bounding sphere, centered so that it encloses the whole
    /// zero-level set with margin to spare.
    pub fn bounding_sphere(&self) -> (Vec3, f64) {
        match *self {
            Primitive::Sphere { r } => (Vec3::new(0.0, 0.0, 0.0), r),
            Primitive::Cube { x, y, z } => {
                let half = Vec3::new(x, y, z).scale(0.5);
                (Vec3::new(0.0, 0.0, 0.0), half.len())
            }
            Primitive::Cylinder { h, r } => {
                let hh = h * 0.5;
                (Vec3::new(0.0, 0.0, 0.0), (r * r + hh * hh).sqrt())
            }
            Primitive::Cone { h, r } => {
                let hh = h * 0.5;
                (Vec3::new(0.0, 0.0, hh), (r * r + hh * hh).sqrt())
            }
            Primitive::Torus { r, thickness } => (Vec3::new(0.0, 0.0, 0.0), r + thickness),
            Primitive::Capsule { h, r1, r2 } => {
                let hh = h * 0.5;
                let rmax = r1.max(r2);
                (Vec3::new(0.0, 0.0, hh), (hh * hh + rmax * rmax).sqrt())
            }
            Primitive::Pyramid { h, base } => {
                let hh = h * 0.5;
                let diag = base * std::f64::consts::SQRT_2 * 0.5;
                (Vec3::new(0.0, 0.0, hh), (hh * hh + diag * diag).sqrt())
            }
            Primitive::Extrude { h, ref profile } => {
                let (c2, r2) = profile.bounding_circle();
                (Vec3::new(c2.x, c2.y, 0.0), (h * h + r2 * r2).sqrt())
            }
            Primitive::Revolve { offset, ref profile } => {
                let (c2, r2) = profile.bounding_circle();
                let radial_extent = offset.abs() + c2.x.abs() + r2;
                (Vec3::new(0.0, 0.0, c2.y), radial_extent.max(r2))
            }
        }
    }
}

fn sd_sphere(p: Vec3, r: f64) -> f64 {
    p.len() - r
}

fn sd_cube(p: Vec3, half: Vec3) -> f64 {
    let d = p.abs().sub(half);
    d.max(Vec3::new(0.0, 0.0, 0.0)).len() + d.x.max(d.y).max(d.z).min(0.0)
}

fn sd_capped_cylinder(p: Vec3, half_h: f64, r: f64) -> f64 {
    let d = Vec2::new(Vec2::new(p.x, p.y).len() - r, p.z.abs() - half_h);
    d.x.max(d.y).min(0.0) + d.max(Vec2::new(0.0, 0.0)).len()
}

fn clamp01(x: f64) -> f64 {
    x.max(0.0).min(1.0)
}

/// Exact solid cone, apex at `(0,0,h)`, base radius `r` at `z=0`. Ported from
/// Inigo Quilez' "Cone - exact" distance function article.
fn sd_cone(p: Vec3, r: f64, h: f64) -> f64 {
    let q = Vec2::new(r, h);
    let w = Vec2::new(Vec2::new(p.x, p.y).len(), p.z);
    let wq = w.dot(q) / q.dot(q);
    let a = w.sub(Vec2::new(q.x * clamp01(wq), q.y * clamp01(wq)));
    let t = clamp01(w.x / q.x);
    let b = w.sub(Vec2::new(q.x * t, q.y));
    let k = q.y.signum();
    let d = a.dot(a).min(b.dot(b));
    let s = (k * (w.x * q.y - w.y * q.x)).max(k * (w.y - q.y));
    d.sqrt() * s.signum()
}

fn sd_torus(p: Vec3, r: f64, thickness: f64) -> f64 {
    let q = Vec2::new(Vec2::new(p.x, p.y).len() - r, p.z);
    q.len() - thickness
}

/// Exact round cone (capsule with independently sized ends) from `(0,0,0)`
/// radius `r1` to `(0,0,h)` radius `r2`. Ported from Inigo Quilez'
/// "Round Cone - exact" article.
fn sd_round_cone(p: Vec3, r1: f64, r2: f64, h: f64) -> f64 {
    let q = Vec2::new(Vec2::new(p.x, p.y).len(), p.z);
    let b = (r1 - r2) / h;
    let a = (1.0 - b * b).max(0.0).sqrt();
    let k = q.dot(Vec2::new(-b, a));
    if k < 0.0 {
        return q.len() - r1;
    }
    if k > a * h {
        return q.sub(Vec2::new(0.0, h)).len() - r2;
    }
    q.dot(Vec2::new(a, b)) - r1
}

/// Square pyramid as the intersection of the four slanted side faces and
/// the base plane, in the same max-of-planes style as `sd_cube`. `half_base`
/// is the half-width of the square base.
fn sd_pyramid(p: Vec3, h: f64, half_base: f64) -> f64 {
    let l = (h * h + half_base * half_base).sqrt();
    let face = |u: f64, sign: f64| -> f64 { (h * (u * sign - half_base) + half_base * p.z) / l };
    let dx_pos = face(p.x, 1.0);
    let dx_neg = face(p.x, -1.0);
    let dy_pos = face(p.y, 1.0);
    let dy_neg = face(p.y, -1.0);
    let sides = dx_pos.max(dx_neg).max(dy_pos).max(dy_neg);
    sides.max(-p.z)
}

/// A 2-D signed distance field, used as the cross-section for `Extrude` and
/// the profile for `Revolve`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Sdf2 {
    Circle { r: f64 },
    Rect { half: Vec2 },
    /// A regular `n`-sided polygon with circumradius `r`, used as the
    /// profile that `Extrude` lifts into a 3-D prism.
    Polygon { n: u32, r: f64 },
    /// A parabola `y = k*x^2`, clipped to `|y| <= height`. Grounded on the
    /// `Parabola`/`parabolicBowl` helper in the original source, used there
    /// to build a revolved dish shape.
    Parabola { k: f64, height: f64 },
}

impl Sdf2 {
    pub fn distance(&self, p: Vec2) -> f64 {
        match *self {
            Sdf2::Circle { r } => p.len() - r,
            Sdf2::Rect { half } => {
                let d = p.abs().sub(half);
                d.max(Vec2::new(0.0, 0.0)).len() + d.max_component().min(0.0)
            }
            Sdf2::Polygon { n, r } => sd_regular_polygon(p, n, r),
            Sdf2::Parabola { k, height } => {
                let bowl = sd_parabola(p, k);
                // clip the infinite parabola to a finite dish of the given
                // height by intersecting with a half-plane at y = height.
                bowl.max(p.y - height)
            }
        }
    }

    /// Conservative bounding circle of the profile, used to derive the
    /// bounding sphere of the `Extrude`/`Revolve` primitive that consumes it.
    pub fn bounding_circle(&self) -> (Vec2, f64) {
        match *self {
            Sdf2::Circle { r } => (Vec2::new(0.0, 0.0), r),
            Sdf2::Rect { half } => (Vec2::new(0.0, 0.0), half.len()),
            Sdf2::Polygon { r, .. } => (Vec2::new(0.0, 0.0), r),
            Sdf2::Parabola { k, height } => {
                let half_width = (height / k.max(1e-12)).sqrt();
                let center = Vec2::new(0.0, height * 0.5);
                let radius = Vec2::new(half_width, height * 0.5).len() * 1.5 + 1.0;
                (center, radius)
            }
        }
    }
}

/// Approximate distance to a regular `n`-gon with circumradius `r`, via
/// angular folding into the nearest wedge and measuring the perpendicular
/// distance to that wedge's edge.
fn sd_regular_polygon(p: Vec2, n: u32, r: f64) -> f64 {
    let an = std::f64::consts::PI / (n.max(3) as f64);
    let mut a = p.y.atan2(p.x).abs() % (2.0 * an);
    if a > an {
        a = 2.0 * an - a;
    }
    p.len() * a.cos() - r * an.cos()
}

/// Exact signed distance to the parabola `y = k*x^2`, via Cardano's method.
/// Ported from Inigo Quilez' "2D distance functions" article.
fn sd_parabola(pos: Vec2, k: f64) -> f64 {
    let pos = Vec2::new(pos.x.abs(), pos.y);
    let ik = 1.0 / k;
    let p = ik * (pos.y - 0.5 * ik) / 3.0;
    let q = 0.25 * ik * ik * pos.x;
    let h = q * q - p * p * p;
    let r = h.abs().sqrt();
    let x = if h > 0.0 {
        cbrt(q + r) - cbrt((q - r).abs()) * (r - q).signum()
    } else {
        2.0 * (r.atan2(q) / 3.0).cos() * p.max(0.0).sqrt()
    };
    let closest = Vec2::new(x, k * x * x);
    (pos.sub(closest)).len() * (pos.y - k * x * x).signum()
}

fn cbrt(x: f64) -> f64 {
    x.signum() * x.abs().powf(1.0 / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn sphere_sign_correctness() {
        let s = Primitive::Sphere { r: 2.0 };
        assert!(s.distance(Vec3::new(0.0, 0.0, 0.0)) < 0.0);
        assert!(s.distance(Vec3::new(5.0, 0.0, 0.0)) > 0.0);
        assert_approx_eq!(s.distance(Vec3::new(2.0, 0.0, 0.0)), 0.0, 1e-9);
    }

    #[test]
    fn cube_sign_correctness() {
        let c = Primitive::Cube { x: 2.0, y: 2.0, z: 2.0 };
        assert!(c.distance(Vec3::new(0.0, 0.0, 0.0)) < 0.0);
        assert!(c.distance(Vec3::new(2.0, 2.0, 2.0)) > 0.0);
    }

    #[test]
    fn torus_sign_correctness() {
        let t = Primitive::Torus { r: 3.0, thickness: 1.0 };
        // on the ring centerline, at the surface of the tube
        assert_approx_eq!(t.distance(Vec3::new(4.0, 0.0, 0.0)), 0.0, 1e-9);
        assert!(t.distance(Vec3::new(3.0, 0.0, 0.0)) < 0.0);
        assert!(t.distance(Vec3::new(0.0, 0.0, 0.0)) > 0.0);
    }

    #[test]
    fn cone_apex_and_base_are_on_surface() {
        let c = Primitive::Cone { h: 4.0, r: 2.0 };
        assert_approx_eq!(c.distance(Vec3::new(0.0, 0.0, 4.0)), 0.0, 1e-6);
        assert!(c.distance(Vec3::new(0.0, 0.0, 2.0)) < 0.0);
    }

    #[test]
    fn round_cone_endpoints() {
        let c = Primitive::Capsule { h: 10.0, r1: 2.0, r2: 1.0 };
        assert_approx_eq!(c.distance(Vec3::new(2.0, 0.0, 0.0)), 0.0, 1e-9);
        assert_approx_eq!(c.distance(Vec3::new(0.0, 1.0, 10.0)), 0.0, 1e-9);
    }

    #[test]
    fn extrude_matches_max_combination() {
        let prim = Primitive::Extrude {
            h: 1.0,
            profile: Sdf2::Circle { r: 1.0 },
        };
        let p = Vec3::new(0.0, 0.0, 0.0);
        assert!(prim.distance(p) < 0.0);
        let outside = Vec3::new(0.0, 0.0, 5.0);
        assert!(prim.distance(outside) > 0.0);
    }

    #[test]
    fn revolve_matches_profile_at_offset() {
        let prim = Primitive::Revolve {
            offset: 2.0,
            profile: Sdf2::Circle { r: 0.5 },
        };
        // point at radial distance 2 from axis, z=0 sits at profile-local origin
        assert!(prim.distance(Vec3::new(2.0, 0.0, 0.0)) < 0.0);
        assert!(prim.distance(Vec3::new(0.0, 0.0, 0.0)) > 0.0);
    }

    #[test]
    fn bounding_spheres_are_conservative_for_sphere() {
        let s = Primitive::Sphere { r: 5.0 };
        let (c, r) = s.bounding_sphere();
        assert_approx_eq!(c.len(), 0.0, 1e-12);
        assert_approx_eq!(r, 5.0, 1e-12);
    }
}
