//! The SDF tree: primitives (`primitives`), unary combinators
//! (`combinators`), n-ary CSG (`csg`), and bounding-sphere construction
//! (`bounds`).
//!
//! `Sdf3` is both the scene-construction representation and the evaluator
//! the integrator's hot loop calls directly — a tagged union with shared
//! children (`Arc`, never deep-copied on reuse) and an eagerly-cached
//! bounding sphere at every node, since the tree is immutable once built.
//! `distance` is a plain recursive match that always visits every CSG
//! child; it exists as ground truth for tests. `distance_culled` has
//! identical semantics but applies the bounding-sphere culling described in
//! the module docs on `csg`, and is what the integrator actually calls.
pub mod bounds;
pub mod combinators;
pub mod csg;
pub mod primitives;

pub use primitives::{Primitive, Sdf2};

use crate::error::SceneError;
use crate::math::Vec3;
use combinators::{Distort, Elongate, Mirror, Repeat, Round, Scale, Transform};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A node in the SDF tree. Every variant is conceptually `(payload, inner
/// children, cached bounding sphere)`; see the module doc for why the
/// bounding sphere is cached rather than recomputed. Derives `Serialize`
/// so a `Scene` can be sent whole across the RPC wire (serde's `rc`
/// feature handles the shared `Arc<Sdf3>` children without deep-copying on
/// the sending side; the receiving side gets a fresh, unshared tree, which
/// is fine since a deserialized scene is never compared by pointer).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Sdf3 {
    Primitive(Primitive, (Vec3, f64)),
    Transform(Arc<Sdf3>, Transform, (Vec3, f64)),
    Scale(Arc<Sdf3>, Scale, (Vec3, f64)),
    Distort(Arc<Sdf3>, Distort, (Vec3, f64)),
    Mirror(Arc<Sdf3>, Mirror, (Vec3, f64)),
    Round(Arc<Sdf3>, Round, (Vec3, f64)),
    Elongate(Arc<Sdf3>, Elongate, (Vec3, f64)),
    Repeat(Arc<Sdf3>, Repeat, (Vec3, f64)),
    Union(Vec<Arc<Sdf3>>, (Vec3, f64)),
    Difference(Vec<Arc<Sdf3>>, (Vec3, f64)),
    Intersection(Vec<Arc<Sdf3>>, (Vec3, f64)),
}

impl Sdf3 {
    pub fn bounding_sphere(&self) -> (Vec3, f64) {
        match self {
            Sdf3::Primitive(_, b)
            | Sdf3::Transform(_, _, b)
            | Sdf3::Scale(_, _, b)
            | Sdf3::Distort(_, _, b)
            | Sdf3::Mirror(_, _, b)
            | Sdf3::Round(_, _, b)
            | Sdf3::Elongate(_, _, b)
            | Sdf3::Repeat(_, _, b)
            | Sdf3::Union(_, b)
            | Sdf3::Difference(_, b)
            | Sdf3::Intersection(_, b) => *b,
        }
    }

    /// Reference distance evaluator: always visits every child, never culls.
    /// Used to build `Compiled` and as the ground truth in the culling
    /// equivalence tests.
    pub fn distance(&self, p: Vec3) -> f64 {
        match self {
            Sdf3::Primitive(prim, _) => prim.distance(p),
            Sdf3::Transform(inner, t, _) => inner.distance(t.to_local(p)),
            Sdf3::Scale(inner, s, _) => s.adjust_distance(inner.distance(s.to_local(p))),
            Sdf3::Distort(inner, d, _) => d.adjust_distance(inner.distance(d.to_local(p))),
            Sdf3::Mirror(inner, m, _) => inner.distance(m.to_local(p)),
            Sdf3::Round(inner, r, _) => r.adjust_distance(inner.distance(p)),
            Sdf3::Elongate(inner, e, _) => inner.distance(e.to_local(p)),
            Sdf3::Repeat(inner, r, _) => inner.distance(r.to_local(p)),
            Sdf3::Union(children, _) => {
                children.iter().map(|c| c.distance(p)).fold(f64::INFINITY, f64::min)
            }
            Sdf3::Difference(children, _) => csg::naive_difference(children, p),
            Sdf3::Intersection(children, _) => {
                children.iter().map(|c| c.distance(p)).fold(f64::NEG_INFINITY, f64::max)
            }
        }
    }

    /// The evaluator the integrator actually calls: identical semantics to
    /// `distance`, but CSG nodes skip a child's distance query whenever its
    /// cached bounding sphere proves it can't affect the running result
    /// (spec.md §4.C). Non-CSG nodes have nothing to cull and just recurse.
    pub fn distance_culled(&self, p: Vec3) -> f64 {
        match self {
            Sdf3::Primitive(prim, _) => prim.distance(p),
            Sdf3::Transform(inner, t, _) => inner.distance_culled(t.to_local(p)),
            Sdf3::Scale(inner, s, _) => s.adjust_distance(inner.distance_culled(s.to_local(p))),
            Sdf3::Distort(inner, d, _) => d.adjust_distance(inner.distance_culled(d.to_local(p))),
            Sdf3::Mirror(inner, m, _) => inner.distance_culled(m.to_local(p)),
            Sdf3::Round(inner, r, _) => r.adjust_distance(inner.distance_culled(p)),
            Sdf3::Elongate(inner, e, _) => inner.distance_culled(e.to_local(p)),
            Sdf3::Repeat(inner, r, _) => inner.distance_culled(r.to_local(p)),
            Sdf3::Union(children, _) => csg::culled_union(children, p),
            Sdf3::Difference(children, _) => csg::culled_difference(children, p),
            Sdf3::Intersection(children, _) => csg::culled_intersection(children, p),
        }
    }
}

// --- Builder API -----------------------------------------------------------
//
// Every constructor validates its parameters and fails at construction
// (spec error kind 1/2) rather than ever producing a malformed node; the
// bounding sphere for the new node is computed once, here, and baked in.

pub fn sphere(r: f64) -> Result<Arc<Sdf3>, SceneError> {
    require_positive("Sphere.r", r)?;
    let prim = Primitive::Sphere { r };
    Ok(leaf(prim))
}

pub fn cube(x: f64, y: f64, z: f64) -> Result<Arc<Sdf3>, SceneError> {
    require_positive("Cube.x", x)?;
    require_positive("Cube.y", y)?;
    require_positive("Cube.z", z)?;
    Ok(leaf(Primitive::Cube { x, y, z }))
}

pub fn cylinder(h: f64, r: f64) -> Result<Arc<Sdf3>, SceneError> {
    require_positive("Cylinder.h", h)?;
    require_positive("Cylinder.r", r)?;
    Ok(leaf(Primitive::Cylinder { h, r }))
}

pub fn cone(h: f64, r: f64) -> Result<Arc<Sdf3>, SceneError> {
    require_positive("Cone.h", h)?;
    require_positive("Cone.r", r)?;
    Ok(leaf(Primitive::Cone { h, r }))
}

pub fn torus(r: f64, thickness: f64) -> Result<Arc<Sdf3>, SceneError> {
    require_positive("Torus.r", r)?;
    require_positive("Torus.thickness", thickness)?;
    Ok(leaf(Primitive::Torus { r, thickness }))
}

pub fn capsule(h: f64, r1: f64, r2: f64) -> Result<Arc<Sdf3>, SceneError> {
    require_positive("Capsule.h", h)?;
    require_positive("Capsule.r1", r1)?;
    require_positive("Capsule.r2", r2)?;
    Ok(leaf(Primitive::Capsule { h, r1, r2 }))
}

pub fn pyramid(h: f64, base: f64) -> Result<Arc<Sdf3>, SceneError> {
    require_positive("Pyramid.h", h)?;
    require_positive("Pyramid.base", base)?;
    Ok(leaf(Primitive::Pyramid { h, base }))
}

pub fn extrude(h: f64, profile: Sdf2) -> Result<Arc<Sdf3>, SceneError> {
    require_positive("Extrude.h", h)?;
    Ok(leaf(Primitive::Extrude { h, profile }))
}

pub fn revolve(offset: f64, profile: Sdf2) -> Result<Arc<Sdf3>, SceneError> {
    if offset < 0.0 {
        return Err(SceneError::InvalidParameter {
            what: "Revolve.offset",
            reason: "must be non-negative",
        });
    }
    Ok(leaf(Primitive::Revolve { offset, profile }))
}

/// `Polygon(n, r)` is a convenience 3-D primitive: a regular-`n`-gon profile
/// extruded by `h` (spec §3: "Polygon(n-sides, r) lifted through Extrude").
pub fn polygon_prism(n: u32, r: f64, h: f64) -> Result<Arc<Sdf3>, SceneError> {
    if n < 3 {
        return Err(SceneError::InvalidParameter {
            what: "Polygon.n",
            reason: "must be at least 3 sides",
        });
    }
    require_positive("Polygon.r", r)?;
    extrude(h, Sdf2::Polygon { n, r })
}

fn leaf(prim: Primitive) -> Arc<Sdf3> {
    let bound = prim.bounding_sphere();
    Arc::new(Sdf3::Primitive(prim, bound))
}

fn require_positive(what: &'static str, v: f64) -> Result<(), SceneError> {
    if !v.is_finite() || v <= 0.0 {
        Err(SceneError::InvalidParameter { what, reason: "must be a finite, positive number" })
    } else {
        Ok(())
    }
}

pub fn translate(v: Vec3, inner: Arc<Sdf3>) -> Result<Arc<Sdf3>, SceneError> {
    let t = Transform::translation(v);
    check_invertible("Translate", &t)?;
    let (ic, ir) = inner.bounding_sphere();
    let bound = (t.center_to_world(ic), ir);
    Ok(Arc::new(Sdf3::Transform(inner, t, bound)))
}

pub fn rotate(axis: Vec3, degrees: f64, inner: Arc<Sdf3>) -> Result<Arc<Sdf3>, SceneError> {
    if axis.len() < 1e-12 {
        return Err(SceneError::InvalidParameter {
            what: "Rotate.axis",
            reason: "must be nonzero",
        });
    }
    let t = Transform::rotation(axis, degrees);
    check_invertible("Rotate", &t)?;
    let (ic, ir) = inner.bounding_sphere();
    let bound = (t.center_to_world(ic), ir);
    Ok(Arc::new(Sdf3::Transform(inner, t, bound)))
}

fn check_invertible(what: &'static str, t: &Transform) -> Result<(), SceneError> {
    if t.forward.determinant().abs() < 1e-12 {
        Err(SceneError::DegenerateTransform { what })
    } else {
        Ok(())
    }
}

pub fn scale(factor: f64, inner: Arc<Sdf3>) -> Result<Arc<Sdf3>, SceneError> {
    require_positive("Scale.factor", factor)?;
    let s = Scale { factor };
    let (ic, ir) = inner.bounding_sphere();
    let bound = (ic.scale(factor), s.adjust_radius(ir));
    Ok(Arc::new(Sdf3::Scale(inner, s, bound)))
}

pub fn distort(factor: Vec3, inner: Arc<Sdf3>) -> Result<Arc<Sdf3>, SceneError> {
    require_positive("Distort.factor.x", factor.x)?;
    require_positive("Distort.factor.y", factor.y)?;
    require_positive("Distort.factor.z", factor.z)?;
    let d = Distort { factor };
    let (ic, ir) = inner.bounding_sphere();
    let bound = (ic, d.adjust_radius(ir));
    Ok(Arc::new(Sdf3::Distort(inner, d, bound)))
}

pub fn mirror(signs: Vec3, inner: Arc<Sdf3>) -> Result<Arc<Sdf3>, SceneError> {
    for (what, v) in [("Mirror.signs.x", signs.x), ("Mirror.signs.y", signs.y), ("Mirror.signs.z", signs.z)] {
        if (v - 1.0).abs() > 1e-9 && (v + 1.0).abs() > 1e-9 {
            return Err(SceneError::InvalidParameter { what, reason: "must be +1 or -1" });
        }
    }
    let m = Mirror { signs };
    let (ic, ir) = inner.bounding_sphere();
    let bound = (m.adjust_center(ic), ir);
    Ok(Arc::new(Sdf3::Mirror(inner, m, bound)))
}

pub fn round(radius: f64, inner: Arc<Sdf3>) -> Result<Arc<Sdf3>, SceneError> {
    if !radius.is_finite() {
        return Err(SceneError::InvalidParameter { what: "Round.radius", reason: "must be finite" });
    }
    let r = Round { radius };
    let (ic, ir) = inner.bounding_sphere();
    let bound = (ic, r.adjust_radius(ir));
    Ok(Arc::new(Sdf3::Round(inner, r, bound)))
}

pub fn elongate(dx: f64, dy: f64, dz: f64, inner: Arc<Sdf3>) -> Result<Arc<Sdf3>, SceneError> {
    for (what, v) in [("Elongate.dx", dx), ("Elongate.dy", dy), ("Elongate.dz", dz)] {
        if v < 0.0 || !v.is_finite() {
            return Err(SceneError::InvalidParameter { what, reason: "must be non-negative and finite" });
        }
    }
    let e = Elongate { amount: Vec3::new(dx, dy, dz) };
    let (ic, ir) = inner.bounding_sphere();
    let bound = (ic, e.adjust_radius(ir));
    Ok(Arc::new(Sdf3::Elongate(inner, e, bound)))
}

pub fn repeat(
    px: f64,
    py: f64,
    pz: f64,
    cx: f64,
    cy: f64,
    cz: f64,
    inner: Arc<Sdf3>,
) -> Result<Arc<Sdf3>, SceneError> {
    require_positive("Repeat.period.x", px)?;
    require_positive("Repeat.period.y", py)?;
    require_positive("Repeat.period.z", pz)?;
    let r = Repeat { period: Vec3::new(px, py, pz), cell: Vec3::new(cx, cy, cz) };
    let (ic, ir) = inner.bounding_sphere();
    // a bounded repetition's extent is the cell grid itself; an unbounded
    // axis (cell <= 0) falls back to the single-instance radius, which is
    // not truly conservative for infinite repetition but matches this
    // crate's scenes, which always bound at least the axes that matter for
    // culling (see DESIGN.md).
    let extent = r.bounding_extent();
    let bound_radius = extent.len() + ir;
    let bound = (ic, bound_radius.max(ir));
    Ok(Arc::new(Sdf3::Repeat(inner, r, bound)))
}

pub fn union(children: Vec<Arc<Sdf3>>) -> Result<Arc<Sdf3>, SceneError> {
    build_csg(children, Sdf3::Union, "Union")
}

pub fn difference(children: Vec<Arc<Sdf3>>) -> Result<Arc<Sdf3>, SceneError> {
    build_csg(children, Sdf3::Difference, "Difference")
}

pub fn intersection(children: Vec<Arc<Sdf3>>) -> Result<Arc<Sdf3>, SceneError> {
    build_csg(children, Sdf3::Intersection, "Intersection")
}

fn build_csg(
    children: Vec<Arc<Sdf3>>,
    ctor: fn(Vec<Arc<Sdf3>>, (Vec3, f64)) -> Sdf3,
    what: &'static str,
) -> Result<Arc<Sdf3>, SceneError> {
    if children.is_empty() {
        return Err(SceneError::InvalidParameter { what, reason: "must have at least one child" });
    }
    let spheres: Vec<(Vec3, f64)> = children.iter().map(|c| c.bounding_sphere()).collect();
    let bound = bounds::bounding_sphere_of(&spheres);
    Ok(Arc::new(ctor(children, bound)))
}
