//! Unary combinators: transforms and shape modifiers that wrap a single
//! child SDF. Every combinator caches whatever it needs to avoid recomputing
//! per-query (a transform caches both `M` and `M^-1`; the modifiers are
//! cheap enough not to need caching at all).
use crate::math::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// An affine transform applied to the sampling point before handing it to
/// the child SDF. Caches the forward matrix (used to move the child's
/// bounding-sphere center into the parent's space) and its inverse (used to
/// pull the query point into the child's local space).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub forward: Mat4,
    pub inverse: Mat4,
}

impl Transform {
    pub fn translation(v: Vec3) -> Transform {
        let m = Mat4::translation(v);
        Transform { forward: m, inverse: m.inverse() }
    }

    pub fn rotation(axis: Vec3, degrees: f64) -> Transform {
        let m = Mat4::rotation(axis, degrees);
        Transform { forward: m, inverse: m.inverse() }
    }

    /// `p` pulled back into the child's local space.
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        // manually inlined matrix-vector product: this is the single
        // hottest call in the whole crate (every CSG node with a transform
        // anywhere below it pays this cost on every march step), so we skip
        // the generic `Mat4::mul_vec3` indirection here.
        let m = &self.inverse.m;
        Vec3::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3],
            m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3],
            m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3],
        )
    }

    pub fn center_to_world(&self, center: Vec3) -> Vec3 {
        self.forward.mul_vec3(center)
    }
}

/// Uniform scale. Multiplies both the inner distance and bounding radius by
/// `factor`, since a uniform scale of Euclidean space is itself a uniform
/// scale of distances, so the result stays exactly 1-Lipschitz.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub factor: f64,
}

impl Scale {
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        p.scale(1.0 / self.factor)
    }

    pub fn adjust_distance(&self, inner_d: f64) -> f64 {
        inner_d * self.factor
    }

    pub fn adjust_radius(&self, inner_r: f64) -> f64 {
        inner_r * self.factor
    }
}

/// Non-uniform scale. Not exactly 1-Lipschitz, so the distance is corrected
/// by `min(factor)` to keep it a conservative underestimate (never
/// overstates how close the surface is, which is what sphere marching
/// depends on).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Distort {
    pub factor: Vec3,
}

impl Distort {
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        p.div(self.factor)
    }

    pub fn adjust_distance(&self, inner_d: f64) -> f64 {
        inner_d * self.factor.min_component()
    }

    pub fn adjust_radius(&self, inner_r: f64) -> f64 {
        inner_r * self.factor.max_component()
    }
}

/// Mirrors the sampling point across the planes implied by `signs`, each
/// component of which must be `+-1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mirror {
    pub signs: Vec3,
}

impl Mirror {
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        p.mul(self.signs)
    }

    pub fn adjust_center(&self, inner_center: Vec3) -> Vec3 {
        inner_center.mul(self.signs)
    }
}

/// Subtracts a constant radius from the inner field, rounding off any sharp
/// edges (e.g. a rounded cube). Bounding radius grows by the same amount.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub radius: f64,
}

impl Round {
    pub fn adjust_distance(&self, inner_d: f64) -> f64 {
        inner_d - self.radius
    }

    pub fn adjust_radius(&self, inner_r: f64) -> f64 {
        inner_r + self.radius
    }
}

/// Stretches the inner field along one or more axes by clamping the query
/// point into a box of half-extents `amount` before sampling the child.
/// This is exact (still 1-Lipschitz) for the unclamped region and a valid
/// underestimate at the elongated corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Elongate {
    pub amount: Vec3,
}

impl Elongate {
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        let clamped = p.max(-self.amount).min(self.amount);
        p.sub(clamped)
    }

    pub fn adjust_radius(&self, inner_r: f64) -> f64 {
        inner_r + self.amount.len()
    }
}

/// Infinite (or finite, via `cell`) repetition of the child field on a
/// grid of `period` spacing. `cell` bounds which grid cells actually exist;
/// a value of `0` on an axis means unbounded repetition on that axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Repeat {
    pub period: Vec3,
    pub cell: Vec3,
}

impl Repeat {
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        let idx = Vec3::new(
            clamp_cell(round(p.x / self.period.x), self.cell.x),
            clamp_cell(round(p.y / self.period.y), self.cell.y),
            clamp_cell(round(p.z / self.period.z), self.cell.z),
        );
        p.sub(idx.mul(self.period))
    }

    /// Repetition has no finite bounding sphere in the unbounded case; the
    /// caller (`Sdf3::bounding_sphere`) only calls this for the bounded
    /// `cell` case, where the instance grid itself is finite.
    pub fn bounding_extent(&self) -> Vec3 {
        self.cell.mul(self.period).scale(0.5)
    }
}

fn round(x: f64) -> f64 {
    x.round()
}

fn clamp_cell(idx: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        idx
    } else {
        idx.max(-limit).min(limit)
    }
}
