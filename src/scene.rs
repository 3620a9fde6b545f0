//! The scene: the single immutable record the whole renderer operates on.
//! Building one validates every numeric field and pre-compiles the combined
//! root SDF (the union of every `Thing`) used by the hot marching loop.
use crate::camera::Camera;
use crate::error::SceneError;
use crate::material::{Color, Material};
use crate::sdf::{self, Sdf3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A `(Material, SDF3)` pair: one of the scene's top-level objects.
#[derive(Clone, Serialize, Deserialize)]
pub struct Thing {
    pub material: Material,
    pub sdf: Arc<Sdf3>,
}

pub fn object(material: Material, sdf: Arc<Sdf3>) -> Thing {
    Thing { material, sdf }
}

/// Soft-shadow disc-sampling parameters (spec.md §6: `ShadowD/R/H/L`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowParams {
    /// Number of disc samples per shadow ray.
    pub samples: u32,
    /// Disc radius, in scene units, the samples are jittered across.
    pub radius: f64,
    /// Shadow intensity (0 = no shadowing, 1 = fully opaque occluders).
    pub intensity: f64,
    /// Falloff exponent applied to the penumbra term.
    pub falloff: f64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    /// `0` means "stream passes indefinitely" (spec.md §4.E).
    pub passes: u32,
    pub samples: u32,
    pub bounces: u32,
    pub horizon: f64,
    pub threshold: f64,
    pub ambient: Color,
    pub shadow: ShadowParams,
    pub camera: Camera,
    pub stuff: Vec<Thing>,

    /// The union of every `Thing`'s SDF, compiled once at construction; this
    /// is what `trace::march` actually walks.
    pub(crate) combined: Arc<Sdf3>,
}

pub struct SceneBuilder {
    pub width: u32,
    pub height: u32,
    pub passes: u32,
    pub samples: u32,
    pub bounces: u32,
    pub horizon: f64,
    pub threshold: f64,
    pub ambient: Color,
    pub shadow: ShadowParams,
    pub camera: Camera,
    pub stuff: Vec<Thing>,
}

impl Scene {
    pub fn build(b: SceneBuilder) -> Result<Scene, SceneError> {
        if b.width == 0 || b.height == 0 {
            return Err(SceneError::InvalidParameter { what: "Scene.width/height", reason: "must be nonzero" });
        }
        if b.samples == 0 {
            return Err(SceneError::InvalidParameter { what: "Scene.samples", reason: "must be at least 1 per pass" });
        }
        if b.bounces == 0 {
            return Err(SceneError::InvalidParameter { what: "Scene.bounces", reason: "must be at least 1" });
        }
        if !(b.horizon > 0.0) {
            return Err(SceneError::InvalidParameter { what: "Scene.horizon", reason: "must be positive" });
        }
        if !(b.threshold > 0.0) {
            return Err(SceneError::InvalidParameter { what: "Scene.threshold", reason: "must be positive" });
        }
        if b.stuff.is_empty() {
            return Err(SceneError::InvalidParameter { what: "Scene.stuff", reason: "must contain at least one Thing" });
        }
        let combined = sdf::union(b.stuff.iter().map(|t| t.sdf.clone()).collect())?;
        Ok(Scene {
            width: b.width,
            height: b.height,
            passes: b.passes,
            samples: b.samples,
            bounces: b.bounces,
            horizon: b.horizon,
            threshold: b.threshold,
            ambient: b.ambient,
            shadow: b.shadow,
            camera: b.camera,
            stuff: b.stuff,
            combined,
        })
    }
}

/// A large flat slab standing in for a ground plane, the convenience rig
/// the original source calls `WorkBench` (used by its test fixtures as a
/// cheap floor/backdrop instead of modeling a full room). `size` is the
/// slab's half-width; it sits with its top face at `z = 0`.
pub fn workbench(size: f64) -> Result<Thing, SceneError> {
    let slab = sdf::cube(size * 2.0, size * 2.0, size)?;
    let sdf = sdf::translate(crate::math::Vec3::new(0.0, 0.0, -size * 0.5), slab)?;
    Ok(object(Material::matte(Color::new(0.7, 0.7, 0.7)), sdf))
}
