//! # `pathtrace-sdf`
//!
//! A distributed, physically-based path tracer over signed distance field
//! (SDF) geometry. Scenes are built from a small algebra of SDF primitives
//! and combinators (`sdf`), composited with bounding-sphere-culled CSG,
//! marched to a surface hit by sphere tracing (`trace`), and shaded by a
//! stochastic path-tracing integrator (`integrator`) that a multi-pass tile
//! scheduler (`render`) drives across a thread pool — and, via the same
//! `Renderer` trait, across remote worker processes (`render::rpc`).
//!
//! Most SDFs are built up from one or more `sdf::primitives` modified and
//! combined with `sdf::combinators` and `sdf::csg`, then painted with a
//! `material::Material` and assembled into a `scene::Scene`.
pub mod camera;
pub mod error;
pub mod image;
pub mod integrator;
pub mod material;
pub mod math;
pub mod render;
pub mod scene;
pub mod sdf;
pub mod trace;
