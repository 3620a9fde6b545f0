//! Error kinds, per spec.md §7. Construction-time errors (invalid
//! primitive parameters, degenerate transforms) are the only ones that ever
//! reach a caller as a `Result`; everything else (numerical glitches during
//! marching/shading, a worker hitting its iteration cap, an RPC renderer
//! dropping out) is recovered locally and only logged, per "recovery is
//! local where possible."
use thiserror::Error;

/// Scene-construction-time failures. An `Sdf3` or `Camera`/`Scene` builder
/// that would violate one of these invariants returns `Err` instead of ever
/// producing a node (spec.md §7, kinds 1-2).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("invalid parameter {what}: {reason}")]
    InvalidParameter { what: &'static str, reason: &'static str },

    #[error("degenerate transform in {what}: matrix is not invertible")]
    DegenerateTransform { what: &'static str },
}

/// Render-time failures (spec.md §7, kinds 3-5). These are recovered from
/// locally almost everywhere; `RenderError::AllRenderersFailed` is the one
/// variant that actually surfaces to the caller of `Renderer::render`, since
/// at that point there is nothing left that could produce an image.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("all renderers failed; no passes could be completed")]
    AllRenderersFailed,

    #[error("remote renderer {addr} disconnected: {source}")]
    RpcConnection { addr: String, #[source] source: std::io::Error },

    #[error("remote renderer {addr} sent a malformed pass message: {source}")]
    RpcDecode { addr: String, #[source] source: bincode::Error },
}
