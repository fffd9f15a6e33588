//! Graphics collaborators of the render core.
//!
//! # Invariants
//! - At most one context is current at a time; it is released on every exit
//!   path through the [`CurrentContext`] guard.
//! - The software context is deterministic: identical call sequences produce
//!   bit-identical framebuffers and selection buffers.

mod camera;
mod context;
mod raster;
mod software;

pub use camera::{overlay_projection, Camera, EditorCamera, Projection};
pub use context::{acquire, ContextProvider, CullFace, CurrentContext, GraphicsContext, SelectionBuffer};
pub use software::{SoftwareContext, SoftwareProvider};

pub fn crate_info() -> &'static str {
    "sceneview-gfx v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("gfx"));
    }
}
