//! Scene description consumed by the render core.
//!
//! # Invariants
//! - The render core never mutates the scene tree; it derives per-frame
//!   records from it.
//! - Node ids are unique within a scene.

mod node;
mod pass;
mod shape;

pub use node::{RenderComponent, Scene, SceneError, SceneNode};
pub use pass::{Pass, ALL_PASSES, MANIPULATOR_SELECTION, SELECTION_PASSES};
pub use shape::{Axis, DrawError, Drawable, RenderArgs, Shape};

pub fn crate_info() -> &'static str {
    "sceneview-scene v0.1.0"
}
