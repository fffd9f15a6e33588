//! Viewport interaction: screen/world mapping, marquee selection and input
//! handler dispatch.
//!
//! # Invariants
//! - Handlers turn raw pointer events into [`Action`]s; nothing downstream
//!   sees raw events.
//! - Every pick region is at least `MIN_PICK_SIZE` pixels on each side.

mod action;
mod handler;
mod marquee;
mod ray;
mod selection;

pub use action::{Action, InputEvent};
pub use handler::{dispatch, InputHandler};
pub use marquee::{MarqueeSelector, MarqueeState};
pub use ray::{compute_pick_region, compute_pick_region_with_min, pick_ray, screen_to_world, Ray};
pub use selection::{resolve_selection, Modifiers, OpSeq, Platform, SelectionMode};

pub fn crate_info() -> &'static str {
    "sceneview-input v0.1.0"
}
