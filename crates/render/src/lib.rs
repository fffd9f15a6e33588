//! Render core: scene flattening, render-key ordering, the pass scheduler and
//! the frame and pick renderers built on it.
//!
//! # Invariants
//! - Renderers never mutate the scene; render data is rebuilt per frame.
//! - The graphics context is released on every exit path.
//! - Identical inputs yield identical frames and hit lists.

mod flatten;
mod key;
mod pick;
mod renderer;
mod scheduler;

pub use flatten::{flatten, flatten_with_extras, RenderData, Renderable};
pub use key::{depth_term, render_key, sort_back_to_front, RenderKey};
pub use pick::{decode_hits, nearest_first, pick, Hit, HitRecord, PickRenderer, HIT_BUFFER_CAPACITY};
pub use renderer::{render_frame, FrameRenderer};
pub use scheduler::{pick_matrix, PassScheduler};

pub fn crate_info() -> &'static str {
    "sceneview-render v0.1.0"
}
