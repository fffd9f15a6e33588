//! Editor viewport session.
//!
//! Scene, selection, camera and viewport are inputs of a dependency graph;
//! flattening and manipulator placement are derived nodes, so a frame or pick
//! only redoes the work whose inputs changed.

mod config;
mod error;
mod manipulator;
mod session;

pub use config::ViewportConfig;
pub use error::ViewportError;
pub use manipulator::{backdrop, translate_handles, TranslateDrag};
pub use session::{SessionStats, ViewportSession};

pub fn crate_info() -> &'static str {
    "sceneview-viewport v0.1.0"
}
