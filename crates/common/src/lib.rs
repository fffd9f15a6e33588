//! Shared types: node identity, transforms, colors and screen rectangles.

mod types;

pub use types::{Color, NodeId, PickRegion, Transform, Viewport, MIN_PICK_SIZE};
