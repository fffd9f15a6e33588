use sceneview_common::Viewport;
use sceneview_gfx::Camera;

use crate::Renderable;

/// Packed sort key for renderables within a pass.
///
/// Layout, high to low: manipulator flag (bit 63), manual index (bits 32..63),
/// depth term (bits 0..32). Ascending order is back-to-front: nearer objects
/// get larger depth terms, higher indices sort later and manipulators come
/// after all scene content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderKey(pub u64);

impl RenderKey {
    const MANIPULATOR_BIT: u64 = 1 << 63;
    const INDEX_SHIFT: u32 = 32;
    const INDEX_MASK: u64 = (1 << 31) - 1;

    /// Build a key. Indices past the 31-bit field saturate at its maximum, so
    /// they still sort after every smaller index.
    pub fn new(depth: u32, index: u32, manipulator: bool) -> Self {
        if u64::from(index) > Self::INDEX_MASK {
            tracing::warn!(index, "manual render index saturated");
        }
        let index = u64::from(index).min(Self::INDEX_MASK);
        let mut key = u64::from(depth) | (index << Self::INDEX_SHIFT);
        if manipulator {
            key |= Self::MANIPULATOR_BIT;
        }
        Self(key)
    }

    pub fn depth(self) -> u32 {
        self.0 as u32
    }

    pub fn index(self) -> u32 {
        ((self.0 >> Self::INDEX_SHIFT) & Self::INDEX_MASK) as u32
    }

    pub fn is_manipulator(self) -> bool {
        self.0 & Self::MANIPULATOR_BIT != 0
    }
}

/// Map NDC depth in `[-1, 1]` to the depth term; `-1` (near) maps to
/// `u32::MAX`, `1` (far) to 0. Depths in front of the near plane clamp to
/// near, depths past the far plane and non-finite depths to far.
pub fn depth_term(ndc_z: f32) -> u32 {
    if !ndc_z.is_finite() {
        return 0;
    }
    let near = (1.0 - f64::from(ndc_z.clamp(-1.0, 1.0))) * 0.5;
    (near * f64::from(u32::MAX)).round() as u32
}

/// Sort key of a renderable as seen through `camera`.
pub fn render_key<C: Camera + ?Sized>(camera: &C, viewport: &Viewport, renderable: &Renderable) -> RenderKey {
    let ndc = camera.project(viewport, renderable.origin());
    RenderKey::new(
        depth_term(ndc.z),
        renderable.index.unwrap_or(0),
        renderable.manipulator,
    )
}

/// Stable back-to-front sort. Items with equal keys keep their relative order,
/// which callers must not rely on.
pub fn sort_back_to_front<C, T>(camera: &C, viewport: &Viewport, items: &mut [T])
where
    C: Camera + ?Sized,
    T: AsRef<Renderable>,
{
    items.sort_by_cached_key(|item| render_key(camera, viewport, item.as_ref()));
}

impl AsRef<Renderable> for Renderable {
    fn as_ref(&self) -> &Renderable {
        self
    }
}
