use std::ops::{Deref, DerefMut};

use glam::{Mat4, Vec3};
use image::RgbaImage;
use sceneview_common::{Color, Viewport};

/// Raw result of a selection-mode rendering.
///
/// `hits` is negative when the hit buffer overflowed; `data` then holds every
/// record that fit before the overflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionBuffer {
    pub hits: i32,
    pub data: Vec<i32>,
}

/// Which triangles are discarded by winding. Counter-clockwise in NDC is the
/// front face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullFace {
    #[default]
    None,
    Front,
    Back,
}

/// Immediate-mode graphics context, modelled on a fixed-function pipeline.
///
/// Matrices follow GL clip conventions (NDC depth in `[-1, 1]`). The model-view
/// stack always holds at least one matrix.
pub trait GraphicsContext {
    fn set_viewport(&mut self, viewport: Viewport);
    fn clear(&mut self, color: Color);

    fn load_projection(&mut self, projection: Mat4);
    /// Replace the top of the model-view stack.
    fn load_model_view(&mut self, model_view: Mat4);
    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    /// Post-multiply the top of the model-view stack.
    fn mult_matrix(&mut self, matrix: Mat4);
    fn matrix_depth(&self) -> usize;

    /// Set face culling for subsequent draws. Contexts start with
    /// [`CullFace::None`].
    fn set_cull_face(&mut self, cull: CullFace);

    /// Draw a triangle list in object space with a flat color.
    fn draw_triangles(&mut self, vertices: &[Vec3], color: Color);

    /// Enter selection mode with a hit buffer of `capacity` integers.
    fn begin_selection(&mut self, capacity: usize);
    /// Leave selection mode and hand back the hit buffer.
    fn end_selection(&mut self) -> SelectionBuffer;
    fn push_name(&mut self, name: u32);
    fn pop_name(&mut self);
    fn name_depth(&self) -> usize;

    fn flush(&mut self);
    fn read_pixels(&mut self, viewport: Viewport) -> RgbaImage;
}

/// Owner of the exclusive graphics context of a viewport.
pub trait ContextProvider {
    type Context: GraphicsContext;

    /// Make the context current. Returns false when no context is available.
    fn make_current(&mut self) -> bool;
    fn release(&mut self);
    fn context(&self) -> &Self::Context;
    fn context_mut(&mut self) -> &mut Self::Context;

    /// Make the drawable surface at least `width` x `height` pixels. Providers
    /// whose surface follows the window on its own keep the default.
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Scoped current context. Releases the context when dropped.
pub struct CurrentContext<'a, P: ContextProvider + ?Sized> {
    provider: &'a mut P,
}

/// Make the provider's context current for the lifetime of the returned guard.
pub fn acquire<P: ContextProvider + ?Sized>(provider: &mut P) -> Option<CurrentContext<'_, P>> {
    if provider.make_current() {
        Some(CurrentContext { provider })
    } else {
        tracing::debug!("no graphics context available");
        None
    }
}

impl<P: ContextProvider + ?Sized> Deref for CurrentContext<'_, P> {
    type Target = P::Context;

    fn deref(&self) -> &Self::Target {
        self.provider.context()
    }
}

impl<P: ContextProvider + ?Sized> DerefMut for CurrentContext<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.provider.context_mut()
    }
}

impl<P: ContextProvider + ?Sized> Drop for CurrentContext<'_, P> {
    fn drop(&mut self) {
        self.provider.release();
    }
}
