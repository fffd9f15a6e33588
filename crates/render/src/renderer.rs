use image::RgbaImage;
use sceneview_common::{Color, Viewport};
use sceneview_gfx::{acquire, Camera, ContextProvider, GraphicsContext};
use sceneview_scene::ALL_PASSES;

use crate::scheduler::PassScheduler;
use crate::RenderData;

/// Renders the visible frame.
///
/// The renderer reads render data and a camera, then produces an image. It
/// never mutates the scene.
#[derive(Debug, Clone, Copy)]
pub struct FrameRenderer {
    pub clear_color: Color,
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self {
            clear_color: Color::rgb(38, 38, 46),
        }
    }
}

impl FrameRenderer {
    pub fn new(clear_color: Color) -> Self {
        Self { clear_color }
    }

    /// Render one frame.
    ///
    /// Returns `None` without touching the provider when the viewport is
    /// empty, and `None` when no context can be made current.
    pub fn render<P, C>(
        &self,
        viewport: Viewport,
        provider: &mut P,
        camera: &C,
        data: &RenderData,
    ) -> Option<RgbaImage>
    where
        P: ContextProvider + ?Sized,
        C: Camera + ?Sized,
    {
        if viewport.is_empty() {
            tracing::debug!(?viewport, "empty viewport, skipping frame");
            return None;
        }
        let _span = tracing::info_span!(
            "render_frame",
            width = viewport.width(),
            height = viewport.height()
        )
        .entered();

        let mut guard = acquire(provider)?;
        let ctx: &mut dyn GraphicsContext = &mut *guard;
        ctx.set_viewport(viewport);
        ctx.clear(self.clear_color);
        PassScheduler::new(camera, viewport).run(ctx, &ALL_PASSES, data);
        ctx.flush();
        Some(ctx.read_pixels(viewport))
    }
}

/// [`FrameRenderer::render`] with the default clear color.
pub fn render_frame<P, C>(
    viewport: Viewport,
    provider: &mut P,
    camera: &C,
    data: &RenderData,
) -> Option<RgbaImage>
where
    P: ContextProvider + ?Sized,
    C: Camera + ?Sized,
{
    FrameRenderer::default().render(viewport, provider, camera, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use sceneview_common::NodeId;
    use sceneview_gfx::{EditorCamera, SoftwareProvider};
    use sceneview_scene::{Pass, RenderComponent, Shape};

    use crate::Renderable;

    fn cube_at(position: Vec3, color: Color, passes: &[Pass]) -> Renderable {
        Renderable::new(
            NodeId::new(),
            Mat4::from_translation(position),
            &RenderComponent::new(Shape::Cube { size: 1.0, color }, passes.iter().copied()),
        )
    }

    fn camera() -> EditorCamera {
        EditorCamera::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO)
    }

    #[test]
    fn empty_world_is_clear_color() {
        let mut provider = SoftwareProvider::new(16, 16);
        let renderer = FrameRenderer::new(Color::BLUE);
        let img = renderer
            .render(Viewport::from_size(16, 16), &mut provider, &camera(), &RenderData::default())
            .unwrap();
        assert_eq!(img.dimensions(), (16, 16));
        assert!(img.pixels().all(|p| p.0 == Color::BLUE.0));
        assert!(!provider.is_current());
    }

    #[test]
    fn nearer_object_wins() {
        let mut data = RenderData::default();
        data.push(cube_at(Vec3::new(0.0, 0.0, 1.0), Color::GREEN, &[Pass::Opaque]));
        data.push(cube_at(Vec3::ZERO, Color::RED, &[Pass::Opaque]));
        let mut provider = SoftwareProvider::new(32, 32);
        let img = render_frame(Viewport::from_size(32, 32), &mut provider, &camera(), &data).unwrap();
        assert_eq!(img.get_pixel(16, 16).0, Color::GREEN.0);
    }

    #[test]
    fn selection_passes_are_not_drawn() {
        let mut data = RenderData::default();
        data.push(cube_at(Vec3::ZERO, Color::RED, &[Pass::Selection]));
        let mut provider = SoftwareProvider::new(16, 16);
        let renderer = FrameRenderer::new(Color::BLACK);
        let img = renderer
            .render(Viewport::from_size(16, 16), &mut provider, &camera(), &data)
            .unwrap();
        assert!(img.pixels().all(|p| p.0 == Color::BLACK.0));
    }

    #[test]
    fn overlay_pass_draws_in_pixels() {
        let mut data = RenderData::default();
        let overlay = Renderable::new(
            NodeId::new(),
            Mat4::from_translation(Vec3::new(4.0, 4.0, 0.0)),
            &RenderComponent::new(
                Shape::Quad {
                    width: 4.0,
                    height: 4.0,
                    color: Color::WHITE,
                },
                [Pass::Overlay],
            ),
        );
        data.push(overlay);
        let mut provider = SoftwareProvider::new(16, 16);
        let renderer = FrameRenderer::new(Color::BLACK);
        let img = renderer
            .render(Viewport::from_size(16, 16), &mut provider, &camera(), &data)
            .unwrap();
        assert_eq!(img.get_pixel(3, 3).0, Color::WHITE.0);
        assert_eq!(img.get_pixel(10, 10).0, Color::BLACK.0);
    }

    #[test]
    fn unavailable_context_yields_none() {
        let mut provider = SoftwareProvider::unavailable(16, 16);
        let frame = render_frame(Viewport::from_size(16, 16), &mut provider, &camera(), &RenderData::default());
        assert!(frame.is_none());
    }
}
