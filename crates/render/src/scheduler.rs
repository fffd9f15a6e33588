use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use glam::{Mat4, Vec3};
use sceneview_common::{PickRegion, Viewport};
use sceneview_gfx::{overlay_projection, Camera, CullFace, GraphicsContext};
use sceneview_scene::{Drawable, Pass};

use crate::key::sort_back_to_front;
use crate::{RenderData, Renderable};

/// Projection restricting rendering to `region`, in the manner of
/// `gluPickMatrix`: the region is scaled up to fill the whole clip volume.
pub fn pick_matrix(viewport: &Viewport, region: &PickRegion) -> Mat4 {
    let width = viewport.width() as f32;
    let height = viewport.height() as f32;
    let center_x = 2.0 * (region.center_x - viewport.left as f32) / width - 1.0;
    let center_y = 1.0 - 2.0 * (region.center_y - viewport.top as f32) / height;
    let scale_x = region.width / width;
    let scale_y = region.height / height;
    Mat4::from_scale(Vec3::new(1.0 / scale_x, 1.0 / scale_y, 1.0))
        * Mat4::from_translation(Vec3::new(-center_x, -center_y, 0.0))
}

/// Configures per-pass transform state and submits renderables.
pub struct PassScheduler<'a, C: Camera + ?Sized> {
    camera: &'a C,
    viewport: Viewport,
    region: Option<PickRegion>,
}

impl<'a, C: Camera + ?Sized> PassScheduler<'a, C> {
    pub fn new(camera: &'a C, viewport: Viewport) -> Self {
        Self {
            camera,
            viewport,
            region: None,
        }
    }

    /// Restrict every pass projection to a pick region.
    pub fn with_pick_region(mut self, region: PickRegion) -> Self {
        self.region = Some(region);
        self
    }

    /// Projection for a pass, pick-restricted when a region is set.
    pub fn projection(&self, pass: Pass) -> Mat4 {
        let base = if pass.is_model_transform() {
            self.camera.projection_matrix(&self.viewport)
        } else {
            overlay_projection(&self.viewport)
        };
        match &self.region {
            Some(region) => pick_matrix(&self.viewport, region) * base,
            None => base,
        }
    }

    pub fn view(&self, pass: Pass) -> Mat4 {
        if pass.is_model_transform() {
            self.camera.view_matrix()
        } else {
            Mat4::IDENTITY
        }
    }

    /// Load projection and view for `pass`.
    pub fn configure(&self, ctx: &mut dyn GraphicsContext, pass: Pass) {
        ctx.load_projection(self.projection(pass));
        ctx.load_model_view(self.view(pass));
    }

    /// Run every pass of `passes` that has renderables.
    pub fn run(&self, ctx: &mut dyn GraphicsContext, passes: &[Pass], data: &RenderData) {
        for &pass in passes {
            let items = data.get(pass);
            if items.is_empty() {
                continue;
            }
            tracing::debug!(%pass, count = items.len(), "pass");
            self.configure(ctx, pass);
            self.submit(ctx, pass, items);
        }
    }

    /// Draw `items` back-to-front and return them in submission order.
    ///
    /// In selection passes each renderable is named by its position in the
    /// returned list, so hit records resolve against it.
    pub fn submit<'r>(
        &self,
        ctx: &mut dyn GraphicsContext,
        pass: Pass,
        items: &'r [Renderable],
    ) -> Vec<&'r Renderable> {
        let mut ordered: Vec<&Renderable> = items.iter().collect();
        sort_back_to_front(self.camera, &self.viewport, &mut ordered);
        let named = pass.is_selection();
        for (index, renderable) in ordered.iter().enumerate() {
            draw_one(ctx, pass, named.then_some(index as u32), renderable);
        }
        ordered
    }
}

/// Draw a single renderable inside a pushed matrix (and name). A failing or
/// panicking drawable is logged; stack depths and culling are restored either
/// way.
fn draw_one(ctx: &mut dyn GraphicsContext, pass: Pass, name: Option<u32>, renderable: &Renderable) {
    let matrix_depth = ctx.matrix_depth();
    let name_depth = ctx.name_depth();

    ctx.push_matrix();
    ctx.mult_matrix(renderable.world_transform);
    if let Some(name) = name {
        ctx.push_name(name);
    }

    let args = renderable.args(pass);
    let result = catch_unwind(AssertUnwindSafe(|| renderable.shape.draw(&mut *ctx, &args)));
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(
            %pass,
            drawable = renderable.shape.label(),
            node = %renderable.node_id,
            "draw failed: {e}"
        ),
        Err(payload) => tracing::warn!(
            %pass,
            drawable = renderable.shape.label(),
            node = %renderable.node_id,
            "draw panicked: {}",
            panic_message(&*payload)
        ),
    }

    while ctx.name_depth() > name_depth {
        ctx.pop_name();
    }
    while ctx.matrix_depth() > matrix_depth {
        ctx.pop_matrix();
    }
    ctx.set_cull_face(CullFace::None);
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use sceneview_common::{Color, NodeId};
    use sceneview_gfx::{EditorCamera, SoftwareContext};
    use sceneview_scene::{DrawError, RenderArgs, RenderComponent, Shape};

    fn viewport() -> Viewport {
        Viewport::from_size(200, 100)
    }

    #[test]
    fn pick_matrix_maps_region_to_clip_volume() {
        let vp = viewport();
        let region = PickRegion::around(150.0, 25.0, 20.0, 10.0);
        let m = pick_matrix(&vp, &region);
        // Region corners in NDC
        let left = 2.0 * region.min_x() / 200.0 - 1.0;
        let top = 1.0 - 2.0 * region.min_y() / 100.0;
        let p = m * Vec4::new(left, top, 0.3, 1.0);
        assert!((p.x + 1.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
        assert!((p.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn overlay_passes_use_identity_view() {
        let cam = EditorCamera::default();
        let scheduler = PassScheduler::new(&cam, viewport());
        assert_eq!(scheduler.view(Pass::Overlay), Mat4::IDENTITY);
        assert_eq!(scheduler.view(Pass::Opaque), cam.view_matrix());
        assert_eq!(scheduler.projection(Pass::Background), overlay_projection(&viewport()));
    }

    #[derive(Debug)]
    struct Broken {
        panic: bool,
    }

    impl Drawable for Broken {
        fn label(&self) -> &str {
            "broken"
        }

        fn draw(&self, ctx: &mut dyn GraphicsContext, _: &RenderArgs) -> Result<(), DrawError> {
            // Leave the stack unbalanced and culling on.
            ctx.push_matrix();
            ctx.set_cull_face(CullFace::Front);
            if self.panic {
                panic!("exploded");
            }
            Err(DrawError::Failed {
                drawable: "broken".into(),
                reason: "missing mesh".into(),
            })
        }
    }

    fn renderable(shape: Shape) -> Renderable {
        Renderable::new(NodeId::new(), Mat4::IDENTITY, &RenderComponent::new(shape, [Pass::Opaque]))
    }

    #[test]
    fn failures_do_not_abort_the_pass() {
        let cam = EditorCamera::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let vp = Viewport::from_size(32, 32);
        let mut ctx = SoftwareContext::new(32, 32);
        let items = vec![
            renderable(Shape::custom(Broken { panic: false })),
            renderable(Shape::custom(Broken { panic: true })),
            // Faces the camera, so it only shows once culling is reset.
            renderable(Shape::Quad {
                width: 1.0,
                height: 1.0,
                color: Color::RED,
            }),
        ];
        let scheduler = PassScheduler::new(&cam, vp);
        scheduler.configure(&mut ctx, Pass::Opaque);
        let submitted = scheduler.submit(&mut ctx, Pass::Opaque, &items);

        assert_eq!(submitted.len(), 3);
        assert_eq!(ctx.matrix_depth(), 1);
        let img = ctx.read_pixels(vp);
        assert_eq!(img.get_pixel(16, 16).0, Color::RED.0);
    }

    #[test]
    fn selection_pass_names_by_position() {
        let cam = EditorCamera::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let vp = Viewport::from_size(32, 32);
        let mut ctx = SoftwareContext::new(32, 32);
        let cube = Shape::Cube {
            size: 1.0,
            color: Color::RED,
        };
        let items = vec![renderable(cube.clone()), renderable(cube)];
        let scheduler = PassScheduler::new(&cam, vp);
        ctx.begin_selection(64);
        scheduler.configure(&mut ctx, Pass::Selection);
        scheduler.submit(&mut ctx, Pass::Selection, &items);
        let buffer = ctx.end_selection();
        assert_eq!(buffer.hits, 2);
        assert_eq!(buffer.data[3], 0);
        assert_eq!(buffer.data[7], 1);
        assert_eq!(ctx.name_depth(), 0);
    }
}
