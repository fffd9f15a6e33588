use glam::{Mat4, Vec3};
use sceneview_common::{Color, NodeId, Transform, Viewport};
use sceneview_input::Ray;
use sceneview_render::{RenderData, Renderable};
use sceneview_scene::{Axis, Pass, RenderComponent, Shape};

/// Window depth of the backdrop, just in front of the far plane.
const BACKDROP_DEPTH: f32 = 0.99999;

/// Translate handles for every selected renderable: one bar per world axis at
/// the renderable's origin, named after the node it moves.
pub fn translate_handles(data: &RenderData, length: f32) -> RenderData {
    let mut handles = RenderData::default();
    for target in &data.selected {
        let at = Mat4::from_translation(target.origin());
        for (axis, color) in [(Axis::X, Color::RED), (Axis::Y, Color::GREEN), (Axis::Z, Color::BLUE)] {
            let component = RenderComponent::new(
                Shape::Axis { axis, length, color },
                [Pass::Manipulator, Pass::ManipulatorSelection],
            )
            .as_manipulator();
            handles.push(Renderable::new(target.node_id, at, &component));
        }
    }
    handles
}

/// Full-viewport quad in the background pass.
pub fn backdrop(id: NodeId, viewport: &Viewport, color: Color) -> Renderable {
    let (width, height) = (viewport.width() as f32, viewport.height() as f32);
    let at = Mat4::from_translation(Vec3::new(width * 0.5, height * 0.5, -BACKDROP_DEPTH));
    Renderable::new(
        id,
        at,
        &RenderComponent::new(Shape::Quad { width, height, color }, [Pass::Background]),
    )
}

/// In-progress drag of a translate handle.
///
/// The node moves along `axis` by the projection of the pointer's travel on a
/// plane that contains the axis and faces the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslateDrag {
    pub node: NodeId,
    axis: Vec3,
    origin: Vec3,
    normal: Vec3,
    grab: Vec3,
    start: Transform,
    parent_inverse: Mat4,
}

impl TranslateDrag {
    /// `None` when the camera looks straight down the axis or the ray misses
    /// the drag plane.
    pub fn begin(
        ray: &Ray,
        node: NodeId,
        axis: Vec3,
        origin: Vec3,
        view_dir: Vec3,
        start: Transform,
        parent_world: Mat4,
    ) -> Option<Self> {
        let normal = axis.cross(view_dir.cross(axis)).normalize_or_zero();
        if normal == Vec3::ZERO {
            return None;
        }
        let grab = ray.intersect_plane(origin, normal)?;
        Some(Self {
            node,
            axis,
            origin,
            normal,
            grab,
            start,
            parent_inverse: parent_world.inverse(),
        })
    }

    /// Local transform of the node for the pointer ray `ray`.
    pub fn update(&self, ray: &Ray) -> Option<Transform> {
        let point = ray.intersect_plane(self.origin, self.normal)?;
        let world_delta = self.axis * (point - self.grab).dot(self.axis);
        let local_delta = self.parent_inverse.transform_vector3(world_delta);
        Some(Transform {
            position: self.start.position + local_delta,
            ..self.start
        })
    }
}
