use std::fmt;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use sceneview_common::{Color, NodeId};
use sceneview_gfx::{CullFace, GraphicsContext};
use serde::{Deserialize, Serialize};

use crate::Pass;

/// Growth of the outline hull drawn around selected shapes.
const OUTLINE_SCALE: f32 = 1.06;
/// Relative half-width of grid lines, and of their outline.
const GRID_LINE_WIDTH: f32 = 0.02;
const GRID_OUTLINE_WIDTH: f32 = 0.05;

/// Per-draw arguments handed to a [`Drawable`].
#[derive(Debug, Clone, Copy)]
pub struct RenderArgs {
    pub pass: Pass,
    pub node_id: NodeId,
    pub world_transform: Mat4,
    pub selected: bool,
}

/// Errors reported by drawables. The scheduler logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error("{drawable} failed: {reason}")]
    Failed { drawable: String, reason: String },
}

/// Something that can issue draw calls for one renderable.
///
/// The context's model-view already contains the renderable's world transform
/// when `draw` is called.
pub trait Drawable: fmt::Debug + Send + Sync {
    /// Identity used in log lines.
    fn label(&self) -> &str;
    fn draw(&self, ctx: &mut dyn GraphicsContext, args: &RenderArgs) -> Result<(), DrawError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Vec3 {
        match self {
            Self::X => Vec3::X,
            Self::Y => Vec3::Y,
            Self::Z => Vec3::Z,
        }
    }
}

/// Built-in drawable kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Axis-aligned cube centered on the origin.
    Cube { size: f32, color: Color },
    /// Rectangle in the XY plane centered on the origin.
    Quad { width: f32, height: f32, color: Color },
    /// Manipulator handle: a thin bar from the origin along an axis.
    Axis { axis: Axis, length: f32, color: Color },
    /// Floor grid on the XZ plane.
    Grid { half_extent: u32, spacing: f32, color: Color },
    #[serde(skip)]
    Custom(Arc<dyn Drawable>),
}

impl Shape {
    pub fn custom(drawable: impl Drawable + 'static) -> Self {
        Self::Custom(Arc::new(drawable))
    }

    fn base_color(&self) -> Color {
        match self {
            Self::Cube { color, .. }
            | Self::Quad { color, .. }
            | Self::Axis { color, .. }
            | Self::Grid { color, .. } => *color,
            Self::Custom(_) => Color::WHITE,
        }
    }

    /// Triangle list in object space.
    pub fn triangles(&self) -> Vec<Vec3> {
        match self {
            Self::Cube { size, .. } => {
                let h = Vec3::splat(size * 0.5);
                cuboid(-h, h)
            }
            Self::Quad { width, height, .. } => quad(*width, *height),
            Self::Axis { axis, length, .. } => {
                let thickness = (length * 0.04).max(0.01);
                let dir = axis.unit();
                let pad = (Vec3::ONE - dir) * thickness;
                cuboid(-pad, dir * *length + pad)
            }
            Self::Grid {
                half_extent,
                spacing,
                ..
            } => grid(*half_extent as i32, *spacing, GRID_LINE_WIDTH),
            Self::Custom(_) => Vec::new(),
        }
    }

    /// Draw the selection outline. Closed shapes draw an inflated hull with
    /// front faces culled so only the rim outside the silhouette remains; a
    /// flat quad draws a border frame in its own plane.
    fn draw_outline(&self, ctx: &mut dyn GraphicsContext) {
        match self {
            Self::Quad { width, height, .. } => {
                ctx.draw_triangles(&quad_frame(*width, *height, OUTLINE_SCALE), Color::SELECTED);
            }
            Self::Grid {
                half_extent,
                spacing,
                ..
            } => {
                let hull = grid(*half_extent as i32, *spacing, GRID_OUTLINE_WIDTH);
                draw_culled(ctx, &hull);
            }
            _ => {
                let hull: Vec<Vec3> = self.triangles().iter().map(|v| *v * OUTLINE_SCALE).collect();
                draw_culled(ctx, &hull);
            }
        }
    }
}

fn draw_culled(ctx: &mut dyn GraphicsContext, hull: &[Vec3]) {
    ctx.set_cull_face(CullFace::Front);
    ctx.draw_triangles(hull, Color::SELECTED);
    ctx.set_cull_face(CullFace::None);
}

impl Drawable for Shape {
    fn label(&self) -> &str {
        match self {
            Self::Cube { .. } => "cube",
            Self::Quad { .. } => "quad",
            Self::Axis { .. } => "axis",
            Self::Grid { .. } => "grid",
            Self::Custom(inner) => inner.label(),
        }
    }

    fn draw(&self, ctx: &mut dyn GraphicsContext, args: &RenderArgs) -> Result<(), DrawError> {
        if let Self::Custom(inner) = self {
            return inner.draw(ctx, args);
        }
        if args.pass != Pass::Outline {
            ctx.draw_triangles(&self.triangles(), self.base_color());
        } else if args.selected {
            self.draw_outline(ctx);
        }
        Ok(())
    }
}

/// Twelve triangles of an axis-aligned box.
fn cuboid(min: Vec3, max: Vec3) -> Vec<Vec3> {
    let corner = |x: bool, y: bool, z: bool| {
        Vec3::new(
            if x { max.x } else { min.x },
            if y { max.y } else { min.y },
            if z { max.z } else { min.z },
        )
    };
    #[rustfmt::skip]
    let faces = [
        // +Z, -Z
        [corner(false, false, true), corner(true, false, true), corner(true, true, true), corner(false, true, true)],
        [corner(true, false, false), corner(false, false, false), corner(false, true, false), corner(true, true, false)],
        // +X, -X
        [corner(true, false, true), corner(true, false, false), corner(true, true, false), corner(true, true, true)],
        [corner(false, false, false), corner(false, false, true), corner(false, true, true), corner(false, true, false)],
        // +Y, -Y
        [corner(false, true, true), corner(true, true, true), corner(true, true, false), corner(false, true, false)],
        [corner(false, false, false), corner(true, false, false), corner(true, false, true), corner(false, false, true)],
    ];
    faces
        .iter()
        .flat_map(|f| [f[0], f[1], f[2], f[2], f[3], f[0]])
        .collect()
}

fn rect(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> [Vec3; 6] {
    let (a, b, c, d) = (
        Vec3::new(min_x, min_y, 0.0),
        Vec3::new(max_x, min_y, 0.0),
        Vec3::new(max_x, max_y, 0.0),
        Vec3::new(min_x, max_y, 0.0),
    );
    [a, b, c, c, d, a]
}

fn quad(width: f32, height: f32) -> Vec<Vec3> {
    let (w, h) = (width * 0.5, height * 0.5);
    rect(-w, -h, w, h).to_vec()
}

/// Border between a quad and the same quad grown by `scale`.
fn quad_frame(width: f32, height: f32, scale: f32) -> Vec<Vec3> {
    let (w, h) = (width * 0.5, height * 0.5);
    let (ow, oh) = (w * scale, h * scale);
    [
        rect(-ow, h, ow, oh),
        rect(-ow, -oh, ow, -h),
        rect(-ow, -h, -w, h),
        rect(w, -h, ow, h),
    ]
    .concat()
}

fn grid(half_extent: i32, spacing: f32, line_width: f32) -> Vec<Vec3> {
    let extent = half_extent as f32 * spacing;
    let half_width = spacing * line_width;
    let mut verts = Vec::new();
    for i in -half_extent..=half_extent {
        let offset = i as f32 * spacing;
        // Line along X
        verts.extend(cuboid(
            Vec3::new(-extent, 0.0, offset - half_width),
            Vec3::new(extent, 0.0, offset + half_width),
        ));
        // Line along Z
        verts.extend(cuboid(
            Vec3::new(offset - half_width, 0.0, -extent),
            Vec3::new(offset + half_width, 0.0, extent),
        ));
    }
    verts
}
