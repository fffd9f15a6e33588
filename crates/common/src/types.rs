use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest width/height of a pick region, in pixels.
pub const MIN_PICK_SIZE: f32 = 10.0;

/// Unique identifier for a node in the scene tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for log lines and CLI output.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Model matrix: scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const RED: Self = Self([220, 50, 50, 255]);
    pub const GREEN: Self = Self([50, 200, 80, 255]);
    pub const BLUE: Self = Self([60, 110, 230, 255]);
    pub const GRAY: Self = Self([110, 110, 110, 255]);
    pub const SELECTED: Self = Self([255, 200, 40, 255]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Pixel rectangle of the viewport. `top` is the upper edge, y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Viewport {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Viewport anchored at the origin.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width() as f32 / self.height() as f32
        }
    }
}

/// Screen-space rectangle used to restrict selection rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickRegion {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

impl PickRegion {
    /// Region centered on a point, each side floored at [`MIN_PICK_SIZE`].
    pub fn around(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self {
            center_x,
            center_y,
            width: width.max(MIN_PICK_SIZE),
            height: height.max(MIN_PICK_SIZE),
        }
    }

    pub fn min_x(&self) -> f32 {
        self.center_x - self.width * 0.5
    }

    pub fn max_x(&self) -> f32 {
        self.center_x + self.width * 0.5
    }

    pub fn min_y(&self) -> f32 {
        self.center_y - self.height * 0.5
    }

    pub fn max_y(&self) -> f32 {
        self.center_y + self.height * 0.5
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_uniqueness() {
        let a = NodeId::new();
        let b = NodeId::new();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn transform_matrix_translates() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.matrix().transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn viewport_dimensions() {
        let vp = Viewport::new(10, 20, 110, 70);
        assert_eq!(vp.width(), 100);
        assert_eq!(vp.height(), 50);
        assert!(!vp.is_empty());
        assert_eq!(vp.aspect(), 2.0);
    }

    #[test]
    fn viewport_empty_when_collapsed() {
        assert!(Viewport::new(5, 0, 5, 100).is_empty());
        assert!(Viewport::new(0, 10, 100, 0).is_empty());
    }

    #[test]
    fn pick_region_floors_size() {
        let r = PickRegion::around(50.0, 50.0, 2.0, 40.0);
        assert_eq!(r.width, MIN_PICK_SIZE);
        assert_eq!(r.height, 40.0);
        assert_eq!(r.min_x(), 45.0);
        assert_eq!(r.max_y(), 70.0);
    }
}
