use glam::{Mat4, Vec3};
use sceneview_common::Viewport;
use serde::{Deserialize, Serialize};

/// Camera collaborator: view/projection plus world <-> screen mapping.
///
/// Screen coordinates are viewport pixels with y growing downwards; `depth`
/// runs from 0 at the near plane to 1 at the far plane.
pub trait Camera {
    fn view_matrix(&self) -> Mat4;
    fn projection_matrix(&self, viewport: &Viewport) -> Mat4;

    fn view_projection(&self, viewport: &Viewport) -> Mat4 {
        self.projection_matrix(viewport) * self.view_matrix()
    }

    /// World point to normalized device coordinates.
    fn project(&self, viewport: &Viewport, world: Vec3) -> Vec3 {
        let clip = self.view_projection(viewport) * world.extend(1.0);
        clip.truncate() / clip.w
    }

    /// Screen point plus depth back to world space.
    fn unproject(&self, viewport: &Viewport, x: f32, y: f32, depth: f32) -> Vec3 {
        let ndc = Vec3::new(
            2.0 * (x - viewport.left as f32) / viewport.width() as f32 - 1.0,
            1.0 - 2.0 * (y - viewport.top as f32) / viewport.height() as f32,
            2.0 * depth - 1.0,
        );
        let world = self.view_projection(viewport).inverse() * ndc.extend(1.0);
        world.truncate() / world.w
    }
}

/// Projection model of an [`EditorCamera`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// Vertical field of view in radians.
    Perspective { fov_y: f32 },
    /// Visible world-space height.
    Orthographic { height: f32 },
}

/// Look-at camera used by the editor viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditorCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
    pub near: f32,
    pub far: f32,
}

impl Default for EditorCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, 15.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            projection: Projection::Perspective {
                fov_y: 60.0_f32.to_radians(),
            },
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl EditorCamera {
    pub fn look_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize()
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Rotate the eye around the target by yaw/pitch deltas in radians.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        let offset = self.position - self.target;
        let radius = offset.length();
        let current_pitch = (offset.y / radius).asin();
        let current_yaw = offset.z.atan2(offset.x);
        let pitch = (current_pitch + pitch).clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
        let yaw = current_yaw + yaw;
        self.position = self.target
            + Vec3::new(
                radius * pitch.cos() * yaw.cos(),
                radius * pitch.sin(),
                radius * pitch.cos() * yaw.sin(),
            );
    }

    /// Move the eye towards the target, never past it.
    pub fn dolly(&mut self, amount: f32) {
        let distance = (self.distance() - amount).max(self.near);
        self.position = self.target - self.forward() * distance;
    }

    /// Translate eye and target together in the view plane.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let right = self.right();
        let up = right.cross(self.forward()).normalize();
        let delta = right * dx + up * dy;
        self.position += delta;
        self.target += delta;
    }
}

impl Camera for EditorCamera {
    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    fn projection_matrix(&self, viewport: &Viewport) -> Mat4 {
        let aspect = viewport.aspect();
        match self.projection {
            Projection::Perspective { fov_y } => {
                Mat4::perspective_rh_gl(fov_y, aspect, self.near, self.far)
            }
            Projection::Orthographic { height } => {
                let half_h = height * 0.5;
                let half_w = half_h * aspect;
                Mat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }
}

/// Pixel-space projection for overlay passes: x right, y down, origin at the
/// viewport's top-left corner.
pub fn overlay_projection(viewport: &Viewport) -> Mat4 {
    Mat4::orthographic_rh_gl(
        0.0,
        viewport.width() as f32,
        viewport.height() as f32,
        0.0,
        -1.0,
        1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::from_size(200, 100)
    }

    #[test]
    fn target_projects_to_center() {
        let cam = EditorCamera::default();
        let ndc = cam.project(&viewport(), cam.target);
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn unproject_inverts_project() {
        let cam = EditorCamera {
            near: 1.0,
            far: 100.0,
            ..EditorCamera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO)
        };
        let vp = viewport();
        let p = Vec3::new(1.0, -0.5, 2.0);
        let ndc = cam.project(&vp, p);
        let x = (ndc.x + 1.0) * 0.5 * vp.width() as f32;
        let y = (1.0 - ndc.y) * 0.5 * vp.height() as f32;
        let depth = (ndc.z + 1.0) * 0.5;
        let back = cam.unproject(&vp, x, y, depth);
        assert!(back.distance(p) < 1e-3, "{back:?}");
    }

    #[test]
    fn orbit_keeps_distance() {
        let mut cam = EditorCamera::default();
        let before = cam.distance();
        cam.orbit(0.5, 0.2);
        assert!((cam.distance() - before).abs() < 1e-3);
    }

    #[test]
    fn dolly_stops_at_near_plane() {
        let mut cam = EditorCamera::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        cam.dolly(100.0);
        assert!((cam.distance() - cam.near).abs() < 1e-4);
    }

    #[test]
    fn pan_moves_target_with_eye() {
        let mut cam = EditorCamera::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        cam.pan(1.0, 0.0);
        assert!((cam.target.x - 1.0).abs() < 1e-5);
        assert!((cam.position.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn orthographic_projection_is_affine() {
        let cam = EditorCamera {
            projection: Projection::Orthographic { height: 10.0 },
            ..EditorCamera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO)
        };
        let m = cam.projection_matrix(&viewport());
        assert_eq!(m.w_axis.w, 1.0);
    }

    #[test]
    fn overlay_maps_top_left_to_ndc_corner() {
        let vp = viewport();
        let p = overlay_projection(&vp).project_point3(Vec3::ZERO);
        assert!((p.x + 1.0).abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }
}
