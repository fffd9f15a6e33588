use glam::{Vec2, Vec3};
use sceneview_common::{PickRegion, Viewport};
use sceneview_gfx::Camera;

/// Half-line in world space. `direction` is unit length unless the ray is
/// degenerate, in which case it is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersection with the plane through `point` with normal `normal`.
    ///
    /// `None` when the ray is parallel to the plane or the plane lies behind
    /// the origin.
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        let denom = normal.dot(self.direction);
        if denom.abs() <= 1.0e-6 {
            return None;
        }
        let t = normal.dot(point - self.origin) / denom;
        if t <= 0.0 {
            return None;
        }
        Some(self.at(t))
    }
}

/// Screen position plus depth (0 at the near plane, 1 at the far plane) to
/// world space.
pub fn screen_to_world<C: Camera + ?Sized>(camera: &C, viewport: &Viewport, screen: Vec3) -> Vec3 {
    camera.unproject(viewport, screen.x, screen.y, screen.z)
}

/// World-space ray through a screen position, from the near plane towards the
/// far plane.
pub fn pick_ray<C: Camera + ?Sized>(camera: &C, viewport: &Viewport, screen: Vec2) -> Ray {
    let near = screen_to_world(camera, viewport, screen.extend(0.0));
    let far = screen_to_world(camera, viewport, screen.extend(1.0));
    Ray::new(near, far - near)
}

/// Pick region spanning two screen points, each side at least
/// [`sceneview_common::MIN_PICK_SIZE`] pixels.
pub fn compute_pick_region(start: Vec2, current: Vec2) -> PickRegion {
    let center = (start + current) * 0.5;
    let size = (current - start).abs();
    PickRegion::around(center.x, center.y, size.x, size.y)
}

/// [`compute_pick_region`] with a caller-chosen minimum side. The minimum
/// never drops below [`sceneview_common::MIN_PICK_SIZE`].
pub fn compute_pick_region_with_min(start: Vec2, current: Vec2, min_size: f32) -> PickRegion {
    let region = compute_pick_region(start, current);
    PickRegion {
        width: region.width.max(min_size),
        height: region.height.max(min_size),
        ..region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sceneview_gfx::EditorCamera;

    fn camera() -> EditorCamera {
        EditorCamera {
            near: 1.0,
            far: 100.0,
            ..EditorCamera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO)
        }
    }

    #[test]
    fn single_point_gives_minimum_region() {
        let p = Vec2::new(40.0, 25.0);
        let region = compute_pick_region(p, p);
        assert_eq!(region.center_x, 40.0);
        assert_eq!(region.center_y, 25.0);
        assert_eq!(region.width, 10.0);
        assert_eq!(region.height, 10.0);
    }

    #[test]
    fn region_is_bounding_rect_in_any_drag_direction() {
        let a = compute_pick_region(Vec2::new(10.0, 80.0), Vec2::new(110.0, 20.0));
        let b = compute_pick_region(Vec2::new(110.0, 20.0), Vec2::new(10.0, 80.0));
        assert_eq!(a, b);
        assert_eq!((a.center_x, a.center_y), (60.0, 50.0));
        assert_eq!((a.width, a.height), (100.0, 60.0));
    }

    #[test]
    fn thin_drag_keeps_minimum_height() {
        let region = compute_pick_region(Vec2::new(0.0, 5.0), Vec2::new(50.0, 7.0));
        assert_eq!(region.width, 50.0);
        assert_eq!(region.height, 10.0);
    }

    #[test]
    fn configured_minimum_widens_region() {
        let p = Vec2::new(5.0, 5.0);
        let region = compute_pick_region_with_min(p, p, 24.0);
        assert_eq!((region.width, region.height), (24.0, 24.0));
        let floor = compute_pick_region_with_min(p, p, 2.0);
        assert_eq!(floor.width, 10.0);
    }

    #[test]
    fn center_ray_points_down_the_view_axis() {
        let vp = Viewport::from_size(200, 100);
        let ray = pick_ray(&camera(), &vp, Vec2::new(100.0, 50.0));
        assert!(ray.direction.abs_diff_eq(Vec3::NEG_Z, 1e-4));
        assert!(ray.origin.abs_diff_eq(Vec3::new(0.0, 0.0, 9.0), 1e-3));
    }

    #[test]
    fn screen_to_world_depth_endpoints() {
        let vp = Viewport::from_size(100, 100);
        let cam = camera();
        let near = screen_to_world(&cam, &vp, Vec3::new(50.0, 50.0, 0.0));
        let far = screen_to_world(&cam, &vp, Vec3::new(50.0, 50.0, 1.0));
        assert!((near.z - 9.0).abs() < 1e-3);
        assert!((far.z + 90.0).abs() < 0.5);
    }

    #[test]
    fn ray_hits_ground_plane() {
        let vp = Viewport::from_size(100, 100);
        let cam = EditorCamera {
            position: Vec3::new(0.0, 10.0, 10.0),
            ..camera()
        };
        let ray = pick_ray(&cam, &vp, Vec2::new(50.0, 50.0));
        let hit = ray.intersect_plane(Vec3::ZERO, Vec3::Y).unwrap();
        assert!(hit.abs_diff_eq(Vec3::ZERO, 1e-2));
    }

    #[test]
    fn parallel_or_behind_plane_misses() {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(ray.intersect_plane(Vec3::ZERO, Vec3::Y).is_none());
        let up = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        assert!(up.intersect_plane(Vec3::ZERO, Vec3::Y).is_none());
    }
}
