//! Triangle setup for the software context: near-plane clipping, viewport
//! mapping and pixel-center coverage.

use glam::{Vec3, Vec4};
use sceneview_common::Viewport;

use crate::context::CullFace;

/// Clip a triangle against the near plane (`z + w >= 0`).
fn clip_near(triangle: [Vec4; 3]) -> Vec<Vec4> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let a = triangle[i];
        let b = triangle[(i + 1) % 3];
        let da = a.z + a.w;
        let db = b.z + b.w;
        if da >= 0.0 {
            out.push(a);
        }
        if (da >= 0.0) != (db >= 0.0) {
            let t = da / (da - db);
            out.push(a + (b - a) * t);
        }
    }
    out
}

fn to_window(clip: Vec4, viewport: &Viewport) -> Vec3 {
    let ndc = clip.truncate() / clip.w;
    Vec3::new(
        viewport.left as f32 + (ndc.x + 1.0) * 0.5 * viewport.width() as f32,
        viewport.top as f32 + (1.0 - ndc.y) * 0.5 * viewport.height() as f32,
        ndc.z,
    )
}

fn edge(a: Vec3, b: Vec3, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Rasterize a clip-space triangle, calling `emit(x, y, depth)` for every
/// covered pixel inside the viewport. `depth` is the window depth in `[0, 1]`.
pub(crate) fn rasterize_triangle(
    triangle: [Vec4; 3],
    viewport: &Viewport,
    cull: CullFace,
    emit: &mut dyn FnMut(i32, i32, f32),
) {
    if triangle.iter().any(|v| !v.is_finite()) {
        return;
    }
    let polygon = clip_near(triangle);
    if polygon.len() < 3 {
        return;
    }
    let window: Vec<Vec3> = polygon.iter().map(|&v| to_window(v, viewport)).collect();
    for i in 1..window.len() - 1 {
        fill(window[0], window[i], window[i + 1], viewport, cull, emit);
    }
}

fn fill(a: Vec3, b: Vec3, c: Vec3, viewport: &Viewport, cull: CullFace, emit: &mut dyn FnMut(i32, i32, f32)) {
    let area = edge(a, b, c.x, c.y);
    if area.abs() <= f32::EPSILON {
        return;
    }
    // Window y points down, so front faces have negative area.
    let culled = match cull {
        CullFace::None => false,
        CullFace::Front => area < 0.0,
        CullFace::Back => area > 0.0,
    };
    if culled {
        return;
    }
    let min_x = a.x.min(b.x).min(c.x).floor().max(viewport.left as f32) as i32;
    let max_x = a.x.max(b.x).max(c.x).ceil().min(viewport.right as f32) as i32;
    let min_y = a.y.min(b.y).min(c.y).floor().max(viewport.top as f32) as i32;
    let max_y = a.y.max(b.y).max(c.y).ceil().min(viewport.bottom as f32) as i32;

    for y in min_y..max_y {
        let py = y as f32 + 0.5;
        for x in min_x..max_x {
            let px = x as f32 + 0.5;
            let w0 = edge(b, c, px, py) / area;
            let w1 = edge(c, a, px, py) / area;
            let w2 = edge(a, b, px, py) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let z = w0 * a.z + w1 * b.z + w2 * c.z;
            if (-1.0..=1.0).contains(&z) {
                emit(x, y, (z + 1.0) * 0.5);
            }
        }
    }
}
