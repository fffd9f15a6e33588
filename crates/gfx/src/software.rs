use glam::{Mat4, Vec3};
use image::{Rgba, RgbaImage};
use sceneview_common::{Color, Viewport};

use crate::context::{ContextProvider, CullFace, GraphicsContext, SelectionBuffer};
use crate::raster::rasterize_triangle;

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Window depth in `[0, 1]` scaled to the full unsigned 32-bit range.
fn encode_depth(depth: f32) -> i32 {
    (f64::from(depth.clamp(0.0, 1.0)) * f64::from(u32::MAX)).round() as u32 as i32
}

#[derive(Debug)]
struct Selection {
    capacity: usize,
    data: Vec<i32>,
    hits: i32,
    overflow: bool,
    /// Depth range touched since the last name-stack change.
    pending: Option<(f32, f32)>,
}

impl Selection {
    fn record(&mut self, names: &[u32]) {
        let Some((min, max)) = self.pending.take() else {
            return;
        };
        if self.overflow {
            return;
        }
        if self.data.len() + 3 + names.len() > self.capacity {
            self.overflow = true;
            return;
        }
        self.data.push(names.len() as i32);
        self.data.push(encode_depth(min));
        self.data.push(encode_depth(max));
        self.data.extend(names.iter().map(|&n| n as i32));
        self.hits += 1;
    }
}

/// Deterministic CPU implementation of [`GraphicsContext`].
///
/// Renders flat-shaded triangles with a depth test into an RGBA framebuffer and
/// emulates fixed-function selection mode: while selecting, no pixels are
/// written and every name-stack change that follows a covered fragment
/// appends a hit record.
#[derive(Debug)]
pub struct SoftwareContext {
    width: u32,
    height: u32,
    color: Vec<[u8; 4]>,
    depth: Vec<f32>,
    viewport: Viewport,
    projection: Mat4,
    model_view: Vec<Mat4>,
    names: Vec<u32>,
    selection: Option<Selection>,
    cull: CullFace,
    draw_calls: usize,
}

impl SoftwareContext {
    pub fn new(width: u32, height: u32) -> Self {
        let len = pixel_count(width, height);
        Self {
            width,
            height,
            color: vec![[0; 4]; len],
            depth: vec![1.0; len],
            viewport: Viewport::from_size(width, height),
            projection: Mat4::IDENTITY,
            model_view: vec![Mat4::IDENTITY],
            names: Vec::new(),
            selection: None,
            cull: CullFace::None,
            draw_calls: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of `draw_triangles` calls since creation.
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    pub fn is_selecting(&self) -> bool {
        self.selection.is_some()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }

    fn top(&self) -> Mat4 {
        self.model_view.last().copied().unwrap_or(Mat4::IDENTITY)
    }
}

impl GraphicsContext for SoftwareContext {
    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn clear(&mut self, color: Color) {
        self.color.fill(color.0);
        self.depth.fill(1.0);
    }

    fn load_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn load_model_view(&mut self, model_view: Mat4) {
        if let Some(top) = self.model_view.last_mut() {
            *top = model_view;
        }
    }

    fn push_matrix(&mut self) {
        let top = self.top();
        self.model_view.push(top);
    }

    fn pop_matrix(&mut self) {
        if self.model_view.len() > 1 {
            self.model_view.pop();
        } else {
            tracing::warn!("model-view stack underflow");
        }
    }

    fn mult_matrix(&mut self, matrix: Mat4) {
        if let Some(top) = self.model_view.last_mut() {
            *top *= matrix;
        }
    }

    fn matrix_depth(&self) -> usize {
        self.model_view.len()
    }

    fn set_cull_face(&mut self, cull: CullFace) {
        self.cull = cull;
    }

    fn draw_triangles(&mut self, vertices: &[Vec3], color: Color) {
        self.draw_calls += 1;
        let mvp = self.projection * self.top();
        let (viewport, cull) = (self.viewport, self.cull);
        for tri in vertices.chunks_exact(3) {
            let clip = [
                mvp * tri[0].extend(1.0),
                mvp * tri[1].extend(1.0),
                mvp * tri[2].extend(1.0),
            ];
            if let Some(selection) = self.selection.as_mut() {
                rasterize_triangle(clip, &viewport, cull, &mut |_, _, d| {
                    selection.pending = Some(match selection.pending {
                        Some((min, max)) => (min.min(d), max.max(d)),
                        None => (d, d),
                    });
                });
            } else {
                let (width, height) = (self.width as i32, self.height as i32);
                let (colors, depths) = (&mut self.color, &mut self.depth);
                rasterize_triangle(clip, &viewport, cull, &mut |x, y, d| {
                    if x < 0 || y < 0 || x >= width || y >= height {
                        return;
                    }
                    let i = y as usize * width as usize + x as usize;
                    if d < depths[i] {
                        depths[i] = d;
                        colors[i] = color.0;
                    }
                });
            }
        }
    }

    fn begin_selection(&mut self, capacity: usize) {
        self.names.clear();
        self.selection = Some(Selection {
            capacity,
            data: Vec::new(),
            hits: 0,
            overflow: false,
            pending: None,
        });
    }

    fn end_selection(&mut self) -> SelectionBuffer {
        let Some(mut selection) = self.selection.take() else {
            return SelectionBuffer::default();
        };
        selection.record(&self.names);
        self.names.clear();
        SelectionBuffer {
            hits: if selection.overflow { -1 } else { selection.hits },
            data: selection.data,
        }
    }

    fn push_name(&mut self, name: u32) {
        if let Some(selection) = self.selection.as_mut() {
            selection.record(&self.names);
            self.names.push(name);
        }
    }

    fn pop_name(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.record(&self.names);
            self.names.pop();
        }
    }

    fn name_depth(&self) -> usize {
        self.names.len()
    }

    fn flush(&mut self) {}

    fn read_pixels(&mut self, viewport: Viewport) -> RgbaImage {
        let width = viewport.width().max(0) as u32;
        let height = viewport.height().max(0) as u32;
        RgbaImage::from_fn(width, height, |x, y| {
            let px = viewport.left + x as i32;
            let py = viewport.top + y as i32;
            Rgba(self.index(px, py).map_or([0; 4], |i| self.color[i]))
        })
    }
}

/// Single-context provider around a [`SoftwareContext`].
#[derive(Debug)]
pub struct SoftwareProvider {
    context: SoftwareContext,
    available: bool,
    current: bool,
    acquisitions: usize,
}

impl SoftwareProvider {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            context: SoftwareContext::new(width, height),
            available: true,
            current: false,
            acquisitions: 0,
        }
    }

    /// A provider whose context can never be made current.
    pub fn unavailable(width: u32, height: u32) -> Self {
        Self {
            available: false,
            ..Self::new(width, height)
        }
    }

    pub fn is_current(&self) -> bool {
        self.current
    }

    /// Number of successful `make_current` calls.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions
    }
}

impl ContextProvider for SoftwareProvider {
    type Context = SoftwareContext;

    fn make_current(&mut self) -> bool {
        if !self.available || self.current {
            return false;
        }
        self.current = true;
        self.acquisitions += 1;
        true
    }

    fn release(&mut self) {
        self.current = false;
    }

    fn context(&self) -> &SoftwareContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut SoftwareContext {
        &mut self.context
    }

    /// Replace the context with a fresh one when it is smaller than requested.
    fn resize(&mut self, width: u32, height: u32) {
        let (current_width, current_height) = self.context.size();
        if current_width < width || current_height < height {
            let (width, height) = (width.max(current_width), height.max(current_height));
            tracing::debug!(width, height, "growing software context");
            self.context = SoftwareContext::new(width, height);
        }
    }
}
