//! Selection-mode picking.
//!
//! Each selection pass is re-rendered with a pick-restricted projection while
//! every renderable carries its submission index as its selection name. The
//! returned hit buffer is decoded and resolved back to renderables.
//!
//! Hits come back **back-to-front**, the same order the frame is drawn in:
//! the hit nearest to the camera is last. Use [`nearest_first`] when the
//! nearest hit should come first.
//!
//! # Hit buffer overflow
//!
//! When a pass produces more records than the hit buffer holds, only the
//! records that fit are returned. Renderables are submitted back-to-front, so
//! the records that fit belong to the **farthest** renderables and the nearest
//! ones are lost. A click or handle drag under overflow then acts on a far
//! object; size `hit_buffer_capacity` for the densest expected pick region.

use sceneview_common::{PickRegion, Viewport};
use sceneview_gfx::{acquire, Camera, ContextProvider, GraphicsContext, SelectionBuffer};
use sceneview_scene::{Pass, MANIPULATOR_SELECTION, SELECTION_PASSES};

use crate::key::sort_back_to_front;
use crate::scheduler::PassScheduler;
use crate::{RenderData, Renderable};

/// Hit buffer capacity, in integers.
pub const HIT_BUFFER_CAPACITY: usize = 4096;

/// One decoded record of a selection buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRecord {
    /// First name on the record's name stack.
    pub name: u32,
    pub min_depth: u32,
    pub max_depth: u32,
}

/// A picked renderable.
#[derive(Debug, Clone)]
pub struct Hit {
    pub pass: Pass,
    pub renderable: Renderable,
    pub record: HitRecord,
}

impl AsRef<Renderable> for Hit {
    fn as_ref(&self) -> &Renderable {
        &self.renderable
    }
}

/// Decode a selection buffer.
///
/// Records are `[name_count, min_depth, max_depth, names...]`; depths are
/// unsigned values stored in signed slots. Records with an empty name stack
/// are skipped. On overflow (negative hit count) every complete record in the
/// buffer is decoded and a warning is logged.
pub fn decode_hits(buffer: &SelectionBuffer) -> Vec<HitRecord> {
    let limit = if buffer.hits < 0 {
        tracing::warn!(
            capacity = buffer.data.len(),
            "selection buffer overflowed; pick results truncated"
        );
        usize::MAX
    } else {
        buffer.hits as usize
    };

    let data = &buffer.data;
    let mut records = Vec::new();
    let mut seen = 0;
    let mut i = 0;
    while seen < limit && i + 3 <= data.len() {
        let Ok(count) = usize::try_from(data[i]) else {
            break;
        };
        if i + 3 + count > data.len() {
            break;
        }
        if count > 0 {
            records.push(HitRecord {
                name: data[i + 3] as u32,
                min_depth: data[i + 1] as u32,
                max_depth: data[i + 2] as u32,
            });
        }
        seen += 1;
        i += 3 + count;
    }
    records
}

/// Reverse a back-to-front hit list so the nearest hit comes first.
pub fn nearest_first(mut hits: Vec<Hit>) -> Vec<Hit> {
    hits.reverse();
    hits
}

/// Selection-mode renderer.
#[derive(Debug, Clone, Copy)]
pub struct PickRenderer {
    pub hit_buffer_capacity: usize,
}

impl Default for PickRenderer {
    fn default() -> Self {
        Self {
            hit_buffer_capacity: HIT_BUFFER_CAPACITY,
        }
    }
}

impl PickRenderer {
    pub fn new(hit_buffer_capacity: usize) -> Self {
        Self {
            hit_buffer_capacity,
        }
    }

    /// Pick scene objects in the selection passes.
    pub fn pick<P, C>(
        &self,
        viewport: Viewport,
        provider: &mut P,
        camera: &C,
        region: Option<PickRegion>,
        data: &RenderData,
    ) -> Vec<Hit>
    where
        P: ContextProvider + ?Sized,
        C: Camera + ?Sized,
    {
        self.pick_passes(viewport, provider, camera, region, data, &SELECTION_PASSES)
    }

    /// Pick tool handles. Manipulators are hit, never selected.
    pub fn pick_manipulators<P, C>(
        &self,
        viewport: Viewport,
        provider: &mut P,
        camera: &C,
        region: Option<PickRegion>,
        manipulators: &RenderData,
    ) -> Vec<Hit>
    where
        P: ContextProvider + ?Sized,
        C: Camera + ?Sized,
    {
        let mut hits = self.pick_passes(
            viewport,
            provider,
            camera,
            region,
            manipulators,
            &[MANIPULATOR_SELECTION],
        );
        for hit in &mut hits {
            hit.renderable.selected = false;
        }
        hits
    }

    /// Pick in the given passes, in order. Hits of each pass are sorted
    /// back-to-front and appended after those of the previous pass.
    pub fn pick_passes<P, C>(
        &self,
        viewport: Viewport,
        provider: &mut P,
        camera: &C,
        region: Option<PickRegion>,
        data: &RenderData,
        passes: &[Pass],
    ) -> Vec<Hit>
    where
        P: ContextProvider + ?Sized,
        C: Camera + ?Sized,
    {
        let Some(region) = region else {
            return Vec::new();
        };
        if viewport.is_empty() || region.is_degenerate() {
            tracing::debug!(?viewport, ?region, "nothing to pick");
            return Vec::new();
        }
        if passes.iter().all(|&pass| data.get(pass).is_empty()) {
            return Vec::new();
        }
        let _span = tracing::info_span!("pick", x = region.center_x, y = region.center_y).entered();
        let Some(mut guard) = acquire(provider) else {
            return Vec::new();
        };
        let ctx: &mut dyn GraphicsContext = &mut *guard;
        ctx.set_viewport(viewport);

        let scheduler = PassScheduler::new(camera, viewport).with_pick_region(region);
        let mut hits = Vec::new();
        for &pass in passes {
            let items = data.get(pass);
            if items.is_empty() {
                continue;
            }
            ctx.begin_selection(self.hit_buffer_capacity);
            scheduler.configure(ctx, pass);
            let submitted = scheduler.submit(ctx, pass, items);
            ctx.flush();
            let buffer = ctx.end_selection();

            let mut pass_hits: Vec<Hit> = decode_hits(&buffer)
                .into_iter()
                .filter_map(|record| match submitted.get(record.name as usize) {
                    Some(renderable) => Some(Hit {
                        pass,
                        renderable: (*renderable).clone(),
                        record,
                    }),
                    None => {
                        tracing::warn!(%pass, name = record.name, "hit names no submitted renderable");
                        None
                    }
                })
                .collect();
            sort_back_to_front(camera, &viewport, &mut pass_hits);
            tracing::debug!(%pass, hits = pass_hits.len(), "pick pass");
            hits.extend(pass_hits);
        }
        hits
    }
}

/// [`PickRenderer::pick`] with the default hit buffer capacity.
pub fn pick<P, C>(
    viewport: Viewport,
    provider: &mut P,
    camera: &C,
    region: Option<PickRegion>,
    data: &RenderData,
) -> Vec<Hit>
where
    P: ContextProvider + ?Sized,
    C: Camera + ?Sized,
{
    PickRenderer::default().pick(viewport, provider, camera, region, data)
}
