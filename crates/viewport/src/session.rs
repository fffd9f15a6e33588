use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::{Mat4, Vec2};
use image::RgbaImage;
use sceneview_common::{NodeId, PickRegion, Viewport};
use sceneview_gfx::{ContextProvider, EditorCamera};
use sceneview_graph::{Graph, GraphError, Inputs};
use sceneview_input::{
    compute_pick_region_with_min, dispatch, pick_ray, resolve_selection, Action, InputEvent, MarqueeSelector, OpSeq,
    Platform,
};
use sceneview_render::{flatten_with_extras, nearest_first, FrameRenderer, Hit, PickRenderer, RenderData};
use sceneview_scene::{Scene, Shape};

use crate::manipulator::{backdrop, translate_handles, TranslateDrag};
use crate::{ViewportConfig, ViewportError};

const SCENE: &str = "scene";
const SELECTION: &str = "selection";
const CAMERA: &str = "camera";
const VIEWPORT: &str = "viewport";
const SCENE_DATA: &str = "scene_data";
const HANDLES: &str = "handles";
const FRAME_DATA: &str = "frame_data";

/// Per-session counters for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub frames_rendered: usize,
    pub frames_reused: usize,
    pub picks: usize,
    pub last_frame_time: Duration,
}

#[derive(Debug, Clone)]
enum Gesture {
    Idle,
    /// Marquee selection; `base` is the selection when the gesture began.
    Select { op_seq: OpSeq, base: BTreeSet<NodeId> },
    Translate(TranslateDrag),
}

struct CachedFrame {
    /// Versions of frame data, camera and viewport the image was rendered from.
    key: [u64; 3],
    image: Arc<RgbaImage>,
}

/// One editor viewport: scene, selection, camera and viewport held as graph
/// inputs, with flattening memoized and frames reused while nothing they
/// depend on changed.
pub struct ViewportSession<P: ContextProvider> {
    config: ViewportConfig,
    provider: P,
    graph: Graph,
    marquee: MarqueeSelector,
    gesture: Gesture,
    frame: Option<CachedFrame>,
    stats: SessionStats,
}

impl<P: ContextProvider> ViewportSession<P> {
    pub fn new(
        mut provider: P,
        scene: Scene,
        camera: EditorCamera,
        viewport: Viewport,
        config: ViewportConfig,
    ) -> Result<Self, ViewportError> {
        fit_surface(&mut provider, viewport);
        let graph = build_graph(scene, camera, viewport, &config)?;
        let marquee = MarqueeSelector::new(Platform::current()).with_min_pick_size(config.min_pick_size);
        Ok(Self {
            config,
            provider,
            graph,
            marquee,
            gesture: Gesture::Idle,
            frame: None,
            stats: SessionStats::default(),
        })
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Use a platform other than the host's for modifier conventions.
    pub fn set_platform(&mut self, platform: Platform) {
        self.marquee = MarqueeSelector::new(platform).with_min_pick_size(self.config.min_pick_size);
    }

    pub fn scene(&mut self) -> Result<Arc<Scene>, ViewportError> {
        Ok(self.graph.get::<Scene>(SCENE)?)
    }

    /// Replace the scene. Selected ids that no longer exist are dropped.
    pub fn set_scene(&mut self, scene: Scene) -> Result<(), ViewportError> {
        scene.validate()?;
        let selection = self.selection()?;
        let kept: BTreeSet<NodeId> = selection.iter().copied().filter(|id| scene.find(*id).is_some()).collect();
        self.graph.set(SCENE, scene)?;
        self.gesture = Gesture::Idle;
        self.set_selection(kept)
    }

    pub fn selection(&mut self) -> Result<Arc<BTreeSet<NodeId>>, ViewportError> {
        Ok(self.graph.get::<BTreeSet<NodeId>>(SELECTION)?)
    }

    /// Replace the selection. Setting an identical selection changes nothing.
    pub fn set_selection(&mut self, selection: BTreeSet<NodeId>) -> Result<(), ViewportError> {
        if *self.selection()? == selection {
            return Ok(());
        }
        tracing::debug!(selected = selection.len(), "selection changed");
        self.graph.set(SELECTION, selection)?;
        Ok(())
    }

    pub fn camera(&mut self) -> Result<Arc<EditorCamera>, ViewportError> {
        Ok(self.graph.get::<EditorCamera>(CAMERA)?)
    }

    pub fn set_camera(&mut self, camera: EditorCamera) -> Result<(), ViewportError> {
        self.graph.set(CAMERA, camera)?;
        Ok(())
    }

    pub fn viewport(&mut self) -> Result<Viewport, ViewportError> {
        Ok(*self.graph.get::<Viewport>(VIEWPORT)?)
    }

    /// Change the viewport rectangle, growing the provider's surface to cover it.
    pub fn resize(&mut self, viewport: Viewport) -> Result<(), ViewportError> {
        if self.viewport()? != viewport {
            fit_surface(&mut self.provider, viewport);
            self.graph.set(VIEWPORT, viewport)?;
        }
        Ok(())
    }

    /// Flattened scene, without manipulators.
    pub fn render_data(&mut self) -> Result<Arc<RenderData>, ViewportError> {
        Ok(self.graph.get::<RenderData>(SCENE_DATA)?)
    }

    /// Render the viewport, reusing the previous image when neither the scene,
    /// the selection, the camera nor the viewport changed since.
    ///
    /// `Ok(None)` when the viewport is empty or no context is available.
    pub fn render(&mut self) -> Result<Option<Arc<RgbaImage>>, ViewportError> {
        let data = self.graph.get::<RenderData>(FRAME_DATA)?;
        let camera = self.camera()?;
        let viewport = self.viewport()?;
        let key = [
            self.graph.version(FRAME_DATA)?,
            self.graph.version(CAMERA)?,
            self.graph.version(VIEWPORT)?,
        ];
        if let Some(frame) = self.frame.as_ref().filter(|frame| frame.key == key) {
            self.stats.frames_reused += 1;
            return Ok(Some(Arc::clone(&frame.image)));
        }

        let started = Instant::now();
        let renderer = FrameRenderer::new(self.config.clear_color);
        let Some(image) = renderer.render(viewport, &mut self.provider, &*camera, &data) else {
            return Ok(None);
        };
        let image = Arc::new(image);
        self.stats.frames_rendered += 1;
        self.stats.last_frame_time = started.elapsed();
        tracing::debug!(elapsed = ?self.stats.last_frame_time, "frame rendered");
        self.frame = Some(CachedFrame {
            key,
            image: Arc::clone(&image),
        });
        Ok(Some(image))
    }

    /// Pick scene objects. Hits are back-to-front, nearest last.
    pub fn pick(&mut self, region: Option<PickRegion>) -> Result<Vec<Hit>, ViewportError> {
        let data = self.render_data()?;
        let camera = self.camera()?;
        let viewport = self.viewport()?;
        self.stats.picks += 1;
        Ok(self.picker().pick(viewport, &mut self.provider, &*camera, region, &data))
    }

    /// Pick translate handles. Hits are back-to-front, nearest last.
    pub fn pick_manipulators(&mut self, region: Option<PickRegion>) -> Result<Vec<Hit>, ViewportError> {
        let handles = self.graph.get::<RenderData>(HANDLES)?;
        let camera = self.camera()?;
        let viewport = self.viewport()?;
        self.stats.picks += 1;
        Ok(self
            .picker()
            .pick_manipulators(viewport, &mut self.provider, &*camera, region, &handles))
    }

    /// Feed a pointer event through handle dragging and marquee selection.
    /// Returns the actions the event produced, already applied.
    pub fn handle_event(&mut self, event: &InputEvent) -> Result<Vec<Action>, ViewportError> {
        let translating = match self.gesture {
            Gesture::Translate(drag) => Some(drag),
            _ => None,
        };
        match (*event, translating) {
            (InputEvent::PointerDown { position, .. }, _) => {
                if let Some(drag) = self.begin_translate(position)? {
                    tracing::debug!(node = %drag.node, "handle drag started");
                    self.gesture = Gesture::Translate(drag);
                    return Ok(Vec::new());
                }
            }
            (InputEvent::PointerMove { position }, Some(drag)) => {
                self.update_translate(&drag, position)?;
                return Ok(Vec::new());
            }
            (InputEvent::PointerUp { .. }, Some(_)) => {
                self.gesture = Gesture::Idle;
                return Ok(Vec::new());
            }
            _ => {}
        }

        let actions = dispatch(&mut [&mut self.marquee], event);
        for action in &actions {
            self.apply(action)?;
        }
        if !self.marquee.is_dragging() {
            self.gesture = Gesture::Idle;
        }
        Ok(actions)
    }

    /// Apply an action produced by an input handler.
    pub fn apply(&mut self, action: &Action) -> Result<(), ViewportError> {
        match *action {
            Action::Select { op_seq, region, mode } => {
                let ongoing = match &self.gesture {
                    Gesture::Select { op_seq: current, base } if *current == op_seq => Some(base.clone()),
                    _ => None,
                };
                let base = match ongoing {
                    Some(base) => base,
                    None => {
                        let base = (*self.selection()?).clone();
                        self.gesture = Gesture::Select {
                            op_seq,
                            base: base.clone(),
                        };
                        base
                    }
                };
                let hits = self.pick(Some(region))?;
                let root = self.scene()?.root_id();
                let next = resolve_selection(&base, hits.iter().map(|hit| hit.renderable.node_id), mode, Some(root));
                self.set_selection(next)
            }
        }
    }

    fn picker(&self) -> PickRenderer {
        PickRenderer::new(self.config.hit_buffer_capacity)
    }

    fn begin_translate(&mut self, position: Vec2) -> Result<Option<TranslateDrag>, ViewportError> {
        if !self.config.manipulators {
            return Ok(None);
        }
        let region = compute_pick_region_with_min(position, position, self.config.min_pick_size);
        let Some(hit) = nearest_first(self.pick_manipulators(Some(region))?).into_iter().next() else {
            return Ok(None);
        };
        let Shape::Axis { axis, .. } = &hit.renderable.shape else {
            return Ok(None);
        };

        let scene = self.scene()?;
        let node_id = hit.renderable.node_id;
        let node = scene.find(node_id).ok_or(ViewportError::UnknownNode(node_id))?;
        let world = scene.world_matrix(node_id).ok_or(ViewportError::UnknownNode(node_id))?;
        let start = node.transform.unwrap_or_default();
        let parent_world = world * start.matrix().inverse();

        let camera = self.camera()?;
        let viewport = self.viewport()?;
        let ray = pick_ray(&*camera, &viewport, position);
        Ok(TranslateDrag::begin(
            &ray,
            node_id,
            axis.unit(),
            hit.renderable.origin(),
            camera.forward(),
            start,
            parent_world,
        ))
    }

    fn update_translate(&mut self, drag: &TranslateDrag, position: Vec2) -> Result<(), ViewportError> {
        let camera = self.camera()?;
        let viewport = self.viewport()?;
        let Some(transform) = drag.update(&pick_ray(&*camera, &viewport, position)) else {
            return Ok(());
        };
        let mut scene = (*self.scene()?).clone();
        let node = scene.find_mut(drag.node).ok_or(ViewportError::UnknownNode(drag.node))?;
        node.transform = Some(transform);
        tracing::trace!(node = %drag.node, position = ?transform.position, "handle drag");
        self.graph.set(SCENE, scene)?;
        Ok(())
    }
}

fn fit_surface<P: ContextProvider>(provider: &mut P, viewport: Viewport) {
    if !viewport.is_empty() {
        provider.resize(viewport.right.max(0) as u32, viewport.bottom.max(0) as u32);
    }
}

fn build_graph(
    scene: Scene,
    camera: EditorCamera,
    viewport: Viewport,
    config: &ViewportConfig,
) -> Result<Graph, GraphError> {
    let mut graph = Graph::new();
    graph.add_input_with(SCENE, scene)?;
    graph.add_input_with(SELECTION, BTreeSet::<NodeId>::new())?;
    graph.add_input_with(CAMERA, camera)?;
    graph.add_input_with(VIEWPORT, viewport)?;

    let background = config.background_color;
    let backdrop_id = NodeId::new();
    graph.add_derived(SCENE_DATA, &[SCENE, SELECTION, VIEWPORT], move |inputs: &Inputs<'_>| {
        let scene = inputs.get::<Scene>(SCENE)?;
        let selection = inputs.get::<BTreeSet<NodeId>>(SELECTION)?;
        let viewport = inputs.get::<Viewport>(VIEWPORT)?;
        let extras = background.map(|color| backdrop(backdrop_id, viewport, color));
        Ok(flatten_with_extras(&scene.root, selection, Mat4::IDENTITY, extras))
    })?;

    let (enabled, length) = (config.manipulators, config.manipulator_length);
    graph.add_derived(HANDLES, &[SCENE_DATA], move |inputs: &Inputs<'_>| {
        let data = inputs.get::<RenderData>(SCENE_DATA)?;
        Ok(if enabled {
            translate_handles(data, length)
        } else {
            RenderData::default()
        })
    })?;

    graph.add_derived(FRAME_DATA, &[SCENE_DATA, HANDLES], |inputs: &Inputs<'_>| {
        let mut data = inputs.get::<RenderData>(SCENE_DATA)?.clone();
        for (pass, items) in &inputs.get::<RenderData>(HANDLES)?.passes {
            data.passes.entry(*pass).or_default().extend(items.iter().cloned());
        }
        Ok(data)
    })?;
    Ok(graph)
}
