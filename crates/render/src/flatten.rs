use std::collections::{BTreeMap, BTreeSet};

use glam::{Mat4, Vec3};
use sceneview_common::NodeId;
use sceneview_scene::{Pass, RenderArgs, RenderComponent, SceneNode, Shape};

/// Per-frame draw record derived from a scene node.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub node_id: NodeId,
    pub world_transform: Mat4,
    pub shape: Shape,
    pub passes: BTreeSet<Pass>,
    pub selected: bool,
    pub index: Option<u32>,
    pub manipulator: bool,
}

impl Renderable {
    pub fn new(node_id: NodeId, world_transform: Mat4, component: &RenderComponent) -> Self {
        Self {
            node_id,
            world_transform,
            shape: component.shape.clone(),
            passes: component.passes.clone(),
            selected: false,
            index: component.index,
            manipulator: component.manipulator,
        }
    }

    /// World-space origin of the renderable.
    pub fn origin(&self) -> Vec3 {
        self.world_transform.w_axis.truncate()
    }

    pub fn args(&self, pass: Pass) -> RenderArgs {
        RenderArgs {
            pass,
            node_id: self.node_id,
            world_transform: self.world_transform,
            selected: self.selected,
        }
    }
}

/// Flattened scene: renderables grouped by pass plus the selected subset.
#[derive(Debug, Clone, Default)]
pub struct RenderData {
    pub passes: BTreeMap<Pass, Vec<Renderable>>,
    /// Selected renderables that take part in a selection pass, in traversal order.
    pub selected: Vec<Renderable>,
}

impl RenderData {
    pub fn get(&self, pass: Pass) -> &[Renderable] {
        self.passes.get(&pass).map_or(&[], Vec::as_slice)
    }

    /// Total number of draw entries across all passes.
    pub fn len(&self) -> usize {
        self.passes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a renderable to every pass it declares.
    pub fn push(&mut self, renderable: Renderable) {
        let passes: Vec<Pass> = renderable.passes.iter().copied().collect();
        if let Some((last, rest)) = passes.split_last() {
            for pass in rest {
                self.passes.entry(*pass).or_default().push(renderable.clone());
            }
            self.passes.entry(*last).or_default().push(renderable);
        }
    }
}

/// Flatten a scene tree into per-pass renderables.
///
/// Pre-order walk; each node's world transform is `inherited * local`. Nodes
/// without a renderable contribute nothing but still propagate their
/// transform to their children.
pub fn flatten(root: &SceneNode, selection: &BTreeSet<NodeId>, start: Mat4) -> RenderData {
    let mut data = RenderData::default();
    visit(root, selection, start, &mut data);
    tracing::trace!(entries = data.len(), selected = data.selected.len(), "scene flattened");
    data
}

/// [`flatten`], then append camera-dependent extras such as manipulators.
pub fn flatten_with_extras(
    root: &SceneNode,
    selection: &BTreeSet<NodeId>,
    start: Mat4,
    extras: impl IntoIterator<Item = Renderable>,
) -> RenderData {
    let mut data = flatten(root, selection, start);
    for extra in extras {
        data.push(extra);
    }
    data
}

fn visit(node: &SceneNode, selection: &BTreeSet<NodeId>, inherited: Mat4, data: &mut RenderData) {
    let world = inherited * node.local_matrix();
    if let Some(component) = &node.renderable {
        let mut renderable = Renderable::new(node.id, world, component);
        renderable.selected = selection.contains(&node.id);
        if renderable.selected && renderable.passes.iter().any(|p| p.is_selection()) {
            data.selected.push(renderable.clone());
        }
        data.push(renderable);
    }
    for child in &node.children {
        visit(child, selection, world, data);
    }
}
