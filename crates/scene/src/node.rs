use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use glam::Mat4;
use sceneview_common::{NodeId, Transform};
use serde::{Deserialize, Serialize};

use crate::{Pass, Shape};

/// Errors from loading or validating a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("node {0} appears more than once")]
    DuplicateNode(NodeId),
}

/// What a node draws and in which passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderComponent {
    pub shape: Shape,
    pub passes: BTreeSet<Pass>,
    /// Manual priority; higher values sort in front within a pass.
    #[serde(default)]
    pub index: Option<u32>,
    /// Tool handles always sort and pick in front of scene content.
    #[serde(default)]
    pub manipulator: bool,
}

impl RenderComponent {
    pub fn new(shape: Shape, passes: impl IntoIterator<Item = Pass>) -> Self {
        Self {
            shape,
            passes: passes.into_iter().collect(),
            index: None,
            manipulator: false,
        }
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    pub fn as_manipulator(mut self) -> Self {
        self.manipulator = true;
        self
    }
}

/// A node of the scene tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    #[serde(default)]
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renderable: Option<RenderComponent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneNode>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneNode {
    pub fn new() -> Self {
        Self::with_id(NodeId::new())
    }

    pub fn with_id(id: NodeId) -> Self {
        Self {
            id,
            name: None,
            transform: None,
            renderable: None,
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_renderable(mut self, renderable: RenderComponent) -> Self {
        self.renderable = Some(renderable);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Local matrix, identity when the node has no transform.
    pub fn local_matrix(&self) -> Mat4 {
        self.transform.map_or(Mat4::IDENTITY, |t| t.matrix())
    }

    /// Pre-order walk over this node and its descendants.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a SceneNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn find(&self, id: NodeId) -> Option<&SceneNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Ids of the nodes on the path from this node to `id`, inclusive.
    pub fn path_to(&self, id: NodeId) -> Option<Vec<NodeId>> {
        if self.id == id {
            return Some(vec![self.id]);
        }
        self.children.iter().find_map(|c| {
            c.path_to(id).map(|mut path| {
                path.insert(0, self.id);
                path
            })
        })
    }
}

/// A scene tree with a single root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub root: SceneNode,
}

impl Scene {
    /// Build a scene, rejecting duplicate node ids.
    pub fn new(root: SceneNode) -> Result<Self, SceneError> {
        let scene = Self { root };
        scene.validate()?;
        Ok(scene)
    }

    pub fn root_id(&self) -> NodeId {
        self.root.id
    }

    pub fn find(&self, id: NodeId) -> Option<&SceneNode> {
        self.root.find(id)
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.root.find_mut(id)
    }

    /// World matrix of `id`: the product of the local matrices from the root
    /// down to the node.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let path = self.root.path_to(id)?;
        let mut node = &self.root;
        let mut world = node.local_matrix();
        for step in &path[1..] {
            node = node.children.iter().find(|c| c.id == *step)?;
            world *= node.local_matrix();
        }
        Some(world)
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.root.walk(&mut |_| count += 1);
        count
    }

    /// All node ids in pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.root.walk(&mut |n| ids.push(n.id));
        ids
    }

    pub fn validate(&self) -> Result<(), SceneError> {
        let mut seen = HashSet::new();
        let mut duplicate = None;
        self.root.walk(&mut |n| {
            if !seen.insert(n.id) && duplicate.is_none() {
                duplicate = Some(n.id);
            }
        });
        match duplicate {
            Some(id) => Err(SceneError::DuplicateNode(id)),
            None => Ok(()),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let scene: Self = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let file = std::fs::File::open(path)?;
        let scene: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        scene.validate()?;
        tracing::debug!(nodes = scene.node_count(), path = %path.display(), "scene loaded");
        Ok(scene)
    }

    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
