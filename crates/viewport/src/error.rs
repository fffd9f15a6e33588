use sceneview_common::NodeId;
use sceneview_graph::GraphError;
use sceneview_scene::SceneError;

#[derive(Debug, thiserror::Error)]
pub enum ViewportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("node {0} is not in the scene")]
    UnknownNode(NodeId),
}
