/// Errors raised while building or evaluating a [`crate::Graph`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    #[error("node `{0}` already exists")]
    DuplicateNode(String),
    #[error("node `{0}` would close a dependency cycle")]
    Cycle(String),
    #[error("node `{0}` is derived and cannot be set")]
    NotAnInput(String),
    #[error("node `{node}` does not hold a `{expected}`")]
    TypeMismatch { node: String, expected: &'static str },
    #[error("input `{0}` has no value")]
    MissingValue(String),
    #[error("computing `{node}` failed: {reason}")]
    Compute { node: String, reason: String },
}

impl GraphError {
    pub fn compute(node: impl Into<String>, reason: impl ToString) -> Self {
        Self::Compute {
            node: node.into(),
            reason: reason.to_string(),
        }
    }
}
