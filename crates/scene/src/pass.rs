use serde::{Deserialize, Serialize};

/// A stage of the rendering protocol.
///
/// The derived ordering is the global pass order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    Background,
    Opaque,
    Transparent,
    Outline,
    Manipulator,
    Overlay,
    Selection,
    ManipulatorSelection,
}

/// Passes drawn into the visible frame, in order.
pub const ALL_PASSES: [Pass; 6] = [
    Pass::Background,
    Pass::Opaque,
    Pass::Transparent,
    Pass::Outline,
    Pass::Manipulator,
    Pass::Overlay,
];

/// Passes rendered in selection mode for object picking.
pub const SELECTION_PASSES: [Pass; 1] = [Pass::Selection];

/// Pass rendered in selection mode for tool-handle picking.
pub const MANIPULATOR_SELECTION: Pass = Pass::ManipulatorSelection;

impl Pass {
    /// Whether the pass uses the camera projection and view. Other passes use a
    /// pixel-space orthographic overlay transform.
    pub fn is_model_transform(self) -> bool {
        !matches!(self, Self::Background | Self::Overlay)
    }

    /// Whether the pass is rendered in selection mode.
    pub fn is_selection(self) -> bool {
        matches!(self, Self::Selection | Self::ManipulatorSelection)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Opaque => "opaque",
            Self::Transparent => "transparent",
            Self::Outline => "outline",
            Self::Manipulator => "manipulator",
            Self::Overlay => "overlay",
            Self::Selection => "selection",
            Self::ManipulatorSelection => "manipulator_selection",
        }
    }
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
