use glam::Vec2;
use sceneview_common::PickRegion;

use crate::selection::{Modifiers, OpSeq, SelectionMode};

/// Raw pointer input delivered to the viewport, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { position: Vec2, modifiers: Modifiers },
    PointerMove { position: Vec2 },
    PointerUp { position: Vec2 },
}

impl InputEvent {
    pub fn position(&self) -> Vec2 {
        match *self {
            Self::PointerDown { position, .. }
            | Self::PointerMove { position }
            | Self::PointerUp { position } => position,
        }
    }
}

/// A high-level action produced by an input handler.
///
/// The viewport session consumes actions, never raw input events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Pick inside `region` and update the selection. Every action of one
    /// drag shares its `op_seq`.
    Select {
        op_seq: OpSeq,
        region: PickRegion,
        mode: SelectionMode,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_position() {
        let p = Vec2::new(3.0, 4.0);
        let down = InputEvent::PointerDown {
            position: p,
            modifiers: Modifiers::NONE,
        };
        assert_eq!(down.position(), p);
        assert_eq!(InputEvent::PointerUp { position: p }.position(), p);
    }

    #[test]
    fn select_action_is_constructible() {
        let a = Action::Select {
            op_seq: OpSeq::new(),
            region: PickRegion::around(0.0, 0.0, 0.0, 0.0),
            mode: SelectionMode::Direct,
        };
        assert!(matches!(a, Action::Select { .. }));
    }
}
