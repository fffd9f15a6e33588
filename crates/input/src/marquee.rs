use glam::Vec2;
use sceneview_common::MIN_PICK_SIZE;

use crate::action::{Action, InputEvent};
use crate::handler::InputHandler;
use crate::ray::compute_pick_region_with_min;
use crate::selection::{OpSeq, Platform, SelectionMode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarqueeState {
    Idle,
    Dragging {
        op_seq: OpSeq,
        start: Vec2,
        current: Vec2,
        mode: SelectionMode,
    },
}

/// Click and rubber-band selection: Idle -> Dragging -> Idle.
#[derive(Debug, Clone)]
pub struct MarqueeSelector {
    state: MarqueeState,
    platform: Platform,
    min_pick_size: f32,
}

impl Default for MarqueeSelector {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}

impl MarqueeSelector {
    pub fn new(platform: Platform) -> Self {
        Self {
            state: MarqueeState::Idle,
            platform,
            min_pick_size: MIN_PICK_SIZE,
        }
    }

    pub fn with_min_pick_size(mut self, min_pick_size: f32) -> Self {
        self.min_pick_size = min_pick_size;
        self
    }

    pub fn state(&self) -> &MarqueeState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, MarqueeState::Dragging { .. })
    }

    fn select_action(&self) -> Option<Action> {
        match self.state {
            MarqueeState::Dragging {
                op_seq,
                start,
                current,
                mode,
            } => Some(Action::Select {
                op_seq,
                region: compute_pick_region_with_min(start, current, self.min_pick_size),
                mode,
            }),
            MarqueeState::Idle => None,
        }
    }
}

impl InputHandler for MarqueeSelector {
    fn handle(&mut self, event: &InputEvent, actions: &mut Vec<Action>) -> bool {
        match (*event, self.state) {
            (InputEvent::PointerDown { position, modifiers }, _) => {
                let mode = if modifiers.is_toggle(self.platform) {
                    SelectionMode::Toggle
                } else {
                    SelectionMode::Direct
                };
                self.state = MarqueeState::Dragging {
                    op_seq: OpSeq::new(),
                    start: position,
                    current: position,
                    mode,
                };
                tracing::trace!(?position, ?mode, "marquee start");
                actions.extend(self.select_action());
                true
            }
            (InputEvent::PointerMove { position }, MarqueeState::Dragging { op_seq, start, mode, .. }) => {
                self.state = MarqueeState::Dragging {
                    op_seq,
                    start,
                    current: position,
                    mode,
                };
                actions.extend(self.select_action());
                true
            }
            (InputEvent::PointerUp { .. }, MarqueeState::Dragging { .. }) => {
                self.state = MarqueeState::Idle;
                true
            }
            (InputEvent::PointerMove { .. } | InputEvent::PointerUp { .. }, MarqueeState::Idle) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Modifiers;

    fn down(x: f32, y: f32, modifiers: Modifiers) -> InputEvent {
        InputEvent::PointerDown {
            position: Vec2::new(x, y),
            modifiers,
        }
    }

    fn feed(selector: &mut MarqueeSelector, event: InputEvent) -> Vec<Action> {
        let mut actions = Vec::new();
        selector.handle(&event, &mut actions);
        actions
    }

    #[test]
    fn click_emits_minimum_region() {
        let mut m = MarqueeSelector::new(Platform::Other);
        let actions = feed(&mut m, down(20.0, 30.0, Modifiers::NONE));
        let [Action::Select { region, mode, .. }] = actions.as_slice() else {
            panic!("expected one select action, got {actions:?}");
        };
        assert_eq!(*mode, SelectionMode::Direct);
        assert_eq!((region.center_x, region.center_y), (20.0, 30.0));
        assert_eq!((region.width, region.height), (10.0, 10.0));
        assert!(m.is_dragging());
    }

    #[test]
    fn drag_shares_op_seq_and_grows_region() {
        let mut m = MarqueeSelector::new(Platform::Other);
        let first = feed(&mut m, down(0.0, 0.0, Modifiers::NONE));
        let second = feed(
            &mut m,
            InputEvent::PointerMove {
                position: Vec2::new(40.0, 20.0),
            },
        );
        let (Action::Select { op_seq: a, .. }, Action::Select { op_seq: b, region, .. }) = (first[0], second[0]);
        assert_eq!(a, b);
        assert_eq!((region.center_x, region.center_y), (20.0, 10.0));
        assert_eq!((region.width, region.height), (40.0, 20.0));
    }

    #[test]
    fn release_emits_nothing_and_resets() {
        let mut m = MarqueeSelector::new(Platform::Other);
        feed(&mut m, down(0.0, 0.0, Modifiers::NONE));
        let actions = feed(
            &mut m,
            InputEvent::PointerUp {
                position: Vec2::new(5.0, 5.0),
            },
        );
        assert!(actions.is_empty());
        assert_eq!(*m.state(), MarqueeState::Idle);
    }

    #[test]
    fn new_gesture_gets_fresh_op_seq() {
        let mut m = MarqueeSelector::new(Platform::Other);
        let first = feed(&mut m, down(0.0, 0.0, Modifiers::NONE));
        feed(&mut m, InputEvent::PointerUp { position: Vec2::ZERO });
        let second = feed(&mut m, down(0.0, 0.0, Modifiers::NONE));
        let (Action::Select { op_seq: a, .. }, Action::Select { op_seq: b, .. }) = (first[0], second[0]);
        assert_ne!(a, b);
    }

    #[test]
    fn toggle_modifier_sets_mode() {
        let mut mac = MarqueeSelector::new(Platform::MacOs);
        let actions = feed(&mut mac, down(0.0, 0.0, Modifiers::meta()));
        assert!(matches!(actions[0], Action::Select { mode: SelectionMode::Toggle, .. }));

        let mut other = MarqueeSelector::new(Platform::Other);
        let actions = feed(&mut other, down(0.0, 0.0, Modifiers::meta()));
        assert!(matches!(actions[0], Action::Select { mode: SelectionMode::Direct, .. }));
    }

    #[test]
    fn idle_ignores_moves() {
        let mut m = MarqueeSelector::new(Platform::Other);
        let mut actions = Vec::new();
        let consumed = m.handle(&InputEvent::PointerMove { position: Vec2::ONE }, &mut actions);
        assert!(!consumed);
        assert!(actions.is_empty());
    }

    #[test]
    fn configured_minimum_applies() {
        let mut m = MarqueeSelector::new(Platform::Other).with_min_pick_size(16.0);
        let actions = feed(&mut m, down(0.0, 0.0, Modifiers::NONE));
        let Action::Select { region, .. } = actions[0];
        assert_eq!(region.width, 16.0);
    }
}
