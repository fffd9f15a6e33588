use crate::action::{Action, InputEvent};

/// Something that turns input events into actions.
pub trait InputHandler {
    /// Handle `event`, appending any produced actions. Returns true when the
    /// event was consumed and must not reach later handlers.
    fn handle(&mut self, event: &InputEvent, actions: &mut Vec<Action>) -> bool;
}

/// Offer `event` to `handlers` in order until one consumes it.
pub fn dispatch(handlers: &mut [&mut dyn InputHandler], event: &InputEvent) -> Vec<Action> {
    let mut actions = Vec::new();
    for handler in handlers.iter_mut() {
        if handler.handle(event, &mut actions) {
            break;
        }
    }
    if actions.is_empty() {
        tracing::trace!(?event, "no action");
    }
    actions
}
