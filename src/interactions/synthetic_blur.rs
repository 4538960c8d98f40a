//! Synthetic blur - focus-out compensation for detached elements.
//!
//! Removing the focused element from the tree drops focus without any
//! `FocusOut` being dispatched, so a subtree tracker would believe focus is
//! still inside forever. `SyntheticBlur` watches the element that received
//! focus and, if it is removed while still focused, calls the wrapped handler
//! with a synthesized `FocusOut` built from the focus-in snapshot.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::engine::on_remove;
use crate::state::{is_focused, FocusEvent, FocusEventKind};
use crate::types::{Cleanup, ElementId, FocusHandler};

struct ArmedWatch {
    target: ElementId,
    unregister: Cleanup,
}

/// Element-removal watcher armed by focus-in events.
///
/// At most one element is watched at a time; arming again replaces the
/// previous watch. Dropping the value unregisters the watcher.
pub struct SyntheticBlur {
    on_blur: FocusHandler,
    armed: Rc<RefCell<Option<ArmedWatch>>>,
}

/// Wrap `on_blur` so it also runs when the focused element is detached.
pub fn create_synthetic_blur(on_blur: FocusHandler) -> SyntheticBlur {
    SyntheticBlur {
        on_blur,
        armed: Rc::new(RefCell::new(None)),
    }
}

impl SyntheticBlur {
    /// Start watching `event.target`.
    pub fn arm(&self, event: &FocusEvent) {
        self.disarm();

        let target = event.target;
        let current_target = event.current_target;
        let on_blur = self.on_blur.clone();
        let armed: Weak<RefCell<Option<ArmedWatch>>> = Rc::downgrade(&self.armed);

        let unregister = on_remove(target, move || {
            // The registry already dropped this watcher
            if let Some(armed) = armed.upgrade() {
                armed.borrow_mut().take();
            }

            // A real blur already happened
            if !is_focused(target) {
                return;
            }

            let event = FocusEvent {
                kind: FocusEventKind::FocusOut,
                target,
                current_target,
                related_target: None,
                synthetic: true,
            };
            tracing::debug!(element = %target, "synthesizing focus-out for detached element");
            on_blur(&event);
        });

        *self.armed.borrow_mut() = Some(ArmedWatch {
            target,
            unregister: Box::new(unregister),
        });
    }

    /// Report a dispatched focus-out. A real blur of the watched element
    /// makes the watch unnecessary.
    pub fn observe_focus_out(&self, event: &FocusEvent) {
        if event.synthetic {
            return;
        }
        let watched = self.armed.borrow().as_ref().map(|watch| watch.target);
        if watched == Some(event.target) {
            self.disarm();
        }
    }

    /// Stop watching.
    pub fn disarm(&self) {
        let watch = self.armed.borrow_mut().take();
        if let Some(watch) = watch {
            (watch.unregister)();
        }
    }

    /// Element currently watched, if any.
    pub fn watched(&self) -> Option<ElementId> {
        self.armed.borrow().as_ref().map(|watch| watch.target)
    }
}

impl Drop for SyntheticBlur {
    fn drop(&mut self) {
        self.disarm();
    }
}
