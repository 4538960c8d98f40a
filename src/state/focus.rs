//! Focus System - active element and focus event dispatch
//!
//! Manages focus state for the element tree:
//! - `active_element` signal (currently focused element)
//! - `focus` / `blur` with bubbling `FocusOut` then `FocusIn` dispatch
//! - Per-element focus listeners (`on_focus_events`)
//! - Silent focus loss when the active element is removed
//!
//! # Example
//!
//! ```ignore
//! use spark_aria::state::focus;
//!
//! let cleanup = focus::on_focus_events(container, FocusHandlers {
//!     on_focus_in: Some(Rc::new(|event| println!("in: {}", event.target))),
//!     on_focus_out: None,
//! });
//!
//! focus::focus(button);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use spark_signals::{signal, Signal};

use crate::engine::{element_flags, is_connected, parent_of};
use crate::types::{ElementFlags, ElementId, FocusHandler};

// =============================================================================
// TYPES
// =============================================================================

/// Focus event type. Both kinds bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEventKind {
    /// Focus arrived at `target`; `related_target` lost it.
    FocusIn,
    /// Focus left `target`; `related_target` is gaining it.
    FocusOut,
}

/// Focus event delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusEvent {
    pub kind: FocusEventKind,
    /// Element that gained or lost focus.
    pub target: ElementId,
    /// Element whose listener is currently running (filled by dispatch).
    pub current_target: Option<ElementId>,
    /// Element on the other side of the transition, if any.
    pub related_target: Option<ElementId>,
    /// True for events synthesized by the library instead of dispatched by focus changes.
    pub synthetic: bool,
}

impl FocusEvent {
    /// Create a focus-in event
    pub fn focus_in(target: ElementId, related_target: Option<ElementId>) -> Self {
        Self {
            kind: FocusEventKind::FocusIn,
            target,
            current_target: None,
            related_target,
            synthetic: false,
        }
    }

    /// Create a focus-out event
    pub fn focus_out(target: ElementId, related_target: Option<ElementId>) -> Self {
        Self {
            kind: FocusEventKind::FocusOut,
            target,
            current_target: None,
            related_target,
            synthetic: false,
        }
    }

    /// Same event as seen by the listener on `element`.
    pub fn with_current_target(mut self, element: ElementId) -> Self {
        self.current_target = Some(element);
        self
    }
}

/// Focus listeners attached to one element.
#[derive(Clone, Default)]
pub struct FocusHandlers {
    pub on_focus_in: Option<FocusHandler>,
    pub on_focus_out: Option<FocusHandler>,
}

// =============================================================================
// STATE
// =============================================================================

thread_local! {
    static ACTIVE_ELEMENT: Signal<Option<ElementId>> = signal(None);

    static LISTENERS: RefCell<HashMap<ElementId, Vec<(usize, FocusHandlers)>>> = RefCell::new(HashMap::new());

    static NEXT_LISTENER_ID: RefCell<usize> = const { RefCell::new(0) };
}

/// Get the currently focused element.
pub fn active_element() -> Option<ElementId> {
    ACTIVE_ELEMENT.with(|s| s.get())
}

/// Check if specific element is focused
pub fn is_focused(id: ElementId) -> bool {
    active_element() == Some(id)
}

fn set_active(value: Option<ElementId>) {
    ACTIVE_ELEMENT.with(|s| s.set(value));
}

// =============================================================================
// LISTENERS
// =============================================================================

/// Attach focus listeners to an element.
/// Returns cleanup function to detach them.
pub fn on_focus_events(id: ElementId, handlers: FocusHandlers) -> impl FnOnce() {
    let listener_id = NEXT_LISTENER_ID.with(|next| {
        let mut next = next.borrow_mut();
        let listener_id = *next;
        *next += 1;
        listener_id
    });

    LISTENERS.with(|listeners| {
        listeners
            .borrow_mut()
            .entry(id)
            .or_default()
            .push((listener_id, handlers));
    });

    move || {
        LISTENERS.with(|listeners| {
            let mut listeners = listeners.borrow_mut();
            if let Some(list) = listeners.get_mut(&id) {
                list.retain(|(other, _)| *other != listener_id);
                if list.is_empty() {
                    listeners.remove(&id);
                }
            }
        });
    }
}

/// Snapshot the handlers of one kind registered on `id`.
fn handlers_for(id: ElementId, kind: FocusEventKind) -> Vec<FocusHandler> {
    LISTENERS.with(|listeners| {
        listeners
            .borrow()
            .get(&id)
            .map(|list| {
                list.iter()
                    .filter_map(|(_, h)| match kind {
                        FocusEventKind::FocusIn => h.on_focus_in.clone(),
                        FocusEventKind::FocusOut => h.on_focus_out.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    })
}

/// Dispatch an event from its target up to the root.
///
/// Each element on the path sees the event with itself as `current_target`.
/// The path is computed before any handler runs.
pub fn dispatch(event: FocusEvent) {
    let mut path = Vec::new();
    let mut current = Some(event.target);
    while let Some(element) = current {
        if !is_connected(element) {
            break;
        }
        path.push(element);
        current = parent_of(element);
    }

    tracing::trace!(
        kind = ?event.kind,
        element = %event.target,
        related = ?event.related_target,
        "dispatch focus event"
    );

    for element in path {
        let handlers = handlers_for(element, event.kind);
        if handlers.is_empty() {
            continue;
        }
        let scoped = event.clone().with_current_target(element);
        for handler in handlers {
            handler(&scoped);
        }
    }
}

// =============================================================================
// FOCUS MOVEMENT
// =============================================================================

/// Check if an element can receive focus right now.
pub fn is_focusable(id: ElementId) -> bool {
    element_flags(id).is_some_and(|flags| {
        flags.contains(ElementFlags::FOCUSABLE) && !flags.contains(ElementFlags::DISABLED)
    })
}

/// Focus an element.
///
/// Dispatches `FocusOut` on the previously focused element (if any) before
/// `FocusIn` on the new one. Returns false if the element cannot take focus.
pub fn focus(id: ElementId) -> bool {
    if !is_focusable(id) {
        return false;
    }

    let previous = active_element();
    if previous == Some(id) {
        return true;
    }

    if let Some(previous) = previous {
        set_active(None);
        dispatch(FocusEvent::focus_out(previous, Some(id)));
    }

    // A focus-out handler may have moved focus or removed the element
    if active_element().is_some() || !is_focusable(id) {
        return active_element() == Some(id);
    }

    set_active(Some(id));
    dispatch(FocusEvent::focus_in(id, previous));
    true
}

/// Clear focus (no element focused)
pub fn blur() {
    if let Some(previous) = active_element() {
        set_active(None);
        dispatch(FocusEvent::focus_out(previous, None));
    }
}

/// Called by the registry after `removed` elements left the tree.
///
/// Drops their listeners and, if one of them was focused, clears focus
/// without dispatching anything.
pub(crate) fn handle_detached(removed: &[ElementId]) {
    LISTENERS.with(|listeners| {
        let mut listeners = listeners.borrow_mut();
        for element in removed {
            listeners.remove(element);
        }
    });

    if let Some(active) = active_element() {
        if removed.contains(&active) {
            tracing::debug!(element = %active, "focused element detached without blur");
            set_active(None);
        }
    }
}

/// Called by the registry after the flags of `id` changed.
///
/// A focused element that can no longer take focus is blurred.
pub(crate) fn handle_focusability_change(id: ElementId) {
    if is_focused(id) && !is_focusable(id) {
        tracing::debug!(element = %id, "focused element lost focusability");
        blur();
    }
}

// =============================================================================
// RESET (for testing)
// =============================================================================

/// Reset all focus state (for testing)
pub fn reset_focus_state() {
    set_active(None);
    LISTENERS.with(|listeners| listeners.borrow_mut().clear());
}

// =============================================================================
// TESTS
// =============================================================================
