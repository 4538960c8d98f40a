//! Focus within - track whether focus is anywhere inside a subtree.
//!
//! Focus moving between two descendants of a container dispatches a
//! `FocusOut` immediately followed by a `FocusIn` on the container. The
//! tracker folds those pairs away and only reports real boundary crossings.
//!
//! # Example
//!
//! ```ignore
//! use spark_aria::{create_focus_within, on_focus_events, CreateFocusWithinProps};
//!
//! let tracker = create_focus_within(CreateFocusWithinProps {
//!     on_focus_within_change: Some(Rc::new(|within| println!("within: {within}"))),
//!     ..Default::default()
//! });
//!
//! // Spread the handlers onto the container
//! let cleanup = on_focus_events(container, tracker.focus_within_props().into());
//! ```

use std::rc::Rc;
use spark_signals::{derived, signal, Derived, Signal};

use crate::engine::contains;
use crate::state::{FocusEvent, FocusHandlers};
use crate::types::{
    access, FocusCallback, FocusHandler, FocusWithinChangeCallback, MaybeAccessor,
};

use super::synthetic_blur::create_synthetic_blur;

// =============================================================================
// Props
// =============================================================================

/// Options for [`create_focus_within`].
#[derive(Clone, Default)]
pub struct CreateFocusWithinProps {
    /// Whether the focus within events should be disabled.
    /// Read on every event.
    pub is_disabled: Option<MaybeAccessor<bool>>,

    /// Called when focus enters the subtree.
    pub on_focus_in: Option<FocusCallback>,

    /// Called when focus leaves the subtree.
    pub on_focus_out: Option<FocusCallback>,

    /// Called with the new value on either transition.
    pub on_focus_within_change: Option<FocusWithinChangeCallback>,
}

/// Handlers to attach to the tracked container.
#[derive(Clone)]
pub struct FocusWithinElementProps {
    pub on_focus_in: FocusHandler,
    pub on_focus_out: FocusHandler,
}

impl PartialEq for FocusWithinElementProps {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.on_focus_in), Rc::as_ptr(&other.on_focus_in))
            && std::ptr::addr_eq(Rc::as_ptr(&self.on_focus_out), Rc::as_ptr(&other.on_focus_out))
    }
}

impl From<FocusWithinElementProps> for FocusHandlers {
    fn from(props: FocusWithinElementProps) -> Self {
        FocusHandlers {
            on_focus_in: Some(props.on_focus_in),
            on_focus_out: Some(props.on_focus_out),
        }
    }
}

/// Result of [`create_focus_within`].
pub struct FocusWithinResult {
    focus_within_props: Derived<FocusWithinElementProps>,
    is_focus_within: Signal<bool>,
}

impl FocusWithinResult {
    /// Props to spread onto the target element.
    ///
    /// Memoized: every read returns the same handler instances.
    pub fn focus_within_props(&self) -> FocusWithinElementProps {
        self.focus_within_props.get()
    }

    /// Whether focus is currently inside the tracked subtree.
    pub fn is_focus_within(&self) -> bool {
        self.is_focus_within.get()
    }
}

// =============================================================================
// Primitive
// =============================================================================

/// Handles focus events for the target and its descendants.
pub fn create_focus_within(props: CreateFocusWithinProps) -> FocusWithinResult {
    let props = Rc::new(props);
    let is_focus_within = signal(false);

    let handle_focus_out: FocusHandler = {
        let props = props.clone();
        let is_focus_within = is_focus_within.clone();
        Rc::new(move |event: &FocusEvent| {
            if access(&props.is_disabled) {
                return;
            }

            // Only leave when focus moves outside the container
            let leaving = match event.current_target {
                Some(current_target) => !contains(current_target, event.related_target),
                None => true,
            };

            if !is_focus_within.get() || !leaving {
                return;
            }

            is_focus_within.set(false);
            tracing::debug!(
                element = %event.target,
                synthetic = event.synthetic,
                "focus left subtree"
            );

            // A callback may move focus back inside; stop reporting once the
            // flag no longer holds the value being announced
            if let Some(on_focus_out) = &props.on_focus_out {
                on_focus_out(event);
                if is_focus_within.get() {
                    return;
                }
            }
            if let Some(on_change) = &props.on_focus_within_change {
                on_change(false);
            }
        })
    };

    let synthetic_blur = Rc::new(create_synthetic_blur(handle_focus_out.clone()));

    let on_focus_out: FocusHandler = {
        let synthetic_blur = synthetic_blur.clone();
        Rc::new(move |event: &FocusEvent| {
            synthetic_blur.observe_focus_out(event);
            handle_focus_out(event);
        })
    };

    let on_focus_in: FocusHandler = {
        let props = props.clone();
        let is_focus_within = is_focus_within.clone();
        Rc::new(move |event: &FocusEvent| {
            if access(&props.is_disabled) {
                return;
            }
            if is_focus_within.get() {
                // Already within: only follow the newly focused element
                synthetic_blur.arm(event);
                return;
            }

            is_focus_within.set(true);
            tracing::debug!(element = %event.target, "focus entered subtree");

            // Nested focus handling during a callback either clears the flag
            // or re-arms the watch on the element that now holds focus
            let watched = synthetic_blur.watched();
            if let Some(on_focus_in) = &props.on_focus_in {
                on_focus_in(event);
                if !is_focus_within.get() {
                    return;
                }
            }
            if let Some(on_change) = &props.on_focus_within_change {
                on_change(true);
                if !is_focus_within.get() {
                    return;
                }
            }
            if synthetic_blur.watched() == watched {
                synthetic_blur.arm(event);
            }
        })
    };

    let element_props = FocusWithinElementProps { on_focus_in, on_focus_out };
    FocusWithinResult {
        focus_within_props: derived(move || element_props.clone()),
        is_focus_within,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{create_element, remove_element, reset_elements, set_element_flags};
    use crate::state::{active_element, blur, focus, on_focus_events, reset_focus_state};
    use crate::types::{ElementFlags, ElementId};
    use std::cell::{Cell, RefCell};

    fn setup() {
        reset_elements();
        reset_focus_state();
    }

    /// Counts every callback and records change values.
    #[derive(Default)]
    struct Calls {
        focus_in: Cell<usize>,
        focus_out: Cell<usize>,
        changes: RefCell<Vec<bool>>,
    }

    fn tracked_props(calls: &Rc<Calls>) -> CreateFocusWithinProps {
        let c_in = calls.clone();
        let c_out = calls.clone();
        let c_change = calls.clone();
        CreateFocusWithinProps {
            on_focus_in: Some(Rc::new(move |_: &FocusEvent| {
                c_in.focus_in.set(c_in.focus_in.get() + 1);
            })),
            on_focus_out: Some(Rc::new(move |_: &FocusEvent| {
                c_out.focus_out.set(c_out.focus_out.get() + 1);
            })),
            on_focus_within_change: Some(Rc::new(move |v: bool| {
                c_change.changes.borrow_mut().push(v);
            })),
            ..Default::default()
        }
    }

    fn container_with_children() -> (ElementId, ElementId, ElementId) {
        let container = create_element(None, ElementFlags::FOCUSABLE).unwrap();
        let a = create_element(Some(container), ElementFlags::FOCUSABLE).unwrap();
        let b = create_element(Some(container), ElementFlags::FOCUSABLE).unwrap();
        (container, a, b)
    }

    #[test]
    fn test_enter_reenter_leave_scenario() {
        setup();
        let (container, a, _) = container_with_children();
        let outside = create_element(None, ElementFlags::FOCUSABLE).unwrap();
        let calls = Rc::new(Calls::default());
        let tracker = create_focus_within(tracked_props(&calls));
        let handlers = tracker.focus_within_props();

        let enter = FocusEvent::focus_in(container, None).with_current_target(container);
        (handlers.on_focus_in)(&enter);
        assert_eq!(calls.focus_in.get(), 1);
        assert_eq!(*calls.changes.borrow(), vec![true]);
        assert!(tracker.is_focus_within());

        // Descendant focus-in while already within
        let reenter = FocusEvent::focus_in(a, Some(container)).with_current_target(container);
        (handlers.on_focus_in)(&reenter);
        assert_eq!(calls.focus_in.get(), 1);
        assert_eq!(calls.changes.borrow().len(), 1);

        let leave = FocusEvent::focus_out(a, Some(outside)).with_current_target(container);
        (handlers.on_focus_out)(&leave);
        assert_eq!(calls.focus_out.get(), 1);
        assert_eq!(*calls.changes.borrow(), vec![true, false]);
        assert!(!tracker.is_focus_within());
    }

    #[test]
    fn test_focus_out_to_contained_element_is_suppressed() {
        setup();
        let (container, a, b) = container_with_children();
        let calls = Rc::new(Calls::default());
        let tracker = create_focus_within(tracked_props(&calls));
        let handlers = tracker.focus_within_props();

        (handlers.on_focus_in)(&FocusEvent::focus_in(a, None).with_current_target(container));
        (handlers.on_focus_out)(&FocusEvent::focus_out(a, Some(b)).with_current_target(container));

        assert!(tracker.is_focus_within());
        assert_eq!(calls.focus_out.get(), 0);
        assert_eq!(*calls.changes.borrow(), vec![true]);
    }

    #[test]
    fn test_focus_out_to_nothing_leaves() {
        setup();
        let (container, a, _) = container_with_children();
        let calls = Rc::new(Calls::default());
        let tracker = create_focus_within(tracked_props(&calls));
        let handlers = tracker.focus_within_props();

        (handlers.on_focus_in)(&FocusEvent::focus_in(a, None).with_current_target(container));
        (handlers.on_focus_out)(&FocusEvent::focus_out(a, None).with_current_target(container));

        assert!(!tracker.is_focus_within());
        assert_eq!(calls.focus_out.get(), 1);
        assert_eq!(*calls.changes.borrow(), vec![true, false]);
    }

    #[test]
    fn test_focus_out_while_not_within_is_ignored() {
        setup();
        let (container, a, _) = container_with_children();
        let calls = Rc::new(Calls::default());
        let tracker = create_focus_within(tracked_props(&calls));

        let leave = FocusEvent::focus_out(a, None).with_current_target(container);
        (tracker.focus_within_props().on_focus_out)(&leave);

        assert_eq!(calls.focus_out.get(), 0);
        assert!(calls.changes.borrow().is_empty());
    }

    #[test]
    fn test_disabled_accessor_read_per_event() {
        setup();
        let (container, a, _) = container_with_children();
        let calls = Rc::new(Calls::default());
        let disabled = signal(true);
        let tracker = create_focus_within(CreateFocusWithinProps {
            is_disabled: Some(disabled.clone().into()),
            ..tracked_props(&calls)
        });
        let handlers = tracker.focus_within_props();
        let event_in = FocusEvent::focus_in(a, None).with_current_target(container);
        let event_out = FocusEvent::focus_out(a, None).with_current_target(container);

        (handlers.on_focus_in)(&event_in);
        assert!(!tracker.is_focus_within());
        assert_eq!(calls.focus_in.get(), 0);

        disabled.set(false);
        (handlers.on_focus_in)(&event_in);
        assert!(tracker.is_focus_within());

        // Disabling freezes the flag
        disabled.set(true);
        (handlers.on_focus_out)(&event_out);
        assert!(tracker.is_focus_within());
        assert_eq!(calls.focus_out.get(), 0);
        assert_eq!(*calls.changes.borrow(), vec![true]);
    }

    #[test]
    fn test_callbacks_see_updated_flag() {
        setup();
        let (container, a, _) = container_with_children();
        let flag: Rc<RefCell<Option<Signal<bool>>>> = Rc::new(RefCell::new(None));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let flag_clone = flag.clone();
        let seen_clone = seen.clone();
        let tracker = create_focus_within(CreateFocusWithinProps {
            on_focus_within_change: Some(Rc::new(move |value: bool| {
                let current = flag_clone.borrow().as_ref().map(|s| s.get());
                seen_clone.borrow_mut().push((value, current));
            })),
            ..Default::default()
        });
        *flag.borrow_mut() = Some(tracker.is_focus_within.clone());

        let handlers = tracker.focus_within_props();
        (handlers.on_focus_in)(&FocusEvent::focus_in(a, None).with_current_target(container));
        (handlers.on_focus_out)(&FocusEvent::focus_out(a, None).with_current_target(container));

        assert_eq!(*seen.borrow(), vec![(true, Some(true)), (false, Some(false))]);
    }

    #[test]
    fn test_props_are_stable() {
        setup();
        let tracker = create_focus_within(CreateFocusWithinProps::default());

        let first = tracker.focus_within_props();
        let second = tracker.focus_within_props();
        assert!(first == second);
        assert!(Rc::ptr_eq(&first.on_focus_in, &second.on_focus_in));
    }

    #[test]
    fn test_attached_to_container_with_real_focus() {
        setup();
        let (container, a, b) = container_with_children();
        let outside = create_element(None, ElementFlags::FOCUSABLE).unwrap();
        let calls = Rc::new(Calls::default());
        let tracker = create_focus_within(tracked_props(&calls));
        let _cleanup = on_focus_events(container, tracker.focus_within_props().into());

        focus(container);
        focus(a);
        focus(b);
        focus(container);
        assert_eq!(*calls.changes.borrow(), vec![true]);

        focus(outside);
        assert_eq!(*calls.changes.borrow(), vec![true, false]);
        assert_eq!(calls.focus_in.get(), 1);
        assert_eq!(calls.focus_out.get(), 1);

        focus(b);
        blur();
        assert_eq!(*calls.changes.borrow(), vec![true, false, true, false]);
    }

    #[test]
    fn test_removing_focused_descendant_leaves() {
        setup();
        let (container, a, _) = container_with_children();
        let calls = Rc::new(Calls::default());
        let tracker = create_focus_within(tracked_props(&calls));
        let _cleanup = on_focus_events(container, tracker.focus_within_props().into());

        focus(a);
        assert!(tracker.is_focus_within());

        remove_element(a).unwrap();

        assert!(!tracker.is_focus_within());
        assert_eq!(calls.focus_out.get(), 1);
        assert_eq!(*calls.changes.borrow(), vec![true, false]);
    }

    #[test]
    fn test_removing_nested_focus_target_leaves() {
        setup();
        let (container, a, _) = container_with_children();
        let a1 = create_element(Some(a), ElementFlags::FOCUSABLE).unwrap();
        let calls = Rc::new(Calls::default());
        let tracker = create_focus_within(tracked_props(&calls));
        let _cleanup = on_focus_events(container, tracker.focus_within_props().into());

        focus(a);
        focus(a1);
        assert_eq!(calls.focus_in.get(), 1);

        remove_element(a1).unwrap();

        assert!(!tracker.is_focus_within());
        assert_eq!(*calls.changes.borrow(), vec![true, false]);
    }

    #[test]
    fn test_removing_previously_focused_descendant_is_silent() {
        setup();
        let (container, a, _) = container_with_children();
        let outside = create_element(None, ElementFlags::FOCUSABLE).unwrap();
        let calls = Rc::new(Calls::default());
        let tracker = create_focus_within(tracked_props(&calls));
        let _cleanup = on_focus_events(container, tracker.focus_within_props().into());

        focus(a);
        focus(outside);
        remove_element(a).unwrap();

        assert_eq!(*calls.changes.borrow(), vec![true, false]);
    }

    #[test]
    fn test_removing_whole_container_leaves() {
        setup();
        let (container, a, _) = container_with_children();
        let calls = Rc::new(Calls::default());
        let tracker = create_focus_within(tracked_props(&calls));
        let _cleanup = on_focus_events(container, tracker.focus_within_props().into());

        focus(a);
        remove_element(container).unwrap();

        assert!(!tracker.is_focus_within());
        assert_eq!(*calls.changes.borrow(), vec![true, false]);
    }

    #[test]
    fn test_focus_in_callback_that_blurs_reports_final_state() {
        setup();
        let (container, a, _) = container_with_children();
        let calls = Rc::new(Calls::default());
        let blurred = Rc::new(Cell::new(false));
        let blurred_clone = blurred.clone();
        let tracker = create_focus_within(CreateFocusWithinProps {
            on_focus_in: Some(Rc::new(move |_: &FocusEvent| {
                if !blurred_clone.replace(true) {
                    blur();
                }
            })),
            ..tracked_props(&calls)
        });
        let _cleanup = on_focus_events(container, tracker.focus_within_props().into());

        focus(a);

        assert_eq!(active_element(), None);
        assert!(!tracker.is_focus_within());
        assert_eq!(calls.changes.borrow().last().copied(), Some(tracker.is_focus_within()));
        assert_eq!(*calls.changes.borrow(), vec![false]);

        // No stale watch on the element that lost focus
        focus(a);
        remove_element(a).unwrap();
        assert_eq!(calls.changes.borrow().last().copied(), Some(tracker.is_focus_within()));
        assert!(!tracker.is_focus_within());
    }

    #[test]
    fn test_focus_out_callback_that_refocuses_inside_reports_final_state() {
        setup();
        let (container, a, b) = container_with_children();
        let outside = create_element(None, ElementFlags::FOCUSABLE).unwrap();
        let calls = Rc::new(Calls::default());
        let refocused = Rc::new(Cell::new(false));
        let refocused_clone = refocused.clone();
        let tracker = create_focus_within(CreateFocusWithinProps {
            on_focus_out: Some(Rc::new(move |_: &FocusEvent| {
                if !refocused_clone.replace(true) {
                    focus(b);
                }
            })),
            ..tracked_props(&calls)
        });
        let _cleanup = on_focus_events(container, tracker.focus_within_props().into());

        focus(a);
        focus(outside);

        assert_eq!(active_element(), Some(b));
        assert!(tracker.is_focus_within());
        assert_eq!(calls.changes.borrow().last().copied(), Some(tracker.is_focus_within()));
        assert_eq!(*calls.changes.borrow(), vec![true, true]);

        // The watch follows b, so detaching it is still reported
        remove_element(b).unwrap();
        assert!(!tracker.is_focus_within());
        assert_eq!(*calls.changes.borrow(), vec![true, true, false]);
    }

    #[test]
    fn test_disabling_focused_descendant_leaves() {
        setup();
        let (container, a, _) = container_with_children();
        let calls = Rc::new(Calls::default());
        let tracker = create_focus_within(tracked_props(&calls));
        let _cleanup = on_focus_events(container, tracker.focus_within_props().into());

        focus(a);
        set_element_flags(a, ElementFlags::FOCUSABLE | ElementFlags::DISABLED).unwrap();

        assert!(!tracker.is_focus_within());
        assert_eq!(calls.focus_out.get(), 1);
        assert_eq!(*calls.changes.borrow(), vec![true, false]);
    }
}
