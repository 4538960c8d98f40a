//! # spark-aria
//!
//! Reactive interaction primitives for component trees.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for fine-grained reactivity.
//!
//! ## Architecture
//!
//! Elements are ids in a thread-local element tree. Focus state is a signal
//! holding the active element; moving focus dispatches bubbling `FocusOut`
//! then `FocusIn` events to listeners attached per element. Interaction
//! primitives produce handler sets that are attached to a container:
//!
//! ```text
//! focus(el) → FocusOut/FocusIn dispatch → container listeners → focus-within flag → callbacks
//! remove_element(el) → removal watchers → synthetic FocusOut
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (ElementId, ElementFlags, MaybeAccessor, callbacks)
//! - [`engine`] - Element tree, containment, removal watchers
//! - [`state`] - Active element, focus/blur, focus event dispatch
//! - [`interactions`] - Focus-within tracking, synthetic blur

pub mod engine;
pub mod error;
pub mod interactions;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::ElementError;

pub use engine::{
    children_of, contains, create_element, element_flags, is_connected, on_remove,
    parent_of, remove_element, reset_elements, set_element_flags,
};

pub use state::{
    active_element, blur, dispatch, focus, is_focusable, is_focused, on_focus_events,
    reset_focus_state, FocusEvent, FocusEventKind, FocusHandlers,
};

pub use interactions::{
    create_focus_within, create_synthetic_blur, CreateFocusWithinProps,
    FocusWithinElementProps, FocusWithinResult, SyntheticBlur,
};
