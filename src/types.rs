//! Core types shared by the engine, focus state, and interaction primitives.

use std::fmt;
use std::rc::Rc;
use spark_signals::Signal;

use crate::state::FocusEvent;

// =============================================================================
// Element Identity
// =============================================================================

/// Handle to an element in the element tree.
///
/// Ids are allocated monotonically and never reused, so a stale id held by a
/// watcher or a snapshot can never alias a newer element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    /// Raw index of this element.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// =============================================================================
// Element Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Element capabilities as a bitfield.
    ///
    /// Combine with bitwise OR: `ElementFlags::FOCUSABLE | ElementFlags::DISABLED`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ElementFlags: u8 {
        const NONE = 0;
        /// Element can receive focus.
        const FOCUSABLE = 1 << 0;
        /// Element refuses focus while set.
        const DISABLED = 1 << 1;
    }
}

// =============================================================================
// Cleanup / Callbacks
// =============================================================================

/// Cleanup function returned by registrations.
pub type Cleanup = Box<dyn FnOnce()>;

/// Handler attached to an element's focus event slot.
pub type FocusHandler = Rc<dyn Fn(&FocusEvent)>;

/// User callback receiving the focus event that caused a transition.
pub type FocusCallback = Rc<dyn Fn(&FocusEvent)>;

/// User callback receiving the new focus-within value.
pub type FocusWithinChangeCallback = Rc<dyn Fn(bool)>;

// =============================================================================
// MaybeAccessor - static value or reactive read
// =============================================================================

/// A value that can be static, a signal, or a getter.
///
/// Every `get()` reads through to the current value, so a signal or getter
/// backed option is never cached between events.
#[derive(Clone)]
pub enum MaybeAccessor<T: Clone + PartialEq + 'static> {
    /// Static value (not reactive).
    Static(T),
    /// Reactive signal.
    Signal(Signal<T>),
    /// Getter function (called each time the value is needed).
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone + PartialEq + 'static> MaybeAccessor<T> {
    /// Get the current value.
    pub fn get(&self) -> T {
        match self {
            MaybeAccessor::Static(v) => v.clone(),
            MaybeAccessor::Signal(s) => s.get(),
            MaybeAccessor::Getter(f) => f(),
        }
    }

    /// Build a getter-backed accessor from a closure.
    pub fn getter(f: impl Fn() -> T + 'static) -> Self {
        MaybeAccessor::Getter(Rc::new(f))
    }
}

impl<T: Clone + PartialEq + 'static> From<T> for MaybeAccessor<T> {
    fn from(value: T) -> Self {
        MaybeAccessor::Static(value)
    }
}

impl<T: Clone + PartialEq + 'static> From<Signal<T>> for MaybeAccessor<T> {
    fn from(signal: Signal<T>) -> Self {
        MaybeAccessor::Signal(signal)
    }
}

/// Read an optional boolean accessor; an absent option reads as `false`.
pub fn access(value: &Option<MaybeAccessor<bool>>) -> bool {
    value.as_ref().is_some_and(MaybeAccessor::get)
}
