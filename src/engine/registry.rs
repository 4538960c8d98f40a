//! Element Registry - the host element tree.
//!
//! Manages the lifecycle of elements:
//! - Monotonic id allocation (ids are never reused)
//! - Parent/child links and the containment test
//! - Recursive removal with per-element removal watchers
//!
//! Removal watchers are the tree's mutation-observation facility: they run
//! after an element has been detached but before the focus state learns that
//! its active element is gone.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::ElementError;
use crate::state::focus;
use crate::types::{ElementFlags, ElementId};

// =============================================================================
// Registry State
// =============================================================================

struct ElementNode {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    flags: ElementFlags,
}

type RemovalWatcher = Box<dyn FnOnce()>;

thread_local! {
    /// Live elements.
    static ELEMENTS: RefCell<HashMap<ElementId, ElementNode>> = RefCell::new(HashMap::new());

    /// Next id to allocate.
    static NEXT_ID: RefCell<usize> = const { RefCell::new(0) };

    /// Removal watchers registered per element, tagged with a watcher id.
    static REMOVAL_WATCHERS: RefCell<HashMap<ElementId, Vec<(usize, RemovalWatcher)>>> = RefCell::new(HashMap::new());

    /// Counter for watcher ids.
    static NEXT_WATCHER_ID: RefCell<usize> = const { RefCell::new(0) };
}

// =============================================================================
// Creation / Removal
// =============================================================================

/// Create an element, optionally as the last child of `parent`.
pub fn create_element(
    parent: Option<ElementId>,
    flags: ElementFlags,
) -> Result<ElementId, ElementError> {
    ELEMENTS.with(|elements| {
        let mut elements = elements.borrow_mut();

        if let Some(parent) = parent {
            if !elements.contains_key(&parent) {
                return Err(ElementError::UnknownParent(parent));
            }
        }

        let id = NEXT_ID.with(|next| {
            let mut next = next.borrow_mut();
            let id = ElementId(*next);
            *next += 1;
            id
        });

        elements.insert(id, ElementNode { parent, children: Vec::new(), flags });
        if let Some(parent) = parent.and_then(|p| elements.get_mut(&p)) {
            parent.children.push(id);
        }

        tracing::trace!(element = %id, parent = ?parent, "element created");
        Ok(id)
    })
}

/// Remove an element together with its whole subtree.
///
/// Removal watchers of every removed element run after the subtree is
/// detached. Focus held inside the subtree is then dropped silently, without
/// dispatching a blur.
pub fn remove_element(id: ElementId) -> Result<(), ElementError> {
    let removed = ELEMENTS.with(|elements| {
        let mut elements = elements.borrow_mut();

        let parent = match elements.get(&id) {
            Some(node) => node.parent,
            None => return Err(ElementError::UnknownElement(id)),
        };
        if let Some(parent) = parent.and_then(|p| elements.get_mut(&p)) {
            parent.children.retain(|&child| child != id);
        }

        // Depth-first, parents before children
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = elements.remove(&current) {
                stack.extend(node.children.iter().rev().copied());
                removed.push(current);
            }
        }
        Ok(removed)
    })?;

    tracing::trace!(element = %id, count = removed.len(), "subtree removed");

    for &element in &removed {
        run_removal_watchers(element);
    }

    focus::handle_detached(&removed);
    Ok(())
}

fn run_removal_watchers(id: ElementId) {
    let watchers = REMOVAL_WATCHERS.with(|watchers| watchers.borrow_mut().remove(&id));
    if let Some(watchers) = watchers {
        for (_, watcher) in watchers {
            watcher();
        }
    }
}

// =============================================================================
// Removal Watchers
// =============================================================================

/// Run `callback` once when `id` is removed, directly or with an ancestor.
///
/// Returns cleanup function to unregister. Watching an element that is not
/// connected registers nothing.
pub fn on_remove(id: ElementId, callback: impl FnOnce() + 'static) -> impl FnOnce() {
    let watcher_id = if is_connected(id) {
        let watcher_id = NEXT_WATCHER_ID.with(|next| {
            let mut next = next.borrow_mut();
            let watcher_id = *next;
            *next += 1;
            watcher_id
        });
        REMOVAL_WATCHERS.with(|watchers| {
            watchers
                .borrow_mut()
                .entry(id)
                .or_default()
                .push((watcher_id, Box::new(callback)));
        });
        Some(watcher_id)
    } else {
        None
    };

    move || {
        let Some(watcher_id) = watcher_id else { return };
        REMOVAL_WATCHERS.with(|watchers| {
            let mut watchers = watchers.borrow_mut();
            if let Some(list) = watchers.get_mut(&id) {
                list.retain(|(other, _)| *other != watcher_id);
                if list.is_empty() {
                    watchers.remove(&id);
                }
            }
        });
    }
}

/// Number of removal watchers currently registered on `id`.
#[cfg(test)]
pub(crate) fn removal_watcher_count(id: ElementId) -> usize {
    REMOVAL_WATCHERS.with(|watchers| watchers.borrow().get(&id).map_or(0, Vec::len))
}

// =============================================================================
// Lookups
// =============================================================================

/// Check if `id` is currently part of the tree.
pub fn is_connected(id: ElementId) -> bool {
    ELEMENTS.with(|elements| elements.borrow().contains_key(&id))
}

/// Get the parent of an element (`None` for roots and removed elements).
pub fn parent_of(id: ElementId) -> Option<ElementId> {
    ELEMENTS.with(|elements| elements.borrow().get(&id).and_then(|node| node.parent))
}

/// Children of an element in insertion order.
pub fn children_of(id: ElementId) -> Vec<ElementId> {
    ELEMENTS.with(|elements| {
        elements
            .borrow()
            .get(&id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    })
}

/// Containment test: true if `node` is `ancestor` itself or one of its
/// descendants. A missing node is never contained.
pub fn contains(ancestor: ElementId, node: Option<ElementId>) -> bool {
    let Some(mut current) = node else { return false };
    ELEMENTS.with(|elements| {
        let elements = elements.borrow();
        if !elements.contains_key(&ancestor) {
            return false;
        }
        loop {
            if current == ancestor {
                return true;
            }
            match elements.get(&current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    })
}

/// Get the flags of an element.
pub fn element_flags(id: ElementId) -> Option<ElementFlags> {
    ELEMENTS.with(|elements| elements.borrow().get(&id).map(|node| node.flags))
}

/// Replace the flags of an element.
///
/// Disabling (or making unfocusable) the focused element blurs it, so
/// listeners receive a regular `FocusOut`.
pub fn set_element_flags(id: ElementId, flags: ElementFlags) -> Result<(), ElementError> {
    ELEMENTS.with(|elements| match elements.borrow_mut().get_mut(&id) {
        Some(node) => {
            node.flags = flags;
            Ok(())
        }
        None => Err(ElementError::UnknownElement(id)),
    })?;

    focus::handle_focusability_change(id);
    Ok(())
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Drop every element and watcher. Does not run watchers.
pub fn reset_elements() {
    ELEMENTS.with(|elements| elements.borrow_mut().clear());
    REMOVAL_WATCHERS.with(|watchers| watchers.borrow_mut().clear());
    NEXT_ID.with(|next| *next.borrow_mut() = 0);
    NEXT_WATCHER_ID.with(|next| *next.borrow_mut() = 0);
}

// =============================================================================
// Tests
// =============================================================================
