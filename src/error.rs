//! Element tree errors.

use thiserror::Error;

use crate::types::ElementId;

/// Misuse of the element tree API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ElementError {
    /// The element does not exist or was already removed.
    #[error("unknown element {0}")]
    UnknownElement(ElementId),

    /// The requested parent does not exist or was already removed.
    #[error("cannot attach to unknown parent {0}")]
    UnknownParent(ElementId),
}
