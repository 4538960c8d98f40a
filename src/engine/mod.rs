//! Element Engine - the host element tree.
//!
//! Elements are ids into a thread-local registry. The registry owns parent
//! links, the containment test, and removal watchers:
//!
//! ```text
//! e0 (root)
//! ├── e1 (focusable)
//! └── e2
//!     └── e3 (focusable)
//! ```

mod registry;

pub use registry::*;
