//! Interaction primitives.
//!
//! - [`create_focus_within`] - subtree-scoped focus tracking
//! - [`create_synthetic_blur`] - focus-out compensation when the focused
//!   element is detached
//!
//! Primitives return handlers; attach them with
//! [`on_focus_events`](crate::state::on_focus_events).

mod focus_within;
mod synthetic_blur;

pub use focus_within::*;
pub use synthetic_blur::*;
