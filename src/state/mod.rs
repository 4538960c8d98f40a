//! State Module - Runtime focus state
//!
//! - **Focus** - active element, focus/blur, bubbling focus event dispatch

pub mod focus;

pub use focus::*;
