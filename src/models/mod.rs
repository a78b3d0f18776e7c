//! Data models for the wintrack lifecycle tracker

pub mod lifecycle_event;
pub mod raw_event;
pub mod window;

pub use lifecycle_event::*;
pub use raw_event::*;
pub use window::*;
