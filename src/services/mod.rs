//! Core services for the wintrack lifecycle tracker

pub mod description;
pub mod observers;
pub mod tracker_service;
pub mod transitions;
pub mod window_tracker;

pub use description::*;
pub use observers::*;
pub use tracker_service::*;
pub use transitions::*;
pub use window_tracker::*;
