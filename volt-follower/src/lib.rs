//! Voltage follower for a BB3 chassis with two DCP405 modules
//!
//! The output channel tracks the measurement channel plus a
//! configurable offset: `out = in + offset`, clamped to the module's
//! physical range. The operator drives the run from a dialog on the
//! chassis front panel; this tool polls that dialog over the SCPI port
//! and closes the loop.

pub mod config;
pub mod controller;
pub mod error;
pub mod pacing;
pub mod session;

pub use config::FollowerConfig;
pub use controller::Controller;
pub use error::{FollowerError, Result};
