//! Link layer for the EEZ BB3 power-supply chassis.
//!
//! The chassis speaks a line-oriented SCPI dialect over its TCP port
//! (default 5025). This crate provides the blocking transport, the
//! line/binary-block framing, and the small command vocabulary the
//! bench tools need: channel control, measurements, and the on-screen
//! dialog surface (data push, action poll, input prompt).

pub mod block;
pub mod chassis;
pub mod client;
pub mod dialog;
pub mod error;
pub mod transport;

pub use chassis::Chassis;
pub use client::ScpiClient;
pub use dialog::Unit;
pub use error::{Error, Result};
pub use transport::{TcpTransport, Transport};
