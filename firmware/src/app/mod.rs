//! Application core — pure clock logic, zero I/O.
//!
//! All interaction with the panel, the network clock and storage happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
