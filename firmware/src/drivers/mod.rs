//! Panel driver and one-shot hardware initialisation.

pub mod display;
#[cfg(target_os = "espidf")]
pub mod hw_init;
