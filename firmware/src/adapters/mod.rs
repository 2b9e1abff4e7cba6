//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to              |
//! |------------|--------------------|--------------------------|
//! | `log_sink` | EventSink          | Serial log output        |
//! | `nvs`      | CredentialPort     | NVS / in-memory store    |
//! | `sntp`     | TimePort           | ESP-IDF SNTP client      |
//! | `wifi`     | ConnectivityPort   | ESP-IDF WiFi STA         |
//!
//! The clock face implements `DisplayPort` in
//! [`drivers::display`](crate::drivers::display).

pub mod log_sink;
pub mod nvs;
pub mod sntp;
pub mod wifi;
