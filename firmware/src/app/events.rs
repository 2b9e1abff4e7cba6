//! Outbound application events.
//!
//! The [`ClockService`](super::service::ClockService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.

use crate::clock::LocalTime;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started.  Carries the NTP server in use.
    Started { ntp_server: heapless::String<64>, utc_offset_hours: i8 },

    /// The wall clock became valid.
    TimeSynced(LocalTime),

    /// The wall clock was valid and is no longer readable.
    SyncLost,

    /// A new minute began.
    MinuteTick(LocalTime),

    /// A panel write failed.  Rendering is retried on the next tick.
    DisplayFault,
}
