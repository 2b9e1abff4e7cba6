//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { ntp_server, utc_offset_hours } => {
                info!("EVENT | started | ntp={} utc{:+}", ntp_server, utc_offset_hours);
            }
            AppEvent::TimeSynced(t) => {
                info!("EVENT | time synced | {}", t.format_hms());
            }
            AppEvent::SyncLost => {
                warn!("EVENT | time sync lost");
            }
            AppEvent::MinuteTick(t) => {
                info!("EVENT | {}", t.format_hm());
            }
            AppEvent::DisplayFault => {
                warn!("EVENT | display write failed");
            }
        }
    }
}
