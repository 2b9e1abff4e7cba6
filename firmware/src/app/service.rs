//! Clock service — the hexagonal core.
//!
//! [`ClockService`] turns "what time is it" into "what should the panel
//! show".  All I/O flows through port traits injected at call sites, so the
//! whole service is testable with mock adapters.
//!
//! ```text
//!   TimePort ──▶ ┌──────────────────┐ ──▶ DisplayPort
//!                │   ClockService   │
//!                └──────────────────┘ ──▶ EventSink
//! ```

use log::{info, warn};

use crate::clock::{LocalTime, is_plausibly_synced};
use crate::config::SystemConfig;
use crate::ntp::NtpSettings;

use super::events::AppEvent;
use super::ports::{DisplayPort, DisplayStatus, EventSink, SyncError, TimePort};

pub struct ClockService {
    ntp: NtpSettings,
    network_up: bool,
    synced: bool,
    /// Last face actually written to the panel.
    drawn: Option<LocalTime>,
    /// Last status bar actually written to the panel.
    status: Option<DisplayStatus>,
}

impl ClockService {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            ntp: config.ntp.clone(),
            network_up: false,
            synced: false,
            drawn: None,
            status: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        let mut ntp_server = heapless::String::new();
        // Both strings share the same capacity.
        let _ = ntp_server.push_str(self.ntp.effective_server());
        sink.emit(&AppEvent::Started {
            ntp_server,
            utc_offset_hours: self.ntp.utc_offset_hours,
        });
        info!(
            "ClockService started (ntp={}, utc{:+})",
            self.ntp.effective_server(),
            self.ntp.utc_offset_hours
        );
    }

    /// Kick off SNTP once the network is up.  The adapter refuses settings
    /// that fail validation.
    pub fn begin_sync(&mut self, time: &mut impl TimePort) -> Result<(), SyncError> {
        time.start(&self.ntp)
    }

    pub fn set_network_up(&mut self, up: bool) {
        if up != self.network_up {
            info!("ClockService: network {}", if up { "up" } else { "down" });
        }
        self.network_up = up;
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Read the clock and redraw whatever changed since the last tick.
    pub fn tick<D: DisplayPort>(
        &mut self,
        time: &impl TimePort,
        display: &mut D,
        sink: &mut impl EventSink,
    ) {
        let now = time.now_unix().filter(|t| is_plausibly_synced(*t));

        let Some(unix) = now else {
            if self.synced {
                warn!("ClockService: wall clock lost");
                self.synced = false;
                sink.emit(&AppEvent::SyncLost);
            }
            let status = if self.network_up {
                DisplayStatus::Syncing
            } else {
                DisplayStatus::NoNetwork
            };
            self.render_status(status, display, sink);
            return;
        };

        let local = LocalTime::from_unix(unix, self.ntp.utc_offset_hours);
        if !self.synced {
            self.synced = true;
            info!("ClockService: time synced, local {}", local.format_hms());
            sink.emit(&AppEvent::TimeSynced(local));
        }
        self.render_status(DisplayStatus::Ok, display, sink);

        if self.drawn == Some(local) {
            return;
        }
        let new_minute = self
            .drawn
            .is_none_or(|prev| prev.minute != local.minute || prev.hour != local.hour);

        match display.show_time(&local) {
            Ok(()) => self.drawn = Some(local),
            Err(e) => {
                warn!("ClockService: panel write failed: {:?}", e);
                self.drawn = None;
                sink.emit(&AppEvent::DisplayFault);
                return;
            }
        }
        if new_minute {
            sink.emit(&AppEvent::MinuteTick(local));
        }
    }

    fn render_status<D: DisplayPort>(
        &mut self,
        status: DisplayStatus,
        display: &mut D,
        sink: &mut impl EventSink,
    ) {
        if self.status == Some(status) {
            return;
        }
        match display.show_status(status) {
            Ok(()) => self.status = Some(status),
            Err(e) => {
                warn!("ClockService: status bar write failed: {:?}", e);
                self.status = None;
                sink.emit(&AppEvent::DisplayFault);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::EPOCH_2020;
    use core::cell::Cell;

    struct FakeTime(Cell<Option<i64>>);

    impl TimePort for FakeTime {
        fn start(&mut self, settings: &NtpSettings) -> Result<(), SyncError> {
            settings.validate().map_err(|_| SyncError::InvalidSettings)
        }
        fn now_unix(&self) -> Option<i64> {
            self.0.get()
        }
    }

    #[derive(Default)]
    struct Panel {
        faces: Vec<LocalTime>,
        statuses: Vec<DisplayStatus>,
    }

    impl DisplayPort for Panel {
        type Error = &'static str;
        fn show_time(&mut self, time: &LocalTime) -> Result<(), Self::Error> {
            self.faces.push(*time);
            Ok(())
        }
        fn show_status(&mut self, status: DisplayStatus) -> Result<(), Self::Error> {
            self.statuses.push(status);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Events(Vec<AppEvent>);

    impl EventSink for Events {
        fn emit(&mut self, event: &AppEvent) {
            self.0.push(event.clone());
        }
    }

    #[test]
    fn unsynced_shows_no_network_then_syncing() {
        let mut svc = ClockService::new(&SystemConfig::default());
        let time = FakeTime(Cell::new(None));
        let mut panel = Panel::default();
        let mut ev = Events::default();

        svc.tick(&time, &mut panel, &mut ev);
        svc.tick(&time, &mut panel, &mut ev);
        svc.set_network_up(true);
        svc.tick(&time, &mut panel, &mut ev);

        assert_eq!(
            panel.statuses,
            vec![DisplayStatus::NoNetwork, DisplayStatus::Syncing]
        );
        assert!(panel.faces.is_empty());
        assert!(!svc.is_synced());
    }

    #[test]
    fn pre_2020_clock_counts_as_unsynced() {
        let mut svc = ClockService::new(&SystemConfig::default());
        let time = FakeTime(Cell::new(Some(1000)));
        let mut panel = Panel::default();
        let mut ev = Events::default();
        svc.tick(&time, &mut panel, &mut ev);
        assert!(!svc.is_synced());
        assert!(panel.faces.is_empty());
    }

    #[test]
    fn sync_applies_pacific_offset_and_redraws_once_per_second() {
        let mut svc = ClockService::new(&SystemConfig::default());
        let time = FakeTime(Cell::new(Some(EPOCH_2020 + 12 * 3600)));
        let mut panel = Panel::default();
        let mut ev = Events::default();

        svc.tick(&time, &mut panel, &mut ev);
        svc.tick(&time, &mut panel, &mut ev);
        assert_eq!(panel.faces.len(), 1);
        assert_eq!(panel.faces[0], LocalTime { hour: 4, minute: 0, second: 0 });

        time.0.set(Some(EPOCH_2020 + 12 * 3600 + 1));
        svc.tick(&time, &mut panel, &mut ev);
        assert_eq!(panel.faces.len(), 2);

        let minute_ticks = ev.0.iter().filter(|e| matches!(e, AppEvent::MinuteTick(_))).count();
        assert_eq!(minute_ticks, 1);
        assert!(matches!(ev.0[0], AppEvent::TimeSynced(_)));
    }

    #[test]
    fn losing_time_emits_sync_lost() {
        let mut svc = ClockService::new(&SystemConfig::default());
        let time = FakeTime(Cell::new(Some(EPOCH_2020)));
        let mut panel = Panel::default();
        let mut ev = Events::default();
        svc.tick(&time, &mut panel, &mut ev);
        time.0.set(None);
        svc.tick(&time, &mut panel, &mut ev);
        assert_eq!(ev.0.last(), Some(&AppEvent::SyncLost));
        assert!(!svc.is_synced());
    }

    #[test]
    fn invalid_ntp_settings_never_start_sync() {
        let cfg = SystemConfig {
            ntp: NtpSettings::new("not a host", 100).unwrap(),
            ..SystemConfig::default()
        };
        let mut svc = ClockService::new(&cfg);
        let mut sntp = crate::adapters::sntp::SntpAdapter::new();
        assert_eq!(svc.begin_sync(&mut sntp), Err(SyncError::InvalidSettings));
        assert_eq!(sntp.now_unix(), None);

        let mut panel = Panel::default();
        let mut ev = Events::default();
        svc.tick(&sntp, &mut panel, &mut ev);
        assert!(!svc.is_synced());
        assert!(panel.faces.is_empty());
    }
}
