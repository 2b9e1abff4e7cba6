//! SNTP time adapter.
//!
//! Implements [`TimePort`] for the TftClock.
//!
//! - **`target_os = "espidf"`** — wraps `esp_idf_svc::sntp::EspSntp`, which
//!   sets the system clock in the background once a reply arrives.  The wall
//!   clock is read back with `gettimeofday()`.
//! - **`not(target_os = "espidf")`** — the host clock is assumed correct
//!   once [`TimePort::start`] has been called.
//!
//! A clock still before 2020-01-01 has never been set and reads as `None`.

use core::cell::Cell;

use log::{info, warn};

use crate::app::ports::{SyncError, TimePort};
use crate::clock::is_plausibly_synced;
use crate::ntp::NtpSettings;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sntp::{EspSntp, SntpConf, SyncStatus};

/// Sticky "first sync completed" flag.
///
/// ESP-IDF reports `Completed` once and then resets the status, so the
/// flag is set on the first completion and never cleared.
#[derive(Debug, Default)]
struct SyncLatch(Cell<bool>);

impl SyncLatch {
    fn observe(&self, completed: bool) -> bool {
        if completed {
            self.0.set(true);
        }
        self.0.get()
    }
}

pub struct SntpAdapter {
    #[cfg(target_os = "espidf")]
    sntp: Option<EspSntp<'static>>,
    #[cfg(not(target_os = "espidf"))]
    started: bool,
    latch: SyncLatch,
}

impl Default for SntpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SntpAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            sntp: None,
            #[cfg(not(target_os = "espidf"))]
            started: false,
            latch: SyncLatch::default(),
        }
    }

    fn is_started(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            self.sntp.is_some()
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.started
        }
    }

    /// `true` once the first SNTP exchange has completed.  Stays `true`.
    #[cfg(target_os = "espidf")]
    pub fn is_synced(&self) -> bool {
        let completed = self
            .sntp
            .as_ref()
            .is_some_and(|s| s.get_sync_status() == SyncStatus::Completed);
        self.latch.observe(completed || self.now_unix().is_some())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn is_synced(&self) -> bool {
        self.latch.observe(self.now_unix().is_some())
    }

    #[cfg(target_os = "espidf")]
    fn system_unix() -> Option<i64> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: `tv` is a valid out-pointer; the timezone argument may be null.
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        Some(i64::from(tv.tv_sec))
    }

    #[cfg(not(target_os = "espidf"))]
    fn system_unix() -> Option<i64> {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|d| i64::try_from(d.as_secs()).ok())
    }
}

impl TimePort for SntpAdapter {
    fn start(&mut self, settings: &NtpSettings) -> Result<(), SyncError> {
        if self.is_started() {
            return Err(SyncError::AlreadyStarted);
        }
        settings.validate().map_err(|e| {
            warn!("SNTP: refusing to start ({})", e);
            SyncError::InvalidSettings
        })?;
        let server = settings.effective_server();

        #[cfg(target_os = "espidf")]
        {
            let mut conf = SntpConf::default();
            conf.servers[0] = server;
            let sntp = EspSntp::new(&conf).map_err(|e| {
                warn!("SNTP: start failed ({})", e);
                SyncError::StartFailed
            })?;
            self.sntp = Some(sntp);
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.started = true;
        }

        info!("SNTP: polling '{}' (utc{:+})", server, settings.utc_offset_hours);
        Ok(())
    }

    /// The system clock, once it has been set.  Independent of the SNTP
    /// status, which ESP-IDF clears after each completed exchange.
    fn now_unix(&self) -> Option<i64> {
        if !self.is_started() {
            return None;
        }
        Self::system_unix().filter(|t| is_plausibly_synced(*t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_time_before_start() {
        let s = SntpAdapter::new();
        assert!(!s.is_synced());
        assert_eq!(s.now_unix(), None);
    }

    #[test]
    fn start_once() {
        let mut s = SntpAdapter::new();
        s.start(&NtpSettings::default()).unwrap();
        assert_eq!(
            s.start(&NtpSettings::default()),
            Err(SyncError::AlreadyStarted)
        );
        assert!(s.now_unix().is_some_and(is_plausibly_synced));
        assert!(s.is_synced());
    }

    #[test]
    fn empty_server_falls_back_to_pool() {
        let mut s = SntpAdapter::new();
        let settings = NtpSettings::new("", 0).unwrap();
        assert!(s.start(&settings).is_ok());
    }

    #[test]
    fn invalid_settings_refused() {
        let mut s = SntpAdapter::new();
        let bad_host = NtpSettings::new("not a host", -8).unwrap();
        assert_eq!(s.start(&bad_host), Err(SyncError::InvalidSettings));
        let bad_offset = NtpSettings::new("pool.ntp.org", 100).unwrap();
        assert_eq!(s.start(&bad_offset), Err(SyncError::InvalidSettings));
        assert_eq!(s.now_unix(), None);

        // A refused start leaves the adapter free to start properly.
        assert!(s.start(&NtpSettings::default()).is_ok());
    }

    #[test]
    fn latch_holds_after_status_resets() {
        let latch = SyncLatch::default();
        assert!(!latch.observe(false));
        assert!(latch.observe(true));
        // Status reads back as reset on the next poll.
        assert!(latch.observe(false));
        assert!(latch.observe(false));
    }
}
