//! Port traits — the hexagonal boundary between the clock logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ClockService (domain)
//! ```
//!
//! Driven adapters (panel, SNTP, storage, event sinks) implement these
//! traits.  The [`ClockService`](super::service::ClockService) consumes them
//! via generics, so the domain core never touches hardware directly.
//!
//! ## Security notes
//!
//! - **CredentialPort** implementations MUST validate before persisting.
//! - Only the Wi-Fi credentials are ever persisted; pins and NTP settings
//!   always come from the build.

use core::fmt;

use crate::clock::LocalTime;
use crate::credentials::WifiCredentials;
use crate::ntp::NtpSettings;

pub use crate::error::{ConfigError, StorageError};

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → panel)
// ───────────────────────────────────────────────────────────────

/// What the status bar under the clock face should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    /// Time is synced, bar blank.
    Ok,
    /// Network up, waiting for the first SNTP reply.
    Syncing,
    /// No Wi-Fi link (or no credentials).
    NoNetwork,
}

pub trait DisplayPort {
    type Error: fmt::Debug;

    /// Redraw the clock face.
    fn show_time(&mut self, time: &LocalTime) -> Result<(), Self::Error>;

    fn show_status(&mut self, status: DisplayStatus) -> Result<(), Self::Error>;
}

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: SNTP → domain)
// ───────────────────────────────────────────────────────────────

/// Errors from starting time synchronisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// The SNTP service could not be started.
    StartFailed,
    /// Server or UTC offset failed validation.
    InvalidSettings,
    /// Already running.
    AlreadyStarted,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartFailed => write!(f, "SNTP start failed"),
            Self::InvalidSettings => write!(f, "invalid NTP settings"),
            Self::AlreadyStarted => write!(f, "SNTP already started"),
        }
    }
}

pub trait TimePort {
    /// Begin periodic synchronisation against `settings.effective_server()`.
    ///
    /// Settings that fail [`NtpSettings::validate`] are refused with
    /// [`SyncError::InvalidSettings`].
    fn start(&mut self, settings: &NtpSettings) -> Result<(), SyncError>;

    /// Current UNIX time in seconds, `None` until the clock has been set.
    fn now_unix(&self) -> Option<i64>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Credential port (driven adapter: domain ↔ persistent secrets)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the Wi-Fi credentials.
///
/// # Security
///
/// Implementations MUST validate before persisting and MUST keep the
/// record in the credential namespace.
pub trait CredentialPort {
    /// Returns [`ConfigError::NotFound`] if nothing has been stored yet.
    fn load(&self) -> Result<WifiCredentials, ConfigError>;

    /// Validate and persist.
    fn save(&self, creds: &WifiCredentials) -> Result<(), ConfigError>;
}
