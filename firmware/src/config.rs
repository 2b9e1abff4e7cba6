//! System configuration.
//!
//! Everything the display, Wi-Fi and time-sync code needs from the outside
//! world, assembled once at boot and then frozen with [`install`].  After
//! that the configuration is a `&'static SystemConfig`: readable from any
//! task without locking, and impossible to mutate.
//!
//! Pins and NTP settings are fixed by the build.  Only the Wi-Fi
//! credentials may come from elsewhere (NVS or the process environment),
//! see [`resolve`].
//!
//! Validation lives here but is invoked by the consumers (`main` before
//! [`install`], `NvsAdapter` before persisting, the Wi-Fi and SNTP adapters
//! before use); building or reading a config never fails on its own.

use std::sync::OnceLock;

use crate::credentials::WifiCredentials;
use crate::error::ConfigError;
use crate::ntp::NtpSettings;
use crate::pins::DisplayPins;

/// Core system configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemConfig {
    // --- Display ---
    pub display: DisplayPins,

    // --- Network ---
    pub wifi: WifiCredentials,

    // --- Time ---
    pub ntp: NtpSettings,
}

impl SystemConfig {
    /// Board pin map plus whatever the build environment injected.
    pub fn from_build_env() -> Self {
        Self {
            display: DisplayPins::BOARD,
            wifi: WifiCredentials::from_build_env(),
            ntp: NtpSettings::from_build_env(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.display.validate()?;
        self.wifi.validate()?;
        self.ntp.validate()
    }
}

/// Pick the boot configuration.
///
/// The build always supplies the pins and NTP settings.  Credentials come
/// from the build if it injected a complete pair, else from NVS, else from
/// the process environment.
pub fn resolve(
    build: SystemConfig,
    stored: Option<WifiCredentials>,
    env: Option<WifiCredentials>,
) -> SystemConfig {
    if build.wifi.is_complete() {
        return build;
    }
    match stored
        .filter(WifiCredentials::is_complete)
        .or_else(|| env.filter(WifiCredentials::is_complete))
    {
        Some(wifi) => SystemConfig { wifi, ..build },
        None => build,
    }
}

// ---------------------------------------------------------------------------
// Process-wide frozen instance
// ---------------------------------------------------------------------------

static CONFIG: OnceLock<SystemConfig> = OnceLock::new();

/// Freeze `config` for the rest of the process.
///
/// Fails with [`ConfigError::AlreadyInstalled`] on a second call; the
/// first installed value is kept.
pub fn install(config: SystemConfig) -> Result<&'static SystemConfig, ConfigError> {
    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInstalled)?;
    CONFIG.get().ok_or(ConfigError::NotFound)
}

/// The installed configuration, if [`install`] has run.
pub fn get() -> Option<&'static SystemConfig> {
    CONFIG.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SystemConfig {
        SystemConfig {
            wifi: WifiCredentials::new("TestNet", "password1").unwrap(),
            ..SystemConfig::default()
        }
    }

    #[test]
    fn default_config_uses_board_values() {
        let c = SystemConfig::default();
        assert_eq!(c.display, DisplayPins { dc: 4, cs: 5 });
        assert_eq!(c.ntp.server.as_str(), "us.pool.ntp.org");
        assert_eq!(c.ntp.utc_offset_hours, -8);
    }

    #[test]
    fn default_config_without_credentials_fails_validation() {
        let c = SystemConfig::default();
        assert!(matches!(
            c.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn complete_config_is_valid() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn conflicting_pins_rejected() {
        let c = SystemConfig {
            display: DisplayPins { dc: 5, cs: 5 },
            ..sample()
        };
        assert!(matches!(c.validate(), Err(ConfigError::Pins(_))));
    }

    #[test]
    fn resolve_prefers_build_credentials() {
        let stored = WifiCredentials::new("Stored", "password2").unwrap();
        let c = resolve(sample(), Some(stored), None);
        assert_eq!(c.wifi.ssid.as_str(), "TestNet");
    }

    #[test]
    fn resolve_takes_only_credentials_from_storage() {
        let build = SystemConfig {
            ntp: NtpSettings::new("time.example.org", 1).unwrap(),
            ..SystemConfig::default()
        };
        let stored = WifiCredentials::new("Stored", "password2").unwrap();
        let c = resolve(build.clone(), Some(stored), None);
        assert_eq!(c.wifi.ssid.as_str(), "Stored");
        assert_eq!(c.display, DisplayPins::BOARD);
        assert_eq!(c.ntp, build.ntp);
    }

    #[test]
    fn resolve_falls_back_to_stored_then_env() {
        let stored = WifiCredentials::new("Stored", "password2").unwrap();
        let env = WifiCredentials::new("FromEnv", "password3").unwrap();

        let c = resolve(SystemConfig::default(), Some(stored), Some(env.clone()));
        assert_eq!(c.wifi.ssid.as_str(), "Stored");

        let c = resolve(SystemConfig::default(), None, Some(env.clone()));
        assert_eq!(c.wifi.ssid.as_str(), "FromEnv");
        assert_eq!(c.display, DisplayPins::BOARD);

        let half = WifiCredentials::new("Stored", "").unwrap();
        let c = resolve(SystemConfig::default(), Some(half), Some(env.clone()));
        assert_eq!(c.wifi, env);

        let c = resolve(SystemConfig::default(), None, None);
        assert!(!c.wifi.is_complete());
    }

    #[test]
    fn install_freezes_first_value() {
        // The only test in this binary that touches the global.
        let first = install(sample()).unwrap();
        assert_eq!(first.display.dc, 4);

        let other = SystemConfig {
            display: DisplayPins { dc: 20, cs: 21 },
            ..sample()
        };
        assert_eq!(install(other), Err(ConfigError::AlreadyInstalled));

        let a = get().unwrap();
        let b = get().unwrap();
        assert!(core::ptr::eq(a, b));
        assert_eq!(a.display, DisplayPins::BOARD);
    }
}
