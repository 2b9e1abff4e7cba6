//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`] — the hexagonal boundary for network
//! connectivity.  Credentials come from the frozen
//! [`SystemConfig`](crate::config::SystemConfig) and are validated here,
//! at the point of use.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation backend for host-side tests.
//!
//! ## Reconnection policy
//!
//! On disconnect the adapter waits an exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s) before retrying.

use core::fmt;
use log::{error, info, warn};

use crate::credentials::{Passphrase, WifiCredentials};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidCredentials,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidCredentials => write!(f, "WiFi credentials rejected"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

pub trait ConnectivityPort {
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    fn poll(&mut self);
    fn set_credentials(&mut self, creds: &WifiCredentials) -> Result<(), ConnectivityError>;
    fn rssi(&self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

const INITIAL_BACKOFF_SECS: u32 = 2;
const MAX_BACKOFF_SECS: u32 = 60;

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    passphrase: Passphrase,
    backoff_secs: u32,
    /// Seconds left before the next reconnect attempt.
    retry_in_secs: u32,
    last_rssi: Option<i8>,
    #[cfg(target_os = "espidf")]
    driver: BlockingWifi<EspWifi<'static>>,
    /// Simulation: number of upcoming connect attempts that fail.
    #[cfg(not(target_os = "espidf"))]
    sim_failures: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(driver: BlockingWifi<EspWifi<'static>>) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            passphrase: Passphrase::default(),
            backoff_secs: INITIAL_BACKOFF_SECS,
            retry_in_secs: 0,
            last_rssi: None,
            driver,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            passphrase: Passphrase::default(),
            backoff_secs: INITIAL_BACKOFF_SECS,
            retry_in_secs: 0,
            last_rssi: None,
            sim_failures: 0,
            sim_link_up: false,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn backoff_secs(&self) -> u32 {
        self.backoff_secs
    }

    /// Make the next `n` connect attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulate_failures(&mut self, n: u32) {
        self.sim_failures = n;
    }

    /// Drop the simulated link as if the AP went away.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulate_link_loss(&mut self) {
        self.sim_link_up = false;
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let conf = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidCredentials)?,
            password: self
                .passphrase
                .expose()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidCredentials)?,
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        });
        self.driver
            .set_configuration(&conf)
            .map_err(|_| ConnectivityError::InvalidCredentials)?;
        if !self.driver.is_started().unwrap_or(false) {
            self.driver
                .start()
                .map_err(|_| ConnectivityError::ConnectionFailed)?;
        }
        self.driver.connect().map_err(|e| {
            warn!("WiFi: connect error {}", e);
            ConnectivityError::ConnectionFailed
        })?;
        self.driver
            .wait_netif_up()
            .map_err(|_| ConnectivityError::ConnectionFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        if self.sim_failures > 0 {
            self.sim_failures -= 1;
            warn!("WiFi(sim): simulated connect failure ({} left)", self.sim_failures);
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.sim_link_up = true;
        info!("WiFi(sim): associated with '{}'", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.driver.disconnect() {
            warn!("WiFi: disconnect error {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_link_up = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_link_up
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        use esp_idf_svc::sys::{ESP_OK, esp_wifi_sta_get_ap_info, wifi_ap_record_t};
        let mut info = wifi_ap_record_t::default();
        // SAFETY: `info` is a valid out-pointer for the duration of the call.
        (unsafe { esp_wifi_sta_get_ap_info(&mut info) } == ESP_OK).then_some(info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        self.sim_link_up.then_some(-60)
    }

    fn on_connected(&mut self) {
        self.state = WifiState::Connected;
        self.backoff_secs = INITIAL_BACKOFF_SECS;
        self.retry_in_secs = 0;
        self.last_rssi = self.platform_rssi();
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        self.state = WifiState::Connecting;

        match self.platform_connect() {
            Ok(()) => {
                self.on_connected();
                info!("WiFi: connected (RSSI={:?})", self.last_rssi);
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed — {}", e);
                self.state = WifiState::Reconnecting { attempt: 0 };
                self.retry_in_secs = self.backoff_secs;
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.last_rssi = None;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    /// Call once per second.
    fn poll(&mut self) {
        match self.state {
            WifiState::Reconnecting { attempt } => {
                if self.retry_in_secs > 0 {
                    self.retry_in_secs -= 1;
                    return;
                }
                info!("WiFi: reconnect attempt {} (backoff {}s)", attempt, self.backoff_secs);
                if self.platform_connect().is_ok() {
                    self.on_connected();
                    info!("WiFi: reconnected (RSSI={:?})", self.last_rssi);
                } else {
                    self.backoff_secs = (self.backoff_secs * 2).min(MAX_BACKOFF_SECS);
                    self.retry_in_secs = self.backoff_secs;
                    self.state = WifiState::Reconnecting { attempt: attempt + 1 };
                }
            }
            WifiState::Connected => {
                if self.platform_is_connected() {
                    self.last_rssi = self.platform_rssi();
                } else {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.state = WifiState::Reconnecting { attempt: 0 };
                    self.retry_in_secs = self.backoff_secs;
                    self.last_rssi = None;
                }
            }
            WifiState::Disconnected | WifiState::Connecting => {}
        }
    }

    fn set_credentials(&mut self, creds: &WifiCredentials) -> Result<(), ConnectivityError> {
        creds.validate().map_err(|e| {
            warn!("WiFi: {}", e);
            ConnectivityError::InvalidCredentials
        })?;
        self.ssid.clone_from(&creds.ssid);
        self.passphrase = creds.passphrase.clone();
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(ssid: &str, pass: &str) -> WifiCredentials {
        WifiCredentials::new(ssid, pass).unwrap()
    }

    #[test]
    fn rejects_empty_ssid() {
        let mut a = WifiAdapter::new();
        assert_eq!(
            a.set_credentials(&creds("", "password123")),
            Err(ConnectivityError::InvalidCredentials)
        );
    }

    #[test]
    fn rejects_empty_passphrase() {
        let mut a = WifiAdapter::new();
        assert_eq!(
            a.set_credentials(&creds("OpenCafe", "")),
            Err(ConnectivityError::InvalidCredentials)
        );
    }

    #[test]
    fn connect_without_credentials_fails() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.connect(), Err(ConnectivityError::NoCredentials));
    }

    #[test]
    fn connect_disconnect_roundtrip() {
        let mut a = WifiAdapter::new();
        a.set_credentials(&creds("TestNet", "password1")).unwrap();
        a.connect().unwrap();
        assert!(a.is_connected());
        assert!(a.rssi().is_some());
        a.disconnect();
        assert!(!a.is_connected());
        assert!(a.rssi().is_none());
    }

    #[test]
    fn double_connect_fails() {
        let mut a = WifiAdapter::new();
        a.set_credentials(&creds("Net", "password1")).unwrap();
        a.connect().unwrap();
        assert_eq!(a.connect(), Err(ConnectivityError::AlreadyConnected));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let mut a = WifiAdapter::new();
        a.set_credentials(&creds("Net", "password1")).unwrap();
        a.simulate_failures(u32::MAX);
        assert!(a.connect().is_err());
        assert_eq!(a.backoff_secs(), 2);

        let mut seen = Vec::new();
        for _ in 0..400 {
            let before = a.backoff_secs();
            a.poll();
            if a.backoff_secs() != before {
                seen.push(a.backoff_secs());
            }
        }
        assert_eq!(&seen[..5], &[4, 8, 16, 32, 60]);
        assert_eq!(a.backoff_secs(), MAX_BACKOFF_SECS);
    }

    #[test]
    fn reconnects_after_link_loss() {
        let mut a = WifiAdapter::new();
        a.set_credentials(&creds("Net", "password1")).unwrap();
        a.connect().unwrap();
        a.simulate_link_loss();
        a.poll();
        assert_eq!(a.state(), WifiState::Reconnecting { attempt: 0 });
        for _ in 0..=INITIAL_BACKOFF_SECS {
            a.poll();
        }
        assert!(a.is_connected());
    }
}
