//! Wi-Fi station credentials.
//!
//! Credentials are never compiled in as literals.  They reach the firmware
//! from one of three places, in the order `main` tries them:
//!
//! 1. `WIFI_SSID` / `WIFI_PASS` in the **build** environment (`option_env!`),
//! 2. the NVS `auth` namespace (see [`NvsAdapter`]),
//! 3. `WIFI_SSID` / `WIFI_PASS` in the **process** environment (host runs).
//!
//! [`NvsAdapter`]: crate::adapters::nvs::NvsAdapter

use core::fmt;

use heapless::String;

use crate::error::ConfigError;

/// 802.11 SSID limit.
pub const SSID_MAX_LEN: usize = 32;
/// WPA2-PSK passphrase limits.  A 64-character value is not a passphrase
/// but the raw 256-bit PSK in hex.
pub const PASSPHRASE_MIN_LEN: usize = 8;
pub const PASSPHRASE_MAX_LEN: usize = 63;
pub const PSK_HEX_LEN: usize = 64;

// ───────────────────────────────────────────────────────────────
// Passphrase
// ───────────────────────────────────────────────────────────────

/// A WPA2 passphrase.  `Debug` and `Display` never print the content.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Passphrase(String<PSK_HEX_LEN>);

impl Passphrase {
    pub fn new(pass: &str) -> Result<Self, ConfigError> {
        String::try_from(pass)
            .map(Self)
            .map_err(|()| ConfigError::TooLong("passphrase"))
    }

    /// The secret itself.  Only hand this to the Wi-Fi driver.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Passphrase(<{} bytes redacted>)", self.0.len())
    }
}

impl fmt::Display for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String<SSID_MAX_LEN>,
    pub passphrase: Passphrase,
}

impl WifiCredentials {
    pub fn new(ssid: &str, passphrase: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            ssid: String::try_from(ssid).map_err(|()| ConfigError::TooLong("ssid"))?,
            passphrase: Passphrase::new(passphrase)?,
        })
    }

    /// Credentials injected at build time.  Empty when the variables were
    /// not set; an over-long value is treated as unset.
    pub fn from_build_env() -> Self {
        Self::new(
            option_env!("WIFI_SSID").unwrap_or(""),
            option_env!("WIFI_PASS").unwrap_or(""),
        )
        .unwrap_or_default()
    }

    /// Credentials from the process environment.  `None` unless both
    /// variables are present.
    pub fn from_env() -> Option<Self> {
        let ssid = std::env::var("WIFI_SSID").ok()?;
        let pass = std::env::var("WIFI_PASS").ok()?;
        Self::new(&ssid, &pass).ok()
    }

    /// Both SSID and passphrase are present.
    pub fn is_complete(&self) -> bool {
        !self.ssid.is_empty() && !self.passphrase.is_empty()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ssid(&self.ssid)?;
        validate_passphrase(self.passphrase.expose())
    }
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), ConfigError> {
    if ssid.is_empty() {
        return Err(ConfigError::ValidationFailed("ssid must not be empty"));
    }
    if ssid.len() > SSID_MAX_LEN || !is_printable_ascii(ssid) {
        return Err(ConfigError::ValidationFailed(
            "ssid must be 1-32 printable ASCII bytes",
        ));
    }
    Ok(())
}

pub fn validate_passphrase(pass: &str) -> Result<(), ConfigError> {
    if pass.is_empty() {
        return Err(ConfigError::ValidationFailed("passphrase must not be empty"));
    }
    if pass.len() == PSK_HEX_LEN {
        if !pass.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ConfigError::ValidationFailed(
                "64-character passphrase must be a hex PSK",
            ));
        }
        return Ok(());
    }
    if !(PASSPHRASE_MIN_LEN..=PASSPHRASE_MAX_LEN).contains(&pass.len())
        || !is_printable_ascii(pass)
    {
        return Err(ConfigError::ValidationFailed(
            "passphrase must be 8-63 printable ASCII bytes",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_passphrase() {
        let c = WifiCredentials::new("HomeNet", "hunter22hunter22").unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("HomeNet"));
        assert!(!dbg.contains("hunter22"));
        assert_eq!(format!("{}", c.passphrase), "********");
    }

    #[test]
    fn rejects_empty_ssid() {
        let c = WifiCredentials::new("", "password123").unwrap();
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn rejects_empty_passphrase() {
        let c = WifiCredentials::new("MyNet", "").unwrap();
        assert!(!c.is_complete());
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn rejects_short_passphrase() {
        let c = WifiCredentials::new("MyNet", "short").unwrap();
        assert!(c.is_complete());
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_non_printable_ssid() {
        assert!(validate_ssid("bad\tname").is_err());
    }

    #[test]
    fn oversized_values_do_not_fit() {
        let long = "x".repeat(SSID_MAX_LEN + 1);
        assert_eq!(
            WifiCredentials::new(&long, "password1"),
            Err(ConfigError::TooLong("ssid"))
        );
        let long = "x".repeat(PSK_HEX_LEN + 1);
        assert_eq!(Passphrase::new(&long), Err(ConfigError::TooLong("passphrase")));
    }

    #[test]
    fn accepts_valid_wpa2() {
        let c = WifiCredentials::new("HomeWiFi", "mysecret8").unwrap();
        assert!(c.validate().is_ok());
        assert_eq!(c.passphrase.expose(), "mysecret8");
    }

    #[test]
    fn sixty_four_chars_must_be_hex_psk() {
        let hex = "0123456789abcdefABCDEF0123456789abcdef0123456789abcdef0123456789";
        assert_eq!(hex.len(), PSK_HEX_LEN);
        assert!(validate_passphrase(hex).is_ok());

        let text = "x".repeat(PSK_HEX_LEN);
        assert!(WifiCredentials::new("HomeWiFi", &text).is_ok());
        assert!(matches!(
            validate_passphrase(&text),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn passphrase_bounds() {
        assert!(validate_passphrase(&"p".repeat(PASSPHRASE_MIN_LEN)).is_ok());
        assert!(validate_passphrase(&"p".repeat(PASSPHRASE_MAX_LEN)).is_ok());
        assert!(validate_passphrase(&"p".repeat(PASSPHRASE_MIN_LEN - 1)).is_err());
        assert!(validate_passphrase("tab\there1").is_err());
    }
}
