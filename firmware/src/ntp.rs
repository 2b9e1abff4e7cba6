//! NTP server and timezone settings.
//!
//! The board is deployed on the US west coast, so the defaults point at the
//! US NTP pool with Pacific Standard Time.  Both can be overridden at build
//! time with `NTP_SERVER` and `UTC_OFFSET_HOURS`.

use heapless::String;

use crate::error::ConfigError;

pub const DEFAULT_NTP_SERVER: &str = "us.pool.ntp.org";
/// Used when the configured server is empty.
pub const FALLBACK_NTP_POOL: &str = "pool.ntp.org";

/// Pacific Standard Time (USA).
pub const DEFAULT_UTC_OFFSET_HOURS: i8 = -8;
pub const MIN_UTC_OFFSET_HOURS: i8 = -12;
pub const MAX_UTC_OFFSET_HOURS: i8 = 14;

pub const HOSTNAME_MAX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtpSettings {
    /// Empty selects [`FALLBACK_NTP_POOL`].
    pub server: String<HOSTNAME_MAX_LEN>,
    pub utc_offset_hours: i8,
}

impl NtpSettings {
    pub fn new(server: &str, utc_offset_hours: i8) -> Result<Self, ConfigError> {
        Ok(Self {
            server: String::try_from(server).map_err(|()| ConfigError::TooLong("ntp server"))?,
            utc_offset_hours,
        })
    }

    /// Defaults with any build-time overrides applied.  An override that
    /// does not parse or fit is ignored in favour of the default.
    pub fn from_build_env() -> Self {
        let server = option_env!("NTP_SERVER").unwrap_or(DEFAULT_NTP_SERVER);
        let offset = option_env!("UTC_OFFSET_HOURS")
            .and_then(|s| s.trim().parse::<i8>().ok())
            .unwrap_or(DEFAULT_UTC_OFFSET_HOURS);
        Self::new(server, offset).unwrap_or_default()
    }

    /// The hostname actually handed to the SNTP client.
    pub fn effective_server(&self) -> &str {
        if self.server.is_empty() {
            FALLBACK_NTP_POOL
        } else {
            self.server.as_str()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_UTC_OFFSET_HOURS..=MAX_UTC_OFFSET_HOURS).contains(&self.utc_offset_hours) {
            return Err(ConfigError::ValidationFailed(
                "utc_offset_hours must be -12..=14",
            ));
        }
        if !self.server.is_empty() && !is_valid_hostname(&self.server) {
            return Err(ConfigError::ValidationFailed(
                "ntp server must be a valid hostname",
            ));
        }
        Ok(())
    }
}

impl Default for NtpSettings {
    fn default() -> Self {
        let mut server = String::new();
        // Fits: the constant is shorter than HOSTNAME_MAX_LEN.
        let _ = server.push_str(DEFAULT_NTP_SERVER);
        Self {
            server,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
        }
    }
}

/// RFC 1123 hostname syntax: dot-separated labels of 1–63 alphanumerics or
/// hyphens, not starting or ending with a hyphen, 253 bytes total.  A single
/// trailing dot (fully-qualified form) is accepted.
pub fn is_valid_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_board() {
        let n = NtpSettings::default();
        assert_eq!(n.server.as_str(), "us.pool.ntp.org");
        assert_eq!(n.utc_offset_hours, -8);
        assert!(n.validate().is_ok());
    }

    #[test]
    fn empty_server_uses_pool() {
        let n = NtpSettings::new("", 0).unwrap();
        assert!(n.validate().is_ok());
        assert_eq!(n.effective_server(), FALLBACK_NTP_POOL);
    }

    #[test]
    fn offset_bounds_inclusive() {
        assert!(NtpSettings::new("", -12).unwrap().validate().is_ok());
        assert!(NtpSettings::new("", 14).unwrap().validate().is_ok());
        assert!(NtpSettings::new("", -13).unwrap().validate().is_err());
        assert!(NtpSettings::new("", 15).unwrap().validate().is_err());
    }

    #[test]
    fn hostname_syntax() {
        assert!(is_valid_hostname("us.pool.ntp.org"));
        assert!(is_valid_hostname("time-a.nist.gov."));
        assert!(is_valid_hostname("localhost"));
        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname("-bad.example"));
        assert!(!is_valid_hostname("bad-.example"));
        assert!(!is_valid_hostname("a..b"));
        assert!(!is_valid_hostname("under_score.org"));
        assert!(!is_valid_hostname(&"a".repeat(64)));
    }

    #[test]
    fn invalid_server_rejected() {
        let n = NtpSettings::new("not a host", -8).unwrap();
        assert!(matches!(n.validate(), Err(ConfigError::ValidationFailed(_))));
    }
}
