//! Wall-clock arithmetic: UNIX seconds + fixed UTC offset → local time of day.
//!
//! No DST handling; the offset is whatever the config says.

use core::fmt::Write;

use heapless::String;

const SECS_PER_DAY: i64 = 86_400;

/// 2020-01-01T00:00:00Z.  Anything earlier means the RTC has not been set.
pub const EPOCH_2020: i64 = 1_577_836_800;

/// `true` once SNTP has moved the clock past the build-era floor.
pub fn is_plausibly_synced(unix_secs: i64) -> bool {
    unix_secs >= EPOCH_2020
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalTime {
    /// Time of day at `unix_secs` shifted by `utc_offset_hours`.
    pub fn from_unix(unix_secs: i64, utc_offset_hours: i8) -> Self {
        let local = unix_secs + i64::from(utc_offset_hours) * 3600;
        let secs_of_day = local.rem_euclid(SECS_PER_DAY);
        Self {
            hour: (secs_of_day / 3600) as u8,
            minute: ((secs_of_day % 3600) / 60) as u8,
            second: (secs_of_day % 60) as u8,
        }
    }

    /// `"HH:MM:SS"`.
    pub fn format_hms(&self) -> String<8> {
        let mut s = String::new();
        // 8 bytes always fit.
        let _ = write!(s, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second);
        s
    }

    /// `"HH:MM"`.
    pub fn format_hm(&self) -> String<5> {
        let mut s = String::new();
        let _ = write!(s, "{:02}:{:02}", self.hour, self.minute);
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_midnight() {
        let t = LocalTime::from_unix(EPOCH_2020, 0);
        assert_eq!(t, LocalTime { hour: 0, minute: 0, second: 0 });
    }

    #[test]
    fn pacific_offset_wraps_to_previous_day() {
        // 2020-01-01 03:04:05Z is 19:04:05 PST on Dec 31.
        let t = LocalTime::from_unix(EPOCH_2020 + 3 * 3600 + 4 * 60 + 5, -8);
        assert_eq!(t, LocalTime { hour: 19, minute: 4, second: 5 });
        assert_eq!(t.format_hms().as_str(), "19:04:05");
        assert_eq!(t.format_hm().as_str(), "19:04");
    }

    #[test]
    fn positive_offset_wraps_forward() {
        let t = LocalTime::from_unix(EPOCH_2020 + 23 * 3600, 14);
        assert_eq!(t.hour, 13);
    }

    #[test]
    fn pre_epoch_times_are_not_synced() {
        assert!(!is_plausibly_synced(0));
        assert!(!is_plausibly_synced(EPOCH_2020 - 1));
        assert!(is_plausibly_synced(EPOCH_2020));
    }
}
