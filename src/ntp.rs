// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock to NTP timestamp conversion (§4.5).

use std::time::{SystemTime, UNIX_EPOCH};

/// Number of seconds between 1900-01-01 (NTP epoch) and 1970-01-01 (Unix epoch).
pub(crate) const GETTIMEOFDAY_TO_NTP_OFFSET: u32 = 2_208_988_800;

/// A 64-bit fixed-point NTP timestamp: upper 32 bits seconds since 1900-01-01,
/// lower 32 bits a binary fraction of a second.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NtpTimestamp {
    pub sec: u32,
    pub frac: u32,
}

impl NtpTimestamp {
    /// Returns the current wall-clock time as an NTP timestamp.
    ///
    /// Mirrors the original tool's `gettimeofday`-based construction.
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::from_unix(since_epoch.as_secs() as u32, since_epoch.subsec_micros())
    }

    pub fn from_unix(unix_secs: u32, usec: u32) -> Self {
        NtpTimestamp {
            sec: unix_secs.wrapping_add(GETTIMEOFDAY_TO_NTP_OFFSET),
            frac: usec2ntp(usec),
        }
    }

    /// Seconds since the Unix epoch, the inverse of the offset applied in [`Self::from_unix`].
    pub fn unix_secs(&self) -> u32 {
        self.sec.wrapping_sub(GETTIMEOFDAY_TO_NTP_OFFSET)
    }
}

/// Converts microseconds to a fraction of a second scaled by 2^32 (the lower
/// 32 bits of an NTP timestamp).
///
/// Uses the factorization `2^32/10^6 = 4096 + 256 - 1825/32`, which has a max
/// conversion error of `3 * 10^-7` and an average error of about half that.
fn usec2ntp(usec: u32) -> u32 {
    let t = (usec.wrapping_mul(1825)) >> 5;
    (usec << 12).wrapping_add(usec << 8).wrapping_sub(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_usec_is_zero_frac() {
        assert_eq!(usec2ntp(0), 0);
    }

    #[test]
    fn half_second_is_half_of_u32_max_ish() {
        // 500_000 us should be close to 2^31.
        let frac = usec2ntp(500_000);
        let half = 1u64 << 31;
        let diff = (frac as i64 - half as i64).abs();
        assert!(diff < 1_000_000, "frac={frac} too far from half");
    }

    #[test]
    fn from_unix_applies_offset() {
        let ts = NtpTimestamp::from_unix(0, 0);
        assert_eq!(ts.sec, GETTIMEOFDAY_TO_NTP_OFFSET);
        assert_eq!(ts.frac, 0);
        assert_eq!(ts.unix_secs(), 0);
    }

    #[test]
    fn now_is_within_a_second_of_system_time() {
        let ts = NtpTimestamp::now();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32;
        assert!((ts.unix_secs() as i64 - now as i64).abs() <= 1);
    }
}
