use crate::error::{FormatError, Result};

/// Track bitrate in bits/second/track. `None` is the distinguished `UNKNOWN` value.
///
/// Data-check heuristics (§4.B) assume a recovered bitrate is always of the
/// form `2^n * 1e6` with `n >= -6`; [`TrackBitRate::power_of_two`] constructs
/// exactly such a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct TrackBitRate(pub Option<u64>);

impl TrackBitRate {
    pub const UNKNOWN: TrackBitRate = TrackBitRate(None);

    pub fn known(bps: u64) -> Result<Self> {
        if bps == 0 {
            return Err(FormatError::InvalidTrackBitrate(Some(bps)));
        }
        Ok(TrackBitRate(Some(bps)))
    }

    /// Construct `round(2^n * 1e6)` bits/sec, n may be negative down to -6.
    pub fn power_of_two(n: i32) -> Result<Self> {
        if n < -6 {
            return Err(FormatError::InvalidTrackBitrate(None));
        }
        let value = (2f64.powi(n) * 1.0e6).round();
        if value <= 0.0 || !value.is_finite() {
            return Err(FormatError::InvalidTrackBitrate(None));
        }
        Ok(TrackBitRate(Some(value as u64)))
    }

    pub fn is_unknown(self) -> bool {
        self.0.is_none()
    }

    pub fn bits_per_second(self) -> Option<u64> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roundtrip() {
        assert!(TrackBitRate::UNKNOWN.is_unknown());
        assert_eq!(TrackBitRate::UNKNOWN.bits_per_second(), None);
    }

    #[test]
    fn power_of_two_basic() {
        assert_eq!(TrackBitRate::power_of_two(1).unwrap().bits_per_second(), Some(2_000_000));
        assert_eq!(TrackBitRate::power_of_two(0).unwrap().bits_per_second(), Some(1_000_000));
        assert_eq!(TrackBitRate::power_of_two(4).unwrap().bits_per_second(), Some(16_000_000));
    }

    #[test]
    fn power_of_two_below_floor_rejected() {
        assert!(TrackBitRate::power_of_two(-7).is_err());
    }

    #[test]
    fn zero_rejected() {
        assert!(TrackBitRate::known(0).is_err());
    }
}
