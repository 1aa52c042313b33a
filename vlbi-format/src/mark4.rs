//! Mark4 time-code codec (§4.A).
//!
//! The Mark4 time code is 13 BCD digits laid out `Y DDD HH MM SS sss`: one
//! digit for the last digit of the year, three for day-of-year, two each for
//! hour/minute/second, and three for milliseconds. A CRC12 over the
//! surrounding header track data guards against corrupted bits; the year
//! itself isn't carried in full, so recovering a four-digit year needs a
//! reference year to disambiguate the decade.

use crate::bcd::{digits_to_u64, u64_to_digits};
use crate::bitrate::TrackBitRate;
use crate::crc::crc12_mark4;
use crate::error::{FormatError, Result};
use crate::timestamp::{Rational, Subsecond, Timestamp};
use chrono::{Datelike, NaiveDate, TimeZone, Utc};

/// The 13 decoded BCD digits of a Mark4 time code, unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark4TimeCode {
    pub year_digit: u8,
    pub day_of_year: u16,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond_digits: [u8; 3],
}

impl Mark4TimeCode {
    /// Unpack from the 13 BCD digits, most-significant first: 1 year digit,
    /// 3 day-of-year digits, 2 hour, 2 minute, 2 second, 3 millisecond.
    pub fn from_digits(digits: &[u8; 13]) -> Self {
        Mark4TimeCode {
            year_digit: digits[0],
            day_of_year: digits_to_u64(&digits[1..4]) as u16,
            hour: digits_to_u64(&digits[4..6]) as u8,
            minute: digits_to_u64(&digits[6..8]) as u8,
            second: digits_to_u64(&digits[8..10]) as u8,
            millisecond_digits: [digits[10], digits[11], digits[12]],
        }
    }

    pub fn to_digits(self) -> [u8; 13] {
        let mut out = [0u8; 13];
        out[0] = self.year_digit;
        out[1..4].copy_from_slice(&u64_to_digits(self.day_of_year as u64, 3));
        out[4..6].copy_from_slice(&u64_to_digits(self.hour as u64, 2));
        out[6..8].copy_from_slice(&u64_to_digits(self.minute as u64, 2));
        out[8..10].copy_from_slice(&u64_to_digits(self.second as u64, 2));
        out[10..13].copy_from_slice(&self.millisecond_digits);
        out
    }
}

/// Pack 13 BCD digits two-to-a-byte, high nibble first, padding the final
/// nibble with 0xF if there's an odd digit count (there isn't here, but the
/// header track bytes this rides in round up to 7 bytes regardless).
pub fn pack_digit_bytes(digits: &[u8; 13]) -> [u8; 7] {
    let mut out = [0u8; 7];
    for i in 0..6 {
        out[i] = crate::bcd::pack_byte(digits[2 * i], digits[2 * i + 1]);
    }
    out[6] = crate::bcd::pack_byte(digits[12], 0xF);
    out
}

pub fn unpack_digit_bytes(bytes: &[u8; 7]) -> [u8; 13] {
    let mut out = [0u8; 13];
    for i in 0..6 {
        let (hi, lo) = crate::bcd::unpack_byte(bytes[i]);
        out[2 * i] = hi;
        out[2 * i + 1] = lo;
    }
    out[12] = crate::bcd::unpack_byte(bytes[6]).0;
    out
}

/// Verify a CRC12 recomputed over `track_data` against the `expected` value
/// stored alongside the time code.
pub fn verify_crc12(track_data: &[u8], expected: u32) -> Result<()> {
    let computed = crc12_mark4(track_data);
    if computed != expected {
        return Err(FormatError::CrcMismatch { expected, computed });
    }
    Ok(())
}

/// Recover a full year from a single last-digit and a `reference_year`:
/// the decade whose last digit matches, clamped back one decade if that
/// lands in the future. Mark4 only ever stores the last digit, so frames
/// captured near a decade boundary need an externally supplied reference
/// (current wall-clock year, or the scan's nominal start year) to resolve
/// the ambiguity.
pub fn recover_year(year_digit: u8, reference_year: i32) -> i32 {
    let mut year = reference_year - (reference_year % 10) + year_digit as i32;
    if year > reference_year {
        year -= 10;
    }
    year
}

/// Millisecond BCD last digits that are unreachable at 8/16 Mbps track
/// rates, where frames land every 1.25 ms: over a 10 ms cycle the
/// thousandths digit only ever takes 0,1,2,3,5,6,7,8.
const FORBIDDEN_LAST_DIGIT_AT_8_16_MBPS: [u8; 2] = [4, 9];

fn is_8_or_16_mbps(rate: TrackBitRate) -> bool {
    matches!(rate.bits_per_second(), Some(8_000_000) | Some(16_000_000))
}

/// Decode a [`Mark4TimeCode`] plus a track bitrate into a [`Timestamp`].
///
/// At 8/16 Mbps the last millisecond digit can't legitimately be 4 or 9
/// (§4.A "8/16Mbps exclusion"); when it is, this corrects it by subtracting
/// `0.25ms * (digit % 5)` from the literal BCD reading, which maps the
/// forbidden readings back onto the nearest legal 1.25ms tick.
pub fn decode_timestamp(
    tc: Mark4TimeCode,
    reference_year: i32,
    trackbitrate: TrackBitRate,
) -> Result<Timestamp> {
    let year = recover_year(tc.year_digit, reference_year);
    let date = NaiveDate::from_yo_opt(year, tc.day_of_year as u32)
        .ok_or_else(|| FormatError::InvalidDescriptor(format!("day-of-year {} invalid for year {year}", tc.day_of_year)))?;
    let datetime = date
        .and_hms_opt(tc.hour as u32, tc.minute as u32, tc.second as u32)
        .ok_or_else(|| FormatError::InvalidDescriptor("invalid time-of-day in Mark4 time code".into()))?;
    let whole_seconds = Utc.from_utc_datetime(&datetime).timestamp();

    let mut ms_value = digits_to_u64(&tc.millisecond_digits) as f64;
    let last_digit = tc.millisecond_digits[2];
    if is_8_or_16_mbps(trackbitrate) && FORBIDDEN_LAST_DIGIT_AT_8_16_MBPS.contains(&last_digit) {
        ms_value -= 0.25 * (last_digit % 5) as f64;
    }

    Ok(Timestamp::new(
        whole_seconds,
        Subsecond::known(Rational::new((ms_value * 1000.0).round() as u64, 1_000_000)),
    ))
}

/// Inverse of [`decode_timestamp`]: split a [`Timestamp`] back into a
/// [`Mark4TimeCode`], taking only the last digit of the year.
pub fn encode_timestamp(ts: Timestamp) -> Result<Mark4TimeCode> {
    let Some(subsec) = ts.subsecond.as_f64() else {
        return Err(FormatError::UnknownSubsecond);
    };
    let datetime = chrono::DateTime::<Utc>::from_timestamp(ts.seconds, 0)
        .ok_or_else(|| FormatError::InvalidDescriptor("timestamp out of range".into()))?;
    let ms = (subsec * 1000.0).round() as u64;
    Ok(Mark4TimeCode {
        year_digit: (datetime.year().rem_euclid(10)) as u8,
        day_of_year: datetime.ordinal() as u16,
        hour: datetime.hour() as u8,
        minute: datetime.minute() as u8,
        second: datetime.second() as u8,
        millisecond_digits: u64_to_digits(ms, 3).try_into().unwrap(),
    })
}

use chrono::Timelike;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_digits() -> [u8; 13] {
        // year digit 7 (e.g. 2027), day 123, 08:09:10, .456
        [7, 1, 2, 3, 0, 8, 0, 9, 1, 0, 4, 5, 6]
    }

    #[test]
    fn digit_roundtrip_through_bytes() {
        let digits = sample_digits();
        let bytes = pack_digit_bytes(&digits);
        let back = unpack_digit_bytes(&bytes);
        assert_eq!(back, digits);
    }

    #[test]
    fn timecode_field_unpack_matches_digits() {
        let tc = Mark4TimeCode::from_digits(&sample_digits());
        assert_eq!(tc.year_digit, 7);
        assert_eq!(tc.day_of_year, 123);
        assert_eq!(tc.hour, 8);
        assert_eq!(tc.minute, 9);
        assert_eq!(tc.second, 10);
        assert_eq!(tc.millisecond_digits, [4, 5, 6]);
        assert_eq!(tc.to_digits(), sample_digits());
    }

    #[test]
    fn recover_year_picks_current_decade_clamped_to_not_exceed_reference() {
        assert_eq!(recover_year(7, 2027), 2027);
        assert_eq!(recover_year(7, 2030), 2027);
        assert_eq!(recover_year(9, 2030), 2029);
        assert_eq!(recover_year(0, 2029), 2020);
    }

    #[test]
    fn decode_timestamp_basic_unknown_rate() {
        let tc = Mark4TimeCode::from_digits(&sample_digits());
        let ts = decode_timestamp(tc, 2027, TrackBitRate::UNKNOWN).unwrap();
        assert!(!ts.is_partial());
        assert!((ts.subsecond.as_f64().unwrap() - 0.456).abs() < 1e-6);
    }

    #[test]
    fn decode_timestamp_applies_8mbps_correction_for_forbidden_digit() {
        let mut digits = sample_digits();
        digits[12] = 9; // forbidden last digit at 8/16Mbps
        let tc = Mark4TimeCode::from_digits(&digits);
        let rate = TrackBitRate::known(8_000_000).unwrap();
        let ts = decode_timestamp(tc, 2027, rate).unwrap();
        // literal reading .459 corrected by 0.25ms * (9 % 5) = 1.0ms -> .458
        assert!((ts.subsecond.as_f64().unwrap() - 0.458).abs() < 1e-6);
    }

    #[test]
    fn encode_then_decode_recovers_fields() {
        let tc = Mark4TimeCode::from_digits(&sample_digits());
        let ts = decode_timestamp(tc, 2027, TrackBitRate::UNKNOWN).unwrap();
        let back = encode_timestamp(ts).unwrap();
        assert_eq!(back.day_of_year, tc.day_of_year);
        assert_eq!(back.hour, tc.hour);
        assert_eq!(back.minute, tc.minute);
        assert_eq!(back.second, tc.second);
    }

    #[test]
    fn crc_mismatch_is_detected() {
        let data = b"some header track bytes";
        let good = crc12_mark4(data);
        assert!(verify_crc12(data, good).is_ok());
        assert!(verify_crc12(data, good ^ 1).is_err());
    }
}
