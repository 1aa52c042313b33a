//! VLBA and Mark5B header/time-code codec (§4.A).
//!
//! VLBA (big-endian tape) and Mark5B (little-endian disk) share essentially
//! the same header layout: a truncated Modified Julian Day (last four
//! digits, "TMJD") plus seconds-of-day as BCD, a CRC16, and — Mark5B only —
//! a 15-bit frame counter used to refine the subsecond beyond what the BCD
//! seconds field carries.

use crate::bcd::digits_to_u64;
use crate::crc::crc16_vlba;
use crate::error::{FormatError, Result};
use crate::timestamp::{Rational, Subsecond, Timestamp};
use chrono::NaiveDate;

const UNIX_EPOCH_MJD: i64 = 40_587; // MJD of 1970-01-01

/// Recover a full Modified Julian Day from a truncated 3-digit TMJD value
/// (modulo 1000): add it to the current 1000-day window, then clamp back
/// one window if that lands in the future — the header never carries more
/// than the last three digits (§4.A "VLBA/Mark5B").
pub fn recover_mjd(tmjd: u32, current_mjd: i64) -> i64 {
    debug_assert!(tmjd < 1_000);
    let mut mjd = current_mjd - (current_mjd % 1_000) + tmjd as i64;
    if mjd > current_mjd {
        mjd -= 1_000;
    }
    mjd
}

/// Convert a full Modified Julian Day into a `NaiveDate`.
pub fn mjd_to_date(mjd: i64) -> Result<NaiveDate> {
    let unix_days = mjd - UNIX_EPOCH_MJD;
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|d| d.checked_add_signed(chrono::Duration::days(unix_days)))
        .ok_or_else(|| FormatError::InvalidDescriptor(format!("MJD {mjd} out of range")))
}

/// Convert a date into its Modified Julian Day.
pub fn date_to_mjd(date: NaiveDate) -> i64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    UNIX_EPOCH_MJD + (date - epoch).num_days()
}

/// The decoded BCD/binary fields of a VLBA or Mark5B header time code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeTimeCode {
    /// Last 3 digits of the Modified Julian Day.
    pub tmjd: u32,
    /// Whole seconds since midnight.
    pub seconds_of_day: u32,
    /// BCD fraction-of-second digits (tenths, hundredths, thousandths).
    pub fraction_digits: [u8; 4],
    /// 15-bit frame counter within the current second (Mark5B only).
    pub frame_number: Option<u16>,
}

impl TapeTimeCode {
    pub fn from_digits(tmjd_digits: &[u8; 3], time_digits: &[u8; 9], frame_number: Option<u16>) -> Self {
        let tmjd = digits_to_u64(tmjd_digits) as u32;
        let seconds_of_day = digits_to_u64(&time_digits[0..5]) as u32;
        let mut fraction_digits = [0u8; 4];
        fraction_digits.copy_from_slice(&time_digits[5..9]);
        TapeTimeCode { tmjd, seconds_of_day, fraction_digits, frame_number }
    }
}

/// Maximum value a 15-bit Mark5B frame counter can hold before wrapping.
const FRAME_COUNTER_BITS: u32 = 15;
const FRAME_COUNTER_MODULUS: u32 = 1 << FRAME_COUNTER_BITS;

/// Refine the subsecond using Mark5B's frame counter and the format's frame
/// period, detecting wraparound of the 15-bit counter against the BCD
/// fraction-of-second already decoded. `frames_per_second` is the nominal
/// frame rate (e.g. 1 / frame_period).
pub fn refine_mark5b_subsecond(
    bcd_fraction: f64,
    frame_number: u16,
    frames_per_second: f64,
) -> f64 {
    if frames_per_second <= 0.0 {
        return bcd_fraction;
    }
    let frame_period = 1.0 / frames_per_second;
    let nominal_frame = (bcd_fraction * frames_per_second).round() as i64;
    let wrapped_nominal = nominal_frame.rem_euclid(FRAME_COUNTER_MODULUS as i64) as u16;
    // If the counter appears to have wrapped relative to the BCD-implied
    // frame index, correct by a whole modulus of frame periods.
    let delta = frame_number as i64 - wrapped_nominal as i64;
    let corrected_frame = nominal_frame + delta;
    corrected_frame as f64 * frame_period
}

/// Verify a CRC16 recomputed over `header_data` against `expected`.
pub fn verify_crc16(header_data: &[u8], expected: u32) -> Result<()> {
    let computed = crc16_vlba(header_data);
    if computed != expected {
        return Err(FormatError::CrcMismatch { expected, computed });
    }
    Ok(())
}

/// Decode a [`TapeTimeCode`] into a [`Timestamp`], given the current MJD
/// (for [`recover_mjd`]) and, for Mark5B, the nominal frame rate used to
/// refine the subsecond via [`refine_mark5b_subsecond`].
pub fn decode_timestamp(tc: TapeTimeCode, current_mjd: i64, frames_per_second: Option<f64>) -> Result<Timestamp> {
    let mjd = recover_mjd(tc.tmjd, current_mjd);
    let date = mjd_to_date(mjd)?;
    let midnight = chrono::NaiveDateTime::new(date, chrono::NaiveTime::MIN);
    let whole_seconds = chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(midnight, chrono::Utc).timestamp()
        + tc.seconds_of_day as i64;

    let bcd_fraction = digits_to_u64(&tc.fraction_digits) as f64 / 10_000.0;
    let fraction = match (tc.frame_number, frames_per_second) {
        (Some(frame), Some(fps)) => refine_mark5b_subsecond(bcd_fraction, frame, fps),
        _ => bcd_fraction,
    };

    Ok(Timestamp::new(whole_seconds, Subsecond::known(Rational::new((fraction * 1_000_000.0).round() as u64, 1_000_000))))
}
