//! VDIF header codec (§4.A), including the legacy (16-byte) and standard
//! (32-byte) header variants and real/complex sample framing.
//!
//! Header word layout and bit masks follow the VDIF spec's own bitfield
//! packing (word 0: invalid/legacy/seconds; word 1: ref epoch/frame number;
//! word 2: version/log2(channels)/frame length in units of 8 bytes; word 3:
//! data type/bits-per-sample/thread id/station id).

use crate::error::{FormatError, Result};
use crate::timestamp::{Rational, Subsecond, Timestamp};
use chrono::{Datelike, NaiveDate};

const MASK_IS_VALID: u32 = 0x8000_0000;
const MASK_IS_LEGACY: u32 = 0x4000_0000;
const MASK_TIME: u32 = 0x3FFF_FFFF;
const MASK_REF_EPOCH: u32 = 0x3F00_0000;
const MASK_FRAME_NO: u32 = 0x00FF_FFFF;
const MASK_VERSION_NO: u32 = 0xE000_0000;
const MASK_LOG2_CHANNELS: u32 = 0x1F00_0000;
const MASK_SIZE8: u32 = 0x00FF_FFFF;
const MASK_IS_COMPLEX: u32 = 0x8000_0000;
const MASK_BITS_PER_SAMPLE_MINUS_1: u32 = 0x7C00_0000;
const MASK_THREAD_ID: u32 = 0x03FF_0000;
const MASK_STATION_ID: u32 = 0x0000_FFFF;

/// A decoded VDIF header (legacy and standard variants share these fields;
/// `edv0..3` are simply zero for legacy frames, which lack words 4-7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct VdifHeader {
    pub is_valid: bool,
    pub is_legacy: bool,
    pub seconds_from_epoch: u32,
    pub ref_epoch: u8,
    pub frame_number: u32,
    pub version: u8,
    pub nchan: u32,
    pub frame_length_bytes: u32,
    pub is_complex: bool,
    pub bits_per_sample: u32,
    pub thread_id: u16,
    pub station_id: u16,
    pub edv: [u32; 4],
}

fn words_from_bytes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Decode a VDIF header from its raw header bytes (16 for legacy, 32 for
/// standard). Returns [`FormatError::HeaderTruncated`] if too short.
pub fn decode_header(bytes: &[u8]) -> Result<VdifHeader> {
    if bytes.len() < 16 {
        return Err(FormatError::HeaderTruncated { need: 16, have: bytes.len() });
    }
    let w = words_from_bytes(&bytes[0..16.min(bytes.len())]);
    let is_legacy = (w[0] & MASK_IS_LEGACY) != 0;
    let needed = if is_legacy { 16 } else { 32 };
    if bytes.len() < needed {
        return Err(FormatError::HeaderTruncated { need: needed, have: bytes.len() });
    }
    let w = words_from_bytes(&bytes[0..needed]);

    let log2chan = ((w[2] & MASK_LOG2_CHANNELS) >> 24) as u32;
    let edv = if is_legacy {
        [0, 0, 0, 0]
    } else {
        [w[4], w[5], w[6], w[7]]
    };

    Ok(VdifHeader {
        is_valid: (w[0] & MASK_IS_VALID) == 0,
        is_legacy,
        seconds_from_epoch: w[0] & MASK_TIME,
        ref_epoch: ((w[1] & MASK_REF_EPOCH) >> 24) as u8,
        frame_number: w[1] & MASK_FRAME_NO,
        version: ((w[2] & MASK_VERSION_NO) >> 29) as u8,
        nchan: 1u32 << log2chan,
        frame_length_bytes: (w[2] & MASK_SIZE8) * 8,
        is_complex: (w[3] & MASK_IS_COMPLEX) != 0,
        bits_per_sample: (((w[3] & MASK_BITS_PER_SAMPLE_MINUS_1) >> 26) as u32) + 1,
        thread_id: ((w[3] & MASK_THREAD_ID) >> 16) as u16,
        station_id: (w[3] & MASK_STATION_ID) as u16,
        edv,
    })
}

/// Encode a [`VdifHeader`] to bytes (16 bytes if legacy, 32 otherwise).
pub fn encode_header(h: &VdifHeader) -> Vec<u8> {
    let mut w0 = h.seconds_from_epoch & MASK_TIME;
    if !h.is_valid {
        w0 |= MASK_IS_VALID;
    }
    if h.is_legacy {
        w0 |= MASK_IS_LEGACY;
    }
    let w1 = (h.frame_number & MASK_FRAME_NO) | ((h.ref_epoch as u32) << 24);
    let log2chan = h.nchan.max(1).ilog2();
    let w2 = (h.frame_length_bytes / 8 & MASK_SIZE8) | (log2chan << 24) | ((h.version as u32) << 29);
    let mut w3 = (h.station_id as u32) | ((h.thread_id as u32) << 16) | (((h.bits_per_sample - 1) as u32) << 26);
    if h.is_complex {
        w3 |= MASK_IS_COMPLEX;
    }

    let mut words = vec![w0, w1, w2, w3];
    if !h.is_legacy {
        words.extend_from_slice(&h.edv);
    }
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Number of half-years since VDIF epoch 0 (2000-01-01): epoch `n` begins at
/// 2000-01-01 + `n/2` years, plus six months if `n` is odd.
pub fn ref_epoch_to_date(ref_epoch: u8) -> NaiveDate {
    let year = 2000 + (ref_epoch as i32) / 2;
    let month = if ref_epoch % 2 == 0 { 1 } else { 7 };
    NaiveDate::from_ymd_opt(year, month, 1).expect("valid VDIF reference epoch date")
}

/// The inverse of [`ref_epoch_to_date`]: compute the half-year index for a
/// given calendar date.
pub fn date_to_ref_epoch(date: NaiveDate) -> u8 {
    let years_since_2000 = date.year() - 2000;
    let half = if date.month() >= 7 { 1 } else { 0 };
    (years_since_2000 * 2 + half) as u8
}

/// Decode a [`VdifHeader`]'s epoch fields into a full [`Timestamp`]. VDIF
/// carries whole seconds only; the frame number combined with `frame_rate`
/// (frames/second for this thread) gives the subsecond part.
pub fn decode_timestamp(header: &VdifHeader, frame_rate: Option<f64>) -> Result<Timestamp> {
    let epoch_date = ref_epoch_to_date(header.ref_epoch);
    let epoch_midnight = chrono::NaiveDateTime::new(epoch_date, chrono::NaiveTime::MIN);
    let epoch_unix = chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(epoch_midnight, chrono::Utc).timestamp();
    let whole_seconds = epoch_unix + header.seconds_from_epoch as i64;

    let subsecond = match frame_rate {
        Some(rate) if rate > 0.0 => {
            Subsecond::known(Rational::new(header.frame_number as u64, rate.round() as u64))
        }
        _ => Subsecond::UNKNOWN,
    };
    Ok(Timestamp::new(whole_seconds, subsecond))
}

/// Encode a [`Timestamp`] back into `(ref_epoch, seconds_from_epoch,
/// frame_number)`, given the thread's frame rate.
pub fn encode_timestamp(ts: Timestamp, frame_rate: f64) -> Result<(u8, u32, u32)> {
    let datetime = chrono::DateTime::<chrono::Utc>::from_timestamp(ts.seconds, 0)
        .ok_or_else(|| FormatError::InvalidDescriptor("timestamp out of range".into()))?;
    let ref_epoch = date_to_ref_epoch(datetime.date_naive());
    let epoch_date = ref_epoch_to_date(ref_epoch);
    let epoch_midnight = chrono::NaiveDateTime::new(epoch_date, chrono::NaiveTime::MIN);
    let epoch_unix = chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(epoch_midnight, chrono::Utc).timestamp();
    let seconds_from_epoch = (ts.seconds - epoch_unix) as u32;

    let frame_number = match ts.subsecond.as_f64() {
        Some(frac) => (frac * frame_rate).round() as u32,
        None => 0,
    };
    Ok((ref_epoch, seconds_from_epoch, frame_number))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_header_bytes() -> Vec<u8> {
        let h = VdifHeader {
            is_valid: true,
            is_legacy: false,
            seconds_from_epoch: 123_456,
            ref_epoch: 47, // 2000 + 23, odd -> July
            frame_number: 17,
            version: 0,
            nchan: 4,
            frame_length_bytes: 8000,
            is_complex: false,
            bits_per_sample: 2,
            thread_id: 3,
            station_id: 0x4A56, // "JV" or similar two-char id
            edv: [1, 2, 3, 4],
        };
        encode_header(&h)
    }

    #[test]
    fn standard_header_roundtrip() {
        let bytes = standard_header_bytes();
        assert_eq!(bytes.len(), 32);
        let h = decode_header(&bytes).unwrap();
        assert!(h.is_valid);
        assert!(!h.is_legacy);
        assert_eq!(h.seconds_from_epoch, 123_456);
        assert_eq!(h.ref_epoch, 47);
        assert_eq!(h.frame_number, 17);
        assert_eq!(h.nchan, 4);
        assert_eq!(h.frame_length_bytes, 8000);
        assert_eq!(h.bits_per_sample, 2);
        assert_eq!(h.thread_id, 3);
        assert_eq!(h.station_id, 0x4A56);
        assert_eq!(h.edv, [1, 2, 3, 4]);
    }

    #[test]
    fn legacy_header_is_16_bytes_and_roundtrips() {
        let h = VdifHeader {
            is_valid: true,
            is_legacy: true,
            seconds_from_epoch: 10,
            ref_epoch: 0,
            frame_number: 0,
            version: 0,
            nchan: 1,
            frame_length_bytes: 5008,
            is_complex: false,
            bits_per_sample: 8,
            thread_id: 0,
            station_id: 1,
            edv: [0, 0, 0, 0],
        };
        let bytes = encode_header(&h);
        assert_eq!(bytes.len(), 16);
        let back = decode_header(&bytes).unwrap();
        assert!(back.is_legacy);
        assert_eq!(back.frame_length_bytes, 5008);
    }

    #[test]
    fn truncated_header_is_rejected() {
        let bytes = vec![0u8; 10];
        assert!(decode_header(&bytes).is_err());
    }

    #[test]
    fn ref_epoch_roundtrips_through_date() {
        for epoch in 0..60u8 {
            let date = ref_epoch_to_date(epoch);
            assert_eq!(date_to_ref_epoch(date), epoch);
        }
    }

    #[test]
    fn invalid_bit_set_when_marked_invalid() {
        let h = VdifHeader {
            is_valid: false,
            is_legacy: false,
            seconds_from_epoch: 1,
            ref_epoch: 0,
            frame_number: 0,
            version: 0,
            nchan: 1,
            frame_length_bytes: 5008,
            is_complex: true,
            bits_per_sample: 2,
            thread_id: 0,
            station_id: 0,
            edv: [0; 4],
        };
        let bytes = encode_header(&h);
        let back = decode_header(&bytes).unwrap();
        assert!(!back.is_valid);
        assert!(back.is_complex);
        let _ = h;
    }
}
