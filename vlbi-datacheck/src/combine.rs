//! Combining two partial probes into a complete result (§4.B.5/§3),
//! mirroring `data_check.cc::copy_subsecond`/`combine_data_check_results`
//! exactly: fill in whichever side is missing its track bitrate and/or
//! subsecond time using the other, or derive the bitrate from the byte
//! distance between two samples taken a known number of bytes apart.

use crate::error::{DataCheckError, Result};
use crate::result::DataCheckResult;
use vlbi_format::{Subsecond, Timestamp, TrackBitRate};

/// Fill `destination`'s track bitrate and subsecond from `source`'s track
/// bitrate and `destination`'s own frame number, per `copy_subsecond`.
/// `source` must already be non-partial.
fn copy_subsecond(source: &DataCheckResult, destination: &mut DataCheckResult) -> Result<()> {
    destination.trackbitrate = source.trackbitrate;
    let ntrack = destination.kind.ntrack() as u64;
    let bps = destination
        .trackbitrate
        .bits_per_second()
        .ok_or(DataCheckError::InconsistentFormats)?;
    let nsec = (destination.frame_number as u64 * destination.payloadsize as u64 * 8) as f64 / (ntrack * bps) as f64;
    destination.time = Timestamp::new(destination.time.seconds, Subsecond::from_seconds(nsec));
    Ok(())
}

/// Merge two probes of the same byte range into complete results,
/// following `combine_data_check_results`'s exact branch order:
/// both-complete is a no-op; mismatched format/ntrack/VDIF-thread-shape
/// fails; a non-partial side fills in the other via [`copy_subsecond`];
/// otherwise the bitrate is derived from the byte distance between the
/// two samples' nominal frame-zero positions.
///
/// `byte_offset` is the distance (in bytes) between `first`'s and `last`'s
/// read windows, as the original computes it from the caller's sampling
/// positions.
pub fn combine_data_check_results(first: &mut DataCheckResult, last: &mut DataCheckResult, byte_offset: u64) -> Result<()> {
    if !first.is_partial() && !last.is_partial() {
        return Ok(());
    }
    if first.kind != last.kind || first.kind.ntrack() != last.kind.ntrack() {
        return Err(DataCheckError::InconsistentFormats);
    }
    if first.is_vdif() && (first.vdif_threads.is_empty() || first.vdif_frame_size != last.vdif_frame_size) {
        return Err(DataCheckError::InconsistentFormats);
    }
    if !first.is_partial() {
        return copy_subsecond(first, last);
    }
    if !last.is_partial() {
        return copy_subsecond(last, first);
    }

    // Both partial: can only guess the bitrate if the two samples fall in
    // different whole seconds.
    if first.time.seconds >= last.time.seconds {
        return Err(DataCheckError::InconsistentFormats);
    }

    // Union of VDIF thread ids, visible to both sides either way.
    for (&id, header) in last.vdif_threads.iter() {
        first.vdif_threads.entry(id).or_insert(*header);
    }
    last.vdif_threads = first.vdif_threads.clone();

    let vdif_threads = first.thread_count() as i64;
    let framesize = first.framesize() as i64;
    let ntrack = first.kind.ntrack() as i64;

    let byte_diff = byte_offset as i64
        + (last.byte_offset as i64 - last.frame_number as i64 * framesize * vdif_threads)
        - (first.byte_offset as i64 - first.frame_number as i64 * framesize * vdif_threads);

    if byte_diff <= 0 {
        return Err(DataCheckError::InconsistentFormats);
    }

    let seconds_diff = (last.time.seconds - first.time.seconds) as f64;
    let trackbitrate_power = ((8.0 * byte_diff as f64) / 1.0e6 / (ntrack as f64 * vdif_threads as f64) / seconds_diff)
        .log2()
        .round();

    let max_frame_number = first.frame_number.max(last.frame_number) as f64;
    let minimum_trackbitrate_power = ((8.0 * first.payloadsize as f64 * max_frame_number) / 1.0e6 / ntrack as f64)
        .log2()
        .ceil();

    if trackbitrate_power < -6.0 {
        return Err(DataCheckError::InconsistentFormats);
    }

    let power = trackbitrate_power.max(minimum_trackbitrate_power);
    let bps = (2f64.powf(power) * 1.0e6).round() as u64;
    first.trackbitrate = TrackBitRate::known(bps)?;

    let nsec = (first.frame_number as u64 * first.payloadsize as u64 * 8) as f64 / (ntrack as u64 * bps) as f64;
    first.time = Timestamp::new(first.time.seconds, Subsecond::from_seconds(nsec));

    copy_subsecond(first, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlbi_format::descriptor::{FormatKind, Mark5BFields};
    use vlbi_format::Rational;

    fn mark5b_result(byte_offset: u64, frame_number: u32, seconds: i64, payloadsize: usize) -> DataCheckResult {
        let mut r = DataCheckResult::new(
            FormatKind::Mark5B(Mark5BFields { ntrack: 32, dbe_no_subsecond: false, tvg: false }),
            TrackBitRate::UNKNOWN,
            byte_offset,
            frame_number,
            Timestamp::new(seconds, Subsecond::UNKNOWN),
        );
        r.payloadsize = payloadsize;
        r
    }

    #[test]
    fn both_complete_is_noop() {
        let mut first = mark5b_result(0, 0, 100, 9984);
        first.trackbitrate = TrackBitRate::known(32_000_000).unwrap();
        first.time = Timestamp::new(100, Subsecond::known(Rational::new(0, 1)));
        let mut last = first.clone();
        combine_data_check_results(&mut first, &mut last, 0).unwrap();
        assert!(!first.is_partial());
    }

    #[test]
    fn mismatched_ntrack_is_rejected() {
        let mut first = mark5b_result(0, 0, 100, 9984);
        let mut last = DataCheckResult::new(
            FormatKind::Mark5B(Mark5BFields { ntrack: 16, dbe_no_subsecond: false, tvg: false }),
            TrackBitRate::UNKNOWN,
            0,
            0,
            Timestamp::new(101, Subsecond::UNKNOWN),
        );
        assert!(combine_data_check_results(&mut first, &mut last, 0).is_err());
    }

    #[test]
    fn known_side_fills_in_partial_side() {
        let mut known = mark5b_result(0, 0, 100, 9984);
        known.trackbitrate = TrackBitRate::known(32_000_000).unwrap();
        known.time = Timestamp::new(100, Subsecond::known(Rational::new(0, 1)));
        let mut partial = mark5b_result(9984 * 3, 3, 100, 9984);
        combine_data_check_results(&mut known, &mut partial, 0).unwrap();
        assert!(!partial.is_partial());
        assert_eq!(partial.trackbitrate, known.trackbitrate);
    }

    #[test]
    fn derives_bitrate_from_byte_distance_across_seconds() {
        // 1 second apart, 32Mbps/track over 32 tracks => 128_000_000 bytes/sec total.
        let mut first = mark5b_result(0, 0, 100, 9984);
        let mut last = mark5b_result(128_000_000, 0, 101, 9984);
        combine_data_check_results(&mut first, &mut last, 0).unwrap();
        assert!(!first.is_partial());
        assert_eq!(first.trackbitrate.bits_per_second(), Some(32_000_000));
    }

    #[test]
    fn same_second_cannot_derive_bitrate() {
        let mut first = mark5b_result(0, 0, 100, 9984);
        let mut last = mark5b_result(100, 0, 100, 9984);
        assert!(combine_data_check_results(&mut first, &mut last, 0).is_err());
    }
}
