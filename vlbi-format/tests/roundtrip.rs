//! Concrete scenario checks mirroring §8's testable properties: format
//! round trips, sync-word invariance, and NRZ-M self-inverse, exercised
//! through the crate's public dispatch API rather than per-module unit
//! tests.

use vlbi_format::descriptor::{FormatDescriptor, FormatKind, Mark5BFields, VdifFields};
use vlbi_format::syncsearch::BoyerMoore;
use vlbi_format::{nrzm, vdif, TrackBitRate};

#[test]
fn mark5b_32track_32mbps_round_trips_through_descriptor() {
    let descriptor = FormatDescriptor::new(
        FormatKind::Mark5B(Mark5BFields { ntrack: 32, dbe_no_subsecond: false, tvg: false }),
        TrackBitRate::known(32_000_000).unwrap(),
        4,
        0,
        16,
        10000 - 16,
    )
    .unwrap();
    assert_eq!(descriptor.framesize(), 10000);

    let rate = vlbi_format::frame_rate(&descriptor).unwrap();
    let period = vlbi_format::frame_period(&descriptor).unwrap();
    assert!((rate * period - 1.0).abs() < 1e-9);
    assert!(period > 0.0 && period < 1.0);
}

#[test]
fn vdif_scenario_frame_numbers_imply_frame_rate() {
    // §8 scenario 2: 8192-byte frames, timestamps advance by 1s at frame
    // 15624->15625, implying ~15625 frames/sec (~2 Mbps per-thread payload).
    let frame_rate_observed = 15625.0;
    let descriptor = FormatDescriptor::new(
        FormatKind::Vdif(VdifFields { nchan: 2, legacy: false, complex: false, bits_per_sample: 2 }),
        TrackBitRate::UNKNOWN,
        0,
        0,
        32,
        8192 - 32,
    )
    .unwrap();
    // Round-trip a VDIF header whose frame_number sits right at the
    // second boundary and check the decoded subsecond approaches 1.0.
    let header = vdif::VdifHeader {
        is_valid: true,
        is_legacy: false,
        seconds_from_epoch: 500,
        ref_epoch: 0,
        frame_number: 15624,
        version: 0,
        nchan: descriptor.kind.ntrack(),
        frame_length_bytes: descriptor.framesize() as u32,
        is_complex: false,
        bits_per_sample: 2,
        thread_id: 1,
        station_id: 0x4566,
        edv: [0; 4],
    };
    let bytes = vdif::encode_header(&header);
    let decoded = vdif::decode_header(&bytes).unwrap();
    let ts = vdif::decode_timestamp(&decoded, Some(frame_rate_observed)).unwrap();
    assert!(ts.subsecond.as_f64().unwrap() < 1.0);
    assert!(ts.subsecond.as_f64().unwrap() > 0.99);
}

#[test]
fn syncword_invariance_finds_known_offset() {
    let needle = vlbi_format::syncsearch::tape_syncword(32);
    let mut haystack = vec![0u8; 1024];
    let k = 256;
    haystack[k..k + needle.len()].copy_from_slice(&needle);
    let bm = BoyerMoore::new(&needle);
    assert_eq!(bm.search(&haystack), Some(k));
}

#[test]
fn nrzm_self_inverse_over_random_looking_words() {
    let original: Vec<u32> = (0..64).map(|i| (i as u32).wrapping_mul(2_654_435_761)).collect();
    let mut buf = original.clone();
    nrzm::nrzm_encode(&mut buf);
    nrzm::nrzm_decode(&mut buf);
    assert_eq!(buf, original);
}

#[test]
fn mark5b_descriptor_rejects_inconsistent_header_size() {
    let err = FormatDescriptor::new(
        FormatKind::Mark5B(Mark5BFields { ntrack: 32, dbe_no_subsecond: false, tvg: false }),
        TrackBitRate::UNKNOWN,
        4,
        0,
        17, // not a multiple of ntrack
        100,
    );
    assert!(err.is_err());
}
