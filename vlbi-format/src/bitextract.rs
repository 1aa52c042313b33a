//! Branchless extraction of a single track's bits from a multi-track
//! interleaved frame (§4.A "Bit extraction").
//!
//! Mark4/VLBA frames interleave `ntrack` parallel bitstreams bit-by-bit
//! across each 32-bit word: bit `track` of word `w` belongs to track
//! number `track`. Extracting one track's worth of bits from `n_words`
//! is then "pick bit `track` out of every word", done here with a
//! mask-and-compare trick (no conditional branch per bit).

/// Extract bit `track` (0-based) from every word in `words`, packing the
/// extracted bits MSB-first into the returned byte vector (one bit per
/// source word).
pub fn extract_track_bits(words: &[u32], track: u32) -> Vec<u8> {
    let mask = 1u32 << track;
    let mut out = vec![0u8; (words.len() + 7) / 8];
    for (i, &w) in words.iter().enumerate() {
        // Branchless bit-twiddling-hack conditional set: produces 0 or 1
        // without an `if`, then ORs it into the correct output bit position.
        let bit = ((w & mask) != 0) as u8;
        out[i / 8] |= bit << (7 - (i % 8));
    }
    out
}

/// Extract a full track's bits into a bit-per-`bool` vector (convenience
/// form for tests and small frames where packing isn't worth it).
pub fn extract_track_bits_unpacked(words: &[u32], track: u32) -> Vec<bool> {
    let mask = 1u32 << track;
    words.iter().map(|&w| (w & mask) != 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_constant_track() {
        // track 3 is set in every word
        let words = [0b1000u32, 0b1000, 0b1000, 0b1000];
        let bits = extract_track_bits_unpacked(&words, 3);
        assert_eq!(bits, vec![true, true, true, true]);
    }

    #[test]
    fn extracts_varying_track() {
        let words = [0b0001u32, 0b0000, 0b0001, 0b0001];
        let bits = extract_track_bits_unpacked(&words, 0);
        assert_eq!(bits, vec![true, false, true, true]);
    }

    #[test]
    fn packed_matches_unpacked() {
        let words: Vec<u32> = (0..16).map(|i| i as u32).collect();
        let unpacked = extract_track_bits_unpacked(&words, 1);
        let packed = extract_track_bits(&words, 1);
        for (i, &bit) in unpacked.iter().enumerate() {
            let got = (packed[i / 8] >> (7 - (i % 8))) & 1 == 1;
            assert_eq!(got, bit, "bit {i}");
        }
    }
}
