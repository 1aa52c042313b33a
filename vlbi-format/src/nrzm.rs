//! NRZ-M (non-return-to-zero mark) line coding, word-wise over 32-bit words.
//!
//! The wire/tape transform is a differentiation: `out[0] = in[0]; out[i] =
//! in[i] ^ in[i-1]` (§4.A). [`nrzm_decode`] applies that formula directly to
//! recover actual sample bits from captured straight-through data.
//! [`nrzm_encode`] is its inverse, a running (cumulative) XOR, so that
//! `nrzm_decode(nrzm_encode(w)) == w` (§8).

/// Recover sample bits from NRZ-M line-coded data: `out[i] = in[i] ^ in[i-1]`.
/// Safe to do in place (iterates high-to-low so each `words[i-1]` read is
/// still the pre-transform value).
pub fn nrzm_decode(words: &mut [u32]) {
    for i in (1..words.len()).rev() {
        words[i] ^= words[i - 1];
    }
}

/// Inverse of [`nrzm_decode`]: a running cumulative XOR. Must iterate
/// low-to-high so each step consumes the already-encoded `words[i-1]`.
pub fn nrzm_encode(words: &mut [u32]) {
    for i in 1..words.len() {
        words[i] ^= words[i - 1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_after_encode_recovers_original() {
        let original: Vec<u32> = vec![0xDEAD_BEEF, 0x1234_5678, 0, 0xFFFF_FFFF, 0xA5A5_A5A5];
        let mut buf = original.clone();
        nrzm_encode(&mut buf);
        nrzm_decode(&mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn single_word_unchanged_either_way() {
        let mut a = vec![0x12345678u32];
        let mut b = a.clone();
        nrzm_decode(&mut a);
        nrzm_encode(&mut b);
        assert_eq!(a, vec![0x12345678u32]);
        assert_eq!(b, vec![0x12345678u32]);
    }

    #[test]
    fn empty_is_noop() {
        let mut buf: Vec<u32> = vec![];
        nrzm_decode(&mut buf);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_matches_hand_worked_example() {
        let mut buf = vec![0b0011u32, 0b0110, 0b1111];
        nrzm_decode(&mut buf);
        assert_eq!(buf, vec![0b0011, 0b0101, 0b1001]);
    }
}
