//! Nix/Guix flavoured base32 encoding of hash digests.
//!
//! The digest is consumed in 5-bit groups with byte 0 holding the lowest bits, and the
//! highest group is emitted first. The alphabet leaves out `e`, `o`, `t` and `u`.
//! Works for digests of any length, not only SHA-256.

const ALPHABET: &[u8; 32] = b"0123456789abcdfghijklmnpqrsvwxyz";

/// Number of base32 characters produced for a digest of `byte_len` bytes.
pub const fn encoded_len(byte_len: usize) -> usize {
    if byte_len == 0 {
        0
    } else {
        (byte_len * 8 - 1) / 5 + 1
    }
}

/// Encode raw digest bytes. A 32-byte digest always yields 52 characters.
pub fn encode(digest: &[u8]) -> String {
    let len = encoded_len(digest.len());
    let mut out = String::with_capacity(len);

    for k in (0..len).rev() {
        let bit = k * 5;
        let i = bit / 8;
        let j = bit % 8;

        // Bits of the group may straddle two bytes.
        let mut c = u16::from(digest[i]) >> j;
        if let Some(&next) = digest.get(i + 1) {
            c |= u16::from(next) << (8 - j);
        }

        out.push(char::from(ALPHABET[usize::from(c & 0x1f)]));
    }

    out
}

/// Whether every character of `s` belongs to the base32 alphabet.
pub fn is_base32(s: &str) -> bool {
    s.bytes().all(|b| ALPHABET.contains(&b))
}
