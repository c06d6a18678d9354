//! # The save-file byte cipher
//!
//! ECO2 obfuscates `.eco` and `.ecox` files by XOR-ing every byte of the
//! buffer with a short repeating key. XOR is its own inverse, so a single
//! transform serves as both the encrypt and the decrypt direction.
//!
//! Whether a given buffer needs the transform at all is decided by the
//! caller, usually from the file extension (see [`crate::kind`]).

/// The repeating 4-byte XOR key
pub const KEY: [u8; 4] = [172, 41, 85, 66];

/// Apply the XOR transform to a whole buffer.
///
/// Output byte `i` is `data[i] ^ KEY[i % 4]`. Self-inverse:
/// `transform(&transform(data)) == data` for every input, including the
/// empty buffer.
pub fn transform(data: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(KEY.iter().cycle())
        .map(|(d, k)| d ^ k)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{transform, KEY};

    #[test]
    fn self_inverse() {
        let data: Vec<u8> = (0u8..=255).cycle().take(1021).collect();
        assert_eq!(transform(&transform(&data)), data);
    }

    #[test]
    fn empty() {
        assert_eq!(transform(b""), Vec::<u8>::new());
    }

    #[test]
    fn known_bytes() {
        assert_eq!(transform(&[0, 0, 0, 0, 0]), [172, 41, 85, 66, 172]);
        assert_eq!(transform(&KEY), [0, 0, 0, 0]);
    }
}
