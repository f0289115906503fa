//! PKCS#7 padding over the 16 byte AES block.

use crate::aes_128::BLOCK_SIZE;

/// Why a buffer failed to strip as PKCS#7.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum PaddingError {
    #[error("data is empty")]
    Empty,

    #[error("padding length of 0")]
    Zero,

    #[error("padding length {0} exceeds the block size")]
    TooLarge(u8),

    #[error("padding length {pad_len} exceeds data length {len}")]
    Truncated { pad_len: u8, len: usize },

    #[error("not all of the last {pad_len} bytes are equal to {pad_len}")]
    Mismatch { pad_len: u8 },
}

/// Pad `data` to a multiple of the block size. The pad length is always in `1..=16`, so
/// block-aligned input gains a whole extra block.
pub fn pad(data: &[u8]) -> Vec<u8> {
    let mut padded = data.to_vec();
    pad_in_place(&mut padded);
    padded
}

pub fn pad_in_place(data: &mut Vec<u8>) {
    let pad_len = BLOCK_SIZE - data.len() % BLOCK_SIZE;
    #[allow(clippy::cast_possible_truncation)]
    data.resize(data.len() + pad_len, pad_len as u8);
}

/// Remove padding added by [`pad`], returning the unpadded prefix of `data`.
pub fn strip(data: &[u8]) -> Result<&[u8], PaddingError> {
    let pad_len = *data.last().ok_or(PaddingError::Empty)?;

    if pad_len == 0 {
        return Err(PaddingError::Zero);
    }
    if usize::from(pad_len) > BLOCK_SIZE {
        return Err(PaddingError::TooLarge(pad_len));
    }
    if usize::from(pad_len) > data.len() {
        return Err(PaddingError::Truncated {
            pad_len,
            len: data.len(),
        });
    }

    let unpadded_len = data.len() - usize::from(pad_len);
    if !data[unpadded_len..].iter().all(|&x| x == pad_len) {
        return Err(PaddingError::Mismatch { pad_len });
    }

    Ok(&data[..unpadded_len])
}

/// The predicate a padding oracle leaks.
pub fn is_valid(data: &[u8]) -> bool {
    strip(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_partial_block() {
        let padded = pad(b"YELLOW SUBMARINE!!!!");
        assert_eq!(padded.len(), 32);
        assert_eq!(&padded[20..], &[12; 12]);
    }

    #[test]
    fn test_pad_aligned_gets_full_block() {
        let input = b"YELLOW SUBMARINE";
        let padded = pad(input);

        assert_eq!(padded, [&input[..], &[0x10; 16][..]].concat());
        assert_eq!(strip(&padded).unwrap(), input);
    }

    #[test]
    fn test_pad_empty() {
        assert_eq!(pad(b""), [16; 16]);
    }

    #[test]
    fn test_round_trip_all_lengths() {
        let data = crate::gen_random_bytes(1000);
        for len in 0..=1000 {
            let input = &data[..len];
            let padded = pad(input);

            assert_eq!(padded.len() % BLOCK_SIZE, 0, "length {len}");
            assert_eq!(strip(&padded).unwrap(), input, "length {len}");
        }
    }

    #[test]
    fn test_strip_truncated_padding_block() {
        let padded = pad(b"YELLOW SUBMARINE");
        assert_eq!(
            strip(&padded[..30]),
            Err(PaddingError::Mismatch { pad_len: 0x10 })
        );
    }

    #[test]
    fn test_strip_errors() {
        assert_eq!(strip(b""), Err(PaddingError::Empty));
        assert_eq!(strip(b"ICE ICE BABY\x00"), Err(PaddingError::Zero));
        assert_eq!(strip(b"ICE ICE BABY\x11"), Err(PaddingError::TooLarge(0x11)));
        assert_eq!(
            strip(b"\x03\x03"),
            Err(PaddingError::Truncated { pad_len: 3, len: 2 })
        );
        assert_eq!(
            strip(b"ICE ICE BABY\x05\x05\x05\x05"),
            Err(PaddingError::Mismatch { pad_len: 5 })
        );
        assert_eq!(
            strip(b"ICE ICE BABY\x01\x02\x03\x04"),
            Err(PaddingError::Mismatch { pad_len: 4 })
        );
    }

    #[test]
    fn test_strip_valid() {
        assert_eq!(strip(b"ICE ICE BABY\x04\x04\x04\x04").unwrap(), b"ICE ICE BABY");
        assert_eq!(strip(b"ICE ICE BABY\x02\x01").unwrap(), b"ICE ICE BABY\x02");
        assert!(is_valid(&[0x10; 16]));
        assert!(!is_valid(&[0x11; 17]));
    }
}
