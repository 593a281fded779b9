//! Calldata codec for the message board contract:
//! `getMessage() view returns (string)` and `setMessage(string)`.

use crate::error::AbiError;

const WORD: usize = 32;

pub const GET_MESSAGE_SELECTOR: [u8; 4] = [0xce, 0x6d, 0x41, 0xde];
pub const SET_MESSAGE_SELECTOR: [u8; 4] = [0x36, 0x8b, 0x87, 0x72];

pub fn encode_get_message() -> Vec<u8> {
    GET_MESSAGE_SELECTOR.to_vec()
}

pub fn encode_set_message(message: &str) -> Vec<u8> {
    let mut out = SET_MESSAGE_SELECTOR.to_vec();
    out.extend_from_slice(&encode_string(message));
    out
}

/// Single dynamic `string` argument: head offset, length, right-padded bytes.
pub fn encode_string(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let padded_len = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(2 * WORD + padded_len);
    out.extend_from_slice(&word(WORD));
    out.extend_from_slice(&word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(2 * WORD + padded_len, 0);
    out
}

pub fn decode_string(data: &[u8]) -> Result<String, AbiError> {
    if data.is_empty() {
        return Err(AbiError::Empty);
    }
    let offset = read_word(data, 0)?;
    let length = read_word(data, offset)?;
    let start = offset.checked_add(WORD).ok_or(AbiError::Overflow)?;
    let end = start.checked_add(length).ok_or(AbiError::Overflow)?;
    let bytes = data.get(start..end).ok_or(AbiError::Truncated {
        needed: end,
        actual: data.len(),
    })?;
    String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::NotUtf8)
}

fn word(value: usize) -> [u8; WORD] {
    let mut out = [0u8; WORD];
    out[WORD - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    out
}

fn read_word(data: &[u8], at: usize) -> Result<usize, AbiError> {
    let end = at.checked_add(WORD).ok_or(AbiError::Overflow)?;
    let raw = data.get(at..end).ok_or(AbiError::Truncated {
        needed: end,
        actual: data.len(),
    })?;
    if raw[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow);
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&raw[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(low)).map_err(|_| AbiError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_message_calldata_matches_solidity_layout() {
        let calldata = encode_set_message("hello");
        assert_eq!(calldata.len(), 4 + 3 * WORD);
        assert_eq!(&calldata[..4], &SET_MESSAGE_SELECTOR);
        assert_eq!(calldata[4 + WORD - 1], 0x20);
        assert_eq!(calldata[4 + 2 * WORD - 1], 5);
        assert_eq!(&calldata[4 + 2 * WORD..4 + 2 * WORD + 5], b"hello");
        assert!(calldata[4 + 2 * WORD + 5..].iter().all(|b| *b == 0));
    }

    #[test]
    fn string_of_exactly_one_word_is_not_over_padded() {
        let value = "a".repeat(WORD);
        assert_eq!(encode_string(&value).len(), 3 * WORD);
        assert_eq!(encode_string("").len(), 2 * WORD);
    }

    #[test]
    fn decodes_multibyte_utf8_returned_by_get_message() {
        let encoded = encode_string("olá, mundo ✓");
        assert_eq!(decode_string(&encoded).expect("decode"), "olá, mundo ✓");
    }

    #[test]
    fn decode_rejects_empty_and_short_return_data() {
        assert_eq!(decode_string(&[]), Err(AbiError::Empty));
        assert_eq!(
            decode_string(&[0u8; 10]),
            Err(AbiError::Truncated {
                needed: 32,
                actual: 10
            })
        );

        let mut encoded = encode_string("hello");
        encoded.truncate(2 * WORD + 2);
        assert_eq!(
            decode_string(&encoded),
            Err(AbiError::Truncated {
                needed: 2 * WORD + 5,
                actual: 2 * WORD + 2
            })
        );
    }

    #[test]
    fn decode_rejects_oversized_offset_and_bad_utf8() {
        let mut encoded = encode_string("hello");
        encoded[0] = 0xff;
        assert_eq!(decode_string(&encoded), Err(AbiError::Overflow));

        let mut encoded = encode_string("ab");
        encoded[2 * WORD] = 0xff;
        assert_eq!(decode_string(&encoded), Err(AbiError::NotUtf8));
    }
}
