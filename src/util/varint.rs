//! Variable-length integer encoding utilities.
//!
//! 7 bits per byte with a continuation bit, as used by the artifact codecs for
//! counts, term ids, and delta-encoded doc ids and positions. Decoding lives in
//! [`StructReader::read_varint`](crate::storage::structured::StructReader::read_varint),
//! which checksums each byte as it reads.

/// Encode a u64 value using variable-length encoding.
pub fn encode_u64(value: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(10);
    let mut val = value;

    loop {
        let mut byte = (val & 0x7F) as u8;
        val >>= 7;

        if val != 0 {
            byte |= 0x80; // continuation bit
        }

        bytes.push(byte);

        if val == 0 {
            break;
        }
    }

    bytes
}
