//! IEEE 488.2 definite-length binary block decoding
//!
//! Block format:
//! - Marker (1 byte): `#`
//! - Length-of-length (1 byte): ASCII digit 1-9, number of digits in the
//!   length field
//! - Length field (1-9 bytes): decimal payload length
//! - Payload (length bytes): opaque data
//!
//! The declared length governs framing. Payload bytes may contain LF, so
//! newline-based framing of a block response is never valid; a single LF
//! *after* the payload is an optional delimiter the caller may consume.

use crate::error::{Error, Result};

/// Block marker character
pub const MARKER: u8 = b'#';

/// A decoded block borrowed from the input buffer
#[derive(Debug, PartialEq, Eq)]
pub struct Block<'a> {
    /// Payload bytes, exactly as declared
    pub payload: &'a [u8],
    /// Total bytes consumed from the buffer: 2 + digits + payload length
    pub consumed: usize,
}

/// Parse the length-of-length byte (second byte of the block)
///
/// `#0` introduces an indefinite-length block, which the chassis never
/// emits; it is rejected along with non-digits.
pub fn len_of_len(byte: u8) -> Result<usize> {
    match byte {
        b'1'..=b'9' => Ok((byte - b'0') as usize),
        b'0' => Err(Error::InvalidResponse(
            "Indefinite-length block (#0) not supported".into(),
        )),
        other => Err(Error::InvalidResponse(format!(
            "Length-of-length is not a digit: 0x{other:02X}"
        ))),
    }
}

/// Parse the decimal length field
pub fn declared_len(digits: &[u8]) -> Result<usize> {
    let mut len: usize = 0;
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return Err(Error::InvalidResponse(format!(
                "Length field contains non-digit: 0x{byte:02X}"
            )));
        }
        len = len * 10 + (byte - b'0') as usize;
    }
    Ok(len)
}

/// Decode one complete block from the front of `buf`
///
/// Fails with `InvalidResponse` when the marker or header is malformed
/// and with `Truncated` when the buffer holds fewer payload bytes than
/// the header declares. Never truncates silently.
pub fn decode(buf: &[u8]) -> Result<Block<'_>> {
    if buf.len() < 2 {
        return Err(Error::InvalidResponse(format!(
            "Block header needs 2 bytes, got {}",
            buf.len()
        )));
    }
    if buf[0] != MARKER {
        return Err(Error::InvalidResponse(format!(
            "Expected block marker '#', got 0x{:02X}",
            buf[0]
        )));
    }

    let digits = len_of_len(buf[1])?;
    if buf.len() < 2 + digits {
        return Err(Error::InvalidResponse(format!(
            "Length field needs {} digits, got {}",
            digits,
            buf.len() - 2
        )));
    }

    let payload_len = declared_len(&buf[2..2 + digits])?;
    let start = 2 + digits;
    let available = buf.len() - start;
    if available < payload_len {
        return Err(Error::Truncated {
            declared: payload_len,
            available,
        });
    }

    Ok(Block {
        payload: &buf[start..start + payload_len],
        consumed: start + payload_len,
    })
}
