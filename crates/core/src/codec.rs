//! Serialization primitives for the slotted index files
//!
//! Fixed-width values (bytes, `u32`, characters, links) decode from a slice
//! that must hold at least their width; only the leading bytes are read.
//! Variable-length values (vints, strings) return the decoded value together
//! with the number of bytes consumed so the caller can keep decoding the rest.
//!
//! # Byte Order
//!
//! - `u32` and links: big-endian, 4 bytes
//! - characters: little-endian 32-bit code points, 4 bytes
//! - vints: little-endian groups of 7 bits, high bit set on every byte but the last
//! - strings: vint byte length followed by UTF-8 bytes

use crate::error::{Error, Result};
use crate::types::NIL;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Width of a fixed `u32`.
pub const U32_WIDTH: usize = 4;
/// Width of an encoded character.
pub const CHAR_WIDTH: usize = 4;
/// Width of an encoded link.
pub const LINK_WIDTH: usize = 4;

/// Longest legal vint (ten groups of seven bits cover a `u64`).
const MAX_VINT_LEN: usize = 10;

#[inline]
fn require(data: &[u8], width: usize, what: &str) -> Result<()> {
    if data.len() < width {
        return Err(Error::corrupt(format!(
            "truncated {}: need {} bytes, have {}",
            what,
            width,
            data.len()
        )));
    }
    Ok(())
}

// ============================================================================
// Bytes and fixed integers
// ============================================================================

/// Encode a single byte.
pub fn encode_u8(value: u8, buf: &mut Vec<u8>) {
    buf.push(value);
}

/// Decode a single byte.
pub fn decode_u8(data: &[u8]) -> Result<u8> {
    require(data, 1, "byte")?;
    Ok(data[0])
}

/// Encode a `u32` as four big-endian bytes.
pub fn encode_u32(value: u32) -> [u8; U32_WIDTH] {
    let mut out = [0u8; U32_WIDTH];
    BigEndian::write_u32(&mut out, value);
    out
}

/// Decode four big-endian bytes.
pub fn decode_u32(data: &[u8]) -> Result<u32> {
    require(data, U32_WIDTH, "u32")?;
    Ok(BigEndian::read_u32(data))
}

// ============================================================================
// Variable-length integers
// ============================================================================

/// Encode an unsigned integer as a vint.
///
/// Zero encodes as the single byte `0x00`.
pub fn encode_vint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a vint, returning `(value, bytes_consumed)`.
///
/// Stops at the first byte with the high bit clear.
pub fn decode_vint(data: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if i == MAX_VINT_LEN {
            break;
        }
        let group = (byte & 0x7F) as u64;
        let shift = 7 * i as u32;
        if shift == 63 && group > 1 {
            return Err(Error::corrupt("vint overflows 64 bits"));
        }
        value |= group << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if data.len() >= MAX_VINT_LEN {
        Err(Error::corrupt("vint longer than 10 bytes"))
    } else {
        Err(Error::corrupt("truncated vint"))
    }
}

// ============================================================================
// Characters and strings
// ============================================================================

/// Encode a character as a 32-bit little-endian code point.
pub fn encode_char(c: char) -> [u8; CHAR_WIDTH] {
    let mut out = [0u8; CHAR_WIDTH];
    LittleEndian::write_u32(&mut out, c as u32);
    out
}

/// Decode a 32-bit little-endian code point.
pub fn decode_char(data: &[u8]) -> Result<char> {
    require(data, CHAR_WIDTH, "character")?;
    let code = LittleEndian::read_u32(data);
    char::from_u32(code).ok_or_else(|| Error::corrupt(format!("invalid code point {:#x}", code)))
}

/// Encode a string as a vint byte length followed by UTF-8 bytes.
pub fn encode_string(value: &str, buf: &mut Vec<u8>) {
    encode_vint(value.len() as u64, buf);
    buf.extend_from_slice(value.as_bytes());
}

/// Decode a length-prefixed UTF-8 string, returning `(string, bytes_consumed)`.
pub fn decode_string(data: &[u8]) -> Result<(String, usize)> {
    let (len, header) = decode_vint(data)?;
    let len = usize::try_from(len).map_err(|_| Error::corrupt("string length overflow"))?;
    let end = header
        .checked_add(len)
        .ok_or_else(|| Error::corrupt("string length overflow"))?;
    if end > data.len() {
        return Err(Error::corrupt(format!(
            "string of {} bytes overruns {} available",
            len,
            data.len() - header
        )));
    }
    let value = std::str::from_utf8(&data[header..end])
        .map_err(|e| Error::corrupt(format!("invalid UTF-8 in string: {}", e)))?;
    Ok((value.to_owned(), end))
}

// ============================================================================
// Links
// ============================================================================

/// Encode a nullable slot link. `None` becomes the `0xFFFFFFFF` sentinel.
pub fn encode_link(link: Option<u32>) -> [u8; LINK_WIDTH] {
    debug_assert!(link != Some(NIL), "slot {:#x} collides with the nil sentinel", NIL);
    encode_u32(link.unwrap_or(NIL))
}

/// Decode a nullable slot link.
pub fn decode_link(data: &[u8]) -> Result<Option<u32>> {
    let raw = decode_u32(data)?;
    Ok(if raw == NIL { None } else { Some(raw) })
}
