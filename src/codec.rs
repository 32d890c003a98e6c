//! Pure, allocation-light wire encoding shared by the handshake (fixed-size
//! fields only) and by callers serializing application packets.
//!
//! Little-endian fixed integers, a `bincode`-compatible varint for `u32`,
//! length-prefixed strings and sequences, an `Option<T>` tag byte, and a
//! UTC `DateTime` record. The varint format matches `bincode`'s
//! `VarintEncoding` byte-for-byte so peers serializing application
//! payloads with `bincode` interoperate with this codec without a
//! translation step.

use crate::error::MessageError;

/// Sentinel byte: what follows is a 2-byte LE `u16`.
const VARINT_U16: u8 = 0xFC;
/// Sentinel byte: what follows is a 4-byte LE `u32`.
const VARINT_U32: u8 = 0xFB;
/// Sentinel byte: what follows is an 8-byte LE `u64` (read-compat only).
const VARINT_U64: u8 = 0xFD;
/// Sentinel byte: what follows is a 16-byte LE `u128` (read-compat only).
const VARINT_U128: u8 = 0xFE;
/// Largest value encodable as a single inline byte.
const VARINT_INLINE_MAX: u32 = 250;

/// Advances `input` past `n` bytes and returns them, or fails with
/// `Deserialization` if fewer than `n` remain.
fn take<'a>(input: &mut &'a [u8], n: usize) -> Result<&'a [u8], MessageError> {
    if input.len() < n {
        return Err(MessageError::Deserialization("truncated input"));
    }
    let (head, tail) = input.split_at(n);
    *input = tail;
    Ok(head)
}

// ---- fixed-width integers (little-endian) ----

macro_rules! fixed_int {
    ($write_name:ident, $read_name:ident, $ty:ty) => {
        pub fn $write_name(buf: &mut Vec<u8>, v: $ty) {
            buf.extend_from_slice(&v.to_le_bytes());
        }

        pub fn $read_name(input: &mut &[u8]) -> Result<$ty, MessageError> {
            let bytes = take(input, std::mem::size_of::<$ty>())?;
            Ok(<$ty>::from_le_bytes(bytes.try_into().unwrap()))
        }
    };
}

fixed_int!(write_u8, read_u8, u8);
fixed_int!(write_u16, read_u16, u16);
fixed_int!(write_u32, read_u32, u32);
fixed_int!(write_u64, read_u64, u64);
fixed_int!(write_i32, read_i32, i32);
fixed_int!(write_i64, read_i64, i64);

// ---- varint(u32) ----

/// Encodes `v` the way `bincode`'s `VarintEncoding` does: values `0..=250`
/// as a single inline byte, larger values as sentinel `0xFB` followed by
/// the full 4-byte LE `u32`.
pub fn write_varint_u32(buf: &mut Vec<u8>, v: u32) {
    if v <= VARINT_INLINE_MAX {
        buf.push(v as u8);
    } else {
        buf.push(VARINT_U32);
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

/// Decodes a varint(u32). Recognizes `0xFC`/`0xFD`/`0xFE` (2/8/16-byte
/// forms) on read for forward compatibility, even though this crate never
/// produces them; values that don't fit in a `u32` are rejected.
pub fn read_varint_u32(input: &mut &[u8]) -> Result<u32, MessageError> {
    let tag = read_u8(input)?;
    match tag {
        0..=250 => Ok(tag as u32),
        VARINT_U32 => read_u32(input),
        VARINT_U16 => {
            let v = read_u16(input)?;
            Ok(v as u32)
        }
        VARINT_U64 => {
            let v = read_u64(input)?;
            u32::try_from(v).map_err(|_| MessageError::Deserialization("varint exceeds u32 range"))
        }
        VARINT_U128 => {
            let bytes = take(input, 16)?;
            let v = u128::from_le_bytes(bytes.try_into().unwrap());
            u32::try_from(v).map_err(|_| MessageError::Deserialization("varint exceeds u32 range"))
        }
        0xFF => Err(MessageError::Deserialization("unsupported varint sentinel")),
        _ => unreachable!("match is exhaustive over u8"),
    }
}

// ---- string ----

pub fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_u64(buf, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

pub fn read_string(input: &mut &[u8]) -> Result<String, MessageError> {
    let len = read_u64(input)? as usize;
    let bytes = take(input, len)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| MessageError::Deserialization("invalid UTF-8 in string"))
}

// ---- option<T> ----

pub fn write_option<T>(buf: &mut Vec<u8>, v: &Option<T>, write_inner: impl FnOnce(&mut Vec<u8>, &T)) {
    match v {
        None => write_u8(buf, 0),
        Some(inner) => {
            write_u8(buf, 1);
            write_inner(buf, inner);
        }
    }
}

pub fn read_option<T>(
    input: &mut &[u8],
    read_inner: impl FnOnce(&mut &[u8]) -> Result<T, MessageError>,
) -> Result<Option<T>, MessageError> {
    match read_u8(input)? {
        0 => Ok(None),
        1 => Ok(Some(read_inner(input)?)),
        _ => Err(MessageError::Deserialization("option tag not in {0,1}")),
    }
}

// ---- sequence ----

pub fn write_seq<T>(buf: &mut Vec<u8>, items: &[T], mut write_item: impl FnMut(&mut Vec<u8>, &T)) {
    write_u64(buf, items.len() as u64);
    for item in items {
        write_item(buf, item);
    }
}

pub fn read_seq<T>(
    input: &mut &[u8],
    mut read_item: impl FnMut(&mut &[u8]) -> Result<T, MessageError>,
) -> Result<Vec<T>, MessageError> {
    let len = read_u64(input)? as usize;
    let mut out = Vec::with_capacity(len.min(1 << 16));
    for _ in 0..len {
        out.push(read_item(input)?);
    }
    Ok(out)
}

// ---- datetime (UTC, Unix epoch) ----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub secs: i64,
    pub nsecs: u32,
}

impl DateTime {
    /// Builds a `DateTime` from a millisecond Unix timestamp using floored
    /// division, so negative timestamps (pre-1970) remain valid.
    pub fn from_millis(ms: i64) -> Self {
        let secs = ms.div_euclid(1000);
        let rem_ms = ms.rem_euclid(1000);
        DateTime {
            secs,
            nsecs: (rem_ms as u32) * 1_000_000,
        }
    }
}

pub fn write_datetime(buf: &mut Vec<u8>, dt: &DateTime) {
    write_i64(buf, dt.secs);
    write_u32(buf, dt.nsecs);
}

pub fn read_datetime(input: &mut &[u8]) -> Result<DateTime, MessageError> {
    let secs = read_i64(input)?;
    let nsecs = read_u32(input)?;
    if nsecs >= 1_000_000_000 {
        return Err(MessageError::InvalidFormat("nsecs out of range"));
    }
    Ok(DateTime { secs, nsecs })
}
