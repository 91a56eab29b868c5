//! Sortable fixed-width numeric encodings.
//!
//! Each function maps a signed integer or IEEE-754 float to a big-endian
//! byte array whose unsigned lexicographic order equals the numeric order of
//! the input:
//!
//! - integers: flip the sign bit of the two's-complement pattern;
//! - floats: invert every bit of negative values, set the sign bit of
//!   non-negative values.
//!
//! `-0.0` encodes just below `+0.0`, and NaNs with the sign bit clear sort
//! above `+inf`.

const I16_SIGN: u16 = 1 << 15;
const I32_SIGN: u32 = 1 << 31;
const I64_SIGN: u64 = 1 << 63;

#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn encode_i16(value: i16) -> [u8; 2] {
    ((value as u16) ^ I16_SIGN).to_be_bytes()
}

#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn decode_i16(bytes: [u8; 2]) -> i16 {
    (u16::from_be_bytes(bytes) ^ I16_SIGN) as i16
}

#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn encode_i32(value: i32) -> [u8; 4] {
    ((value as u32) ^ I32_SIGN).to_be_bytes()
}

#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn decode_i32(bytes: [u8; 4]) -> i32 {
    (u32::from_be_bytes(bytes) ^ I32_SIGN) as i32
}

#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn encode_i64(value: i64) -> [u8; 8] {
    ((value as u64) ^ I64_SIGN).to_be_bytes()
}

#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn decode_i64(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ I64_SIGN) as i64
}

#[must_use]
pub const fn encode_f32(value: f32) -> [u8; 4] {
    let bits = value.to_bits();
    let sortable = if bits & I32_SIGN != 0 { !bits } else { bits | I32_SIGN };
    sortable.to_be_bytes()
}

#[must_use]
pub const fn decode_f32(bytes: [u8; 4]) -> f32 {
    let sortable = u32::from_be_bytes(bytes);
    let bits = if sortable & I32_SIGN != 0 { sortable & !I32_SIGN } else { !sortable };
    f32::from_bits(bits)
}

#[must_use]
pub const fn encode_f64(value: f64) -> [u8; 8] {
    let bits = value.to_bits();
    let sortable = if bits & I64_SIGN != 0 { !bits } else { bits | I64_SIGN };
    sortable.to_be_bytes()
}

#[must_use]
pub const fn decode_f64(bytes: [u8; 8]) -> f64 {
    let sortable = u64::from_be_bytes(bytes);
    let bits = if sortable & I64_SIGN != 0 { sortable & !I64_SIGN } else { !sortable };
    f64::from_bits(bits)
}
