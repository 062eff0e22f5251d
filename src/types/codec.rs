//! Little-endian scalar codec, one arm per primitive kind

use half::f16;

use crate::error::{Result, StructError};

use super::{kind::PrimitiveKind, value::Value};

/// Decode one scalar of `kind` from the first `kind.byte_size()` bytes
pub fn decode_scalar(kind: PrimitiveKind, bytes: &[u8]) -> Value {
    debug_assert!(bytes.len() >= kind.byte_size());
    match kind {
        PrimitiveKind::I8 => Value::Int(bytes[0] as i8 as i64),
        PrimitiveKind::U8 => Value::UInt(bytes[0] as u64),
        PrimitiveKind::I16 => Value::Int(i16::from_le_bytes([bytes[0], bytes[1]]) as i64),
        PrimitiveKind::U16 => Value::UInt(u16::from_le_bytes([bytes[0], bytes[1]]) as u64),
        PrimitiveKind::I32 => Value::Int(i32::from_le_bytes(le4(bytes)) as i64),
        PrimitiveKind::U32 => Value::UInt(u32::from_le_bytes(le4(bytes)) as u64),
        PrimitiveKind::I64 => Value::Int(i64::from_le_bytes(le8(bytes))),
        PrimitiveKind::U64 => Value::UInt(u64::from_le_bytes(le8(bytes))),
        PrimitiveKind::F16 => Value::Float(f16::from_le_bytes([bytes[0], bytes[1]]).to_f64()),
        PrimitiveKind::F32 => Value::Float(f32::from_le_bytes(le4(bytes)) as f64),
        PrimitiveKind::F64 => Value::Float(f64::from_le_bytes(le8(bytes))),
        PrimitiveKind::Bool => Value::Bool(bytes[0] != 0),
        PrimitiveKind::Utf8 => Value::Text(String::from_utf8_lossy(&bytes[..1]).into_owned()),
    }
}

/// Encode `value` as one scalar of `kind` into the first `kind.byte_size()` bytes.
///
/// Integer kinds keep the low bits of the value, the way a fixed-width
/// store would: `300` written to a `u8` reads back `44`, `-1` written to a
/// `u16` reads back `65535`. Floats written to integer kinds are truncated
/// toward zero and then reduced the same way, so `1e40` written to a `u8`
/// reads back `0`. NaN and infinities store 0.
pub fn encode_scalar(kind: PrimitiveKind, value: &Value, out: &mut [u8]) -> Result<()> {
    let size = kind.byte_size();
    debug_assert!(out.len() >= size);
    match kind {
        PrimitiveKind::I8
        | PrimitiveKind::U8
        | PrimitiveKind::I16
        | PrimitiveKind::U16
        | PrimitiveKind::I32
        | PrimitiveKind::U32
        | PrimitiveKind::I64
        | PrimitiveKind::U64 => {
            let bits = integer_bits(kind, value)?;
            out[..size].copy_from_slice(&bits.to_le_bytes()[..size]);
        }
        PrimitiveKind::F16 => {
            let v = float_value(kind, value)?;
            out[..2].copy_from_slice(&f16::from_f64(v).to_le_bytes());
        }
        PrimitiveKind::F32 => {
            let v = float_value(kind, value)?;
            out[..4].copy_from_slice(&(v as f32).to_le_bytes());
        }
        PrimitiveKind::F64 => {
            let v = float_value(kind, value)?;
            out[..8].copy_from_slice(&v.to_le_bytes());
        }
        PrimitiveKind::Bool => {
            out[0] = truthy(kind, value)? as u8;
        }
        PrimitiveKind::Utf8 => match value {
            // Only the first code unit fits; an empty string stores NUL.
            Value::Text(s) => out[0] = s.as_bytes().first().copied().unwrap_or(0),
            other => return Err(StructError::kind_mismatch(kind.name(), other.type_name())),
        },
    }
    Ok(())
}

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

fn integer_bits(kind: PrimitiveKind, value: &Value) -> Result<u64> {
    match *value {
        Value::Int(v) => Ok(v as u64),
        Value::UInt(v) => Ok(v),
        // `%` is exact on floats and leaves |r| < 2^64, which fits an i128
        Value::Float(v) if v.is_finite() => Ok((v.trunc() % TWO_POW_64) as i128 as u64),
        Value::Float(_) => Ok(0),
        Value::Bool(v) => Ok(v as u64),
        ref other => Err(StructError::kind_mismatch(kind.name(), other.type_name())),
    }
}

fn float_value(kind: PrimitiveKind, value: &Value) -> Result<f64> {
    match *value {
        Value::Float(v) => Ok(v),
        Value::Int(v) => Ok(v as f64),
        Value::UInt(v) => Ok(v as f64),
        Value::Bool(v) => Ok(if v { 1.0 } else { 0.0 }),
        ref other => Err(StructError::kind_mismatch(kind.name(), other.type_name())),
    }
}

fn truthy(kind: PrimitiveKind, value: &Value) -> Result<bool> {
    match *value {
        Value::Bool(v) => Ok(v),
        Value::Int(v) => Ok(v != 0),
        Value::UInt(v) => Ok(v != 0),
        Value::Float(v) => Ok(v != 0.0 && !v.is_nan()),
        Value::Text(ref s) => Ok(!s.is_empty()),
        ref other => Err(StructError::kind_mismatch(kind.name(), other.type_name())),
    }
}

fn le4(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

fn le8(bytes: &[u8]) -> [u8; 8] {
    [
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]
}
