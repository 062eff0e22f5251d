//! Scalar accessors: one value at a fixed offset

use std::{fmt, ptr};

use crate::{
    error::{Result, StructError},
    memory::Buffer,
    types::{decode_scalar, encode_scalar, PrimitiveKind, Value},
};

use super::typed::Element;

/// Decode the scalar of `kind` at `offset`. The range must be in bounds.
pub(crate) fn read_scalar(buffer: &Buffer, offset: usize, kind: PrimitiveKind) -> Value {
    match kind.byte_size() {
        1 => decode_scalar(kind, &buffer.load::<1>(offset)),
        2 => decode_scalar(kind, &buffer.load::<2>(offset)),
        4 => decode_scalar(kind, &buffer.load::<4>(offset)),
        _ => decode_scalar(kind, &buffer.load::<8>(offset)),
    }
}

/// Encode `value` as a scalar of `kind` at `offset`. The range must be in bounds.
pub(crate) fn write_scalar(buffer: &Buffer, offset: usize, kind: PrimitiveKind, value: &Value) -> Result<()> {
    let mut bytes = [0u8; 8];
    let size = kind.byte_size();
    encode_scalar(kind, value, &mut bytes[..size])?;
    buffer.store(offset, &bytes[..size]);
    Ok(())
}

/// Live accessor for one scalar. Every call touches the buffer.
#[derive(Clone)]
pub struct ScalarField {
    buffer: Buffer,
    offset: usize,
    kind: PrimitiveKind,
}

impl ScalarField {
    pub(crate) fn new(buffer: Buffer, offset: usize, kind: PrimitiveKind) -> Self {
        debug_assert!(offset + kind.byte_size() <= buffer.len());
        Self { buffer, offset, kind }
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Byte offset within the bound region
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn get(&self) -> Value {
        read_scalar(&self.buffer, self.offset, self.kind)
    }

    pub fn set(&self, value: impl Into<Value>) -> Result<()> {
        self.set_value(&value.into())
    }

    pub fn set_value(&self, value: &Value) -> Result<()> {
        write_scalar(&self.buffer, self.offset, self.kind, value)
    }

    /// Read as the matching Rust type
    pub fn get_as<T: Element>(&self) -> Result<T> {
        self.check_kind::<T>()?;
        let raw = unsafe { ptr::read_unaligned(self.buffer.as_ptr().add(self.offset) as *const T) };
        Ok(raw.from_stored())
    }

    /// Write as the matching Rust type
    pub fn set_as<T: Element>(&self, value: T) -> Result<()> {
        self.check_kind::<T>()?;
        unsafe { ptr::write_unaligned(self.buffer.as_ptr().add(self.offset) as *mut T, value.to_stored()) };
        Ok(())
    }

    fn check_kind<T: Element>(&self) -> Result<()> {
        if T::KIND != self.kind {
            return Err(StructError::kind_mismatch(self.kind.name(), T::KIND.name()));
        }
        Ok(())
    }
}

impl fmt::Debug for ScalarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_round_trip() {
        let buffer = Buffer::allocate(16).unwrap();
        let a = ScalarField::new(buffer.clone(), 0, PrimitiveKind::I16);
        let b = ScalarField::new(buffer.clone(), 3, PrimitiveKind::F64);

        a.set(-1234).unwrap();
        b.set(6.25).unwrap();
        assert_eq!(a.get(), Value::Int(-1234));
        assert_eq!(b.get(), Value::Float(6.25));
        assert_eq!(buffer.read_bytes(0, 2).unwrap(), (-1234i16).to_le_bytes().to_vec());
    }

    #[test]
    fn test_typed_scalar() {
        let buffer = Buffer::allocate(8).unwrap();
        let field = ScalarField::new(buffer, 1, PrimitiveKind::U32);
        field.set_as(0xDEAD_BEEFu32).unwrap();
        assert_eq!(field.get_as::<u32>().unwrap(), 0xDEAD_BEEF);
        assert_eq!(field.get(), Value::UInt(0xDEAD_BEEF));
        assert!(field.get_as::<i32>().is_err());
    }
}
