//! Primitive field kinds

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StructError};

/// Primitive kind of a leaf field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F16,
    F32,
    F64,
    Bool,
    /// One UTF-8 code unit per slot byte
    Utf8,
}

impl PrimitiveKind {
    /// Every kind, in tag order
    pub const ALL: [PrimitiveKind; 13] = [
        PrimitiveKind::I8,
        PrimitiveKind::U8,
        PrimitiveKind::I16,
        PrimitiveKind::U16,
        PrimitiveKind::I32,
        PrimitiveKind::U32,
        PrimitiveKind::I64,
        PrimitiveKind::U64,
        PrimitiveKind::F16,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
        PrimitiveKind::Bool,
        PrimitiveKind::Utf8,
    ];

    /// Scalar size in bytes, which is also the natural alignment
    pub const fn byte_size(self) -> usize {
        match self {
            PrimitiveKind::I8 | PrimitiveKind::U8 | PrimitiveKind::Bool | PrimitiveKind::Utf8 => 1,
            PrimitiveKind::I16 | PrimitiveKind::U16 | PrimitiveKind::F16 => 2,
            PrimitiveKind::I32 | PrimitiveKind::U32 | PrimitiveKind::F32 => 4,
            PrimitiveKind::I64 | PrimitiveKind::U64 | PrimitiveKind::F64 => 8,
        }
    }

    /// The tag identifier for this kind
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F16 => "f16",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Utf8 => "utf8",
        }
    }

    /// Whether arrays of this kind can be exposed as fixed-width element views.
    ///
    /// Booleans and text never are: booleans always go through per-element
    /// accessors, text goes through the UTF-8 codec.
    pub const fn supports_element_view(self) -> bool {
        !matches!(self, PrimitiveKind::Bool | PrimitiveKind::Utf8)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveKind {
    type Err = StructError;

    fn from_str(s: &str) -> Result<Self> {
        PrimitiveKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| StructError::invalid_type(s, format!("unknown kind `{}`", s)))
    }
}
