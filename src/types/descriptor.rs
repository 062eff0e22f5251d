//! Type tag parsing
//!
//! A tag is a kind identifier followed by zero or more bracketed extents,
//! outer to inner: `i32`, `f64[4]`, `utf8[4][10]`. Whitespace is allowed
//! inside the brackets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StructError};

use super::kind::PrimitiveKind;

/// Parsed form of a type tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub kind: PrimitiveKind,
    /// Extents, outer to inner. Empty for scalars.
    pub dims: Vec<usize>,
}

impl TypeDescriptor {
    /// Parse a tag of the form `Kind ('[' Integer ']')*`
    pub fn parse(tag: &str) -> Result<Self> {
        let ident_len = tag
            .char_indices()
            .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
            .map(|(i, _)| i)
            .unwrap_or(tag.len());

        if ident_len == 0 {
            return Err(StructError::invalid_type(tag, "missing kind identifier"));
        }

        let kind: PrimitiveKind = tag[..ident_len]
            .parse()
            .map_err(|_| StructError::invalid_type(tag, format!("unknown kind `{}`", &tag[..ident_len])))?;

        let mut dims = Vec::new();
        let mut rest = &tag[ident_len..];
        while !rest.is_empty() {
            let inner_start = rest
                .strip_prefix('[')
                .ok_or_else(|| StructError::invalid_type(tag, "expected `[` after kind"))?;
            let close = inner_start
                .find(']')
                .ok_or_else(|| StructError::invalid_type(tag, "unterminated `[`"))?;
            let extent = inner_start[..close].trim();
            let extent = extent.parse::<usize>().map_err(|_| {
                StructError::invalid_type(tag, format!("extent `{}` is not a non-negative integer", extent))
            })?;
            dims.push(extent);
            rest = &inner_start[close + 1..];
        }

        // Non-zero extents alone must fit so that every partial product does
        let fits = dims
            .iter()
            .filter(|&&d| d != 0)
            .try_fold(kind.byte_size(), |acc, &d| acc.checked_mul(d))
            .is_some();
        if !fits {
            return Err(StructError::invalid_type(tag, "extent product overflows"));
        }

        Ok(Self { kind, dims })
    }

    /// Scalar byte size of the element kind
    pub fn byte_size(&self) -> usize {
        self.kind.byte_size()
    }

    /// Product of the extents, or 1 for scalars
    pub fn flat_length(&self) -> usize {
        self.dims.iter().product()
    }

    /// Bytes occupied by the whole field. Parsed descriptors never overflow here.
    pub fn total_size(&self) -> usize {
        self.byte_size() * self.flat_length()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for d in &self.dims {
            write!(f, "[{}]", d)?;
        }
        Ok(())
    }
}
