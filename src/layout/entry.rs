//! Layout entries and the ordered layout

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, StructError},
    types::PrimitiveKind,
};

/// Placement of one leaf field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Names from the root record down to the leaf
    pub path: Vec<String>,
    /// Byte offset from the start of the region
    pub offset: usize,
    pub kind: PrimitiveKind,
    /// Product of `dims`, or 1 for scalars
    pub flat_length: usize,
    /// Extents, outer to inner
    pub dims: Vec<usize>,
    /// For each ancestor level `path[..path.len() - 1]`, whether that
    /// container is index-addressable
    pub array_levels: Vec<bool>,
}

impl LayoutEntry {
    pub fn byte_size(&self) -> usize {
        self.kind.byte_size()
    }

    pub fn total_size(&self) -> usize {
        self.byte_size() * self.flat_length
    }

    /// One past the last byte of the leaf, or `None` if that overflows `usize`
    pub fn end(&self) -> Option<usize> {
        self.byte_size()
            .checked_mul(self.flat_length)
            .and_then(|size| self.offset.checked_add(size))
    }

    /// Dotted form of the path, e.g. `d.f.0`
    pub fn dotted_name(&self) -> String {
        self.path.join(".")
    }

    /// Reject entries whose shape metadata is self-inconsistent
    fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(StructError::invalid_parameter("layout", "entry with empty path"));
        }
        if self.array_levels.len() + 1 != self.path.len() {
            return Err(StructError::invalid_parameter(
                "layout",
                format!("entry `{}` has {} array flags for {} path segments", self.dotted_name(), self.array_levels.len(), self.path.len()),
            ));
        }
        let nonzero = self
            .dims
            .iter()
            .filter(|&&d| d != 0)
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| {
                StructError::invalid_parameter("layout", format!("entry `{}` dims {:?} overflow", self.dotted_name(), self.dims))
            })?;
        let expected = if self.dims.contains(&0) { 0 } else { nonzero };
        if expected != self.flat_length {
            return Err(StructError::invalid_parameter(
                "layout",
                format!("entry `{}` flat length {} does not match dims {:?}", self.dotted_name(), self.flat_length, self.dims),
            ));
        }
        Ok(())
    }
}

/// Ordered leaf placements plus the total region length
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    entries: Vec<LayoutEntry>,
    byte_length: usize,
}

impl Layout {
    pub fn new(entries: Vec<LayoutEntry>, byte_length: usize) -> Self {
        Self {
            entries,
            byte_length,
        }
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LayoutEntry> {
        self.entries.iter()
    }

    /// Total bytes the region must provide
    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest scalar alignment among all leaves (1 for an empty layout)
    pub fn max_alignment(&self) -> usize {
        self.entries.iter().map(LayoutEntry::byte_size).max().unwrap_or(1)
    }

    /// Find a leaf by its full path
    pub fn find(&self, path: &[&str]) -> Option<&LayoutEntry> {
        self.entries
            .iter()
            .find(|e| e.path.len() == path.len() && e.path.iter().zip(path).all(|(a, b)| a == b))
    }

    /// Check that every entry is well-formed and lies inside `region_len` bytes.
    ///
    /// Run before binding a layout that did not come from the planner.
    pub fn validate(&self, region_len: usize) -> Result<()> {
        if self.byte_length > region_len {
            return Err(StructError::invalid_parameter(
                "layout",
                format!("layout needs {} bytes, region has {}", self.byte_length, region_len),
            ));
        }
        for entry in &self.entries {
            entry.validate()?;
            let end = entry.end().ok_or_else(|| {
                StructError::invalid_parameter(
                    "layout",
                    format!("entry `{}` at offset {} overflows the address space", entry.dotted_name(), entry.offset),
                )
            })?;
            if end > self.byte_length {
                return Err(StructError::invalid_parameter(
                    "layout",
                    format!("entry `{}` ends at {} past layout length {}", entry.dotted_name(), end, self.byte_length),
                ));
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Layout {
    type Item = &'a LayoutEntry;
    type IntoIter = std::slice::Iter<'a, LayoutEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
