//! Layout snapshots: move a view's structure, not its values, to another
//! execution context
//!
//! Within one process a [`LayoutSnapshot`] carries the layout and a handle
//! to the shared buffer, so another thread can rebind the same bytes. Across
//! processes the snapshot is encoded into a [`SnapshotHeader`] with bincode;
//! the receiver maps the same region independently and binds the header to
//! it. Offsets are always taken verbatim.

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, StructError},
    layout::Layout,
    memory::Buffer,
    utf8::TextMode,
};

/// Identifies encoded snapshot headers ("SHMSTRUC")
pub const SNAPSHOT_MAGIC: u64 = 0x5348_4D53_5452_5543;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u64 = 1;

/// Structure of a bound view plus a handle to its region
#[derive(Debug, Clone)]
pub struct LayoutSnapshot {
    pub layout: Arc<Layout>,
    pub fixed_width_views: bool,
    pub text_mode: TextMode,
    pub buffer: Buffer,
}

impl LayoutSnapshot {
    /// Header describing this snapshot for a context that maps the region
    /// on its own
    pub fn header(&self) -> SnapshotHeader {
        SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
            layout: (*self.layout).clone(),
            fixed_width_views: self.fixed_width_views,
            text_mode: self.text_mode,
            byte_offset: self.buffer.byte_offset(),
            byte_length: self.buffer.len(),
        }
    }

    /// Encode the header with bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self.header())?)
    }

    /// Write the encoded header to a file
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()?)
            .map_err(|e| StructError::from_io(e, &format!("Failed to write snapshot {}", path.display())))
    }
}

/// Serializable form of a snapshot. `byte_offset` is measured from the
/// start of the mapped region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u64,
    pub version: u64,
    pub layout: Layout,
    pub fixed_width_views: bool,
    pub text_mode: TextMode,
    pub byte_offset: usize,
    pub byte_length: usize,
}

impl SnapshotHeader {
    /// Decode and check magic and version
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header: SnapshotHeader = bincode::deserialize(bytes)?;
        if header.magic != SNAPSHOT_MAGIC {
            return Err(StructError::serialization(format!(
                "bad snapshot magic {:#x}",
                header.magic
            )));
        }
        if header.version != SNAPSHOT_VERSION {
            return Err(StructError::version_mismatch(SNAPSHOT_VERSION, header.version));
        }
        Ok(header)
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| StructError::from_io(e, &format!("Failed to read snapshot {}", path.display())))?;
        Self::from_bytes(&bytes)
    }

    /// Attach to `region`, a mapping of the same bytes the snapshot was
    /// taken over
    pub fn bind(self, region: &Buffer) -> Result<LayoutSnapshot> {
        let relative = self.byte_offset.checked_sub(region.byte_offset()).ok_or_else(|| {
            StructError::invalid_parameter(
                "region",
                format!("snapshot starts at {} before region start {}", self.byte_offset, region.byte_offset()),
            )
        })?;
        let buffer = region.window(relative, self.byte_length)?;
        self.layout.validate(buffer.len())?;
        Ok(LayoutSnapshot {
            layout: Arc::new(self.layout),
            fixed_width_views: self.fixed_width_views,
            text_mode: self.text_mode,
            buffer,
        })
    }
}
