//! Byte regions that accessor trees bind to
//!
//! A [`Buffer`] is a cheap handle (`Arc` + offset + length) over one of
//! three backings: a zeroed heap block owned exclusively by the buffer, a
//! shareable mapping, or foreign memory owned by the caller. Clones and
//! windows refer to the same bytes.
//!
//! Accessors read and write through raw pointers. Concurrent non-atomic
//! access from several threads is a data race the caller must prevent;
//! use the atomic element views for cross-thread coordination.

use std::{
    alloc::{self, Layout as AllocLayout},
    fmt,
    ptr::{self, NonNull},
    sync::Arc,
};

use crate::error::{Result, StructError};

use super::{
    config::{Ownership, RegionConfig, SharedBacking, HEAP_ALIGNMENT},
    regions::MappedRegion,
};

/// Zeroed heap allocation aligned to [`HEAP_ALIGNMENT`]
struct HeapBlock {
    ptr: NonNull<u8>,
    layout: AllocLayout,
}

impl HeapBlock {
    fn zeroed(len: usize) -> Result<Self> {
        let layout = AllocLayout::from_size_align(len.max(1), HEAP_ALIGNMENT)
            .map_err(|e| StructError::invalid_parameter("len", e.to_string()))?;
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or_else(|| {
            StructError::platform(format!("Failed to allocate {} bytes", len))
        })?;
        Ok(Self { ptr, layout })
    }
}

impl Drop for HeapBlock {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

enum Backing {
    Heap(HeapBlock),
    Mapped(MappedRegion),
    Foreign { ptr: NonNull<u8>, len: usize },
}

// Backings are only reached through raw pointers; see the module docs.
unsafe impl Send for Backing {}
unsafe impl Sync for Backing {}

impl Backing {
    fn base_ptr(&self) -> *mut u8 {
        match self {
            Backing::Heap(block) => block.ptr.as_ptr(),
            Backing::Mapped(region) => region.as_ptr(),
            Backing::Foreign { ptr, .. } => ptr.as_ptr(),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            Backing::Heap(block) => block.layout.size(),
            Backing::Mapped(region) => region.size(),
            Backing::Foreign { len, .. } => *len,
        }
    }

    fn is_shareable(&self) -> bool {
        !matches!(self, Backing::Heap(_))
    }
}

/// Handle to a contiguous byte region
#[derive(Clone)]
pub struct Buffer {
    backing: Arc<Backing>,
    /// Offset of this buffer's first byte from the backing's base
    byte_offset: usize,
    len: usize,
    ownership: Ownership,
}

impl Buffer {
    /// Allocate a zeroed region owned exclusively by the returned buffer
    pub fn allocate(len: usize) -> Result<Self> {
        Ok(Self {
            backing: Arc::new(Backing::Heap(HeapBlock::zeroed(len)?)),
            byte_offset: 0,
            len,
            ownership: Ownership::Exclusive,
        })
    }

    /// Allocate a zeroed region that other threads (or, for file-backed
    /// regions, other processes) may bind concurrently
    pub fn allocate_shared(len: usize, backing: &SharedBacking) -> Result<Self> {
        let config = RegionConfig::new(backing.clone(), len);
        let region = MappedRegion::new(&config)?;
        Ok(Self::from_region(region, len))
    }

    /// Open an existing or new mapped region, spanning its whole size
    pub fn open_shared(config: &RegionConfig) -> Result<Self> {
        let region = MappedRegion::new(config)?;
        let len = region.size();
        Ok(Self::from_region(region, len))
    }

    fn from_region(region: MappedRegion, len: usize) -> Self {
        Self {
            backing: Arc::new(Backing::Mapped(region)),
            byte_offset: 0,
            len,
            ownership: Ownership::Shared,
        }
    }

    /// Copy `bytes` into a fresh exclusive buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let buffer = Self::allocate(bytes.len())?;
        buffer.write_bytes(0, bytes)?;
        Ok(buffer)
    }

    /// Wrap memory owned by someone else, such as another runtime's linear
    /// memory.
    ///
    /// # Safety
    /// - `ptr` must be valid for reads and writes of `len` bytes
    /// - The memory must stay valid for as long as any buffer, window or
    ///   accessor derived from the result is alive
    pub unsafe fn from_raw_parts(ptr: *mut u8, len: usize) -> Result<Self> {
        let ptr = NonNull::new(ptr)
            .ok_or_else(|| StructError::invalid_parameter("ptr", "Pointer cannot be null"))?;
        Ok(Self {
            backing: Arc::new(Backing::Foreign { ptr, len }),
            byte_offset: 0,
            len,
            ownership: Ownership::Window,
        })
    }

    /// A non-owning window `[byte_offset, byte_offset + len)` relative to the
    /// start of this buffer
    pub fn window(&self, byte_offset: usize, len: usize) -> Result<Self> {
        let end = byte_offset.checked_add(len).ok_or_else(|| {
            StructError::invalid_parameter("byte_offset", "window end overflows")
        })?;
        if end > self.len {
            return Err(StructError::invalid_parameter(
                "byte_offset",
                format!("window [{}, {}) exceeds buffer of {} bytes", byte_offset, end, self.len),
            ));
        }
        Ok(Self {
            backing: Arc::clone(&self.backing),
            byte_offset: self.byte_offset + byte_offset,
            len,
            ownership: Ownership::Window,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset of this buffer within its backing region
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Bytes available in the backing region
    pub fn backing_len(&self) -> usize {
        self.backing.capacity()
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Whether other execution contexts may bind this memory
    pub fn is_shareable(&self) -> bool {
        self.backing.is_shareable()
    }

    /// Pointer to the first byte of this buffer
    pub fn as_ptr(&self) -> *mut u8 {
        // byte_offset <= capacity is checked when windows are created
        unsafe { self.backing.base_ptr().add(self.byte_offset) }
    }

    /// Absolute address of the first byte
    pub fn address(&self) -> usize {
        self.as_ptr() as usize
    }

    /// Whether the address of byte `offset` is a multiple of `alignment`
    pub fn is_aligned_at(&self, offset: usize, alignment: usize) -> bool {
        (self.address() + offset) % alignment == 0
    }

    /// Kind of memory behind the buffer: `heap`, `foreign` or the mapping's
    /// backing name
    pub fn backing_name(&self) -> &'static str {
        match &*self.backing {
            Backing::Heap(_) => "heap",
            Backing::Mapped(region) => region.backing_name(),
            Backing::Foreign { .. } => "foreign",
        }
    }

    /// Flush a file-backed mapping to storage; a no-op for other backings
    pub fn flush(&self) -> Result<()> {
        match &*self.backing {
            Backing::Mapped(region) => region.flush(),
            _ => Ok(()),
        }
    }

    /// Whether two buffers refer to the same backing memory
    pub fn same_backing(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.backing, &other.backing)
    }

    /// Whether the bytes of two buffers overlap
    pub fn overlaps(&self, other: &Buffer) -> bool {
        let (a, b) = (self.address(), other.address());
        a < b + other.len && b < a + self.len
    }

    /// Copy out `len` bytes starting at `offset`
    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        self.check_range(offset, len)?;
        Ok(self.load_vec(offset, len))
    }

    /// Copy `bytes` in at `offset`
    pub fn write_bytes(&self, offset: usize, bytes: &[u8]) -> Result<()> {
        self.check_range(offset, bytes.len())?;
        self.store(offset, bytes);
        Ok(())
    }

    /// Copy of the whole buffer
    pub fn to_vec(&self) -> Vec<u8> {
        self.load_vec(0, self.len)
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(StructError::index_out_of_bounds(offset.saturating_add(len), self.len)),
        }
    }

    /// Read `N` bytes at `offset`. The range must have been validated.
    pub(crate) fn load<const N: usize>(&self, offset: usize) -> [u8; N] {
        debug_assert!(offset + N <= self.len);
        unsafe { ptr::read_unaligned(self.as_ptr().add(offset) as *const [u8; N]) }
    }

    pub(crate) fn load_vec(&self, offset: usize, len: usize) -> Vec<u8> {
        debug_assert!(offset + len <= self.len);
        let mut out = vec![0u8; len];
        unsafe { ptr::copy_nonoverlapping(self.as_ptr().add(offset), out.as_mut_ptr(), len) };
        out
    }

    /// Write `bytes` at `offset`. The range must have been validated.
    pub(crate) fn store(&self, offset: usize, bytes: &[u8]) {
        debug_assert!(offset + bytes.len() <= self.len);
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), self.as_ptr().add(offset), bytes.len()) };
    }

    pub(crate) fn fill(&self, offset: usize, len: usize, byte: u8) {
        debug_assert!(offset + len <= self.len);
        unsafe { ptr::write_bytes(self.as_ptr().add(offset), byte, len) };
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("byte_offset", &self.byte_offset)
            .field("len", &self.len)
            .field("ownership", &self.ownership)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_zeroed_and_aligned() {
        let buffer = Buffer::allocate(24).unwrap();
        assert_eq!(buffer.len(), 24);
        assert_eq!(buffer.ownership(), Ownership::Exclusive);
        assert!(!buffer.is_shareable());
        assert!(buffer.is_aligned_at(0, HEAP_ALIGNMENT));
        assert!(buffer.to_vec().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_window_aliases_parent() {
        let parent = Buffer::allocate(16).unwrap();
        let window = parent.window(4, 8).unwrap();
        assert_eq!(window.byte_offset(), 4);
        assert_eq!(window.ownership(), Ownership::Window);
        assert!(window.same_backing(&parent));
        assert!(window.overlaps(&parent));

        window.write_bytes(0, &[1, 2, 3]).unwrap();
        assert_eq!(parent.read_bytes(4, 3).unwrap(), vec![1, 2, 3]);

        let nested = window.window(2, 2).unwrap();
        assert_eq!(nested.byte_offset(), 6);
        assert_eq!(nested.read_bytes(0, 1).unwrap(), vec![3]);
    }

    #[test]
    fn test_bounds() {
        let buffer = Buffer::allocate(8).unwrap();
        assert!(buffer.window(4, 5).is_err());
        assert!(buffer.window(usize::MAX, 2).is_err());
        assert!(buffer.read_bytes(7, 2).is_err());
        assert!(buffer.write_bytes(8, &[1]).is_err());
        assert!(buffer.write_bytes(8, &[]).is_ok());
    }

    #[test]
    fn test_shared_allocation() {
        let buffer = Buffer::allocate_shared(40, &SharedBacking::Anonymous).unwrap();
        assert_eq!(buffer.ownership(), Ownership::Shared);
        assert!(buffer.is_shareable());
        let clone = buffer.clone();
        clone.write_bytes(39, &[7]).unwrap();
        assert_eq!(buffer.read_bytes(39, 1).unwrap(), vec![7]);
        assert_eq!(buffer.backing_name(), "anonymous");
        assert!(buffer.flush().is_ok());
        assert_eq!(Buffer::allocate(4).unwrap().backing_name(), "heap");
    }

    #[test]
    fn test_foreign_memory() {
        let mut backing = vec![0u64; 4];
        let buffer = unsafe { Buffer::from_raw_parts(backing.as_mut_ptr() as *mut u8, 32).unwrap() };
        assert!(buffer.is_shareable());
        buffer.write_bytes(0, &5u64.to_le_bytes()).unwrap();
        drop(buffer);
        assert_eq!(u64::from_le(backing[0]), 5);
    }

    #[test]
    fn test_zero_length() {
        let buffer = Buffer::allocate(0).unwrap();
        assert!(buffer.is_empty());
        assert!(buffer.to_vec().is_empty());
    }
}
