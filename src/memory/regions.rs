//! Memory-mapped shareable regions

use std::{
    fs::{File, OpenOptions},
    os::unix::fs::OpenOptionsExt,
    path::Path,
    ptr::NonNull,
};

use memmap2::{MmapMut, MmapOptions};

use crate::error::{Result, StructError};

use super::config::{RegionConfig, SharedBacking};

/// A mapping that can be bound by several threads, or by several processes
/// when file-backed.
#[derive(Debug)]
pub struct MappedRegion {
    /// Base pointer captured once from the mutable mapping
    base: NonNull<u8>,
    /// Logical size in bytes; the mapping itself is at least one byte
    size: usize,
    backing_name: &'static str,
    mmap: MmapMut,
    /// Keeps file-backed and memfd descriptors open for the mapping's life
    _file: Option<File>,
}

// The mapping is only reached through `base`; callers synchronise access.
unsafe impl Send for MappedRegion {}
unsafe impl Sync for MappedRegion {}

impl MappedRegion {
    /// Create or open a region
    pub fn new(config: &RegionConfig) -> Result<Self> {
        config.validate()?;

        let (file, size) = match &config.backing {
            SharedBacking::Anonymous => (None, config.size),
            SharedBacking::FileBacked { path } => {
                let (file, size) = Self::open_file_backing(path, config)?;
                (Some(file), size)
            }
            #[cfg(target_os = "linux")]
            SharedBacking::MemFd { name } => (Some(Self::create_memfd_backing(name, config.size)?), config.size),
        };

        let mut mmap = Self::create_mapping(file.as_ref(), size)?;
        let base = NonNull::new(mmap.as_mut_ptr())
            .ok_or_else(|| StructError::platform("Mapping returned a null pointer"))?;

        log::debug!("mapped {} region of {} bytes", config.backing.name(), size);

        Ok(Self {
            base,
            size,
            backing_name: config.backing.name(),
            mmap,
            _file: file,
        })
    }

    /// Create or open file-backed storage, returning the usable size
    fn open_file_backing(path: &Path, config: &RegionConfig) -> Result<(File, usize)> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(config.create)
            .truncate(false)
            .mode(config.permissions)
            .open(path)
            .map_err(|e| StructError::from_io(e, "Failed to create/open file"))?;

        let current = file
            .metadata()
            .map_err(|e| StructError::from_io(e, "Failed to stat file"))?
            .len() as usize;

        let size = if config.size == 0 { current } else { config.size };
        if size == 0 && !config.create {
            // Mapping needs at least one byte and an opened file is never resized
            return Err(StructError::invalid_parameter(
                "size",
                format!("{} is empty", path.display()),
            ));
        }
        if current < size {
            if !config.create {
                return Err(StructError::invalid_parameter(
                    "size",
                    format!("file holds {} bytes, {} requested", current, size),
                ));
            }
            file.set_len(size as u64)
                .map_err(|e| StructError::from_io(e, "Failed to set file size"))?;
        }

        Ok((file, size))
    }

    /// Create memfd-backed storage
    #[cfg(target_os = "linux")]
    fn create_memfd_backing(name: &str, size: usize) -> Result<File> {
        use nix::sys::memfd::{memfd_create, MemFdCreateFlag};
        use std::ffi::CString;

        let name_cstr = CString::new(name)
            .map_err(|_| StructError::invalid_parameter("name", "Name contains null bytes"))?;

        let owned_fd = memfd_create(name_cstr.as_c_str(), MemFdCreateFlag::MFD_CLOEXEC)
            .map_err(|e| StructError::platform(format!("Failed to create memfd: {}", e)))?;

        let file = File::from(owned_fd);
        file.set_len(size.max(1) as u64)
            .map_err(|e| StructError::from_io(e, "Failed to set memfd size"))?;
        Ok(file)
    }

    /// Map the backing storage; anonymous when there is no file
    fn create_mapping(file: Option<&File>, size: usize) -> Result<MmapMut> {
        // Zero-length mappings are rejected by the OS
        let map_len = size.max(1);
        match file {
            Some(f) if size == 0 => {
                f.set_len(1)
                    .map_err(|e| StructError::from_io(e, "Failed to set file size"))?;
                unsafe { MmapOptions::new().len(map_len).map_mut(f) }
                    .map_err(|e| StructError::from_io(e, "Failed to create memory mapping"))
            }
            Some(f) => unsafe { MmapOptions::new().len(map_len).map_mut(f) }
                .map_err(|e| StructError::from_io(e, "Failed to create memory mapping")),
            None => MmapMut::map_anon(map_len)
                .map_err(|e| StructError::from_io(e, "Failed to create anonymous mapping")),
        }
    }

    /// Base address of the mapping
    pub fn as_ptr(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    /// Logical size of the region
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn backing_name(&self) -> &'static str {
        self.backing_name
    }

    /// Flush changes to persistent storage (for file-backed regions)
    pub fn flush(&self) -> Result<()> {
        self.mmap
            .flush()
            .map_err(|e| StructError::from_io(e, "Failed to flush memory mapping"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_region() {
        let region = MappedRegion::new(&RegionConfig::new(SharedBacking::Anonymous, 128)).unwrap();
        assert_eq!(region.size(), 128);
        assert_eq!(region.as_ptr() as usize % 4096, 0);
        assert_eq!(region.backing_name(), "anonymous");
    }

    #[test]
    fn test_file_backed_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.bin");

        let first = MappedRegion::new(&RegionConfig::new(
            SharedBacking::FileBacked { path: path.clone() },
            64,
        ))
        .unwrap();
        unsafe { first.as_ptr().add(10).write(0xAB) };
        first.flush().unwrap();

        let second = MappedRegion::new(&RegionConfig::open_file(&path)).unwrap();
        assert_eq!(second.size(), 64);
        assert_eq!(unsafe { second.as_ptr().add(10).read() }, 0xAB);
    }

    #[test]
    fn test_open_empty_file_leaves_it_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::File::create(&path).unwrap();

        let err = MappedRegion::new(&RegionConfig::open_file(&path)).unwrap_err();
        assert!(matches!(err, StructError::InvalidParameter { .. }));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_memfd_region() {
        let region = MappedRegion::new(&RegionConfig::new(
            SharedBacking::MemFd { name: "shmstruct_test".into() },
            32,
        ))
        .unwrap();
        assert_eq!(region.size(), 32);
        assert_eq!(region.backing_name(), "memfd");
    }
}
