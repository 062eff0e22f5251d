//! Configuration types for backing regions

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StructError};

/// Natural word alignment of the platform. Supplied windows whose offset
/// is not a multiple of this draw an advisory warning when fixed-width
/// element views are enabled.
pub const WORD_ALIGNMENT: usize = 8;

/// Alignment of freshly allocated heap regions
pub const HEAP_ALIGNMENT: usize = WORD_ALIGNMENT;

/// Who owns the bytes behind a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ownership {
    /// Freshly allocated, private to one view
    Exclusive,
    /// Freshly allocated or opened mapping other contexts may bind
    Shared,
    /// Non-owning window into memory owned by the caller
    Window,
}

impl Ownership {
    pub fn name(&self) -> &'static str {
        match self {
            Ownership::Exclusive => "exclusive",
            Ownership::Shared => "shared",
            Ownership::Window => "window",
        }
    }
}

/// How a shareable region is created
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SharedBacking {
    /// Anonymous shared mapping; visible to every thread holding the buffer
    #[default]
    Anonymous,
    /// File-backed mapping; other processes map the same path
    FileBacked { path: PathBuf },
    /// Anonymous memory file descriptor (Linux-specific)
    #[cfg(target_os = "linux")]
    MemFd { name: String },
}

impl SharedBacking {
    /// Check if this backing is supported on the current platform
    pub fn is_supported(&self) -> bool {
        match self {
            SharedBacking::Anonymous | SharedBacking::FileBacked { .. } => true,
            #[cfg(target_os = "linux")]
            SharedBacking::MemFd { .. } => true,
        }
    }

    /// Human-readable name for the backing
    pub fn name(&self) -> &'static str {
        match self {
            SharedBacking::Anonymous => "anonymous",
            SharedBacking::FileBacked { .. } => "file-backed",
            #[cfg(target_os = "linux")]
            SharedBacking::MemFd { .. } => "memfd",
        }
    }
}

/// Configuration for creating or opening a mapped region
#[derive(Debug, Clone)]
pub struct RegionConfig {
    pub backing: SharedBacking,
    /// Size in bytes; 0 with `create == false` means "use the file's size"
    pub size: usize,
    /// Whether to create (and size) the backing if it does not exist
    pub create: bool,
    /// Permissions for created files (Unix permissions)
    pub permissions: u32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            backing: SharedBacking::default(),
            size: 0,
            create: true,
            permissions: 0o600,
        }
    }
}

impl RegionConfig {
    pub fn new(backing: SharedBacking, size: usize) -> Self {
        Self {
            backing,
            size,
            ..Default::default()
        }
    }

    /// Open an existing file-backed region at its current size
    pub fn open_file(path: impl Into<PathBuf>) -> Self {
        Self {
            backing: SharedBacking::FileBacked { path: path.into() },
            size: 0,
            create: false,
            ..Default::default()
        }
    }

    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.backing.is_supported() {
            return Err(StructError::invalid_parameter(
                "backing",
                format!("Backing {} is not supported on this platform", self.backing.name()),
            ));
        }

        match &self.backing {
            SharedBacking::Anonymous if !self.create => Err(StructError::invalid_parameter(
                "create",
                "Anonymous regions cannot be opened, only created",
            )),
            SharedBacking::FileBacked { path } if path.as_os_str().is_empty() => Err(
                StructError::invalid_parameter("path", "File path cannot be empty"),
            ),
            #[cfg(target_os = "linux")]
            SharedBacking::MemFd { name } if name.is_empty() => Err(StructError::invalid_parameter(
                "name",
                "memfd name cannot be empty",
            )),
            #[cfg(target_os = "linux")]
            SharedBacking::MemFd { .. } if !self.create => Err(StructError::invalid_parameter(
                "create",
                "memfd regions cannot be opened by name, only created",
            )),
            _ => Ok(()),
        }
    }
}
