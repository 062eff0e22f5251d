//! Backing memory: exclusive heap blocks, shareable mappings, windows

pub mod buffer;
pub mod config;
pub mod regions;

pub use buffer::Buffer;
pub use config::{Ownership, RegionConfig, SharedBacking, HEAP_ALIGNMENT, WORD_ALIGNMENT};
pub use regions::MappedRegion;
