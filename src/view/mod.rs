//! Struct views: construction, warnings and snapshots

pub mod config;
pub mod snapshot;
pub mod struct_view;
pub mod warnings;

pub use config::StructOptions;
pub use snapshot::{LayoutSnapshot, SnapshotHeader, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
pub use struct_view::StructView;
pub use warnings::LayoutWarning;
