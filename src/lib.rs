//! # shmstruct - Zero-Copy Structured Views over Raw Memory
//!
//! shmstruct describes a fixed-shape, possibly nested record, computes a
//! deterministic byte layout for it and binds a tree of live accessors
//! directly to a byte region. Reads and writes go straight to the region,
//! so the same bytes can be shared with binary protocols, foreign runtimes
//! or other threads and processes.
//!
//! ## Features
//!
//! - **Deterministic layouts**: natural alignment, optional size-descending
//!   reordering, exact packing
//! - **Zero-copy accessors**: scalars, fixed-width element views,
//!   multi-dimensional reshaping, nested records and lists
//! - **Text fields**: fixed-slot and stream UTF-8 encodings
//! - **Shared regions**: anonymous, file-backed and memfd mappings
//! - **Reconstruction**: rebind a captured layout in another thread or
//!   process without replanning
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │  RecordSpec  │──▶│ LayoutPlanner│──▶│      Layout      │
//! │  (type tags) │   │              │   │ (LayoutEntry...) │
//! └──────────────┘   └──────────────┘   └────────┬─────────┘
//!                                                 │   ┌──────────────┐
//!        LayoutSnapshot ─────────────────────────┼──▶│AccessorBinder│
//!                                                 │   └──────┬───────┘
//!                                       ┌─────────▼──────┐   │
//!                                       │     Buffer     │◀──┘
//!                                       │ heap/mmap/raw  │
//!                                       └────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use shmstruct::{RecordSpec, StructOptions, StructView, Value};
//!
//! let spec = RecordSpec::new()
//!     .field_with("id", "u32", 7u32)
//!     .field("samples", "f32[2][3]")
//!     .field("name", "utf8[16]");
//!
//! let view = StructView::new(&spec, StructOptions::default())?;
//! view.get("samples")?.write(&Value::from(vec![vec![1.0f32, 2.0, 3.0], vec![4.0, 5.0, 6.0]]))?;
//! view.get("name")?.write(&Value::from("sensor"))?;
//!
//! assert_eq!(view.get("id")?.read(), Value::UInt(7));
//! assert_eq!(view.get("name")?.read(), Value::from("sensor"));
//! # Ok::<(), shmstruct::StructError>(())
//! ```

pub mod accessors;
pub mod error;
pub mod layout;
pub mod memory;
pub mod types;
pub mod utf8;
pub mod view;

// Main API re-exports
pub use accessors::{
    AccessorBinder, ArrayField, AtomicElement, Element, ElementView, ListNode, NestedArray, Node, RecordNode,
    ScalarField, ScalarSeq, TextArray, TextField, TypedView,
};
pub use error::{Result, StructError};
pub use layout::{align_up, FieldBody, FieldSpec, Layout, LayoutEntry, LayoutPlanner, RecordSpec};
pub use memory::{Buffer, MappedRegion, Ownership, RegionConfig, SharedBacking};
pub use types::{PrimitiveKind, TypeDescriptor, Value};
pub use utf8::TextMode;
pub use view::{LayoutSnapshot, LayoutWarning, SnapshotHeader, StructOptions, StructView};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 3;
pub const VERSION_PATCH: u32 = 0;
