//! Field specifications and deterministic byte layouts
//!
//! Leaves are placed in declaration order (or by descending total size when
//! optimizing), each at the next multiple of its scalar size when aligning.
//! The region length is the final cursor position; there is no trailing
//! padding.

pub mod entry;
pub mod planner;
pub mod spec;

pub use entry::{Layout, LayoutEntry};
pub use planner::{align_up, LayoutPlanner};
pub use spec::{FieldBody, FieldSpec, RecordSpec};
