//! Live accessor trees over bound buffers
//!
//! [`AccessorBinder`] turns a [`Layout`](crate::layout::Layout) into a tree
//! of [`Node`]s. Nodes hold no copies of field values: every read and write
//! goes to the buffer.

pub mod array;
pub mod binder;
pub mod node;
pub mod scalar;
pub mod text;
pub mod typed;

pub use array::{ArrayField, ElementView, NestedArray, ScalarSeq};
pub use binder::AccessorBinder;
pub use node::{ListNode, Node, RecordNode};
pub use scalar::ScalarField;
pub use text::{TextArray, TextField};
pub use typed::{AtomicElement, Element, TypedView};
