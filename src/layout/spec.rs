//! Field specification tree
//!
//! A [`RecordSpec`] is the caller's description of a record before any
//! layout exists: named fields, each either a typed leaf (with an optional
//! initial value), a keyed sub-record, or an indexed list of sub-fields.

use crate::types::Value;

/// One node of a field specification
#[derive(Debug, Clone, PartialEq)]
pub enum FieldBody {
    /// A primitive field described by a type tag such as `f32[2][3]`
    Leaf { tag: String, value: Option<Value> },
    /// A keyed sub-record
    Record(RecordSpec),
    /// An index-addressable sub-record; children are named `0`, `1`, ...
    List(Vec<FieldBody>),
}

impl FieldBody {
    /// A leaf with no initial value
    pub fn leaf(tag: impl Into<String>) -> Self {
        FieldBody::Leaf {
            tag: tag.into(),
            value: None,
        }
    }

    /// A leaf with an initial value
    pub fn leaf_with(tag: impl Into<String>, value: impl Into<Value>) -> Self {
        FieldBody::Leaf {
            tag: tag.into(),
            value: Some(value.into()),
        }
    }

    pub fn record(spec: RecordSpec) -> Self {
        FieldBody::Record(spec)
    }

    pub fn list(items: Vec<FieldBody>) -> Self {
        FieldBody::List(items)
    }
}

/// A named field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub body: FieldBody,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, body: FieldBody) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

/// Ordered set of named fields; the root of every specification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSpec {
    pub fields: Vec<FieldSpec>,
}

impl RecordSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf field without an initial value
    pub fn field(mut self, name: impl Into<String>, tag: impl Into<String>) -> Self {
        self.fields.push(FieldSpec::new(name, FieldBody::leaf(tag)));
        self
    }

    /// Add a leaf field with an initial value
    pub fn field_with(
        mut self,
        name: impl Into<String>,
        tag: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.fields.push(FieldSpec::new(name, FieldBody::leaf_with(tag, value)));
        self
    }

    /// Add a keyed sub-record
    pub fn record(mut self, name: impl Into<String>, spec: RecordSpec) -> Self {
        self.fields.push(FieldSpec::new(name, FieldBody::Record(spec)));
        self
    }

    /// Add an indexed sub-record
    pub fn list(mut self, name: impl Into<String>, items: Vec<FieldBody>) -> Self {
        self.fields.push(FieldSpec::new(name, FieldBody::List(items)));
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
