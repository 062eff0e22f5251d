//! The accessor tree

use std::fmt;

use indexmap::IndexMap;

use crate::{
    error::{Result, StructError},
    types::Value,
};

use super::{
    array::{ArrayField, NestedArray},
    scalar::ScalarField,
    text::TextField,
};

/// One node of a bound accessor tree. The shape is fixed when the tree is
/// bound; every leaf reads and writes the live buffer.
#[derive(Clone)]
pub enum Node {
    Record(RecordNode),
    List(ListNode),
    Scalar(ScalarField),
    Array(ArrayField),
    NestedArray(NestedArray),
    Text(TextField),
}

impl Node {
    /// Variant name, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Record(_) => "record",
            Node::List(_) => "list",
            Node::Scalar(_) => "scalar",
            Node::Array(_) => "array",
            Node::NestedArray(_) => "nested array",
            Node::Text(_) => "text",
        }
    }

    /// Named child of a record node
    pub fn field(&self, name: &str) -> Option<&Node> {
        self.as_record()?.get(name)
    }

    /// Indexed child of a list node or a row of a nested array
    pub fn index(&self, index: usize) -> Option<&Node> {
        match self {
            Node::List(list) => list.get(index),
            Node::NestedArray(nested) => nested.row(index),
            _ => None,
        }
    }

    /// Child addressed by one path segment: a name for records, a decimal
    /// index for lists and nested arrays
    pub fn child(&self, segment: &str) -> Option<&Node> {
        match self {
            Node::Record(record) => record.get(segment),
            _ => self.index(segment.parse().ok()?),
        }
    }

    pub fn as_record(&self) -> Option<&RecordNode> {
        match self {
            Node::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListNode> {
        match self {
            Node::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarField> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayField> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&NestedArray> {
        match self {
            Node::NestedArray(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextField> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Snapshot the subtree as a value tree
    pub fn read(&self) -> Value {
        match self {
            Node::Record(r) => r.read(),
            Node::List(l) => l.read(),
            Node::Scalar(s) => s.get(),
            Node::Array(a) => a.read(),
            Node::NestedArray(n) => n.read(),
            Node::Text(t) => t.read(),
        }
    }

    /// Write a value tree into the subtree. Records accept a subset of
    /// their fields; lists accept a prefix of their items.
    pub fn write(&self, value: &Value) -> Result<()> {
        match self {
            Node::Record(r) => r.write(value),
            Node::List(l) => l.write(value),
            Node::Scalar(s) => s.set_value(value),
            Node::Array(a) => a.write(value),
            Node::NestedArray(n) => n.write(value),
            Node::Text(t) => t.write(value),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Record(r) => r.fmt(f),
            Node::List(l) => l.fmt(f),
            Node::Scalar(s) => s.fmt(f),
            Node::Array(a) => a.fmt(f),
            Node::NestedArray(n) => n.fmt(f),
            Node::Text(t) => t.fmt(f),
        }
    }
}

/// Keyed children in layout order
#[derive(Clone, Default)]
pub struct RecordNode {
    fields: IndexMap<String, Node>,
}

impl RecordNode {
    pub(crate) fn new(fields: IndexMap<String, Node>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Walk a path of names and indices from this record
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Result<&Node> {
        let not_found = || {
            StructError::field_not_found(path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("."))
        };
        let (first, rest) = path.split_first().ok_or_else(not_found)?;
        let mut node = self.get(first.as_ref()).ok_or_else(not_found)?;
        for segment in rest {
            node = node.child(segment.as_ref()).ok_or_else(not_found)?;
        }
        Ok(node)
    }

    pub fn read(&self) -> Value {
        Value::Record(self.fields.iter().map(|(k, v)| (k.clone(), v.read())).collect())
    }

    pub fn write(&self, value: &Value) -> Result<()> {
        let values = value
            .as_record()
            .ok_or_else(|| StructError::kind_mismatch("record", value.type_name()))?;
        for (name, v) in values {
            self.get(name)
                .ok_or_else(|| StructError::field_not_found(name.clone()))?
                .write(v)?;
        }
        Ok(())
    }
}

impl fmt::Debug for RecordNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

/// Index-addressable children
#[derive(Clone, Default)]
pub struct ListNode {
    items: Vec<Node>,
}

impl ListNode {
    pub(crate) fn new(items: Vec<Node>) -> Self {
        Self { items }
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn read(&self) -> Value {
        Value::List(self.items.iter().map(Node::read).collect())
    }

    pub fn write(&self, value: &Value) -> Result<()> {
        let values = value
            .as_list()
            .ok_or_else(|| StructError::kind_mismatch("list", value.type_name()))?;
        if values.len() > self.items.len() {
            return Err(StructError::index_out_of_bounds(values.len() - 1, self.items.len()));
        }
        self.items.iter().zip(values).try_for_each(|(node, v)| node.write(v))
    }
}

impl fmt::Debug for ListNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}
