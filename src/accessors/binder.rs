//! Builds accessor trees from a layout and a buffer

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::{
    error::{Result, StructError},
    layout::{Layout, LayoutEntry},
    memory::Buffer,
    types::PrimitiveKind,
    utf8::TextMode,
};

use super::{
    array::{ArrayField, ElementView, NestedArray, ScalarSeq},
    node::{ListNode, Node, RecordNode},
    scalar::ScalarField,
    text::{TextArray, TextField},
};

/// Binds layouts to one buffer.
///
/// Offsets are taken from the layout verbatim, so two binders given the
/// same layout and the same bytes produce trees that address identical
/// memory.
#[derive(Debug, Clone)]
pub struct AccessorBinder<'a> {
    buffer: &'a Buffer,
    fixed_width_views: bool,
    text_mode: TextMode,
}

/// Intermediate tree while entries are placed
enum Pending {
    Keyed(IndexMap<String, Pending>),
    Indexed(BTreeMap<usize, Pending>),
    Done(Node),
}

impl<'a> AccessorBinder<'a> {
    pub fn new(buffer: &'a Buffer) -> Self {
        Self {
            buffer,
            fixed_width_views: true,
            text_mode: TextMode::default(),
        }
    }

    /// Use per-element accessors instead of zero-copy element views
    pub fn with_fixed_width_views(mut self, enabled: bool) -> Self {
        self.fixed_width_views = enabled;
        self
    }

    pub fn with_text_mode(mut self, mode: TextMode) -> Self {
        self.text_mode = mode;
        self
    }

    /// Bind every entry of `layout` and return the root record
    pub fn bind(&self, layout: &Layout) -> Result<RecordNode> {
        layout.validate(self.buffer.len())?;

        let mut root = Pending::Keyed(IndexMap::new());
        for entry in layout {
            let node = self.bind_leaf(entry)?;
            place(&mut root, entry, node)?;
        }

        log::debug!(
            "Bound {} fields over {} bytes at {:#x} (fixed-width views: {})",
            layout.len(),
            layout.byte_length(),
            self.buffer.address(),
            self.fixed_width_views
        );

        match finish(root) {
            Node::Record(record) => Ok(record),
            _ => Err(StructError::invalid_parameter("layout", "root is not a record")),
        }
    }

    fn bind_leaf(&self, entry: &LayoutEntry) -> Result<Node> {
        let buffer = self.buffer.clone();
        let (offset, kind) = (entry.offset, entry.kind);

        if kind == PrimitiveKind::Utf8 {
            let text = if entry.dims.is_empty() {
                TextField::Char(ScalarField::new(buffer, offset, kind))
            } else {
                TextField::Slots(TextArray::new(buffer, offset, &entry.dims, self.text_mode))
            };
            return Ok(Node::Text(text));
        }

        match entry.dims.as_slice() {
            [] => Ok(Node::Scalar(ScalarField::new(buffer, offset, kind))),
            [len] => Ok(Node::Array(self.array_field(offset, *len, kind)?)),
            dims => {
                let make = |o, l| self.array_field(o, l, kind);
                Ok(Node::NestedArray(NestedArray::build(offset, kind, dims, &make)?))
            }
        }
    }

    fn array_field(&self, offset: usize, len: usize, kind: PrimitiveKind) -> Result<ArrayField> {
        if self.fixed_width_views && kind.supports_element_view() {
            Ok(ArrayField::Elements(ElementView::new(self.buffer.clone(), offset, len, kind)?))
        } else {
            Ok(ArrayField::Scalars(ScalarSeq::new(self.buffer.clone(), offset, len, kind)))
        }
    }
}

/// Insert `node` at the entry's path, creating intermediate records and
/// lists as the entry's array flags dictate
fn place(root: &mut Pending, entry: &LayoutEntry, node: Node) -> Result<()> {
    let conflict = || {
        StructError::invalid_parameter(
            "layout",
            format!("conflicting entries at `{}`", entry.dotted_name()),
        )
    };
    let (leaf, parents) = entry.path.split_last().ok_or_else(conflict)?;

    let mut current = root;
    for (segment, &is_array) in parents.iter().zip(&entry.array_levels) {
        let make = || {
            if is_array {
                Pending::Indexed(BTreeMap::new())
            } else {
                Pending::Keyed(IndexMap::new())
            }
        };
        let (next, _) = child(current, segment, make).ok_or_else(conflict)?;
        if !matches!((&*next, is_array), (Pending::Indexed(_), true) | (Pending::Keyed(_), false)) {
            return Err(conflict());
        }
        current = next;
    }

    match child(current, leaf, || Pending::Done(node)) {
        Some((_, true)) => Ok(()),
        _ => Err(conflict()),
    }
}

/// The child of `parent` named `segment`, inserted with `make` when absent.
/// The flag reports whether it was inserted.
fn child<'p>(parent: &'p mut Pending, segment: &str, make: impl FnOnce() -> Pending) -> Option<(&'p mut Pending, bool)> {
    match parent {
        Pending::Keyed(map) => {
            let created = !map.contains_key(segment);
            Some((map.entry(segment.to_string()).or_insert_with(make), created))
        }
        Pending::Indexed(map) => {
            let index: usize = segment.parse().ok()?;
            let created = !map.contains_key(&index);
            Some((map.entry(index).or_insert_with(make), created))
        }
        Pending::Done(_) => None,
    }
}

fn finish(pending: Pending) -> Node {
    match pending {
        Pending::Keyed(map) => Node::Record(RecordNode::new(
            map.into_iter().map(|(k, v)| (k, finish(v))).collect(),
        )),
        Pending::Indexed(mut map) => {
            let len = map.keys().next_back().map_or(0, |last| last + 1);
            // Items with no leaves leave gaps; they bind as empty records.
            let items = (0..len)
                .map(|i| map.remove(&i).map_or_else(|| Node::Record(RecordNode::default()), finish))
                .collect();
            Node::List(ListNode::new(items))
        }
        Pending::Done(node) => node,
    }
}
