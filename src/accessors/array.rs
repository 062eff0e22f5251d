//! Array accessors: fixed-width element views, per-element fallbacks and
//! multi-dimensional reshaping

use std::fmt;

use crate::{
    error::{Result, StructError},
    memory::Buffer,
    types::{PrimitiveKind, Value},
};

use super::{
    node::{ListNode, Node},
    scalar::{read_scalar, write_scalar, ScalarField},
    typed::{Element, TypedView},
};

/// Zero-copy view over `len` aligned elements of one kind
#[derive(Clone)]
pub struct ElementView {
    buffer: Buffer,
    offset: usize,
    len: usize,
    kind: PrimitiveKind,
}

impl ElementView {
    /// Create a view; the first element's address must be a multiple of the
    /// element size
    pub(crate) fn new(buffer: Buffer, offset: usize, len: usize, kind: PrimitiveKind) -> Result<Self> {
        let align = kind.byte_size();
        if !buffer.is_aligned_at(offset, align) {
            return Err(StructError::alignment(buffer.address() + offset, align));
        }
        debug_assert!(offset + len * align <= buffer.len());
        Ok(Self {
            buffer,
            offset,
            len,
            kind,
        })
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte offset within the bound region
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Address of the first element
    pub fn address(&self) -> usize {
        self.buffer.address() + self.offset
    }

    pub fn get(&self, index: usize) -> Result<Value> {
        self.check_index(index)?;
        Ok(read_scalar(&self.buffer, self.offset + index * self.kind.byte_size(), self.kind))
    }

    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.set_value(index, &value.into())
    }

    pub fn set_value(&self, index: usize, value: &Value) -> Result<()> {
        self.check_index(index)?;
        write_scalar(&self.buffer, self.offset + index * self.kind.byte_size(), self.kind, value)
    }

    /// Statically typed view over the same bytes
    pub fn typed<T: Element>(&self) -> Result<TypedView<T>> {
        if T::KIND != self.kind {
            return Err(StructError::kind_mismatch(self.kind.name(), T::KIND.name()));
        }
        TypedView::new(self.buffer.clone(), self.offset, self.len)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(StructError::index_out_of_bounds(index, self.len));
        }
        Ok(())
    }
}

/// Index-addressable sequence of independent scalar accessors, used when
/// fixed-width views are disabled or the kind has none
#[derive(Clone)]
pub struct ScalarSeq {
    buffer: Buffer,
    offset: usize,
    len: usize,
    kind: PrimitiveKind,
}

impl ScalarSeq {
    pub(crate) fn new(buffer: Buffer, offset: usize, len: usize, kind: PrimitiveKind) -> Self {
        Self {
            buffer,
            offset,
            len,
            kind,
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Accessor for element `index`, at `offset + index * byte_size`
    pub fn accessor(&self, index: usize) -> Option<ScalarField> {
        (index < self.len).then(|| {
            ScalarField::new(self.buffer.clone(), self.offset + index * self.kind.byte_size(), self.kind)
        })
    }

    pub fn get(&self, index: usize) -> Result<Value> {
        self.accessor(index)
            .map(|a| a.get())
            .ok_or_else(|| StructError::index_out_of_bounds(index, self.len))
    }

    pub fn set_value(&self, index: usize, value: &Value) -> Result<()> {
        self.accessor(index)
            .ok_or_else(|| StructError::index_out_of_bounds(index, self.len))?
            .set_value(value)
    }
}

/// A one-dimensional array leaf
#[derive(Clone)]
pub enum ArrayField {
    /// Zero-copy element view
    Elements(ElementView),
    /// Per-element scalar accessors
    Scalars(ScalarSeq),
}

impl ArrayField {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            ArrayField::Elements(v) => v.kind(),
            ArrayField::Scalars(s) => s.kind(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayField::Elements(v) => v.len(),
            ArrayField::Scalars(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this array aliases the buffer through a fixed-width view
    pub fn is_zero_copy(&self) -> bool {
        matches!(self, ArrayField::Elements(_))
    }

    pub fn elements(&self) -> Option<&ElementView> {
        match self {
            ArrayField::Elements(v) => Some(v),
            ArrayField::Scalars(_) => None,
        }
    }

    /// Statically typed view; only available for fixed-width views
    pub fn typed<T: Element>(&self) -> Result<TypedView<T>> {
        match self {
            ArrayField::Elements(v) => v.typed(),
            ArrayField::Scalars(_) => Err(StructError::invalid_parameter(
                "fixed_width_views",
                "array is bound with per-element accessors",
            )),
        }
    }

    pub fn get(&self, index: usize) -> Result<Value> {
        match self {
            ArrayField::Elements(v) => v.get(index),
            ArrayField::Scalars(s) => s.get(index),
        }
    }

    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.set_value(index, &value.into())
    }

    pub fn set_value(&self, index: usize, value: &Value) -> Result<()> {
        match self {
            ArrayField::Elements(v) => v.set_value(index, value),
            ArrayField::Scalars(s) => s.set_value(index, value),
        }
    }

    /// All elements, in order
    pub fn to_values(&self) -> Vec<Value> {
        (0..self.len()).filter_map(|i| self.get(i).ok()).collect()
    }

    pub fn read(&self) -> Value {
        Value::List(self.to_values())
    }

    /// Write a (possibly nested) list starting at element 0; a scalar
    /// writes element 0
    pub fn write(&self, value: &Value) -> Result<()> {
        let flat = value.flatten();
        if flat.len() > self.len() {
            return Err(StructError::invalid_parameter(
                "value",
                format!("{} elements for an array of {}", flat.len(), self.len()),
            ));
        }
        flat.into_iter()
            .enumerate()
            .try_for_each(|(i, v)| self.set_value(i, v))
    }
}

impl fmt::Debug for ArrayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_values()).finish()
    }
}

/// A multi-dimensional array leaf: nested rows over the same bytes plus a
/// flat view of the whole leaf
#[derive(Clone)]
pub struct NestedArray {
    dims: Vec<usize>,
    rows: Vec<Node>,
    flat: ArrayField,
}

impl NestedArray {
    /// `make_array(offset, len)` builds each innermost row and the flat view
    pub(crate) fn build(
        offset: usize,
        kind: PrimitiveKind,
        dims: &[usize],
        make_array: &dyn Fn(usize, usize) -> Result<ArrayField>,
    ) -> Result<Self> {
        debug_assert!(dims.len() > 1);
        let flat_len: usize = dims.iter().product();
        let rows = build_rows(offset, kind.byte_size(), dims, make_array)?;
        Ok(Self {
            dims: dims.to_vec(),
            rows,
            flat: make_array(offset, flat_len)?,
        })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.flat.kind()
    }

    /// Rows along the outermost dimension
    pub fn rows(&self) -> &[Node] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Node> {
        self.rows.get(index)
    }

    /// The innermost array addressed by all but the last index
    pub fn inner(&self, outer: &[usize]) -> Option<&ArrayField> {
        if outer.len() + 1 != self.dims.len() {
            return None;
        }
        let (first, rest) = outer.split_first()?;
        let mut node = self.rows.get(*first)?;
        for &i in rest {
            node = node.index(i)?;
        }
        node.as_array()
    }

    /// Element at a full index, one entry per dimension
    pub fn get(&self, index: &[usize]) -> Result<Value> {
        self.flat.get(self.flat_index(index)?)
    }

    pub fn set(&self, index: &[usize], value: impl Into<Value>) -> Result<()> {
        self.flat.set_value(self.flat_index(index)?, &value.into())
    }

    /// One-dimensional view spanning the whole leaf
    pub fn flat_view(&self) -> &ArrayField {
        &self.flat
    }

    pub fn read(&self) -> Value {
        Value::List(self.rows.iter().map(Node::read).collect())
    }

    pub fn write(&self, value: &Value) -> Result<()> {
        self.flat.write(value)
    }

    fn flat_index(&self, index: &[usize]) -> Result<usize> {
        if index.len() != self.dims.len() {
            return Err(StructError::invalid_parameter(
                "index",
                format!("{} indices for {} dimensions", index.len(), self.dims.len()),
            ));
        }
        index.iter().zip(&self.dims).try_fold(0usize, |acc, (&i, &d)| {
            if i >= d {
                Err(StructError::index_out_of_bounds(i, d))
            } else {
                Ok(acc * d + i)
            }
        })
    }
}

impl fmt::Debug for NestedArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.rows).finish()
    }
}

/// Rows for `dims[0]`, recursing until the last two dimensions, whose
/// inner extent becomes a one-dimensional array of `dims[last]` elements
fn build_rows(
    offset: usize,
    byte_size: usize,
    dims: &[usize],
    make_array: &dyn Fn(usize, usize) -> Result<ArrayField>,
) -> Result<Vec<Node>> {
    let (&outer, rest) = dims
        .split_first()
        .ok_or_else(|| StructError::invalid_parameter("dims", "empty dimension list"))?;
    let stride: usize = rest.iter().product::<usize>() * byte_size;

    (0..outer)
        .map(|i| {
            let row_offset = offset + i * stride;
            if rest.len() == 1 {
                Ok(Node::Array(make_array(row_offset, rest[0])?))
            } else {
                Ok(Node::List(ListNode::new(build_rows(row_offset, byte_size, rest, make_array)?)))
            }
        })
        .collect()
}
