//! Layout planning: flatten the field tree, optionally reorder, place leaves

use std::collections::HashSet;

use crate::{
    error::{Result, StructError},
    types::{TypeDescriptor, Value},
};

use super::{
    entry::{Layout, LayoutEntry},
    spec::{FieldBody, RecordSpec},
};

/// Computes byte layouts from field specifications.
///
/// Planning is a pure function of the specification and the two flags, so
/// independent planners given the same input produce identical offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutPlanner {
    /// Stable-sort leaves by total size, largest first, before placement.
    /// Changes physical field order.
    pub optimize: bool,
    /// Place every leaf at a multiple of its scalar size
    pub align: bool,
}

impl Default for LayoutPlanner {
    fn default() -> Self {
        Self {
            optimize: false,
            align: true,
        }
    }
}

/// A leaf collected during flattening, before placement
#[derive(Debug)]
struct FlatLeaf<'a> {
    path: Vec<String>,
    array_levels: Vec<bool>,
    desc: TypeDescriptor,
    value: Option<&'a Value>,
}

/// A placed leaf together with its initial value, if any
#[derive(Debug)]
pub(crate) struct PlannedLayout<'a> {
    pub layout: Layout,
    pub values: Vec<Option<&'a Value>>,
}

impl LayoutPlanner {
    pub fn new(optimize: bool, align: bool) -> Self {
        Self { optimize, align }
    }

    /// Compute the layout for `spec`
    pub fn plan(&self, spec: &RecordSpec) -> Result<Layout> {
        Ok(self.plan_with_values(spec)?.layout)
    }

    pub(crate) fn plan_with_values<'a>(&self, spec: &'a RecordSpec) -> Result<PlannedLayout<'a>> {
        let mut leaves = Vec::new();
        flatten_record(spec, &mut Vec::new(), &mut Vec::new(), &mut leaves)?;

        if self.optimize {
            // sort_by is stable: equal sizes keep declaration order
            leaves.sort_by(|a, b| b.desc.total_size().cmp(&a.desc.total_size()));
        }

        let mut cursor = 0usize;
        let mut entries = Vec::with_capacity(leaves.len());
        let mut values = Vec::with_capacity(leaves.len());
        for leaf in leaves {
            if self.align {
                cursor = checked_align_up(cursor, leaf.desc.byte_size()).ok_or_else(overflow)?;
            }
            entries.push(LayoutEntry {
                path: leaf.path,
                offset: cursor,
                kind: leaf.desc.kind,
                flat_length: leaf.desc.flat_length(),
                dims: leaf.desc.dims.clone(),
                array_levels: leaf.array_levels,
            });
            values.push(leaf.value);
            cursor = cursor.checked_add(leaf.desc.total_size()).ok_or_else(overflow)?;
        }

        Ok(PlannedLayout {
            layout: Layout::new(entries, cursor),
            values,
        })
    }
}

/// Round `value` up to a multiple of `align` (a power of two)
pub fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

fn checked_align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    value.checked_add(align - 1).map(|v| v & !(align - 1))
}

fn overflow() -> StructError {
    StructError::invalid_parameter("spec", "layout length overflows the address space")
}

fn flatten_record<'a>(
    spec: &'a RecordSpec,
    prefix: &mut Vec<String>,
    levels: &mut Vec<bool>,
    out: &mut Vec<FlatLeaf<'a>>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for field in &spec.fields {
        if !seen.insert(field.name.as_str()) {
            let mut path = prefix.clone();
            path.push(field.name.clone());
            return Err(StructError::invalid_parameter(
                "spec",
                format!("duplicate field `{}`", path.join(".")),
            ));
        }
        flatten_body(&field.name, &field.body, prefix, levels, out)?;
    }
    Ok(())
}

fn flatten_body<'a>(
    name: &str,
    body: &'a FieldBody,
    prefix: &mut Vec<String>,
    levels: &mut Vec<bool>,
    out: &mut Vec<FlatLeaf<'a>>,
) -> Result<()> {
    match body {
        FieldBody::Leaf { tag, value } => {
            let desc = TypeDescriptor::parse(tag)?;
            let mut path = prefix.clone();
            path.push(name.to_string());
            out.push(FlatLeaf {
                path,
                array_levels: levels.clone(),
                desc,
                value: value.as_ref(),
            });
        }
        FieldBody::Record(sub) => {
            prefix.push(name.to_string());
            levels.push(false);
            let result = flatten_record(sub, prefix, levels, out);
            prefix.pop();
            levels.pop();
            result?;
        }
        FieldBody::List(items) => {
            prefix.push(name.to_string());
            levels.push(true);
            let result = items
                .iter()
                .enumerate()
                .try_for_each(|(i, item)| flatten_body(&i.to_string(), item, prefix, levels, out));
            prefix.pop();
            levels.pop();
            result?;
        }
    }
    Ok(())
}
