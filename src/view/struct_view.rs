//! Bound views: a layout, a buffer and the accessor tree over it

use std::{fmt, sync::Arc};

use crate::{
    accessors::{AccessorBinder, Node, RecordNode},
    error::{Result, StructError},
    layout::{Layout, RecordSpec},
    memory::{Buffer, Ownership},
    types::Value,
    utf8::TextMode,
};

use super::{
    config::StructOptions,
    snapshot::{LayoutSnapshot, SnapshotHeader},
    warnings::{self, LayoutWarning},
};

/// A record bound to live memory.
///
/// The layout never changes after construction. Accessors obtained from the
/// view hold clones of the buffer handle, so they stay valid after the view
/// is dropped.
#[derive(Clone)]
pub struct StructView {
    layout: Arc<Layout>,
    buffer: Buffer,
    root: RecordNode,
    fixed_width_views: bool,
    text_mode: TextMode,
    warnings: Vec<LayoutWarning>,
}

impl StructView {
    /// Plan `spec`, allocate or bind a region and write any initial values
    pub fn new(spec: &RecordSpec, options: StructOptions) -> Result<Self> {
        options.validate()?;
        let planned = options.planner().plan_with_values(spec)?;
        let layout = Arc::new(planned.layout);
        let len = layout.byte_length();

        let buffer = match &options.buffer {
            Some(region) => region.window(options.byte_offset, len)?,
            None if options.shared => Buffer::allocate_shared(len, &options.shared_backing)?,
            None => Buffer::allocate(len)?,
        };

        let window_offset = options.buffer.as_ref().map(|_| buffer.byte_offset());
        let warnings = warnings::collect(options.align, options.fixed_width_views, window_offset);
        if options.warnings {
            warnings.iter().for_each(LayoutWarning::emit);
        }

        let max_alignment = layout.max_alignment();
        if window_offset.is_some() && options.fixed_width_views && !buffer.is_aligned_at(0, max_alignment) {
            return Err(StructError::alignment(buffer.address(), max_alignment));
        }

        let root = AccessorBinder::new(&buffer)
            .with_fixed_width_views(options.fixed_width_views)
            .with_text_mode(options.text_mode)
            .bind(&layout)?;

        for (entry, value) in layout.iter().zip(planned.values) {
            if let Some(value) = value {
                root.lookup(entry.path.as_slice())?.write(value)?;
            }
        }

        log::debug!(
            "Created {} view: {} fields, {} bytes",
            buffer.ownership().name(),
            layout.len(),
            len
        );

        Ok(Self {
            layout,
            buffer,
            root,
            fixed_width_views: options.fixed_width_views,
            text_mode: options.text_mode,
            warnings,
        })
    }

    /// Rebind a snapshot's layout to its buffer without replanning
    pub fn from_snapshot(snapshot: &LayoutSnapshot) -> Result<Self> {
        let root = AccessorBinder::new(&snapshot.buffer)
            .with_fixed_width_views(snapshot.fixed_width_views)
            .with_text_mode(snapshot.text_mode)
            .bind(&snapshot.layout)?;

        Ok(Self {
            layout: Arc::clone(&snapshot.layout),
            buffer: snapshot.buffer.clone(),
            root,
            fixed_width_views: snapshot.fixed_width_views,
            text_mode: snapshot.text_mode,
            warnings: Vec::new(),
        })
    }

    /// Rebind an encoded snapshot to `region`, an independent mapping of the
    /// same bytes
    pub fn attach(bytes: &[u8], region: &Buffer) -> Result<Self> {
        let snapshot = SnapshotHeader::from_bytes(bytes)?.bind(region)?;
        Self::from_snapshot(&snapshot)
    }

    /// Capture the structure for another context. Exclusive buffers cannot
    /// be handed out.
    pub fn snapshot(&self) -> Result<LayoutSnapshot> {
        if self.buffer.ownership() == Ownership::Exclusive {
            return Err(StructError::invalid_parameter(
                "buffer",
                "exclusive buffers cannot be snapshotted; construct with `shared` or a supplied buffer",
            ));
        }
        Ok(LayoutSnapshot {
            layout: Arc::clone(&self.layout),
            fixed_width_views: self.fixed_width_views,
            text_mode: self.text_mode,
            buffer: self.buffer.clone(),
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Root of the accessor tree
    pub fn data(&self) -> &RecordNode {
        &self.root
    }

    pub fn byte_length(&self) -> usize {
        self.layout.byte_length()
    }

    pub fn fixed_width_views(&self) -> bool {
        self.fixed_width_views
    }

    pub fn text_mode(&self) -> TextMode {
        self.text_mode
    }

    /// Warnings raised at construction, whether or not they were logged
    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    /// Top-level field by name
    pub fn field(&self, name: &str) -> Option<&Node> {
        self.root.get(name)
    }

    /// Node at a dotted path such as `d.f.0`
    pub fn get(&self, path: &str) -> Result<&Node> {
        let segments: Vec<&str> = path.split('.').collect();
        self.root.lookup(&segments)
    }

    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Result<&Node> {
        self.root.lookup(path)
    }

    /// Every field as a value tree
    pub fn read(&self) -> Value {
        self.root.read()
    }

    /// Write a (partial) value tree
    pub fn write(&self, value: &Value) -> Result<()> {
        self.root.write(value)
    }
}

impl fmt::Debug for StructView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructView")
            .field("buffer", &self.buffer)
            .field("byte_length", &self.layout.byte_length())
            .field("data", &self.root)
            .finish()
    }
}
