//! Construction options for fresh struct views

use crate::{
    error::{Result, StructError},
    layout::LayoutPlanner,
    memory::{Buffer, RegionConfig, SharedBacking},
    utf8::TextMode,
};

/// Options for [`StructView::new`](super::StructView::new)
#[derive(Debug, Clone)]
pub struct StructOptions {
    /// Allocate a shareable region instead of an exclusive one. Ignored when
    /// `buffer` is set.
    pub shared: bool,
    /// How a shareable region is created
    pub shared_backing: SharedBacking,
    /// Encoding policy for text array fields
    pub text_mode: TextMode,
    /// Reorder leaves by total size, largest first
    pub optimize_layout: bool,
    /// Pad each leaf to a multiple of its scalar size
    pub align: bool,
    /// Bind numeric arrays as zero-copy element views
    pub fixed_width_views: bool,
    /// Bind a window of this region instead of allocating
    pub buffer: Option<Buffer>,
    /// Start of the window within `buffer`. Ignored without `buffer`.
    pub byte_offset: usize,
    /// Emit advisory warnings through `log`
    pub warnings: bool,
}

impl Default for StructOptions {
    fn default() -> Self {
        Self {
            shared: false,
            shared_backing: SharedBacking::default(),
            text_mode: TextMode::FixedSlot,
            optimize_layout: false,
            align: true,
            fixed_width_views: true,
            buffer: None,
            byte_offset: 0,
            warnings: true,
        }
    }
}

impl StructOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a shareable region
    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Allocate a shareable region with a specific backing
    pub fn with_shared_backing(mut self, backing: SharedBacking) -> Self {
        self.shared = true;
        self.shared_backing = backing;
        self
    }

    pub fn with_text_mode(mut self, mode: TextMode) -> Self {
        self.text_mode = mode;
        self
    }

    pub fn with_optimize_layout(mut self, optimize: bool) -> Self {
        self.optimize_layout = optimize;
        self
    }

    pub fn with_align(mut self, align: bool) -> Self {
        self.align = align;
        self
    }

    pub fn with_fixed_width_views(mut self, enabled: bool) -> Self {
        self.fixed_width_views = enabled;
        self
    }

    /// Bind a window of `buffer` starting at `byte_offset`
    pub fn with_buffer(mut self, buffer: Buffer, byte_offset: usize) -> Self {
        self.buffer = Some(buffer);
        self.byte_offset = byte_offset;
        self
    }

    pub fn with_warnings(mut self, warnings: bool) -> Self {
        self.warnings = warnings;
        self
    }

    /// Planner configured from these options
    pub fn planner(&self) -> LayoutPlanner {
        LayoutPlanner::new(self.optimize_layout, self.align)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match &self.buffer {
            Some(buffer) if self.byte_offset > buffer.len() => {
                return Err(StructError::invalid_parameter(
                    "byte_offset",
                    format!("offset {} is past the end of a {} byte buffer", self.byte_offset, buffer.len()),
                ));
            }
            Some(_) => return Ok(()),
            None => {}
        }

        if self.shared {
            RegionConfig::new(self.shared_backing.clone(), 0).validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = StructOptions::default();
        assert!(!options.shared);
        assert!(options.align);
        assert!(options.fixed_width_views);
        assert!(!options.optimize_layout);
        assert_eq!(options.text_mode, TextMode::FixedSlot);
        assert!(options.buffer.is_none());
        assert_eq!(options.byte_offset, 0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let buffer = Buffer::allocate(16).unwrap();
        assert!(StructOptions::new().with_buffer(buffer.clone(), 16).validate().is_ok());
        assert!(StructOptions::new().with_buffer(buffer, 17).validate().is_err());

        let empty_path = SharedBacking::FileBacked { path: "".into() };
        assert!(StructOptions::new().with_shared_backing(empty_path).validate().is_err());
    }

    #[test]
    fn test_byte_offset_ignored_without_buffer() {
        let mut options = StructOptions::new();
        options.byte_offset = 1024;
        assert!(options.validate().is_ok());
    }
}
