//! Advisory warnings raised while building a view

use std::fmt;

use crate::memory::WORD_ALIGNMENT;

/// Non-fatal conditions detected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutWarning {
    /// Alignment padding is off while fixed-width element views are on
    UnalignedLayoutWithViews,
    /// The supplied window does not start on a word boundary while
    /// fixed-width element views are on
    UnalignedWindowOffset { byte_offset: usize },
}

impl LayoutWarning {
    /// Log the warning
    pub fn emit(&self) {
        log::warn!("{}", self);
    }
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutWarning::UnalignedLayoutWithViews => write!(
                f,
                "alignment is disabled while fixed-width views are enabled; misaligned arrays will fail to bind"
            ),
            LayoutWarning::UnalignedWindowOffset { byte_offset } => write!(
                f,
                "byte offset {} is not a multiple of {}; fixed-width views may fail to bind",
                byte_offset, WORD_ALIGNMENT
            ),
        }
    }
}

/// Warnings for a fresh view built with these settings
pub(crate) fn collect(align: bool, fixed_width_views: bool, window_offset: Option<usize>) -> Vec<LayoutWarning> {
    let mut warnings = Vec::new();
    if !fixed_width_views {
        return warnings;
    }
    if !align {
        warnings.push(LayoutWarning::UnalignedLayoutWithViews);
    }
    if let Some(byte_offset) = window_offset.filter(|o| o % WORD_ALIGNMENT != 0) {
        warnings.push(LayoutWarning::UnalignedWindowOffset { byte_offset });
    }
    warnings
}
