//! UTF-8 text slots
//!
//! A text leaf `utf8[..][W]` is a run of fixed-width slots, `W` bytes each.
//! Two mutually exclusive policies decide how a list of strings maps onto
//! the slots:
//!
//! - [`TextMode::FixedSlot`]: string `i` lives in slot `i`, NUL-padded.
//! - [`TextMode::Stream`]: the strings are joined into one stream written
//!   from the first byte; reading yields the whole NUL-terminated stream in
//!   slot 0 and empty strings elsewhere.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StructError};

/// Encoding policy for text array fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextMode {
    #[default]
    FixedSlot,
    Stream,
}

/// Decode bytes as UTF-8 up to the first NUL. Invalid sequences decode
/// as U+FFFD.
pub fn decode_cstr(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a
/// code point
pub fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Encode `strings` into a region of `slot_count * slot_width` bytes.
///
/// Strings longer than their space are cut at the last whole code point.
/// Unused bytes are NUL.
pub fn encode_slots<S: AsRef<str>>(
    strings: &[S],
    slot_count: usize,
    slot_width: usize,
    mode: TextMode,
) -> Result<Vec<u8>> {
    let region_len = slot_count * slot_width;
    let mut out = vec![0u8; region_len];
    match mode {
        TextMode::FixedSlot => {
            if strings.len() > slot_count {
                return Err(StructError::invalid_parameter(
                    "value",
                    format!("{} strings for {} slots", strings.len(), slot_count),
                ));
            }
            for (i, s) in strings.iter().enumerate() {
                let bytes = truncate_utf8(s.as_ref(), slot_width).as_bytes();
                let start = i * slot_width;
                out[start..start + bytes.len()].copy_from_slice(bytes);
            }
        }
        TextMode::Stream => {
            let joined: String = strings.iter().map(AsRef::as_ref).collect();
            let bytes = truncate_utf8(&joined, region_len).as_bytes();
            out[..bytes.len()].copy_from_slice(bytes);
        }
    }
    Ok(out)
}

/// Decode a region of `slot_count * slot_width` bytes into `slot_count`
/// strings
pub fn decode_slots(region: &[u8], slot_count: usize, slot_width: usize, mode: TextMode) -> Vec<String> {
    debug_assert_eq!(region.len(), slot_count * slot_width);
    match mode {
        TextMode::FixedSlot => (0..slot_count)
            .map(|i| decode_cstr(&region[i * slot_width..(i + 1) * slot_width]))
            .collect(),
        TextMode::Stream => {
            let mut out = vec![String::new(); slot_count];
            if let Some(first) = out.first_mut() {
                *first = decode_cstr(region);
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_slot() {
        let bytes = encode_slots(&["a", "b", "c"], 4, 10, TextMode::FixedSlot).unwrap();
        assert_eq!(bytes.len(), 40);
        assert_eq!(bytes[0], b'a');
        assert_eq!(bytes[10], b'b');
        assert_eq!(bytes[20], b'c');
        assert_eq!(decode_slots(&bytes, 4, 10, TextMode::FixedSlot), vec!["a", "b", "c", ""]);
    }

    #[test]
    fn test_stream() {
        let bytes = encode_slots(&["a", "b", "c"], 4, 10, TextMode::Stream).unwrap();
        assert_eq!(&bytes[..4], b"abc\0");
        assert_eq!(decode_slots(&bytes, 4, 10, TextMode::Stream), vec!["abc", "", "", ""]);
    }

    #[test]
    fn test_stream_spans_slots() {
        let bytes = encode_slots(&["123", "456789"], 2, 6, TextMode::Stream).unwrap();
        assert_eq!(decode_slots(&bytes, 2, 6, TextMode::Stream), vec!["123456789", ""]);
        // The same bytes read slot by slot
        assert_eq!(decode_slots(&bytes, 2, 6, TextMode::FixedSlot), vec!["123456", "789"]);
    }

    #[test]
    fn test_truncation_keeps_code_points() {
        assert_eq!(truncate_utf8("héllo", 2), "h");
        assert_eq!(truncate_utf8("héllo", 3), "hé");
        let bytes = encode_slots(&["日本語"], 1, 4, TextMode::FixedSlot).unwrap();
        assert_eq!(decode_cstr(&bytes), "日");
    }

    #[test]
    fn test_too_many_strings() {
        assert!(encode_slots(&["a", "b", "c"], 2, 4, TextMode::FixedSlot).is_err());
        assert!(encode_slots(&["a", "b", "c"], 2, 4, TextMode::Stream).is_ok());
    }

    #[test]
    fn test_decode_cstr() {
        assert_eq!(decode_cstr(b"hello\0world"), "hello");
        assert_eq!(decode_cstr(b"full"), "full");
        assert_eq!(decode_cstr(&[0xff, b'a', 0]), "\u{FFFD}a");
    }
}
