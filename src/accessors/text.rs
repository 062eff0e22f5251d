//! Text accessors over `utf8` leaves

use std::fmt;

use crate::{
    error::{Result, StructError},
    memory::Buffer,
    types::Value,
    utf8::{decode_cstr, decode_slots, encode_slots, truncate_utf8, TextMode},
};

use super::scalar::ScalarField;

/// A `utf8` leaf
#[derive(Clone)]
pub enum TextField {
    /// Dimensionless `utf8`: one byte, one code unit
    Char(ScalarField),
    /// `utf8[..][W]`: fixed-width string slots
    Slots(TextArray),
}

impl TextField {
    pub fn read(&self) -> Value {
        match self {
            TextField::Char(c) => c.get(),
            TextField::Slots(t) => t.read(),
        }
    }

    pub fn write(&self, value: &Value) -> Result<()> {
        match self {
            TextField::Char(c) => c.set_value(value),
            TextField::Slots(t) => t.write(value),
        }
    }

    pub fn as_slots(&self) -> Option<&TextArray> {
        match self {
            TextField::Slots(t) => Some(t),
            TextField::Char(_) => None,
        }
    }
}

impl fmt::Debug for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.read())
    }
}

/// Fixed-width string slots. The innermost extent is the slot width in
/// bytes, the outer extents count the slots.
#[derive(Clone)]
pub struct TextArray {
    buffer: Buffer,
    offset: usize,
    dims: Vec<usize>,
    slot_width: usize,
    slot_count: usize,
    mode: TextMode,
}

impl TextArray {
    pub(crate) fn new(buffer: Buffer, offset: usize, dims: &[usize], mode: TextMode) -> Self {
        let (slot_width, outer) = match dims.split_last() {
            Some((&w, outer)) => (w, outer),
            None => (1, &[][..]),
        };
        let slot_count = outer.iter().product();
        debug_assert!(offset + slot_width * slot_count <= buffer.len());
        Self {
            buffer,
            offset,
            dims: dims.to_vec(),
            slot_width,
            slot_count,
            mode,
        }
    }

    pub fn mode(&self) -> TextMode {
        self.mode
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn slot_width(&self) -> usize {
        self.slot_width
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    fn region_len(&self) -> usize {
        self.slot_count * self.slot_width
    }

    fn region(&self) -> Vec<u8> {
        self.buffer.load_vec(self.offset, self.region_len())
    }

    /// String in slot `index`. In stream mode slot 0 holds the whole stream
    /// and every other slot reads empty.
    pub fn get(&self, index: usize) -> Result<String> {
        self.check_index(index)?;
        match self.mode {
            TextMode::FixedSlot => {
                let start = self.offset + index * self.slot_width;
                Ok(decode_cstr(&self.buffer.load_vec(start, self.slot_width)))
            }
            TextMode::Stream if index == 0 => Ok(self.flat_text()),
            TextMode::Stream => Ok(String::new()),
        }
    }

    /// Replace the string in slot `index`. In stream mode only slot 0 is
    /// writable, and it rewrites the whole stream.
    pub fn set(&self, index: usize, text: &str) -> Result<()> {
        self.check_index(index)?;
        match self.mode {
            TextMode::FixedSlot => {
                let start = self.offset + index * self.slot_width;
                let bytes = truncate_utf8(text, self.slot_width).as_bytes();
                self.buffer.fill(start, self.slot_width, 0);
                self.buffer.store(start, bytes);
                Ok(())
            }
            TextMode::Stream if index == 0 => self.write_all(&[text]),
            TextMode::Stream => Err(StructError::invalid_parameter(
                "index",
                format!("stream text is written through slot 0, not {}", index),
            )),
        }
    }

    /// Every slot, decoded under the field's mode
    pub fn read_all(&self) -> Vec<String> {
        decode_slots(&self.region(), self.slot_count, self.slot_width, self.mode)
    }

    /// Encode `strings` over the whole region, clearing unused bytes
    pub fn write_all<S: AsRef<str>>(&self, strings: &[S]) -> Result<()> {
        let bytes = encode_slots(strings, self.slot_count, self.slot_width, self.mode)?;
        self.buffer.store(self.offset, &bytes);
        Ok(())
    }

    /// The whole region as one NUL-terminated string
    pub fn flat_text(&self) -> String {
        decode_cstr(&self.region())
    }

    /// A single slot reads as text; more slots read as a (nested) list
    pub fn read(&self) -> Value {
        let strings = self.read_all();
        if self.dims.len() <= 1 {
            return Value::Text(strings.into_iter().next().unwrap_or_default());
        }
        let mut items = strings.into_iter().map(Value::Text);
        nest(&mut items, &self.dims[..self.dims.len() - 1])
    }

    pub fn write(&self, value: &Value) -> Result<()> {
        let strings = value
            .flatten()
            .into_iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| StructError::kind_mismatch("utf8", v.type_name()))
            })
            .collect::<Result<Vec<_>>>()?;
        self.write_all(&strings)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.slot_count {
            return Err(StructError::index_out_of_bounds(index, self.slot_count));
        }
        Ok(())
    }
}

impl fmt::Debug for TextArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.read_all()).finish()
    }
}

fn nest(items: &mut impl Iterator<Item = Value>, dims: &[usize]) -> Value {
    match dims.split_first() {
        Some((&n, [])) => Value::List(items.take(n).collect()),
        Some((&n, rest)) => Value::List((0..n).map(|_| nest(items, rest)).collect()),
        None => Value::List(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveKind;

    fn array(dims: &[usize], mode: TextMode) -> (Buffer, TextArray) {
        let len = dims.iter().product();
        let buffer = Buffer::allocate(len).unwrap();
        let text = TextArray::new(buffer.clone(), 0, dims, mode);
        (buffer, text)
    }

    #[test]
    fn test_fixed_slots() {
        let (_, text) = array(&[4, 10], TextMode::FixedSlot);
        text.write(&Value::from(vec!["a", "b", "c"])).unwrap();
        assert_eq!(text.read_all(), vec!["a", "b", "c", ""]);
        assert_eq!(text.get(2).unwrap(), "c");

        text.set(1, "longer than ten bytes").unwrap();
        assert_eq!(text.get(1).unwrap(), "longer tha");
        assert!(text.set(4, "x").is_err());
    }

    #[test]
    fn test_set_clears_slot() {
        let (_, text) = array(&[2, 6], TextMode::FixedSlot);
        text.set(0, "abcdef").unwrap();
        text.set(0, "xy").unwrap();
        assert_eq!(text.get(0).unwrap(), "xy");
    }

    #[test]
    fn test_stream() {
        let (_, text) = array(&[4, 10], TextMode::Stream);
        text.write(&Value::from(vec!["a", "b", "c"])).unwrap();
        assert_eq!(text.read_all(), vec!["abc", "", "", ""]);
        assert_eq!(text.read(), Value::from(vec!["abc", "", "", ""]));

        text.set(0, "streamed across slots").unwrap();
        assert_eq!(text.get(0).unwrap(), "streamed across slots");
        assert_eq!(text.get(3).unwrap(), "");
        assert!(text.set(1, "x").is_err());
    }

    #[test]
    fn test_single_string() {
        let (_, text) = array(&[8], TextMode::FixedSlot);
        text.write(&Value::from("hello")).unwrap();
        assert_eq!(text.read(), Value::from("hello"));
    }

    #[test]
    fn test_nested_text() {
        let (_, text) = array(&[2, 2, 3], TextMode::FixedSlot);
        text.write(&Value::from(vec![vec!["a", "b"], vec!["c", "d"]])).unwrap();
        assert_eq!(text.read(), Value::from(vec![vec!["a", "b"], vec!["c", "d"]]));
    }

    #[test]
    fn test_char_field() {
        let buffer = Buffer::allocate(1).unwrap();
        let field = TextField::Char(ScalarField::new(buffer, 0, PrimitiveKind::Utf8));
        field.write(&Value::from("Z")).unwrap();
        assert_eq!(field.read(), Value::from("Z"));
        assert!(field.write(&Value::from(3)).is_err());
    }

    #[test]
    fn test_non_text_rejected() {
        let (_, text) = array(&[2, 4], TextMode::FixedSlot);
        assert!(matches!(
            text.write(&Value::from(vec![1, 2])),
            Err(StructError::KindMismatch { .. })
        ));
    }
}
