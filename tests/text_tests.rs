//! Integration tests for text fields under both encoding policies

use shmstruct::{RecordSpec, StructOptions, StructView, TextMode, Value};

#[cfg(test)]
mod tests {
    use super::*;

    fn names(mode: TextMode) -> StructView {
        let spec = RecordSpec::new().field("names", "utf8[4][10]");
        StructView::new(&spec, StructOptions::new().with_text_mode(mode)).unwrap()
    }

    #[test]
    fn test_fixed_slot_mode() {
        let view = names(TextMode::FixedSlot);
        let field = view.get("names").unwrap();
        field.write(&Value::from(vec!["a", "b", "c"])).unwrap();
        assert_eq!(field.read(), Value::from(vec!["a", "b", "c", ""]));

        let bytes = view.buffer().to_vec();
        assert_eq!(bytes[10], b'b');
        assert_eq!(bytes[20], b'c');
        assert!(bytes[30..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_stream_mode() {
        let view = names(TextMode::Stream);
        let field = view.get("names").unwrap();
        field.write(&Value::from(vec!["a", "b", "c"])).unwrap();
        assert_eq!(field.read(), Value::from(vec!["abc", "", "", ""]));
        assert_eq!(&view.buffer().to_vec()[..4], b"abc\0");
    }

    #[test]
    fn test_slot_access() {
        let view = names(TextMode::FixedSlot);
        let slots = view.get("names").unwrap().as_text().unwrap().as_slots().unwrap();
        assert_eq!(slots.slot_count(), 4);
        assert_eq!(slots.slot_width(), 10);

        slots.set(3, "fourth").unwrap();
        slots.set(0, "first").unwrap();
        assert_eq!(slots.read_all(), vec!["first", "", "", "fourth"]);
        assert_eq!(slots.flat_text(), "first");
    }

    #[test]
    fn test_too_long_strings_are_cut_on_code_points() {
        let view = names(TextMode::FixedSlot);
        let slots = view.get("names").unwrap().as_text().unwrap().as_slots().unwrap();
        slots.set(0, "ééééééé").unwrap();
        assert_eq!(slots.get(0).unwrap(), "ééééé");

        let stream = names(TextMode::Stream);
        let slots = stream.get("names").unwrap().as_text().unwrap().as_slots().unwrap();
        let long = "x".repeat(50);
        slots.write_all(&[long.as_str()]).unwrap();
        assert_eq!(slots.get(0).unwrap().len(), 40);
    }

    #[test]
    fn test_too_many_strings_in_fixed_mode() {
        let view = names(TextMode::FixedSlot);
        let five = Value::from(vec!["1", "2", "3", "4", "5"]);
        assert!(view.get("names").unwrap().write(&five).is_err());

        let stream = names(TextMode::Stream);
        stream.get("names").unwrap().write(&five).unwrap();
        assert_eq!(stream.get("names").unwrap().read(), Value::from(vec!["12345", "", "", ""]));
    }

    #[test]
    fn test_single_char_field() {
        let spec = RecordSpec::new().field_with("c", "utf8", "Q").field_with("m", "utf8", "ü");
        let view = StructView::new(&spec, StructOptions::default()).unwrap();
        assert_eq!(view.byte_length(), 2);
        assert_eq!(view.get("c").unwrap().read(), Value::from("Q"));
        // Only the first code unit of a multi-byte code point is stored
        assert_eq!(view.buffer().read_bytes(1, 1).unwrap(), vec![0xC3]);
        assert_eq!(view.get("m").unwrap().read(), Value::from("\u{FFFD}"));
    }

    #[test]
    fn test_single_string_field() {
        let spec = RecordSpec::new().field_with("label", "utf8[12]", "sensor-7");
        let view = StructView::new(&spec, StructOptions::default()).unwrap();
        assert_eq!(view.get("label").unwrap().read(), Value::from("sensor-7"));
    }

    #[test]
    fn test_text_mode_survives_snapshot() {
        let spec = RecordSpec::new().field("names", "utf8[2][4]");
        let view = StructView::new(
            &spec,
            StructOptions::new().with_shared(true).with_text_mode(TextMode::Stream),
        )
        .unwrap();
        view.get("names").unwrap().write(&Value::from(vec!["abc", "def"])).unwrap();

        let other = StructView::from_snapshot(&view.snapshot().unwrap()).unwrap();
        assert_eq!(other.text_mode(), TextMode::Stream);
        assert_eq!(other.get("names").unwrap().read(), Value::from(vec!["abcdef", ""]));
    }
}
