//! Integration tests for type tags and layout planning

use shmstruct::{
    layout::{FieldBody, LayoutPlanner, RecordSpec},
    types::{PrimitiveKind, TypeDescriptor},
    StructError, StructOptions, StructView,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> RecordSpec {
        RecordSpec::new().field("a", "i8").field("b", "i64")
    }

    #[test]
    fn test_kind_sizes() {
        let expected = [1, 1, 2, 2, 4, 4, 8, 8, 2, 4, 8, 1, 1];
        for (kind, size) in PrimitiveKind::ALL.iter().zip(expected) {
            assert_eq!(kind.byte_size(), size, "{}", kind);
        }
    }

    #[test]
    fn test_type_tags() {
        let desc = TypeDescriptor::parse("u16[3][4]").unwrap();
        assert_eq!(desc.kind, PrimitiveKind::U16);
        assert_eq!(desc.dims, vec![3, 4]);
        assert_eq!(desc.total_size(), 24);

        for bad in ["", "i33", "u8[", "u8[x]", "u8[2]junk", "[2]"] {
            assert!(
                matches!(TypeDescriptor::parse(bad), Err(StructError::InvalidType { .. })),
                "accepted `{}`",
                bad
            );
        }
    }

    #[test]
    fn test_concrete_packing() {
        let aligned = LayoutPlanner::new(false, true).plan(&pair()).unwrap();
        assert_eq!(aligned.byte_length(), 16);
        assert_eq!(aligned.find(&["b"]).unwrap().offset, 8);

        let optimized = LayoutPlanner::new(true, true).plan(&pair()).unwrap();
        assert_eq!(optimized.byte_length(), 9);
        assert_eq!(optimized.entries()[0].path, vec!["b"]);

        for optimize in [false, true] {
            assert_eq!(LayoutPlanner::new(optimize, false).plan(&pair()).unwrap().byte_length(), 9);
        }
    }

    #[test]
    fn test_offsets_do_not_overlap() {
        let spec = RecordSpec::new()
            .field("a", "u8")
            .field("b", "f32[3]")
            .field("c", "u16")
            .record("d", RecordSpec::new().field("e", "f64").field("f", "bool[5]"))
            .field("g", "utf8[2][7]");
        let layout = LayoutPlanner::default().plan(&spec).unwrap();

        let mut cursor = 0;
        for entry in &layout {
            assert!(entry.offset >= cursor, "{} overlaps", entry.dotted_name());
            assert_eq!(entry.offset % entry.byte_size(), 0);
            cursor = entry.end().unwrap();
        }
        assert_eq!(layout.byte_length(), cursor);
    }

    #[test]
    fn test_nested_entries() {
        let spec = RecordSpec::new().record(
            "outer",
            RecordSpec::new().list(
                "items",
                vec![
                    FieldBody::leaf("u32"),
                    FieldBody::record(RecordSpec::new().field("x", "i16[2]")),
                ],
            ),
        );
        let layout = LayoutPlanner::default().plan(&spec).unwrap();
        let x = layout.find(&["outer", "items", "1", "x"]).unwrap();
        assert_eq!(x.array_levels, vec![false, true, false]);
        assert_eq!(x.dims, vec![2]);
        assert_eq!(x.flat_length, 2);
        assert_eq!(x.dotted_name(), "outer.items.1.x");
    }

    #[test]
    fn test_layout_is_deterministic() {
        let spec = RecordSpec::new()
            .field("a", "u8")
            .field("b", "u32[2]")
            .field("c", "u8[4]")
            .field("d", "u64");
        let planner = LayoutPlanner::new(true, true);
        assert_eq!(planner.plan(&spec).unwrap(), planner.plan(&spec).unwrap());
    }

    #[test]
    fn test_reordering_is_stable() {
        let spec = RecordSpec::new()
            .field("a", "u8[4]")
            .field("b", "u32")
            .field("c", "u16[2]")
            .field("d", "u64");
        let layout = LayoutPlanner::new(true, true).plan(&spec).unwrap();
        let order: Vec<_> = layout.iter().map(|e| e.dotted_name()).collect();
        assert_eq!(order, vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn test_zero_extent_leaf() {
        let spec = RecordSpec::new().field("a", "u8").field("z", "u32[0]").field("b", "u8");
        let layout = LayoutPlanner::default().plan(&spec).unwrap();
        assert_eq!(layout.find(&["z"]).unwrap().offset, 4);
        assert_eq!(layout.find(&["b"]).unwrap().offset, 4);
        assert_eq!(layout.byte_length(), 5);

        let view = StructView::new(&spec, StructOptions::default()).unwrap();
        assert!(view.get("z").unwrap().as_array().unwrap().is_empty());
    }

    #[test]
    fn test_zero_extent_leaf_reordered() {
        let spec = RecordSpec::new().field("a", "u8").field("z", "u32[0]").field("b", "u64");
        let layout = LayoutPlanner::new(true, true).plan(&spec).unwrap();
        let order: Vec<_> = layout.iter().map(|e| e.dotted_name()).collect();
        assert_eq!(order, vec!["b", "a", "z"]);
        assert_eq!(layout.find(&["b"]).unwrap().offset, 0);
        assert_eq!(layout.find(&["a"]).unwrap().offset, 8);
        // Still padded to its scalar size even though it occupies nothing
        assert_eq!(layout.find(&["z"]).unwrap().offset, 12);
        assert_eq!(layout.byte_length(), 12);

        let view = StructView::new(&spec, StructOptions::new().with_optimize_layout(true)).unwrap();
        let z = view.get("z").unwrap().as_array().unwrap();
        assert!(z.is_empty());
        assert!(z.is_zero_copy());
        assert_eq!(z.read(), shmstruct::Value::List(vec![]));
    }

    #[test]
    fn test_invalid_tag_fails_construction() {
        let spec = RecordSpec::new().field("a", "float32");
        assert!(matches!(
            StructView::new(&spec, StructOptions::default()),
            Err(StructError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_layout_serializes() {
        let layout = LayoutPlanner::default().plan(&pair()).unwrap();
        let bytes = bincode::serialize(&layout).unwrap();
        let restored: shmstruct::Layout = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, layout);
    }
}
