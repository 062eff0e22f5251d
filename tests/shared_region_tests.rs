//! Integration tests for shared regions and layout reconstruction

use std::{
    sync::{atomic::Ordering, Arc, Barrier},
    thread,
};

use tempfile::TempDir;
use shmstruct::{
    view::{SNAPSHOT_MAGIC, SNAPSHOT_VERSION},
    Buffer, Layout, LayoutEntry, Ownership, PrimitiveKind, RecordSpec, RegionConfig, SharedBacking,
    SnapshotHeader, StructError, StructOptions, StructView, TextMode, Value,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_spec() -> RecordSpec {
        RecordSpec::new()
            .field("tag", "u8")
            .field("count", "i32[1]")
            .field("hits", "u64[4]")
    }

    #[test]
    fn test_snapshot_addresses_same_bytes() {
        let view = StructView::new(&counter_spec(), StructOptions::new().with_shared(true)).unwrap();
        assert_eq!(view.buffer().ownership(), Ownership::Shared);

        let other = StructView::from_snapshot(&view.snapshot().unwrap()).unwrap();
        assert_eq!(other.layout(), view.layout());
        assert_eq!(other.buffer().address(), view.buffer().address());

        other.get("tag").unwrap().write(&Value::from(9u8)).unwrap();
        assert_eq!(view.get("tag").unwrap().read(), Value::UInt(9));
    }

    #[test]
    fn test_atomic_increments_across_threads() {
        const THREADS: usize = 4;
        const ROUNDS: i32 = 1000;

        let view = StructView::new(&counter_spec(), StructOptions::new().with_shared(true)).unwrap();
        let snapshot = view.snapshot().unwrap();
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let snapshot = snapshot.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let local = StructView::from_snapshot(&snapshot).unwrap();
                    let count = local.get("count").unwrap().as_array().unwrap().typed::<i32>().unwrap();
                    let hits = local.get("hits").unwrap().as_array().unwrap().typed::<u64>().unwrap();
                    barrier.wait();
                    for _ in 0..ROUNDS {
                        count.atomics()[0].fetch_add(1, Ordering::SeqCst);
                        hits.atomics()[t].fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let count = view.get("count").unwrap().as_array().unwrap();
        assert_eq!(count.get(0).unwrap(), Value::Int(THREADS as i64 * ROUNDS as i64));
        assert_eq!(
            view.get("hits").unwrap().read(),
            Value::from(vec![ROUNDS as u64; THREADS])
        );
    }

    #[test]
    fn test_file_backed_attach() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("region");

        let spec = RecordSpec::new()
            .field_with("seq", "u64", 41u64)
            .field_with("name", "utf8[16]", "writer")
            .field_with("data", "f32[2][2]", vec![vec![1.0f32, 2.0], vec![3.0, 4.0]]);
        let writer = StructView::new(
            &spec,
            StructOptions::new().with_shared_backing(SharedBacking::FileBacked { path: path.clone() }),
        )
        .unwrap();
        let header = writer.snapshot().unwrap().to_bytes().unwrap();

        // An independent mapping of the same file, as another process would open it
        let region = Buffer::open_shared(&RegionConfig::open_file(&path)).unwrap();
        assert!(!region.same_backing(writer.buffer()));
        let reader = StructView::attach(&header, &region).unwrap();

        assert_eq!(reader.read(), writer.read());
        reader.get("seq").unwrap().write(&Value::from(42u64)).unwrap();
        assert_eq!(writer.get("seq").unwrap().read(), Value::UInt(42));
        assert_eq!(reader.get("name").unwrap().read(), Value::from("writer"));
    }

    #[test]
    fn test_header_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let region_path = temp_dir.path().join("region");
        let header_path = temp_dir.path().join("region.layout");

        let writer = StructView::new(
            &counter_spec(),
            StructOptions::new().with_shared_backing(SharedBacking::FileBacked { path: region_path.clone() }),
        )
        .unwrap();
        writer.snapshot().unwrap().write_to(&header_path).unwrap();
        writer.get("tag").unwrap().write(&Value::from(5u8)).unwrap();

        let header = SnapshotHeader::read_from(&header_path).unwrap();
        let region = Buffer::open_shared(&RegionConfig::open_file(&region_path)).unwrap();
        let reader = StructView::from_snapshot(&header.bind(&region).unwrap()).unwrap();
        assert_eq!(reader.get("tag").unwrap().read(), Value::UInt(5));
    }

    #[test]
    fn test_windowed_snapshot_keeps_offset() {
        let region = Buffer::allocate_shared(256, &SharedBacking::Anonymous).unwrap();
        let view = StructView::new(&counter_spec(), StructOptions::new().with_buffer(region.clone(), 64)).unwrap();
        view.get("tag").unwrap().write(&Value::from(7u8)).unwrap();

        let header = view.snapshot().unwrap().to_bytes().unwrap();
        let attached = StructView::attach(&header, &region).unwrap();
        assert_eq!(attached.buffer().byte_offset(), 64);
        assert_eq!(attached.get("tag").unwrap().read(), Value::UInt(7));

        let too_small = Buffer::allocate_shared(32, &SharedBacking::Anonymous).unwrap();
        assert!(StructView::attach(&header, &too_small).is_err());
    }

    #[test]
    fn test_exclusive_views_cannot_be_shared() {
        let view = StructView::new(&counter_spec(), StructOptions::default()).unwrap();
        assert!(matches!(view.snapshot(), Err(StructError::InvalidParameter { .. })));
    }

    fn crafted_header(entry: LayoutEntry, byte_length: usize) -> Vec<u8> {
        let header = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
            layout: Layout::new(vec![entry], byte_length),
            fixed_width_views: false,
            text_mode: TextMode::FixedSlot,
            byte_offset: 0,
            byte_length,
        };
        bincode::serialize(&header).unwrap()
    }

    #[test]
    fn test_attach_rejects_overflowing_entries() {
        let region = Buffer::allocate_shared(8, &SharedBacking::Anonymous).unwrap();

        let wild_offset = LayoutEntry {
            path: vec!["x".to_string()],
            offset: usize::MAX - 3,
            kind: PrimitiveKind::U64,
            flat_length: 1,
            dims: vec![],
            array_levels: vec![],
        };
        assert!(wild_offset.end().is_none());
        assert!(matches!(
            StructView::attach(&crafted_header(wild_offset, 8), &region),
            Err(StructError::InvalidParameter { .. })
        ));

        // Extents whose product wraps to the declared flat length
        let wrapping_dims = LayoutEntry {
            path: vec!["x".to_string()],
            offset: 0,
            kind: PrimitiveKind::U8,
            flat_length: 0,
            dims: vec![1 << 32, 1 << 32],
            array_levels: vec![],
        };
        assert!(matches!(
            StructView::attach(&crafted_header(wrapping_dims, 8), &region),
            Err(StructError::InvalidParameter { .. })
        ));

        let oversized = LayoutEntry {
            path: vec!["x".to_string()],
            offset: 0,
            kind: PrimitiveKind::U64,
            flat_length: usize::MAX / 4,
            dims: vec![usize::MAX / 4],
            array_levels: vec![],
        };
        assert!(matches!(
            StructView::attach(&crafted_header(oversized, 8), &region),
            Err(StructError::InvalidParameter { .. })
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_memfd_backing() {
        let backing = SharedBacking::MemFd { name: "shmstruct-test".to_string() };
        let view = StructView::new(&counter_spec(), StructOptions::new().with_shared_backing(backing)).unwrap();
        let other = StructView::from_snapshot(&view.snapshot().unwrap()).unwrap();
        other.get("hits").unwrap().as_array().unwrap().set(2, 11u64).unwrap();
        assert_eq!(view.get("hits").unwrap().as_array().unwrap().get(2).unwrap(), Value::UInt(11));
    }
}
