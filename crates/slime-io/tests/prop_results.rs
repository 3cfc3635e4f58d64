use proptest::prelude::*;
use slime_core::{MaskRecord, MaskStats};
use slime_geom::Position;
use slime_io::{format_record, parse_line};

proptest! {
    // A written row reads back as the same position, whichever field is found first.
    #[test]
    fn written_rows_parse_back(
        bx in -30_000_000i32..=30_000_000,
        bz in -30_000_000i32..=30_000_000,
        block_size in 0u32..=73_984,
        chunk_size in 0u32..=289,
    ) {
        let record = MaskRecord {
            position: Position::from_block(bx, bz),
            stats: MaskStats {
                block_size,
                chunk_size,
                block_surface_area: 49_640,
                chunk_surface_area: 222,
            },
        };
        let line = format_record(&record);
        prop_assert_eq!(line.split(';').count(), 4);
        prop_assert_eq!(parse_line(&line), Some(record.position));
        let chunk_field = line.split(';').nth(1).unwrap();
        prop_assert_eq!(parse_line(chunk_field), Some(record.position));
    }
}
