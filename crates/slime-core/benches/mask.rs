use criterion::{Criterion, black_box, criterion_group, criterion_main};

use slime_core::{Mask, MaskParams, MaskShape, SearchPath};
use slime_geom::{Direction, Point, Position};

fn bench_mask_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask_moves");
    let params = MaskParams {
        world_seed: 0x5EED,
        ..MaskParams::default()
    };
    let start = Position::new(Point::new(1000, -1000), Point::new(8, 8));

    group.bench_function("move_by_chunk_east", |b| {
        let mut mask = Mask::new(params.clone(), start);
        b.iter(|| {
            mask.move_by_chunk(Direction::East);
            black_box(mask.stats());
        })
    });
    group.bench_function("move_to_next_chunk", |b| {
        let mut mask = Mask::new(params.clone(), start);
        let mut chunk = start.chunk;
        b.iter(|| {
            chunk = chunk.step(Direction::East, 1);
            mask.move_to(Position::new(chunk, start.offset));
            black_box(mask.stats());
        })
    });
    group.bench_function("move_to_new_offset", |b| {
        let mut mask = Mask::new(params.clone(), start);
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % 256;
            mask.move_to(Position::new(start.chunk, Point::new(i / 16, i % 16)));
            black_box(mask.stats());
        })
    });
    group.finish();
}

fn bench_mask_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask_build");
    group.sample_size(20);
    for shape in [MaskShape::Exact, MaskShape::Floor] {
        let params = MaskParams {
            shape,
            ..MaskParams::default()
        };
        group.bench_function(format!("{shape:?}").to_lowercase(), |b| {
            b.iter(|| black_box(Mask::new(params.clone(), Position::default()).stats()))
        });
    }
    group.finish();
}

fn bench_spiral_walk(c: &mut Criterion) {
    let params = MaskParams::default();
    c.bench_function("spiral_walk_32x32", |b| {
        b.iter(|| {
            let mut path = SearchPath::new(Point::ORIGIN, 0, 32);
            let mut mask: Option<Mask> = None;
            let mut prev: Option<Point> = None;
            let mut total = 0u64;
            while let Some(chunk) = path.step() {
                let m = mask.get_or_insert_with(|| {
                    Mask::new(params.clone(), Position::new(chunk, Point::ORIGIN))
                });
                if let Some(dir) = prev.and_then(|p| Direction::between(p, chunk)) {
                    m.move_by_chunk(dir);
                }
                prev = Some(chunk);
                total += u64::from(m.block_size());
            }
            black_box(total)
        })
    });
}

criterion_group!(benches, bench_mask_moves, bench_mask_build, bench_spiral_walk);
criterion_main!(benches);
