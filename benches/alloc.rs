use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use firstfit_rs::MemorySpace;

pub fn bench_memory_space(c: &mut Criterion) {
    c.bench_function("memory_space_allocate_1k", |b| {
        b.iter_batched(
            || MemorySpace::new(1 << 20),
            |mut space| {
                for i in 0..1_000 {
                    black_box(space.allocate(black_box(1 + i % 64)));
                }
                black_box(space)
            },
            BatchSize::SmallInput,
        )
    });

    // every other block released, so allocations scan a fragmented free list
    c.bench_function("memory_space_allocate_fragmented", |b| {
        b.iter_batched(
            || {
                let mut space = MemorySpace::new(1 << 20);
                let bases: Vec<usize> = (0..2_000).filter_map(|_| space.allocate(16)).collect();
                for base in bases.iter().step_by(2) {
                    space.release(*base);
                }
                space
            },
            |mut space| {
                for _ in 0..100 {
                    black_box(space.allocate(black_box(32)));
                }
                black_box(space)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("memory_space_defragment_2k", |b| {
        b.iter_batched(
            || {
                let mut space = MemorySpace::new(1 << 20);
                let bases: Vec<usize> = (0..2_000).filter_map(|_| space.allocate(16)).collect();
                for base in bases.iter().rev() {
                    space.release(*base);
                }
                space
            },
            |mut space| {
                space.defragment();
                black_box(space)
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_memory_space);
criterion_main!(benches);
