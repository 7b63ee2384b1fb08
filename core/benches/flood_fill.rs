use criterion::{Criterion, criterion_group, criterion_main};
use sapeur_core::{Game, Minefield};

fn bench_flood_fill(c: &mut Criterion) {
    // bomb-free 64x64 board: opening a corner cascades across the whole grid
    let minefield = Minefield::from_mine_coords((64, 64), &[]).unwrap();

    c.bench_function("flood_fill_64x64", |b| {
        b.iter(|| {
            let mut game = Game::from_minefield(minefield.clone());
            game.open((0, 0)).unwrap()
        })
    });
}

criterion_group!(benches, bench_flood_fill);
criterion_main!(benches);
