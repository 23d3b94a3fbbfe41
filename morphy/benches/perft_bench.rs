extern crate criterion;
extern crate morphy;

use criterion::{criterion_group, criterion_main, Criterion};

use morphy::board::perft::perft;
use morphy::board::Board;

fn bench_perft(c: &mut Criterion) {
    let board = Board::start_pos();
    c.bench_function("perft 3 start position", |b| {
        b.iter(|| perft(&board, 3))
    });

    let kiwipete = Board::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    c.bench_function("perft 2 kiwipete", |b| b.iter(|| perft(&kiwipete, 2)));
}

fn bench_movegen(c: &mut Criterion) {
    let board = Board::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    c.bench_function("movegen kiwipete", |b| b.iter(|| board.generate_moves()));
}

criterion_group!(benches, bench_perft, bench_movegen);
criterion_main!(benches);
