use criterion::{black_box, criterion_group, criterion_main, Criterion};
use crossword_engine::{
    generate_moves, BoardLayout, Game, LeaveTable, Lexicon, MoveGenArgs, MoveList,
    MoveRecordType, MoveSortType, Rack, TileSet,
};

const WORDS: &[&str] = &[
    "AT", "TA", "AN", "NA", "TAN", "ANT", "NET", "TEN", "EAT", "TEA", "ATE", "ETA", "NEAT",
    "ANTE", "RAT", "TAR", "ART", "STAR", "RATS", "ARTS", "TSAR", "EAR", "ERA", "ARE", "SEA",
    "EATS", "SEAT", "TEAS", "EAST", "ORE", "ROE", "TOE", "OAT", "OATS", "NOTE", "TONE",
    "STONE", "ONSET", "IRE", "SIR", "RISE", "TIES", "SITE", "SIN", "INS", "NIT", "TIN",
    "TINS", "SNIT", "LINE", "LINT", "LIST", "SILT", "SLIT", "VORTEX", "VEX", "QUIRKED",
];

fn bench_movegen(c: &mut Criterion) {
    let tileset = TileSet::default();
    let lexicon = Lexicon::from_words(WORDS, &tileset).unwrap();
    let leaves = LeaveTable::empty();
    let layout = BoardLayout::standard15();
    let mut game = Game::new(&tileset, &layout, [&lexicon, &lexicon], [&leaves, &leaves], 7);
    let mut rows = vec![String::from("..............."); 15];
    rows[7] = String::from("....STONE......");
    rows[8] = String::from("....T..........");
    rows[9] = String::from("....ANTE.......");
    game.load_position(&rows, ["AEINRST", "AEILOTU"], [24, 18], 0, 0)
        .unwrap();

    let args = MoveGenArgs {
        record_type: MoveRecordType::All,
        sort_type: MoveSortType::Equity,
        ..MoveGenArgs::default()
    };
    let mut list = MoveList::new(4096);
    c.bench_function("generate_all_midgame", |b| {
        b.iter(|| {
            generate_moves(&game, &args, &mut list);
            black_box(list.count())
        })
    });

    let best_args = MoveGenArgs {
        record_type: MoveRecordType::Best,
        sort_type: MoveSortType::Equity,
        ..MoveGenArgs::default()
    };
    let mut best = MoveList::new(1);
    c.bench_function("generate_best_midgame", |b| {
        b.iter(|| {
            generate_moves(&game, &best_args, &mut best);
            black_box(best.count())
        })
    });

    let mut opening = Game::new(&tileset, &layout, [&lexicon, &lexicon], [&leaves, &leaves], 7);
    opening
        .set_known_rack(
            0,
            &Rack::from_letters(tileset.size(), &tileset.encode("EORSTVX").unwrap()),
        )
        .unwrap();
    c.bench_function("generate_all_opening", |b| {
        b.iter(|| {
            generate_moves(&opening, &args, &mut list);
            black_box(list.count())
        })
    });
}

criterion_group!(benches, bench_movegen);
criterion_main!(benches);
