//! Statically initialized lookup tables: sliding-piece magics, board
//! geometry, Zobrist randoms, and piece-square tables. Everything in here is
//! immutable after startup and safe to share between threads.

pub mod boards;
pub mod magic;
pub mod prelude;
pub mod psqt;
pub mod zobrist;

use self::boards::BoardTables;
use self::magic::MagicTables;
use self::psqt::PsqtTables;
use self::zobrist::ZobristTables;

/// Bundle of every precomputed table the board and searchers consult.
pub struct Helper {
    pub magics: MagicTables,
    pub boards: BoardTables,
    pub zobrist: ZobristTables,
    pub psqt: PsqtTables,
}

impl Helper {
    #[cold]
    pub fn new() -> Helper {
        let magics = MagicTables::new();
        let boards = BoardTables::new(&magics);
        Helper {
            magics,
            boards,
            zobrist: ZobristTables::new(),
            psqt: PsqtTables::new(),
        }
    }
}

impl Default for Helper {
    fn default() -> Self {
        Helper::new()
    }
}

lazy_static! {
    /// The process-wide table bundle, created on first use. Nothing inside is
    /// ever mutated, so handing out `&'static` references is safe.
    pub static ref HELPER: Helper = Helper::new();
}

/// Forces initialization of the static tables. Optional; any accessor will
/// initialize them on first touch.
#[cold]
pub fn init_statics() {
    lazy_static::initialize(&HELPER);
}
