//! The board-representation half of the morphy chess engine.
//!
//! This package is separated into two parts: the board representation &
//! associated functions (the current crate, `morphy`), and the searcher built
//! on top of these foundations, `morphy_engine`.
//!
//! # Usage
//!
//! You can create a [`Board`] with the starting position like so:
//!
//! ```
//! use morphy::Board;
//! let board = Board::start_pos();
//! ```
//!
//! Generating a list of moves (contained inside a [`MoveList`]) can be done
//! with:
//!
//! ```
//! # use morphy::Board;
//! # let board = Board::start_pos();
//! let list = board.generate_moves();
//! ```
//!
//! Applying and undoing moves is simple:
//!
//! ```
//! use morphy::Board;
//!
//! let mut board = Board::start_pos();
//! let list = board.generate_moves();
//!
//! for mv in list.iter() {
//!     board.apply_move(*mv);
//!     board.undo_move();
//! }
//! ```
//!
//! Using FEN strings is also supported:
//!
//! ```
//! use morphy::Board;
//!
//! let start_position = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
//! let board = Board::from_fen(start_position).unwrap();
//! ```
//!
//! [`MoveList`]: core/move_list/struct.MoveList.html
//! [`Board`]: board/struct.Board.html

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;

pub mod board;
pub mod core;
pub mod helper;
pub mod tools;

pub use crate::board::Board;
pub use crate::core::bitboard::BitBoard;
pub use crate::core::move_list::MoveList;
pub use crate::core::piece_move::{Move, MoveKind, ScoredMove};
pub use crate::core::sq::SQ;
pub use crate::core::{File, GenTypes, Piece, PieceType, Player, Rank};
