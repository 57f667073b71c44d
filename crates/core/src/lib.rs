pub mod board;
pub mod engine;
pub mod journal;
pub mod journal_file;
pub mod replay;
pub mod types;

pub use board::{BASE_BLAST_RANGE, Board, BoardParseError};
pub use engine::{DecisionError, Engine, Mode};
pub use journal::{RunJournal, TickRecord};
pub use replay::*;
pub use types::*;
