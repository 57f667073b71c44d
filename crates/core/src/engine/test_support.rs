//! Shared fixtures for engine submodule tests.

use super::*;

pub(super) fn parse_rows(rows: &[&str]) -> Board {
    Board::parse(&rows.concat()).expect("fixture board parses")
}

/// 13x13 arena with the hero at (5,5) and a single brick at (5,7).
pub(super) fn demolish_arena() -> [&'static str; 13] {
    [
        "☼☼☼☼☼☼☼☼☼☼☼☼☼",
        "☼           ☼",
        "☼           ☼",
        "☼           ☼",
        "☼           ☼",
        "☼    ☺      ☼",
        "☼           ☼",
        "☼    #      ☼",
        "☼           ☼",
        "☼           ☼",
        "☼           ☼",
        "☼           ☼",
        "☼☼☼☼☼☼☼☼☼☼☼☼☼",
    ]
}

pub(super) fn engine_with_board(rows: &[&str]) -> (Engine, Board) {
    (Engine::new(), parse_rows(rows))
}

impl Engine {
    /// Derive the per-tick view exactly the way the tick pipeline does,
    /// without running the observation phase.
    pub(super) fn view_for(&self, board: &Board) -> TickView {
        let me = board.hero().expect("fixture needs a hero");
        build_view(board, me, &self.bomb, &self.perks, &self.hostiles)
    }
}
