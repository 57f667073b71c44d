//! Per-tick decision pipeline: observe, choose a goal, synthesize a move,
//! veto unsafe output. A panic anywhere inside the pipeline is caught at
//! this boundary and downgraded to a no-op command; one bad tick must
//! never end the run.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use super::*;
use crate::board::BoardParseError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecisionError {
    Parse(BoardParseError),
    /// The snapshot carries no hero cell in any state, alive or dead.
    HeroMissing,
}

impl fmt::Display for DecisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionError::Parse(inner) => write!(f, "snapshot rejected: {inner}"),
            DecisionError::HeroMissing => write!(f, "snapshot has no hero cell"),
        }
    }
}

impl std::error::Error for DecisionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecisionError::Parse(inner) => Some(inner),
            DecisionError::HeroMissing => None,
        }
    }
}

impl From<BoardParseError> for DecisionError {
    fn from(inner: BoardParseError) -> Self {
        DecisionError::Parse(inner)
    }
}

impl Engine {
    /// Turn one raw snapshot into one command. This is the only public
    /// mutation point of the engine.
    pub fn process_tick(&mut self, raw: &str) -> Result<Command, DecisionError> {
        let board = Board::parse(raw)?;
        self.tick += 1;

        let command = match panic::catch_unwind(AssertUnwindSafe(|| self.decide(&board))) {
            Ok(decided) => decided?,
            Err(_) => {
                tracing::error!(tick = self.tick, "decision panicked, emitting no-op");
                Command::none()
            }
        };

        self.prev_command = command;
        tracing::debug!(tick = self.tick, mode = ?self.mode, %command, "tick decided");
        Ok(command)
    }

    fn decide(&mut self, board: &Board) -> Result<Command, DecisionError> {
        let me = board.hero().ok_or(DecisionError::HeroMissing)?;

        // Observation phase. A perk recorded on our cell last tick was
        // walked over and is ours now.
        let picked = self.prev_perk_cells.get(&me).copied();
        self.perks.advance(picked);
        let blast_range = self.effective_blast_range();
        self.bomb.observe(board, me, self.prev_command, &mut self.perks, blast_range);
        self.hostiles.observe(board);

        if board.at(me) == Element::HeroDead {
            tracing::info!(tick = self.tick, "hero is dead, waiting for respawn");
            self.reset_life();
            return Ok(Command::none());
        }
        if board.bricks().is_empty() {
            // A wiped brick field means the round rolled over.
            tracing::info!(tick = self.tick, "no bricks left, treating as a fresh round");
            self.reset_life();
            return Ok(Command::none());
        }

        let view = build_view(board, me, &self.bomb, &self.perks, &self.hostiles);
        let path = self.choose_goal(board, &view);

        // A path that never leaves our own blast zone is a trap.
        let path = path.filter(|p| {
            self.bomb.danger().is_empty() || !p.iter().all(|cell| self.bomb.danger().contains(cell))
        });

        let (command, fled) = match path {
            Some(path) => (self.synthesize(board, &view, &path), false),
            None => (self.start_flee(&view), true),
        };
        let command = self.apply_remote_override(&view, command);

        // Final veto on the destination cell. Flee output carries its own
        // safety reasoning and is emitted as planned.
        let dest = match command.direction {
            Some(direction) => me.step(direction),
            None => me,
        };
        let command = if fled || self.is_cell_safe(&view, dest) {
            command
        } else if self.is_cell_safe(&view, me) {
            tracing::debug!(%command, "vetoed unsafe step, holding position");
            Command::none()
        } else {
            self.start_flee(&view)
        };

        self.prev_opponents = board.opponents();
        self.prev_perk_cells =
            board.perks().into_iter().collect();
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn raw(rows: &[&str]) -> String {
        rows.concat()
    }

    #[test]
    fn brick_within_blast_reach_is_bombed_with_a_retreat_step() {
        let mut engine = Engine::new();
        // Hero (5,5), brick (5,7): the straight corridor is inside blast
        // reach, so the bomb drops immediately.
        let command = engine.process_tick(&raw(&demolish_arena())).expect("tick");
        assert_eq!(command.act, Some(ActOrder::BeforeMove), "brick in reach gets bombed");
        assert!(command.direction.is_some(), "the bomb drop comes with a retreat step");
        assert_eq!(*engine.mode(), Mode::Flee);
    }

    #[test]
    fn dead_hero_emits_noop_and_resets_tracked_state() {
        let mut engine = Engine::new();
        // Brick out of blast reach: the first tick is a plain approach step.
        let approach = raw(&[
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼    ☺      ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼    #      ☼",
            "☼           ☼",
            "☼           ☼",
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
        ]);
        let command = engine.process_tick(&approach).expect("tick");
        assert_eq!(command, Command::step(Direction::Down));
        assert_eq!(*engine.mode(), Mode::Demolish(Point::new(5, 9)));

        let dead = raw(&[
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼    Ѡ      ☼",
            "☼           ☼",
            "☼           ☼",
            "☼    #      ☼",
            "☼           ☼",
            "☼           ☼",
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
        ]);
        let command = engine.process_tick(&dead).expect("tick");
        assert_eq!(command, Command::none());
        assert_eq!(*engine.mode(), Mode::Flee, "death clears the active goal");
        assert_eq!(engine.current_tick(), 2, "the tick counter survives death");
    }

    #[test]
    fn unparseable_snapshot_is_an_error_not_a_panic() {
        let mut engine = Engine::new();
        let err = engine.process_tick("☼☼☼").unwrap_err();
        assert!(matches!(err, DecisionError::Parse(BoardParseError::NotSquare { len: 3 })));
        assert_eq!(engine.current_tick(), 0, "rejected input does not consume a tick");
    }

    #[test]
    fn snapshot_without_hero_reports_hero_missing() {
        let mut engine = Engine::new();
        let empty = raw(&[
            "☼☼☼☼☼",
            "☼   ☼",
            "☼ # ☼",
            "☼   ☼",
            "☼☼☼☼☼",
        ]);
        assert_eq!(engine.process_tick(&empty).unwrap_err(), DecisionError::HeroMissing);
    }

    #[test]
    fn standing_in_an_imminent_lane_forces_a_flee_step() {
        let mut engine = Engine::new();
        let board = raw(&[
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
            "☼1  ☺       ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼  #        ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
        ]);
        let command = engine.process_tick(&board).expect("tick");
        let direction = command.direction.expect("must move out of the lane");
        let dest = Point::new(4, 1).step(direction);
        let lane: Vec<Point> = (1..=4).map(|x| Point::new(x, 1)).collect();
        assert!(!lane.contains(&dest), "destination leaves the blast lane: {dest:?}");
    }

    #[test]
    fn perk_pickup_is_detected_one_tick_later() {
        let mut engine = Engine::new();
        let with_perk = raw(&[
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
            "☼☺i         ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼      #    ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
        ]);
        let command = engine.process_tick(&with_perk).expect("tick");
        assert_eq!(command, Command::step(Direction::Right), "adjacent perk is stepped onto");

        let collected = raw(&[
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
            "☼ ☺         ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼      #    ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
        ]);
        engine.process_tick(&collected).expect("tick");
        assert!(engine.perks().immunity_ticks() > 0, "stepping onto the perk cell collects it");
    }

    #[test]
    fn emitted_commands_are_recorded_for_the_next_observation() {
        let mut engine = Engine::new();
        let command = engine.process_tick(&raw(&demolish_arena())).expect("tick");
        assert_eq!(engine.prev_command, command);
    }
}
