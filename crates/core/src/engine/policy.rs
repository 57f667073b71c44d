//! Move synthesis: turn the chosen path into one emitted command.
//! Bomb placement, remote detonation and the final safety veto live here;
//! goal selection does not, it only hands over a path.

use std::collections::BTreeSet;

use super::*;

impl Engine {
    /// Walk the path, deciding per tick whether to also drop a bomb.
    pub(crate) fn synthesize(&mut self, board: &Board, view: &TickView, path: &[Point]) -> Command {
        self.panic_streak = 0;
        let Some(&next) = path.get(1) else {
            return Command::none();
        };
        let Some(direction) = Direction::between(view.me, next) else {
            return Command::none();
        };

        // Destroy goals fire from the adjacent cell, or down a straight
        // corridor the blast can cover.
        let in_firing_position = path.len() == 2
            || (is_straight(path) && (path.len() - 1) as u32 <= view.blast_range);
        if self.mode.is_destroy() && in_firing_position {
            self.mode = Mode::Flee;
            let mut avoid = board.blast_cells(view.me, view.blast_range);
            avoid.extend(self.bomb.danger().iter().copied());
            tracing::debug!(target = ?path.last(), "dropping bomb on target");
            return Command::act_then_step(self.flee_step(view, &avoid));
        }

        if path.len() == 2 {
            // Collection goals are resolved by stepping onto the target.
            return Command::step(direction);
        }

        if path.len() <= SAFE_STEP_THRESHOLD && view.immunity_ticks as usize <= SAFE_STEP_THRESHOLD
        {
            return Command::step(direction);
        }

        if self.perks.has_extra_bomb() && !self.bomb.remote_armed() {
            // Spare bomb in hand: mine the trail while walking it.
            return Command::act_then_step(Some(direction));
        }

        if self.bomb.fuse_active() || self.bomb.remote_armed() {
            return Command::step(direction);
        }

        let here = self.potential_yield(board, view.me, view.blast_range);
        let there = self.potential_yield(board, next, view.blast_range);
        if there > here {
            return Command::step_then_act(direction);
        }
        if here > 0 {
            return Command::act_then_step(Some(direction));
        }
        Command::step(direction)
    }

    /// Score of a bomb dropped at `from`: blast rays are walked outward and
    /// every target they would reach is tallied. Bricks and fresh corpses
    /// terminate a ray the way they terminate a real blast.
    pub(crate) fn potential_yield(&self, board: &Board, from: Point, blast_range: u32) -> u32 {
        let mut score = 0;
        for direction in Direction::ALL {
            let mut cell = from;
            for _ in 0..blast_range {
                cell = cell.step(direction);
                if cell.is_bad(board.size()) {
                    break;
                }
                if self.hostiles.newly_dead().contains(&cell) {
                    score += 10;
                    break;
                }
                match board.at(cell) {
                    Element::Wall => break,
                    Element::Brick => {
                        score += 1;
                        break;
                    }
                    Element::Opponent | Element::OpponentOnBomb => score += 20,
                    Element::Hostile => score += 10,
                    _ => {}
                }
            }
        }
        score
    }

    /// While a remote bomb is pending, the act token means "detonate", so
    /// any placement intent is stripped and detonation is scheduled on the
    /// side of the move that keeps the agent out of the blast.
    pub(crate) fn apply_remote_override(&self, view: &TickView, mut command: Command) -> Command {
        if !self.bomb.remote_armed() {
            return command;
        }
        command.clear_act();
        let Some(origin) = self.bomb.origin() else {
            return command;
        };
        let next = match command.direction {
            Some(direction) => view.me.step(direction),
            None => view.me,
        };
        if view.immunity_ticks > 0 {
            command.add_act(ActOrder::BeforeMove);
        } else if view.me == origin {
            // Standing on the bomb itself: never detonate.
        } else if !self.bomb.danger().contains(&next) {
            command.add_act(ActOrder::AfterMove);
        } else if !self.bomb.danger().contains(&view.me) {
            command.add_act(ActOrder::BeforeMove);
        }
        command
    }

    /// Hard per-cell check applied to this tick's destination.
    pub(crate) fn is_cell_safe(&self, view: &TickView, cell: Point) -> bool {
        (view.immunity_ticks > 1 || !view.imminent.contains(&cell))
            && !self.hostiles.newly_dead().contains(&cell)
            && !self.hostiles.predicted().contains(&cell)
    }

    /// Abandon the goal and survive. After enough consecutive cornered
    /// ticks, a bomb is dropped to blast an exit open.
    pub(crate) fn start_flee(&mut self, view: &TickView) -> Command {
        self.mode = Mode::Flee;
        self.panic_streak += 1;
        if self.panic_streak > PANIC_BOMB_STREAK
            && !self.bomb.fuse_active()
            && !self.bomb.remote_armed()
        {
            self.panic_streak = 0;
            tracing::debug!("cornered too long, bombing an exit open");
            return Command::act_only();
        }
        match self.flee_step(view, self.bomb.danger()) {
            Some(direction) => Command::step(direction),
            None => Command::none(),
        }
    }

    fn flee_step(&self, view: &TickView, avoid: &BTreeSet<Point>) -> Option<Direction> {
        let path = self.flee_path(view, avoid)?;
        Direction::between(view.me, *path.get(1)?)
    }

    /// Farthest-first search for a reachable refuge cell near the agent.
    /// `avoid` filters destinations only: transiting a doomed lane is fine
    /// while the fuse allows it, ending the retreat inside one is not.
    /// Candidate count is capped to bound per-tick search cost.
    fn flee_path(&self, view: &TickView, avoid: &BTreeSet<Point>) -> Option<Vec<Point>> {
        let me = view.me;
        let mut candidates = Vec::new();
        for dy in -FLEE_SCAN_RADIUS..=FLEE_SCAN_RADIUS {
            for dx in -FLEE_SCAN_RADIUS..=FLEE_SCAN_RADIUS {
                let cell = me.offset(dx, dy);
                if cell == me || cell.is_bad(view.grid.size()) {
                    continue;
                }
                if view.imminent.contains(&cell)
                    || self.hostiles.predicted().contains(&cell)
                    || avoid.contains(&cell)
                    || view.grid.at(cell) == CellCost::Blocked
                {
                    continue;
                }
                candidates.push(cell);
            }
        }
        candidates.sort_by(|a, b| me.manhattan(*b).cmp(&me.manhattan(*a)).then(a.cmp(b)));
        candidates.truncate(FLEE_CANDIDATE_CAP);

        // First pass insists the opening step itself is safe. The desperate
        // pass runs only when standing still already loses.
        for require_safe_step in [true, false] {
            for cell in &candidates {
                let Some(path) = shortest_path(&view.grid, me, *cell) else {
                    continue;
                };
                let Some(&next) = path.get(1) else {
                    continue;
                };
                if require_safe_step && !self.is_cell_safe(view, next) {
                    continue;
                }
                return Some(path);
            }
            if self.is_cell_safe(view, me) {
                break;
            }
        }
        None
    }
}

fn is_straight(path: &[Point]) -> bool {
    path.iter().all(|p| p.x == path[0].x) || path.iter().all(|p| p.y == path[0].y)
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn adjacent_destroy_target_triggers_bomb_and_retreat() {
        let (mut engine, board) = engine_with_board(&[
            "☼☼☼☼☼☼☼",
            "☼     ☼",
            "☼ ☺#  ☼",
            "☼     ☼",
            "☼     ☼",
            "☼     ☼",
            "☼☼☼☼☼☼☼",
        ]);
        engine.mode = Mode::Demolish(Point::new(3, 2));
        let view = engine.view_for(&board);
        let path = vec![Point::new(2, 2), Point::new(3, 2)];
        let command = engine.synthesize(&board, &view, &path);

        assert_eq!(command.act, Some(ActOrder::BeforeMove), "bomb drops before the retreat");
        let step = command.direction.expect("retreat step");
        let dest = view.me.step(step);
        assert_ne!(dest, Point::new(3, 2), "retreat never walks into the target");
        assert_ne!(view.grid.at(dest), CellCost::Blocked);
        assert_eq!(*engine.mode(), Mode::Flee);
    }

    #[test]
    fn straight_corridor_within_blast_range_fires_early() {
        let (mut engine, board) = engine_with_board(&[
            "☼☼☼☼☼☼☼",
            "☼     ☼",
            "☼☺  # ☼",
            "☼     ☼",
            "☼     ☼",
            "☼     ☼",
            "☼☼☼☼☼☼☼",
        ]);
        engine.mode = Mode::Demolish(Point::new(4, 2));
        let view = engine.view_for(&board);
        let path: Vec<Point> = (1..=4).map(|x| Point::new(x, 2)).collect();
        assert!((path.len() - 1) as u32 <= view.blast_range);

        let command = engine.synthesize(&board, &view, &path);
        assert!(command.fires_bomb(), "blast reaches down the corridor: {command}");
    }

    #[test]
    fn perk_target_one_step_away_is_stepped_onto_without_a_bomb() {
        let (mut engine, board) = engine_with_board(&[
            "☼☼☼☼☼☼",
            "☼☺r  ☼",
            "☼    ☼",
            "☼    ☼",
            "☼    ☼",
            "☼☼☼☼☼☼",
        ]);
        engine.mode = Mode::PerkHunt(Point::new(2, 1));
        let view = engine.view_for(&board);
        let path = vec![Point::new(1, 1), Point::new(2, 1)];
        let command = engine.synthesize(&board, &view, &path);
        assert_eq!(command, Command::step(Direction::Right));
    }

    #[test]
    fn long_march_bombs_the_cell_with_the_better_yield() {
        let (mut engine, board) = engine_with_board(&[
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
            "☼☺          ☼",
            "☼#          ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼         # ☼",
            "☼           ☼",
            "☼           ☼",
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
        ]);
        engine.mode = Mode::Demolish(Point::new(10, 9));
        let view = engine.view_for(&board);
        // March right along the top row, away from the brick at (1,2).
        let path: Vec<Point> = (1..=9).map(|x| Point::new(x, 1)).collect();

        let command = engine.synthesize(&board, &view, &path);
        assert_eq!(
            command,
            Command::act_then_step(Some(Direction::Right)),
            "current cell reaches the brick below, the next cell reaches nothing"
        );
    }

    #[test]
    fn pending_fuse_suppresses_further_placement() {
        let (mut engine, board) = engine_with_board(&[
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
            "☼☺          ☼",
            "☼#          ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼           ☼",
            "☼         # ☼",
            "☼           ☼",
            "☼           ☼",
            "☼☼☼☼☼☼☼☼☼☼☼☼☼",
        ]);
        engine.mode = Mode::Demolish(Point::new(10, 9));
        let mut perks = PerkTracker::new();
        engine.bomb.observe(
            &parse_rows(&["☼☼☼", "☼☻☼", "☼☼☼"]),
            Point::new(1, 1),
            Command::none(),
            &mut perks,
            3,
        );
        assert!(engine.bomb.fuse_active());

        let view = engine.view_for(&board);
        let path: Vec<Point> = (1..=9).map(|x| Point::new(x, 1)).collect();
        let command = engine.synthesize(&board, &view, &path);
        assert_eq!(command, Command::step(Direction::Right));
    }

    #[test]
    fn remote_override_detonates_after_stepping_clear() {
        let mut engine = Engine::new();
        engine.perks.advance(Some(Perk::RemoteControl));
        let placed = parse_rows(&[
            "☼☼☼☼☼☼☼",
            "☼☻    ☼",
            "☼     ☼",
            "☼     ☼",
            "☼     ☼",
            "☼     ☼",
            "☼☼☼☼☼☼☼",
        ]);
        let mut perks = engine.perks.clone();
        engine.bomb.observe(&placed, Point::new(1, 1), Command::none(), &mut perks, 3);
        engine.perks = perks;
        assert!(engine.bomb.remote_armed());

        // Hero has walked out to (5,1); the blast lane ends at (4,1).
        let walked = parse_rows(&[
            "☼☼☼☼☼☼☼☼",
            "☼5   ☺ ☼",
            "☼      ☼",
            "☼      ☼",
            "☼      ☼",
            "☼      ☼",
            "☼      ☼",
            "☼☼☼☼☼☼☼☼",
        ]);
        let view = engine.view_for(&walked);
        let overridden =
            engine.apply_remote_override(&view, Command::act_then_step(Some(Direction::Down)));
        assert_eq!(
            overridden,
            Command::step_then_act(Direction::Down),
            "placement intent becomes a detonation once the move clears the blast"
        );
    }

    #[test]
    fn remote_override_never_detonates_while_standing_on_the_bomb() {
        let mut engine = Engine::new();
        engine.perks.advance(Some(Perk::RemoteControl));
        let placed = parse_rows(&[
            "☼☼☼☼☼☼",
            "☼☻   ☼",
            "☼    ☼",
            "☼    ☼",
            "☼    ☼",
            "☼☼☼☼☼☼",
        ]);
        let mut perks = engine.perks.clone();
        engine.bomb.observe(&placed, Point::new(1, 1), Command::none(), &mut perks, 3);
        engine.perks = perks;

        let view = engine.view_for(&placed);
        let overridden = engine.apply_remote_override(&view, Command::act_only());
        assert_eq!(overridden, Command::none());
    }

    #[test]
    fn flee_leaves_the_imminent_blast_lane() {
        let (mut engine, board) = engine_with_board(&[
            "☼☼☼☼☼☼☼",
            "☼1  ☺ ☼",
            "☼     ☼",
            "☼     ☼",
            "☼     ☼",
            "☼     ☼",
            "☼☼☼☼☼☼☼",
        ]);
        let view = engine.view_for(&board);
        assert!(view.imminent.contains(&view.me), "fixture puts the hero in the lane");

        let command = engine.start_flee(&view);
        let direction = command.direction.expect("flee step");
        let dest = view.me.step(direction);
        assert!(!view.imminent.contains(&dest), "first flee step exits the lane: {dest:?}");
        assert_eq!(*engine.mode(), Mode::Flee);
    }

    #[test]
    fn safe_agent_with_no_safe_step_stands_still() {
        // Every open neighbor is doomed this tick, but the hero's own cell
        // is not: the bombs sit four cells out, so their rays stop one short
        // of the hero. Standing still must win over a desperate step.
        let (mut engine, board) = engine_with_board(&[
            "☼☼☼☼☼☼☼☼☼☼☼",
            "☼    1    ☼",
            "☼         ☼",
            "☼         ☼",
            "☼         ☼",
            "☼1   ☺   1☼",
            "☼         ☼",
            "☼         ☼",
            "☼         ☼",
            "☼    1    ☼",
            "☼☼☼☼☼☼☼☼☼☼☼",
        ]);
        let view = engine.view_for(&board);
        assert!(engine.is_cell_safe(&view, view.me));
        for neighbor in view.me.neighbors() {
            assert!(!engine.is_cell_safe(&view, neighbor));
        }
        assert_eq!(engine.start_flee(&view), Command::none());
    }

    #[test]
    fn cornered_streak_ends_with_a_breakout_bomb() {
        let (mut engine, board) = engine_with_board(&[
            "☼☼☼☼☼",
            "☼☺# ☼",
            "☼## ☼",
            "☼   ☼",
            "☼☼☼☼☼",
        ]);
        let view = engine.view_for(&board);
        engine.panic_streak = PANIC_BOMB_STREAK + 1;
        let command = engine.start_flee(&view);
        assert_eq!(command, Command::act_only());
        assert_eq!(engine.panic_streak, 0, "the streak resets once the bomb drops");
    }

    #[test]
    fn yield_scores_opponents_over_bricks_and_respects_occlusion() {
        let (engine, board) = engine_with_board(&[
            "☼☼☼☼☼☼☼☼☼",
            "☼☺ ♥    ☼",
            "☼#      ☼",
            "☼♥      ☼",
            "☼       ☼",
            "☼       ☼",
            "☼       ☼",
            "☼       ☼",
            "☼☼☼☼☼☼☼☼☼",
        ]);
        // Right ray reaches the opponent at (3,1); the down ray stops at the
        // brick, so the opponent behind it never counts.
        assert_eq!(engine.potential_yield(&board, Point::new(1, 1), 3), 21);
    }
}
