//! Behavioral goal selection and maintenance.
//! One goal is active at a time; power-ups preempt everything, idle
//! opponents preempt demolition, and a collapsed goal falls back to flee.

use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Chase a reachable idle opponent.
    Pursue(Point),
    /// Path toward the densest cluster of destructible walls.
    Demolish(Point),
    /// Collect a nearby power-up.
    PerkHunt(Point),
    /// No positive goal; survive.
    Flee,
}

impl Mode {
    pub fn target(self) -> Option<Point> {
        match self {
            Mode::Pursue(target) | Mode::Demolish(target) | Mode::PerkHunt(target) => Some(target),
            Mode::Flee => None,
        }
    }

    /// Goals resolved by bombing the target rather than standing on it.
    pub(crate) fn is_destroy(self) -> bool {
        matches!(self, Mode::Pursue(_) | Mode::Demolish(_))
    }
}

impl Engine {
    /// Reuse the active goal when it still holds, otherwise reselect.
    /// Returns the path serving whatever goal ends up active.
    pub(crate) fn choose_goal(&mut self, board: &Board, view: &TickView) -> Option<Vec<Point>> {
        let active = self.mode;
        if active == Mode::Flee {
            return self.pick_fresh_goal(board, view);
        }

        // Power-ups preempt every running goal.
        if let Some(path) = self.near_perk_path(board, view) {
            let target = *path.last()?;
            self.mode = Mode::PerkHunt(target);
            tracing::debug!(?target, "perk preempts active goal");
            return Some(path);
        }

        // An idle opponent preempts demolition, but not an active chase.
        if matches!(active, Mode::Demolish(_))
            && let Some(path) = self.idle_opponent_path(board, view)
        {
            let target = *path.last()?;
            self.victim = Some(target);
            self.mode = Mode::Pursue(target);
            tracing::debug!(?target, "idle opponent preempts demolition");
            return Some(path);
        }

        let target = active.target()?;
        let path = shortest_path(&view.grid, view.me, target);
        let target_survives =
            matches!(board.at(target), Element::Opponent | Element::OpponentOnBomb | Element::Brick);
        match path {
            Some(path) if target_survives => Some(path),
            _ => {
                tracing::debug!(?target, "goal target lost; reselecting");
                self.pick_fresh_goal(board, view)
            }
        }
    }

    fn pick_fresh_goal(&mut self, board: &Board, view: &TickView) -> Option<Vec<Point>> {
        self.victim = None;

        if let Some(path) = self.near_perk_path(board, view) {
            let target = *path.last()?;
            self.mode = Mode::PerkHunt(target);
            tracing::debug!(?target, "goal: perk hunt");
            return Some(path);
        }

        if let Some(path) = self.idle_opponent_path(board, view) {
            let target = *path.last()?;
            self.victim = Some(target);
            self.mode = Mode::Pursue(target);
            tracing::debug!(?target, "goal: pursue idle opponent");
            return Some(path);
        }

        if let Some(path) = self.demolish_path(board, view) {
            let target = *path.last()?;
            self.mode = Mode::Demolish(target);
            tracing::debug!(?target, "goal: demolish");
            return Some(path);
        }

        self.mode = Mode::Flee;
        None
    }

    /// Shortest path to the nearest-by-distance reachable perk within the
    /// scan radius.
    fn near_perk_path(&self, board: &Board, view: &TickView) -> Option<Vec<Point>> {
        let mut candidates: Vec<Point> = board
            .perks()
            .into_iter()
            .map(|(point, _)| point)
            .filter(|point| view.me.manhattan(*point) <= PERK_SCAN_RADIUS)
            .collect();
        candidates.sort_by_key(|point| view.me.manhattan(*point));
        candidates
            .into_iter()
            .find_map(|perk| shortest_path(&view.grid, view.me, perk))
    }

    /// Path to an opponent observed stationary across two consecutive
    /// ticks. The current victim is skipped so a stalled chase can swap
    /// to a different target.
    fn idle_opponent_path(&self, board: &Board, view: &TickView) -> Option<Vec<Point>> {
        self.prev_opponents
            .intersection(&board.opponents())
            .copied()
            .filter(|opponent| Some(*opponent) != self.victim)
            .find_map(|opponent| shortest_path(&view.grid, view.me, opponent))
    }

    /// Exploration-biased demolition target: the farthest reachable brick
    /// in the quadrant holding the most bricks.
    fn demolish_path(&self, board: &Board, view: &TickView) -> Option<Vec<Point>> {
        let mut quadrants: [Vec<Point>; 4] = Default::default();
        for brick in board.bricks() {
            quadrants[quadrant_index(brick, board.size())].push(brick);
        }
        let densest = quadrants
            .iter()
            .enumerate()
            .max_by(|(ai, a), (bi, b)| a.len().cmp(&b.len()).then(bi.cmp(ai)))
            .map(|(_, cells)| cells)?;
        let mut cells = densest.clone();
        if cells.is_empty() {
            return None;
        }
        cells.sort_by(|a, b| {
            view.me.manhattan(*b).cmp(&view.me.manhattan(*a)).then(a.cmp(b))
        });
        cells
            .into_iter()
            .find_map(|brick| shortest_path(&view.grid, view.me, brick))
    }
}

/// Board split into four quadrants by its midlines.
fn quadrant_index(point: Point, board_size: usize) -> usize {
    let half = (board_size / 2) as i32;
    let right = usize::from(point.x > half);
    let bottom = usize::from(point.y > half);
    (bottom << 1) | right
}
