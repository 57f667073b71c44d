//! Hostile-unit observation and next-cell motion prediction.
//! This module exists so position-history inference stays separate from the
//! grid weighting that consumes it. Prediction is probabilistic; consumers
//! treat it as a penalty zone, never a hard block.

use std::collections::BTreeSet;

use super::*;

#[derive(Clone, Debug, Default)]
pub struct HostileTracker {
    prev_live: BTreeSet<Point>,
    prev_dead: BTreeSet<Point>,
    live: BTreeSet<Point>,
    newly_dead: BTreeSet<Point>,
    predicted: BTreeSet<Point>,
}

impl HostileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn live(&self) -> &BTreeSet<Point> {
        &self.live
    }

    /// Cells holding a hostile corpse that was not there last tick. Fresh
    /// corpses are inert obstacles but other agents still avoid them, so
    /// the safety veto treats them as occupied.
    pub fn newly_dead(&self) -> &BTreeSet<Point> {
        &self.newly_dead
    }

    /// Union over all live units of each unit's predicted next cell(s).
    pub fn predicted(&self) -> &BTreeSet<Point> {
        &self.predicted
    }

    pub fn observe(&mut self, board: &Board) {
        let dead_now = board.dead_hostiles();
        self.newly_dead = dead_now.difference(&self.prev_dead).copied().collect();
        self.live = board.hostiles();

        let mut blocked: BTreeSet<Point> = board.walls();
        blocked.append(&mut board.bricks());
        blocked.append(&mut board.blasts());
        blocked.append(&mut board.rubble());
        blocked.extend(dead_now.iter().copied());

        let mut predicted = BTreeSet::new();
        for unit in &self.live {
            match self.inferred_heading(*unit) {
                Some(heading) => {
                    let next = unit.offset(heading.0, heading.1);
                    if blocked.contains(&next) {
                        // Wall bounce: direction after the turn is unknown.
                        predicted.extend(unblocked_neighbors(*unit, &blocked));
                    } else {
                        predicted.insert(next);
                    }
                }
                None => {
                    predicted.extend(unblocked_neighbors(*unit, &blocked));
                }
            }
        }
        self.predicted = predicted;

        self.prev_live = self.live.clone();
        self.prev_dead = dead_now;
    }

    /// A heading exists only when exactly one orthogonal neighbor of the
    /// unit matches a previous-tick position.
    fn inferred_heading(&self, unit: Point) -> Option<(i32, i32)> {
        let mut came_from = None;
        for neighbor in unit.neighbors() {
            if self.prev_live.contains(&neighbor) {
                if came_from.is_some() {
                    return None;
                }
                came_from = Some(neighbor);
            }
        }
        came_from.map(|from| (unit.x - from.x, unit.y - from.y))
    }
}

fn unblocked_neighbors(unit: Point, blocked: &BTreeSet<Point>) -> Vec<Point> {
    unit.neighbors().into_iter().filter(|n| !blocked.contains(n)).collect()
}
