//! Per-tick traversal-cost grid and the derived hazard view.
//! Rebuilt from scratch every tick; nothing here survives between searches,
//! so repeated pathfinding can never leak stale state.

use std::collections::BTreeSet;

use super::*;

pub(crate) const WALKABLE_COST: u32 = 100;
const PERK_CELL_COST: u32 = 1;
const HOSTILE_SURCHARGE: u32 = 5_000;
const HAZARD_FACTOR: u32 = 10;
/// Cells guaranteed to blow this tick are written down to the cost floor:
/// they are already decided by the safety veto, so the search should not
/// spend effort detouring around them. The floor keeps the Manhattan
/// heuristic admissible.
const DOOMED_CELL_COST: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellCost {
    Blocked,
    Open(u32),
}

#[derive(Clone, Debug)]
pub struct CostGrid {
    size: usize,
    cells: Vec<CellCost>,
}

impl CostGrid {
    pub fn new(size: usize, fill: CellCost) -> Self {
        Self { size, cells: vec![fill; size * size] }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn at(&self, point: Point) -> CellCost {
        if point.is_bad(self.size) {
            return CellCost::Blocked;
        }
        self.cells[point.y as usize * self.size + point.x as usize]
    }

    pub fn set(&mut self, point: Point, cost: CellCost) {
        if !point.is_bad(self.size) {
            self.cells[point.y as usize * self.size + point.x as usize] = cost;
        }
    }

    fn rewrite(&mut self, point: Point, f: impl Fn(u32) -> u32) {
        if let CellCost::Open(cost) = self.at(point) {
            self.set(point, CellCost::Open(f(cost)));
        }
    }
}

/// Everything the mode machine and move policy need for one tick, derived
/// once after the trackers have been updated.
pub(crate) struct TickView {
    pub me: Point,
    pub blast_range: u32,
    pub immunity_ticks: u16,
    pub grid: CostGrid,
    /// Blast cells of every known bomb, fused or remote-armed.
    pub weighted_hazards: BTreeSet<Point>,
    /// Blast cells that land this tick; the safety veto's hard set.
    pub imminent: BTreeSet<Point>,
}

/// Compose terrain, perk attraction, hostile prediction and hazard
/// weighting into one cost grid. The layering order is load-bearing:
/// later writes override earlier multiplicative penalties.
pub(crate) fn build_view(
    board: &Board,
    me: Point,
    bomb: &OwnBomb,
    perks: &PerkTracker,
    hostiles: &HostileTracker,
) -> TickView {
    let size = board.size();
    let mut grid = CostGrid::new(size, CellCost::Blocked);
    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let point = Point::new(x, y);
            if !board.at(point).is_impassable() {
                grid.set(point, CellCost::Open(WALKABLE_COST));
            }
        }
    }

    for (point, _) in board.perks() {
        grid.set(point, CellCost::Open(PERK_CELL_COST));
    }

    for point in hostiles.predicted() {
        grid.rewrite(*point, |cost| cost.saturating_add(HOSTILE_SURCHARGE));
    }

    let mut weighted_hazards = board.future_blasts(false);
    weighted_hazards.extend(bomb.danger().iter().copied());

    let mut imminent = board.future_blasts(true);
    if bomb.fuse() == 1 {
        imminent.extend(bomb.danger().iter().copied());
    }

    let immunity_ticks = perks.immunity_ticks();
    if immunity_ticks < IMMUNITY_WEIGHT_GATE {
        for point in &weighted_hazards {
            grid.rewrite(*point, |cost| cost.saturating_mul(HAZARD_FACTOR));
        }
        for point in &imminent {
            grid.rewrite(*point, |_| DOOMED_CELL_COST);
        }
    }

    TickView {
        me,
        blast_range: BASE_BLAST_RANGE + perks.radius_bonus(),
        immunity_ticks,
        grid,
        weighted_hazards,
        imminent,
    }
}
