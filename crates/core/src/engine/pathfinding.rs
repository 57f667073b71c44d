//! Cost-aware shortest-path search over the per-tick grid.
//! This module exists so navigation stays reusable across goal selection,
//! move synthesis and flee planning. It does not own any goal policy.

use std::collections::{BTreeMap, BTreeSet};

use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    y: i32,
    x: i32,
}

/// A* with the Manhattan heuristic. Returns the cells from `start` to
/// `goal` inclusive, or `None` when unreachable. Start and goal are forced
/// walkable so callers can path onto bricks, opponents and perks.
pub(crate) fn shortest_path(grid: &CostGrid, start: Point, goal: Point) -> Option<Vec<Point>> {
    if start.is_bad(grid.size()) || goal.is_bad(grid.size()) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let entry_cost = |point: Point| -> Option<u32> {
        if point == start || point == goal {
            return Some(WALKABLE_COST);
        }
        match grid.at(point) {
            CellCost::Blocked => None,
            CellCost::Open(cost) => Some(cost.max(1)),
        }
    };

    let mut open_set = BTreeSet::new();
    let mut g_score = BTreeMap::new();
    let mut came_from = BTreeMap::new();

    let h = start.manhattan(goal);
    open_set.insert(OpenNode { f: h, h, y: start.y, x: start.x });
    g_score.insert(start, 0u32);

    while let Some(current_node) = open_set.pop_first() {
        let current = Point::new(current_node.x, current_node.y);
        if current == goal {
            return Some(reconstruct_path(&came_from, start, goal));
        }
        let current_g = *g_score.get(&current).unwrap_or(&u32::MAX);
        if current_g == u32::MAX {
            continue;
        }

        for neighbor in current.neighbors() {
            if neighbor.is_bad(grid.size()) {
                continue;
            }
            let Some(step_cost) = entry_cost(neighbor) else {
                continue;
            };
            let tentative_g = current_g.saturating_add(step_cost);
            if tentative_g < *g_score.get(&neighbor).unwrap_or(&u32::MAX) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative_g);
                let h = neighbor.manhattan(goal);
                open_set.insert(OpenNode {
                    f: tentative_g.saturating_add(h),
                    h,
                    y: neighbor.y,
                    x: neighbor.x,
                });
            }
        }
    }
    None
}

fn reconstruct_path(came_from: &BTreeMap<Point, Point>, start: Point, goal: Point) -> Vec<Point> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        let Some(previous) = came_from.get(&current).copied() else {
            return Vec::new();
        };
        current = previous;
        path.push(current);
    }
    path.reverse();
    path
}
