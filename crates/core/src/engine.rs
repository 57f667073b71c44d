//! Decision engine composition: tracked cross-tick state and tuning knobs.
//! This file wires focused engine submodules together.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::{BASE_BLAST_RANGE, Board};
use crate::types::*;

mod grid;
mod hazard;
mod hostiles;
mod mode;
mod pathfinding;
mod perks;
mod policy;
mod tick;

#[cfg(test)]
mod test_support;

pub use grid::{CellCost, CostGrid};
pub use hazard::OwnBomb;
pub use hostiles::HostileTracker;
pub use mode::Mode;
pub use perks::PerkTracker;
pub use tick::DecisionError;

pub(crate) use grid::{TickView, WALKABLE_COST, build_view};
pub(crate) use pathfinding::shortest_path;

/// Fuse ticks on a freshly placed bomb.
pub(crate) const BOMB_FUSE_TICKS: u8 = 5;
/// Duration granted (or re-granted) by a perk pickup.
pub(crate) const PERK_REFILL_TICKS: u16 = 30;
/// Blast reach added per stacked radius-perk pickup.
pub(crate) const BLAST_RADIUS_STEP: u32 = 2;
/// Detonations granted by a remote-control pickup.
pub(crate) const REMOTE_CHARGES: u8 = 3;
/// Manhattan radius scanned for perks worth hunting.
pub(crate) const PERK_SCAN_RADIUS: u32 = 8;
/// Paths at most this long are walked without bombing considerations.
pub(crate) const SAFE_STEP_THRESHOLD: usize = 5;
/// Hazard weighting is skipped only while immunity outlasts this gate.
pub(crate) const IMMUNITY_WEIGHT_GATE: u16 = 4;
/// Chebyshev radius scanned for flee destinations.
pub(crate) const FLEE_SCAN_RADIUS: i32 = 5;
/// Cap on flee candidates searched, farthest first. Bounds per-tick search
/// cost; the deadline is enforced by the transport, not internally.
pub(crate) const FLEE_CANDIDATE_CAP: usize = 24;
/// Consecutive fleeing ticks tolerated before dropping a bomb to break out.
pub(crate) const PANIC_BOMB_STREAK: u32 = 4;

/// The one engine instance: owns every piece of cross-tick state and is
/// mutated only inside its own `process_tick` call.
pub struct Engine {
    tick: u64,
    mode: Mode,
    bomb: OwnBomb,
    perks: PerkTracker,
    hostiles: HostileTracker,
    prev_command: Command,
    prev_opponents: BTreeSet<Point>,
    prev_perk_cells: BTreeMap<Point, Perk>,
    panic_streak: u32,
    victim: Option<Point>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            tick: 0,
            mode: Mode::Flee,
            bomb: OwnBomb::new(),
            perks: PerkTracker::new(),
            hostiles: HostileTracker::new(),
            prev_command: Command::none(),
            prev_opponents: BTreeSet::new(),
            prev_perk_cells: BTreeMap::new(),
            panic_streak: 0,
            victim: None,
        }
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn bomb(&self) -> &OwnBomb {
        &self.bomb
    }

    pub fn perks(&self) -> &PerkTracker {
        &self.perks
    }

    pub fn hostiles(&self) -> &HostileTracker {
        &self.hostiles
    }

    pub(crate) fn effective_blast_range(&self) -> u32 {
        BASE_BLAST_RANGE + self.perks.radius_bonus()
    }

    /// Drop every piece of tracked state to start a fresh life.
    pub(crate) fn reset_life(&mut self) {
        self.mode = Mode::Flee;
        self.bomb.reset();
        self.perks.reset();
        self.hostiles.reset();
        self.prev_opponents.clear();
        self.prev_perk_cells.clear();
        self.panic_streak = 0;
        self.victim = None;
    }

    /// Order-stable hash of the tracked engine state, recorded per tick so
    /// replay can spot divergence mid-run.
    pub fn state_hash(&self) -> u64 {
        use std::hash::Hasher;
        use xxhash_rust::xxh3::Xxh3;

        let mut hasher = Xxh3::new();
        hasher.write_u64(self.tick);

        let (mode_tag, target) = match self.mode {
            Mode::Pursue(target) => (0u8, Some(target)),
            Mode::Demolish(target) => (1, Some(target)),
            Mode::PerkHunt(target) => (2, Some(target)),
            Mode::Flee => (3, None),
        };
        hasher.write_u8(mode_tag);
        let target = target.unwrap_or(Point::new(-1, -1));
        hasher.write_i32(target.x);
        hasher.write_i32(target.y);

        hasher.write_u8(self.bomb.fuse());
        hasher.write_u8(self.bomb.remote_armed() as u8);
        let origin = self.bomb.origin().unwrap_or(Point::new(-1, -1));
        hasher.write_i32(origin.x);
        hasher.write_i32(origin.y);

        for perk in Perk::ALL {
            hasher.write_u16(self.perks.remaining(perk));
        }
        hasher.write_u32(self.perks.radius_bonus());
        hasher.write_u32(self.panic_streak);

        hasher.finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
