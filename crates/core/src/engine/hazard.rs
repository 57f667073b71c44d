//! Own-bomb lifecycle and danger-set derivation.
//! This module exists so fuse/remote bookkeeping stays in one place.
//! It does not track other agents' bombs; the board exposes those directly.

use std::collections::BTreeSet;

use super::*;

/// The engine's own pending bomb, if any. A remote-armed bomb carries no
/// fuse countdown; it detonates only on an explicit act command.
#[derive(Clone, Debug, Default)]
pub struct OwnBomb {
    fuse: u8,
    origin: Option<Point>,
    remote_armed: bool,
    danger: BTreeSet<Point>,
}

impl OwnBomb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn fuse(&self) -> u8 {
        self.fuse
    }

    /// True while a fused (non-remote) bomb of ours is pending.
    pub fn fuse_active(&self) -> bool {
        self.fuse != 0
    }

    pub fn remote_armed(&self) -> bool {
        self.remote_armed
    }

    pub fn origin(&self) -> Option<Point> {
        self.origin
    }

    /// Cells our pending bomb will destroy. Remote-armed bombs contribute
    /// here too; the agent must stay clear of its own trigger radius.
    pub fn danger(&self) -> &BTreeSet<Point> {
        &self.danger
    }

    /// Fold this tick's observations into the bomb state.
    ///
    /// Placement is detected two ways: the board shows the hero standing on
    /// a just-placed bomb, or the previous command carried the act token (in
    /// which case the bomb sits one step behind the move we made with it).
    pub fn observe(
        &mut self,
        board: &Board,
        me: Point,
        prev_command: Command,
        perks: &mut PerkTracker,
        blast_range: u32,
    ) {
        if self.remote_armed && prev_command.fires_bomb() {
            tracing::debug!(origin = ?self.origin, "remote bomb detonated");
            self.reset();
            return;
        }

        if board.at(me) == Element::HeroOnBomb {
            self.origin = Some(me);
            self.fuse = BOMB_FUSE_TICKS;
        } else if prev_command.fires_bomb() {
            let origin = match prev_command.direction {
                Some(direction) => me.step(direction.opposite()),
                None => me,
            };
            self.origin = Some(origin);
            self.fuse = BOMB_FUSE_TICKS;
        }

        // A fresh placement converts to remote arming while charges remain.
        if self.fuse == BOMB_FUSE_TICKS && perks.remote_charges() > 0 {
            self.remote_armed = true;
            perks.use_remote_charge();
            self.fuse = 0;
        }

        if !self.remote_armed && self.fuse != 0 {
            self.fuse -= 1;
            if self.fuse == 0 {
                self.origin = None;
            }
        }

        self.danger = match self.origin {
            Some(origin) => board.blast_cells(origin, blast_range),
            None => BTreeSet::new(),
        };
    }
}
