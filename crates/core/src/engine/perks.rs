//! Perk economy bookkeeping: duration counters, remote charges, radius
//! stacking. Keyed by the closed `Perk` enum so every kind is handled
//! exhaustively at compile time.

use super::*;

#[derive(Clone, Debug, Default)]
pub struct PerkTracker {
    durations: [u16; Perk::COUNT],
    remote_charges: u8,
    radius_stacks: u32,
}

impl PerkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Remaining duration ticks, or remaining charges for remote control.
    pub fn remaining(&self, perk: Perk) -> u16 {
        match perk {
            Perk::RemoteControl => u16::from(self.remote_charges),
            other => self.durations[other.index()],
        }
    }

    pub fn remote_charges(&self) -> u8 {
        self.remote_charges
    }

    pub fn use_remote_charge(&mut self) {
        self.remote_charges = self.remote_charges.saturating_sub(1);
    }

    /// Extra blast reach from stacked radius pickups. Zero whenever the
    /// radius duration counter has expired.
    pub fn radius_bonus(&self) -> u32 {
        self.radius_stacks * BLAST_RADIUS_STEP
    }

    pub fn immunity_ticks(&self) -> u16 {
        self.durations[Perk::Immunity.index()]
    }

    pub fn has_extra_bomb(&self) -> bool {
        self.durations[Perk::ExtraBomb.index()] > 0
    }

    /// Apply one tick: fold in a completed pickup (if any), then decrement
    /// every duration counter. Remote control is charge-based and never
    /// decays with time.
    pub fn advance(&mut self, picked: Option<Perk>) {
        if let Some(perk) = picked {
            tracing::debug!(?perk, "perk picked up");
            match perk {
                Perk::RemoteControl => self.remote_charges = REMOTE_CHARGES,
                Perk::BlastRadius => {
                    let slot = &mut self.durations[Perk::BlastRadius.index()];
                    *slot = slot.saturating_add(PERK_REFILL_TICKS);
                    self.radius_stacks += 1;
                }
                Perk::Immunity | Perk::ExtraBomb => {
                    self.durations[perk.index()] = PERK_REFILL_TICKS;
                }
            }
        }

        for perk in Perk::ALL {
            if perk == Perk::RemoteControl {
                continue;
            }
            let slot = &mut self.durations[perk.index()];
            if *slot > 0 {
                *slot -= 1;
                if *slot == 0 && perk == Perk::BlastRadius {
                    self.radius_stacks = 0;
                }
            }
        }
    }
}
