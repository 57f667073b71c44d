//! Deterministic replay: feed a recorded run through a fresh engine and
//! compare every emitted command and state hash against the journal.

use crate::engine::{DecisionError, Engine};
use crate::journal::RunJournal;

/// First tick where the replayed run stopped matching the recorded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    pub tick: u64,
    pub recorded_command: String,
    pub replayed_command: String,
    pub recorded_hash: u64,
    pub replayed_hash: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub ticks_replayed: u64,
    pub divergence: Option<Divergence>,
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.divergence.is_none()
    }
}

/// Re-run every recorded snapshot through a fresh engine, stopping at the
/// first divergence. The engine is deterministic, so a clean report means
/// the recorded run is exactly reproducible from its snapshots.
pub fn replay(journal: &RunJournal) -> Result<ReplayReport, DecisionError> {
    let mut engine = Engine::new();
    let mut ticks_replayed = 0u64;

    for record in &journal.ticks {
        let command = engine.process_tick(&record.board)?;
        ticks_replayed += 1;

        let replayed_command = command.token();
        let replayed_hash = engine.state_hash();
        if replayed_command != record.command || replayed_hash != record.state_hash {
            tracing::warn!(
                tick = record.tick,
                recorded = %record.command,
                replayed = %replayed_command,
                "replay diverged"
            );
            return Ok(ReplayReport {
                ticks_replayed,
                divergence: Some(Divergence {
                    tick: record.tick,
                    recorded_command: record.command.clone(),
                    replayed_command,
                    recorded_hash: record.state_hash,
                    replayed_hash,
                }),
            });
        }
    }

    Ok(ReplayReport { ticks_replayed, divergence: None })
}
