use serde::{Deserialize, Serialize};

/// In-memory record of one run: every snapshot consumed and command emitted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunJournal {
    pub format_version: u16,
    pub build_id: String,
    pub ticks: Vec<TickRecord>,
}

/// One decided tick. `board` is the raw snapshot exactly as received and
/// `command` the token exactly as emitted, so a replay needs nothing else.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickRecord {
    pub tick: u64,
    pub board: String,
    pub command: String,
    pub state_hash: u64,
    pub decision_micros: u64,
}

impl RunJournal {
    pub fn new(build_id: &str) -> Self {
        Self { format_version: 1, build_id: build_id.to_string(), ticks: Vec::new() }
    }

    pub fn append_tick(&mut self, record: TickRecord) {
        self.ticks.push(record);
    }
}
