//! Line-per-snapshot session loop, generic over reader and writer so the
//! same code drives stdin/stdout in production and buffers in tests.

use std::io::{BufRead, Write};
use std::time::Instant;

use sapper_core::journal_file::JournalWriter;
use sapper_core::{Engine, TickRecord};

pub struct Session {
    engine: Engine,
    journal: Option<JournalWriter>,
}

impl Session {
    pub fn new(journal: Option<JournalWriter>) -> Self {
        Self { engine: Engine::new(), journal }
    }

    /// Drive the engine until the input stream ends. Every input line is
    /// one snapshot (an optional `board=` wire prefix is stripped), every
    /// output line is one command token, flushed per tick. A rejected
    /// snapshot logs and emits a no-op; it never ends the session.
    pub fn run(&mut self, input: impl BufRead, mut output: impl Write) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line?;
            let snapshot = line.strip_prefix("board=").unwrap_or(&line);
            if snapshot.trim().is_empty() {
                continue;
            }

            let started = Instant::now();
            let command = match self.engine.process_tick(snapshot) {
                Ok(command) => command,
                Err(error) => {
                    tracing::warn!(%error, "snapshot rejected, emitting no-op");
                    writeln!(output, "NONE")?;
                    output.flush()?;
                    continue;
                }
            };
            let decision_micros = started.elapsed().as_micros() as u64;

            tracing::info!(
                tick = self.engine.current_tick(),
                mode = ?self.engine.mode(),
                %command,
                state_hash = %crate::format_state_hash(self.engine.state_hash()),
                decision_micros,
                "tick"
            );
            writeln!(output, "{command}")?;
            output.flush()?;

            if let Some(journal) = &mut self.journal {
                journal.append(&TickRecord {
                    tick: self.engine.current_tick(),
                    board: snapshot.to_string(),
                    command: command.token(),
                    state_hash: self.engine.state_hash(),
                    decision_micros,
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use sapper_core::journal_file::load_journal_from_file;
    use sapper_core::replay::replay;

    use super::*;

    fn small_arena() -> String {
        [
            "☼☼☼☼☼☼☼☼☼",
            "☼☺      ☼",
            "☼       ☼",
            "☼       ☼",
            "☼       ☼",
            "☼       ☼",
            "☼      #☼",
            "☼       ☼",
            "☼☼☼☼☼☼☼☼☼",
        ]
        .concat()
    }

    #[test]
    fn emits_one_command_line_per_snapshot_line() {
        let arena = small_arena();
        let input = format!("{arena}\nboard={arena}\n");
        let mut output = Vec::new();

        let mut session = Session::new(None);
        session.run(Cursor::new(input), &mut output).unwrap();

        let lines: Vec<&str> = std::str::from_utf8(&output).unwrap().lines().collect();
        assert_eq!(lines.len(), 2, "prefixed and bare snapshots both decide");
        assert!(!lines[0].is_empty());
    }

    #[test]
    fn rejected_snapshot_emits_noop_and_the_session_continues() {
        let arena = small_arena();
        let input = format!("☼☼☼\n{arena}\n");
        let mut output = Vec::new();

        let mut session = Session::new(None);
        session.run(Cursor::new(input), &mut output).unwrap();

        let lines: Vec<&str> = std::str::from_utf8(&output).unwrap().lines().collect();
        assert_eq!(lines[0], "NONE");
        assert_ne!(lines[1], "", "the next good snapshot still decides");
    }

    #[test]
    fn journaled_session_replays_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let arena = small_arena();
        let input = format!("{arena}\n{arena}\n{arena}\n");

        let writer = JournalWriter::create(&path, "test").unwrap();
        let mut session = Session::new(Some(writer));
        session.run(Cursor::new(input), &mut Vec::new()).unwrap();

        let loaded = load_journal_from_file(&path).unwrap();
        assert_eq!(loaded.journal.ticks.len(), 3);
        let report = replay(&loaded.journal).unwrap();
        assert!(report.is_clean(), "recorded run must reproduce: {:?}", report.divergence);
    }
}
