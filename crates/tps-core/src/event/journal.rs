use chrono::Utc;
use uuid::Uuid;

use super::{RunEvent, RunEventKind};

#[derive(Debug, Default)]
pub struct RunJournal {
    events: Vec<RunEvent>,
}

impl RunJournal {
    pub fn append(&mut self, run_id: Option<Uuid>, kind: RunEventKind) -> &RunEvent {
        let seq = self.events.len() as u64;
        self.events.push(RunEvent { seq,
                                    run_id,
                                    kind,
                                    ts: Utc::now() });
        &self.events[self.events.len() - 1]
    }

    pub fn events(&self) -> &[RunEvent] {
        &self.events
    }

    /// Eventos de un run concreto.
    pub fn for_run(&self, run_id: Uuid) -> impl Iterator<Item = &RunEvent> {
        self.events.iter().filter(move |e| e.run_id == Some(run_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_contiguous() {
        let mut j = RunJournal::default();
        let run = Uuid::new_v4();
        j.append(None, RunEventKind::ChainsSeeded { n_chains: 2 });
        for i in 0..4 {
            j.append(Some(run),
                     RunEventKind::StepCommitted { chain_index: 0,
                                                   step_number: i + 1,
                                                   accepted: true,
                                                   global_step: i + 1,
                                                   tasks: vec![] });
        }
        for (expected, ev) in (0u64..).zip(j.events()) {
            assert_eq!(ev.seq, expected);
        }
        assert_eq!(j.for_run(run).count(), 4);
    }
}
