//! Journal de runs del `Brain`.

mod journal;
mod types;

pub use journal::RunJournal;
pub use types::{RunEvent, RunEventKind};
