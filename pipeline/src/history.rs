use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use entity::Stage;

use crate::notify::NotificationId;

/// How many completed moves stay undoable.
pub const UNDO_DEPTH: usize = 5;

/// Session-unique token for one completed stage move.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct MoveId(u64);

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One persisted stage transition, retained only for undo and display.
#[derive(Clone, Debug)]
pub struct MoveRecord {
    pub id: MoveId,
    pub deal_id: i64,
    /// Denormalized for display after the deal leaves the working set;
    /// callers prefer the live title when the deal is still present.
    pub deal_title: String,
    pub from: Stage,
    pub to: Stage,
    pub at: DateTime<Utc>,
    /// The success notification this move raised, dismissed on undo.
    pub notification: NotificationId,
}

/// Fixed-capacity record of the most recent moves, newest first. The
/// oldest entry is evicted on push once `UNDO_DEPTH` is reached.
#[derive(Debug, Default)]
pub struct MoveHistory {
    entries: VecDeque<MoveRecord>,
    last_id: u64,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(UNDO_DEPTH),
            last_id: 0,
        }
    }

    /// Hand out the id for the next move before its record exists, so
    /// the undo affordance on the success notification can carry it.
    pub fn allocate_id(&mut self) -> MoveId {
        self.last_id += 1;
        MoveId(self.last_id)
    }

    pub fn push(&mut self, record: MoveRecord) {
        if self.entries.len() == UNDO_DEPTH {
            self.entries.pop_back();
        }
        self.entries.push_front(record);
    }

    /// Remove and return the entry for `id`, if it is still retained.
    pub fn take(&mut self, id: MoveId) -> Option<MoveRecord> {
        let idx = self.entries.iter().position(|r| r.id == id)?;
        self.entries.remove(idx)
    }

    /// Put back an entry whose undo failed to persist, keeping the
    /// newest-first ordering by id.
    pub fn restore(&mut self, record: MoveRecord) {
        let idx = self
            .entries
            .iter()
            .position(|r| r.id < record.id)
            .unwrap_or(self.entries.len());
        self.entries.insert(idx, record);
        while self.entries.len() > UNDO_DEPTH {
            self.entries.pop_back();
        }
    }

    pub fn contains(&self, id: MoveId) -> bool {
        self.entries.iter().any(|r| r.id == id)
    }

    /// Newest first.
    pub fn recent(&self) -> impl Iterator<Item = &MoveRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
