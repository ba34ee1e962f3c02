//! Dirty-set bookkeeping and the budgeted background pass.
//!
//! Edits mark fragments dirty; the scheduler drains them a bounded number
//! of lines at a time, so a pass never holds up input handling. The host
//! owns the actual timer: `schedule` arms a latch, the host fires
//! `run_pass` after the configured delay, and a `Reschedule` outcome asks
//! for another round.

use log::debug;

use crate::document::{FragmentId, FragmentSeq};
use crate::engine::highlight;
use crate::engine::selection::SelectionTracker;
use crate::error::Result;
use crate::parse::Language;

/// What the host should do after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The dirty set is drained; no further pass is needed.
    Idle,
    /// The line budget ran out with work remaining; run another pass after
    /// the configured delay.
    Reschedule,
}

#[derive(Debug, Default)]
pub struct DirtyScheduler {
    dirty: Vec<FragmentId>,
    pending: bool,
}

impl DirtyScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment to the dirty set, deduplicated by identity, and flag
    /// it so a pass walking over it knows the line needs revalidation.
    pub fn mark(&mut self, seq: &mut FragmentSeq, id: FragmentId) {
        if self.dirty.contains(&id) {
            return;
        }
        if let Some(frag) = seq.get_mut(id) {
            frag.set_dirty(true);
            self.dirty.push(id);
        }
    }

    pub fn has_work(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Arm the pending-pass latch. Returns true when it was newly armed,
    /// i.e. the host should start (or restart) its delay timer.
    pub fn schedule(&mut self) -> bool {
        let newly = !self.pending;
        self.pending = true;
        newly
    }

    pub fn cancel(&mut self) {
        self.pending = false;
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending
    }

    /// Drop everything; used when the document is replaced wholesale.
    pub fn clear(&mut self) {
        self.dirty.clear();
        self.pending = false;
    }

    /// Fetch one dirty fragment, skipping entries that have been cleaned
    /// or detached in the meantime.
    fn pop_dirty(&mut self, seq: &FragmentSeq) -> Option<FragmentId> {
        while let Some(id) = self.dirty.pop() {
            if seq.get(id).is_some_and(|frag| frag.is_dirty()) {
                return Some(id);
            }
        }
        None
    }

    /// Highlight dirty fragments until `lines_per_pass` lines have been
    /// refreshed, re-enqueueing a line the budget cut off mid-way.
    pub fn run_pass(
        &mut self,
        seq: &mut FragmentSeq,
        language: &dyn Language,
        selection: &mut dyn SelectionTracker,
        lines_per_pass: usize,
    ) -> Result<PassOutcome> {
        self.pending = false;
        let mut lines = lines_per_pass;
        let mut exhausted = false;
        while lines > 0 {
            let Some(start) = self.pop_dirty(seq) else {
                break;
            };
            let report = highlight::run(seq, language, selection, Some(start), Some(lines), false)?;
            if let Some(report) = report {
                lines = report.lines_left.unwrap_or(0);
                if report.line_dirty {
                    if let Some(node) = report.stopped_at {
                        self.mark(seq, node);
                    }
                }
            }
            exhausted = lines == 0;
        }
        if exhausted {
            debug!(
                "highlight budget exhausted, {} dirty entries pending",
                self.dirty.len()
            );
            Ok(PassOutcome::Reschedule)
        } else {
            Ok(PassOutcome::Idle)
        }
    }
}
