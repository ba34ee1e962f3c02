//! The editor facade: one document, one language, and the machinery that
//! keeps its highlighting fresh as it is edited.
//!
//! The host owns the event loop and the timer. Edits come in through
//! [`Editor::replace_range`] (or `import_text`), which mark the affected
//! fragments dirty and arm the pass latch; the host fires
//! [`Editor::run_highlight_pass`] after [`Editor::pass_delay`] and keeps
//! rescheduling while it reports more work. Key handlers that need fresh
//! state immediately (Enter, Tab, electric characters) call the
//! synchronous entry points instead.

use std::ops::Range;
use std::rc::Rc;
use std::time::Duration;

use log::error;

use crate::config::EditorConfig;
use crate::document::{Fragment, FragmentId, FragmentSeq};
use crate::engine::highlight::{self, PassReport};
use crate::engine::indent;
use crate::engine::scheduler::{DirtyScheduler, PassOutcome};
use crate::engine::selection::AnchorSet;
use crate::error::Result;
use crate::lang::LanguageRegistry;
use crate::parse::{Language, Style};

pub struct Editor {
    config: EditorConfig,
    language: Rc<dyn Language>,
    seq: FragmentSeq,
    scheduler: DirtyScheduler,
    anchors: AnchorSet,
}

impl Editor {
    pub fn new(language: Rc<dyn Language>, config: EditorConfig) -> Self {
        Self {
            config,
            language,
            seq: FragmentSeq::new(),
            scheduler: DirtyScheduler::new(),
            anchors: AnchorSet::new(),
        }
    }

    /// Look the configured language up in `registry`; a missing module is
    /// fatal here, not at first use.
    pub fn with_registry(registry: &LanguageRegistry, config: EditorConfig) -> Result<Self> {
        let language = registry.by_name(&config.language)?;
        Ok(Self::new(language, config))
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn language_name(&self) -> &'static str {
        self.language.name()
    }

    pub fn fragments(&self) -> &FragmentSeq {
        &self.seq
    }

    pub fn anchors(&self) -> &AnchorSet {
        &self.anchors
    }

    pub fn anchors_mut(&mut self) -> &mut AnchorSet {
        &mut self.anchors
    }

    /// How long the host should wait between scheduling and running a
    /// background pass.
    pub fn pass_delay(&self) -> Duration {
        Duration::from_millis(self.config.pass_delay_ms)
    }

    pub fn is_pass_scheduled(&self) -> bool {
        self.scheduler.is_scheduled()
    }

    pub fn cancel_scheduled_pass(&mut self) {
        self.scheduler.cancel();
    }

    /// Replace the whole document and queue it for highlighting.
    pub fn import_text(&mut self, text: &str) {
        self.seq = FragmentSeq::from_text(text);
        self.scheduler.clear();
        self.anchors.clear();
        if let Some(head) = self.seq.head() {
            self.scheduler.mark(&mut self.seq, head);
            self.scheduler.schedule();
        }
    }

    /// The document text, reconstructed from the fragment sequence.
    pub fn export_text(&self) -> String {
        self.seq.text()
    }

    /// Splice `text` over the byte range `range`. Fragments strictly
    /// outside the range keep their identity; the affected ones are marked
    /// dirty and a pass is scheduled.
    pub fn replace_range(&mut self, range: Range<usize>, text: &str) {
        let total = self.seq.text_len();
        let start = range.start.min(total);
        let end = range.end.clamp(start, total);

        // Split the fragment the edit starts inside, keeping the prefix.
        let mut split_frag = None;
        let insert_after = match self.seq.find_offset(start) {
            None => self.seq.tail(),
            Some((frag, 0)) => self.seq.prev(frag),
            Some((frag, off)) => {
                if let Some(t) = self.seq.get_mut(frag).and_then(Fragment::as_text_mut) {
                    let tail = t.text.split_off(off);
                    let style = t.style;
                    t.dirty = true;
                    let tail_id = self
                        .seq
                        .insert_after(Some(frag), Fragment::dirty_text(tail, style));
                    self.anchors.split(frag, tail_id, off);
                }
                split_frag = Some(frag);
                Some(frag)
            }
        };

        // Remove the selected bytes.
        let mut to_delete = end - start;
        let mut removed = Vec::new();
        let mut cursor = match insert_after {
            Some(id) => self.seq.next(id),
            None => self.seq.head(),
        };
        while to_delete > 0 {
            let Some(id) = cursor else { break };
            let len = match self.seq.get(id) {
                Some(frag) => frag.len_bytes(),
                None => break,
            };
            if len <= to_delete {
                cursor = self.seq.next(id);
                self.seq.remove(id);
                removed.push(id);
                to_delete -= len;
            } else {
                if let Some(t) = self.seq.get_mut(id).and_then(Fragment::as_text_mut) {
                    t.text = t.text.split_off(to_delete);
                    t.dirty = true;
                }
                to_delete = 0;
            }
        }

        // Insert the replacement, split into text runs and breaks.
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut at = insert_after;
        let mut inserted_first = None;
        for (i, piece) in normalized.split('\n').enumerate() {
            if i > 0 {
                let id = self.seq.insert_after(at, Fragment::dirty_break());
                at = Some(id);
                inserted_first.get_or_insert(id);
            }
            if !piece.is_empty() {
                let id = self
                    .seq
                    .insert_after(at, Fragment::dirty_text(piece, Style::Plain));
                at = Some(id);
                inserted_first.get_or_insert(id);
            }
        }

        // Anchors in deleted fragments land at the start of what replaced
        // them.
        let first_affected = inserted_first
            .or_else(|| match insert_after {
                Some(id) => self.seq.next(id),
                None => self.seq.head(),
            })
            .or(insert_after);
        if let Some(target) = first_affected {
            for old in removed {
                self.anchors.rehome(old, target);
            }
        }

        for id in split_frag.into_iter().chain(first_affected) {
            self.scheduler.mark(&mut self.seq, id);
        }
        if self.scheduler.has_work() {
            self.scheduler.schedule();
        }
    }

    pub fn insert(&mut self, at: usize, text: &str) {
        self.replace_range(at..at, text);
    }

    /// Mark the fragment at `pos` for re-highlighting, as a host does on
    /// an ordinary keystroke.
    pub fn mark_dirty_at(&mut self, pos: usize) {
        let frag = match self.seq.find_offset(pos) {
            Some((frag, _)) => Some(frag),
            None => self.seq.tail(),
        };
        if let Some(frag) = frag {
            self.scheduler.mark(&mut self.seq, frag);
            self.scheduler.schedule();
        }
    }

    /// The background pass body: highlight up to the configured number of
    /// lines of dirty content. On a desynchronization failure the cached
    /// line state is wiped and a full reparse is queued before the error
    /// is surfaced.
    pub fn run_highlight_pass(&mut self) -> Result<PassOutcome> {
        let result = self.scheduler.run_pass(
            &mut self.seq,
            &*self.language,
            &mut self.anchors,
            self.config.lines_per_pass,
        );
        match result {
            Ok(outcome) => {
                if outcome == PassOutcome::Reschedule {
                    self.scheduler.schedule();
                }
                Ok(outcome)
            }
            Err(err) => {
                error!("highlight pass failed: {err}; queueing a full reparse");
                self.reparse_all();
                Err(err)
            }
        }
    }

    /// Synchronous bounded pass, for hosts that need a line fresh right
    /// now (before computing indentation, say).
    pub fn highlight(
        &mut self,
        from: Option<FragmentId>,
        max_lines: Option<usize>,
    ) -> Result<Option<PassReport>> {
        highlight::run(
            &mut self.seq,
            &*self.language,
            &mut self.anchors,
            from,
            max_lines,
            false,
        )
    }

    /// Highlight the whole document in one unbounded sweep, clean lines
    /// included.
    pub fn highlight_all(&mut self) -> Result<()> {
        highlight::run(
            &mut self.seq,
            &*self.language,
            &mut self.anchors,
            None,
            None,
            true,
        )?;
        Ok(())
    }

    /// Drop all cached line state and queue the document for a complete
    /// re-highlight.
    pub fn reparse_all(&mut self) {
        let ids: Vec<_> = self.seq.iter().collect();
        for id in ids {
            if let Some(frag) = self.seq.get_mut(id) {
                frag.set_dirty(true);
                if let Some(b) = frag.as_break_mut() {
                    b.checkpoint = None;
                    b.indent = None;
                }
            }
        }
        if let Some(head) = self.seq.head() {
            self.scheduler.mark(&mut self.seq, head);
        }
        self.scheduler.schedule();
    }

    /// The break that starts the line containing `frag`, or `None` on the
    /// first line.
    pub fn line_start(&self, frag: FragmentId) -> Option<FragmentId> {
        let mut cursor = Some(frag);
        while let Some(id) = cursor {
            if self.seq.get(id).is_some_and(Fragment::is_break) {
                return Some(id);
            }
            cursor = self.seq.prev(id);
        }
        None
    }

    /// Re-indent the line following `after` using its cached indentation
    /// rule, and queue the line for revalidation.
    pub fn indent_line_after(&mut self, after: Option<FragmentId>) -> Result<Option<FragmentId>> {
        let whitespace = indent::line_after(&mut self.seq, after)?;
        if let Some(ws) = whitespace {
            self.scheduler.mark(&mut self.seq, ws);
            self.scheduler.schedule();
        }
        Ok(whitespace)
    }

    /// Re-indent the line containing byte position `pos`: highlight it so
    /// the lexical state is fresh, then apply the indentation rule. This
    /// is the Enter/Tab/electric-character entry point.
    pub fn indent_line_at(&mut self, pos: usize) -> Result<Option<FragmentId>> {
        // A cursor at a fragment boundary sits after the previous
        // fragment; that fragment is the one its line hangs off.
        let frag = match self.seq.find_offset(pos) {
            Some((frag, 0)) => self.seq.prev(frag).or(Some(frag)),
            Some((frag, _)) => Some(frag),
            None => self.seq.tail(),
        };
        let Some(frag) = frag else {
            return Ok(None);
        };
        if let Some(f) = self.seq.get_mut(frag) {
            f.set_dirty(true);
        }
        self.highlight(Some(frag), None)?;
        let start = self.line_start(frag);
        self.indent_line_after(start)
    }

    pub fn electric_chars(&self) -> &'static str {
        self.language.electric_chars()
    }

    pub fn is_electric(&self, ch: char) -> bool {
        self.electric_chars().contains(ch)
    }

    /// Host hook for a just-typed character: electric ones re-indent the
    /// line immediately.
    pub fn handle_typed_char(&mut self, pos: usize, ch: char) -> Result<Option<FragmentId>> {
        if !self.is_electric(ch) {
            return Ok(None);
        }
        self.indent_line_at(pos)
    }
}
