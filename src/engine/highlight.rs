//! The reconciling highlight pass.
//!
//! Tokens pulled from a (possibly resumed) parser are walked in lock-step
//! with the existing fragment sequence. Fragments that already carry the
//! right text and style are left completely alone — that is what preserves
//! their identity and whatever the host hangs off them — while mismatches
//! are patched with the minimum amount of surgery: insert the correct
//! fragment, then eat old fragments until the token's text is accounted
//! for, shortening the last one if a token stops inside it.

use crate::document::{CharStream, Fragment, FragmentId, FragmentSeq, StreamPos};
use crate::engine::selection::SelectionTracker;
use crate::error::{EditorError, Result};
use crate::parse::{Language, TokenParser};

/// Where a pass ended up, used by the scheduler to decide whether and
/// where to continue.
#[derive(Debug)]
pub struct PassReport {
    /// What is left of the line budget, if one was given.
    pub lines_left: Option<usize>,
    /// The fragment the cursor stopped at.
    pub stopped_at: Option<FragmentId>,
    /// Whether the last line visited was dirty.
    pub line_dirty: bool,
    /// The break whose checkpoint the pass resumed from; `None` means the
    /// document was parsed from the top.
    pub resumed_at: Option<FragmentId>,
}

fn out_of_sync<T>(expected: &'static str) -> Result<T> {
    Err(EditorError::ParserOutOfSync { expected })
}

/// Run one highlight pass.
///
/// Starts from the nearest checkpointed break at or before `from` (the
/// document start if there is none), refreshes at most `max_lines` lines,
/// and stops early at the first clean line unless `scan_clean` is set.
/// Returns `None` when there was nothing to do.
pub fn run(
    seq: &mut FragmentSeq,
    language: &dyn Language,
    selection: &mut dyn SelectionTracker,
    from: Option<FragmentId>,
    max_lines: Option<usize>,
    scan_clean: bool,
) -> Result<Option<PassReport>> {
    if seq.is_empty() || max_lines == Some(0) {
        return Ok(None);
    }

    // Back up to the last break before `from` that owns a checkpoint.
    let mut resume = from;
    while let Some(id) = resume {
        match seq.get(id) {
            Some(Fragment::Break(b)) if b.checkpoint.is_some() => break,
            Some(_) => resume = seq.prev(id),
            None => {
                // Stale handle; restart from the top.
                resume = None;
                break;
            }
        }
    }

    // Resuming at the very last fragment means there is nothing after it
    // to highlight.
    if let Some(id) = resume {
        if seq.next(id).is_none() {
            return Ok(None);
        }
    }

    let mut parser: Box<dyn TokenParser> = match resume {
        Some(id) => {
            let checkpoint = seq
                .get(id)
                .and_then(Fragment::as_break)
                .and_then(|b| b.checkpoint.as_ref());
            match checkpoint {
                Some(cp) => cp.resume(),
                None => return out_of_sync("checkpointed break"),
            }
        }
        None => language.start_parser(),
    };

    let mut pos = match resume {
        Some(id) => StreamPos::after(seq, id),
        None => StreamPos::start(seq),
    };

    let mut cursor = PartsCursor::new(resume);
    let mut lines_left = max_lines;
    let mut line_dirty = false;
    let mut line_has_nodes = false;

    loop {
        let token = {
            let mut stream = CharStream::new(seq, &mut pos);
            parser.next_token(&mut stream)
        };
        let Some(token) = token else {
            break;
        };

        let Some(part) = cursor.next_non_empty(seq, selection) else {
            return out_of_sync("fragment for pending token");
        };

        if token.newline {
            let Some(brk) = seq.get(part).and_then(Fragment::as_break) else {
                return out_of_sync("line break");
            };
            if brk.dirty || brk.checkpoint.is_none() || brk.indent.is_none() {
                line_dirty = true;
            }
            // Refresh the cached line state: a checkpoint to resume from
            // and the indentation rule for the next line.
            let checkpoint = parser.checkpoint();
            if let Some(brk) = seq.get_mut(part).and_then(Fragment::as_break_mut) {
                brk.checkpoint = Some(checkpoint);
                brk.indent = token.indent.clone();
                brk.dirty = false;
            }

            let budget_spent = match lines_left.as_mut() {
                Some(left) => {
                    *left -= 1;
                    *left == 0
                }
                None => false,
            };
            if budget_spent || (!scan_clean && !line_dirty && line_has_nodes) {
                return Ok(Some(PassReport {
                    lines_left,
                    stopped_at: cursor.get(seq),
                    line_dirty,
                    resumed_at: resume,
                }));
            }
            line_dirty = false;
            line_has_nodes = false;
            cursor.advance(seq);
        } else {
            let Some(text) = seq.get(part).and_then(Fragment::as_text) else {
                return out_of_sync("text fragment");
            };
            if text.dirty {
                line_dirty = true;
            }
            line_has_nodes = true;

            let correct =
                !text.reduced && text.text == token.value && text.style == token.style;
            if correct {
                if let Some(frag) = seq.get_mut(part) {
                    frag.set_dirty(false);
                }
                cursor.advance(seq);
            } else {
                line_dirty = true;
                let new_id = seq.insert_before(part, Fragment::text(token.value.clone(), token.style));
                let mut remaining = token.value.len();
                let mut offset = 0usize;
                // Eat old fragments until the token's text is paid for.
                while remaining > 0 {
                    let Some(old) = cursor.get(seq) else {
                        return out_of_sync("text run covering token");
                    };
                    let Some(part_size) =
                        seq.get(old).and_then(Fragment::as_text).map(|t| t.text.len())
                    else {
                        return out_of_sync("text fragment inside token");
                    };
                    selection.replaced(old, new_id, remaining, offset);
                    if part_size > remaining {
                        if let Some(t) = seq.get_mut(old).and_then(Fragment::as_text_mut) {
                            t.text = t.text.split_off(remaining);
                            t.reduced = true;
                        }
                        pos.adjust_for_shorten(old, remaining);
                        remaining = 0;
                    } else {
                        remaining -= part_size;
                        offset += part_size;
                        cursor.remove(seq);
                    }
                }
            }
        }
    }

    Ok(Some(PassReport {
        lines_left,
        stopped_at: cursor.get(seq),
        line_dirty,
        resumed_at: resume,
    }))
}

/// Cursor over the fragment sequence that defers moving to the next
/// fragment until the current one is completely dealt with — the pass is
/// constantly inserting and removing around it, and fetching the successor
/// too early would hand back a fragment that is about to change.
struct PartsCursor {
    origin: Option<FragmentId>,
    current: Option<FragmentId>,
    forward: bool,
    ended: bool,
}

impl PartsCursor {
    fn new(origin: Option<FragmentId>) -> Self {
        Self {
            origin,
            current: None,
            forward: false,
            ended: false,
        }
    }

    /// The fragment under the cursor, resolving a pending move.
    fn get(&mut self, seq: &FragmentSeq) -> Option<FragmentId> {
        if self.ended {
            return None;
        }
        match self.current {
            None => {
                self.current = match self.origin {
                    Some(origin) => seq.next(origin),
                    None => seq.head(),
                };
            }
            Some(id) if self.forward => {
                self.current = seq.next(id);
            }
            _ => {}
        }
        self.forward = false;
        if self.current.is_none() {
            self.ended = true;
        }
        self.current
    }

    /// Schedule a move to the next fragment (not fetched yet).
    fn advance(&mut self, seq: &FragmentSeq) {
        if self.forward {
            self.get(seq);
        }
        self.forward = true;
    }

    /// Remove the fragment under the cursor and step onto its successor.
    fn remove(&mut self, seq: &mut FragmentSeq) {
        if let Some(target) = self.get(seq) {
            self.current = seq.prev(target);
            seq.remove(target);
            self.forward = true;
        }
    }

    /// Like `get`, but discards empty text fragments, transferring any
    /// selection anchors to whatever takes their place.
    fn next_non_empty(
        &mut self,
        seq: &mut FragmentSeq,
        selection: &mut dyn SelectionTracker,
    ) -> Option<FragmentId> {
        let mut part = self.get(seq)?;
        loop {
            let empty = seq
                .get(part)
                .and_then(Fragment::as_text)
                .is_some_and(|t| t.text.is_empty());
            if !empty {
                return Some(part);
            }
            let old = part;
            self.remove(seq);
            part = self.get(seq)?;
            selection.replaced(old, part, 0, 0);
        }
    }
}
