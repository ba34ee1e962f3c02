use crate::document::{FragmentId, FragmentSeq};

/// Collaborator notified whenever the highlight pass prunes, shortens or
/// replaces a fragment, so cursor/selection anchors referencing the old
/// fragment can be remapped.
///
/// `consumed` is how many bytes of `old`'s front the new fragment took
/// over; `offset` is where inside `new` those bytes begin. Anchors within
/// the consumed span move into `new`, anchors past it stay in `old` with
/// their offset shifted down.
pub trait SelectionTracker {
    fn replaced(&mut self, old: FragmentId, new: FragmentId, consumed: usize, offset: usize);
}

/// Null tracker for hosts without a selection.
#[derive(Debug, Default)]
pub struct NoSelection;

impl SelectionTracker for NoSelection {
    fn replaced(&mut self, _old: FragmentId, _new: FragmentId, _consumed: usize, _offset: usize) {}
}

/// Handle to an anchor placed in an [`AnchorSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub fragment: FragmentId,
    pub offset: usize,
}

/// A small set of (fragment, byte offset) anchors that survive fragment
/// churn. The editor owns one and threads it through every pass.
#[derive(Debug, Default)]
pub struct AnchorSet {
    anchors: Vec<Option<Anchor>>,
}

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, fragment: FragmentId, offset: usize) -> AnchorId {
        self.anchors.push(Some(Anchor { fragment, offset }));
        AnchorId(self.anchors.len() - 1)
    }

    pub fn get(&self, id: AnchorId) -> Option<Anchor> {
        self.anchors.get(id.0).copied().flatten()
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
    }

    /// Fragment `old` was split at byte `at`, its tail moving to `tail`.
    /// Anchors past the split point follow the tail.
    pub fn split(&mut self, old: FragmentId, tail: FragmentId, at: usize) {
        for anchor in self.anchors.iter_mut().flatten() {
            if anchor.fragment == old && anchor.offset > at {
                anchor.fragment = tail;
                anchor.offset -= at;
            }
        }
    }

    /// Point every anchor sitting in `old` at `fragment` offset 0. Used by
    /// edits that delete fragments outright.
    pub fn rehome(&mut self, old: FragmentId, fragment: FragmentId) {
        for anchor in self.anchors.iter_mut().flatten() {
            if anchor.fragment == old {
                anchor.fragment = fragment;
                anchor.offset = 0;
            }
        }
    }

    /// Absolute byte position of an anchor in the document.
    pub fn resolve(&self, seq: &FragmentSeq, id: AnchorId) -> Option<usize> {
        let anchor = self.get(id)?;
        let base = seq.offset_of(anchor.fragment)?;
        Some(base + anchor.offset)
    }
}

impl SelectionTracker for AnchorSet {
    fn replaced(&mut self, old: FragmentId, new: FragmentId, consumed: usize, offset: usize) {
        for anchor in self.anchors.iter_mut().flatten() {
            if anchor.fragment != old {
                continue;
            }
            if anchor.offset > consumed {
                anchor.offset -= consumed;
            } else {
                anchor.fragment = new;
                anchor.offset += offset;
            }
        }
    }
}
