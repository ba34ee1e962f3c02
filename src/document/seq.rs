use crate::document::fragment::Fragment;
use crate::parse::Style;

/// Stable handle to a fragment in a [`FragmentSeq`]. Ids of removed
/// fragments go stale rather than silently pointing at a reused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Debug)]
struct Entry {
    fragment: Fragment,
    prev: Option<FragmentId>,
    next: Option<FragmentId>,
}

/// The document as an ordered sequence of fragments: a doubly linked list
/// threaded through a slot arena, so fragments keep their identity across
/// the insertions and removals the highlight pass performs around them.
#[derive(Debug, Default)]
pub struct FragmentSeq {
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: Option<FragmentId>,
    tail: Option<FragmentId>,
    len: usize,
}

impl FragmentSeq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from plain text: one unstyled text fragment per
    /// non-empty line, one break fragment per newline. `\r\n` and `\r` are
    /// normalized to `\n`; nothing else is rewritten.
    pub fn from_text(text: &str) -> Self {
        let mut seq = Self::new();
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        for (i, line) in normalized.split('\n').enumerate() {
            if i > 0 {
                seq.push_back(Fragment::dirty_break());
            }
            if !line.is_empty() {
                seq.push_back(Fragment::dirty_text(line, Style::Plain));
            }
        }
        seq
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn head(&self) -> Option<FragmentId> {
        self.head
    }

    pub fn tail(&self) -> Option<FragmentId> {
        self.tail
    }

    pub fn contains(&self, id: FragmentId) -> bool {
        self.entry(id).is_some()
    }

    fn entry(&self, id: FragmentId) -> Option<&Entry> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: FragmentId) -> Option<&mut Entry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    pub fn get(&self, id: FragmentId) -> Option<&Fragment> {
        self.entry(id).map(|e| &e.fragment)
    }

    pub fn get_mut(&mut self, id: FragmentId) -> Option<&mut Fragment> {
        self.entry_mut(id).map(|e| &mut e.fragment)
    }

    pub fn next(&self, id: FragmentId) -> Option<FragmentId> {
        self.entry(id).and_then(|e| e.next)
    }

    pub fn prev(&self, id: FragmentId) -> Option<FragmentId> {
        self.entry(id).and_then(|e| e.prev)
    }

    fn alloc(&mut self, fragment: Fragment) -> FragmentId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(Entry {
                fragment,
                prev: None,
                next: None,
            });
            FragmentId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry: Some(Entry {
                    fragment,
                    prev: None,
                    next: None,
                }),
            });
            FragmentId {
                index,
                generation: 0,
            }
        }
    }

    pub fn push_back(&mut self, fragment: Fragment) -> FragmentId {
        let id = self.alloc(fragment);
        match self.tail {
            Some(tail) => {
                self.entry_mut(tail).unwrap().next = Some(id);
                self.entry_mut(id).unwrap().prev = Some(tail);
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
        id
    }

    /// Insert `fragment` immediately before `at`.
    pub fn insert_before(&mut self, at: FragmentId, fragment: Fragment) -> FragmentId {
        let prev = self.prev(at);
        let id = self.alloc(fragment);
        self.entry_mut(id).unwrap().prev = prev;
        self.entry_mut(id).unwrap().next = Some(at);
        self.entry_mut(at).unwrap().prev = Some(id);
        match prev {
            Some(p) => self.entry_mut(p).unwrap().next = Some(id),
            None => self.head = Some(id),
        }
        self.len += 1;
        id
    }

    /// Insert `fragment` after `at`, or at the head when `at` is `None`.
    pub fn insert_after(&mut self, at: Option<FragmentId>, fragment: Fragment) -> FragmentId {
        match at {
            Some(at) => match self.next(at) {
                Some(next) => self.insert_before(next, fragment),
                None => self.push_back(fragment),
            },
            None => match self.head {
                Some(head) => self.insert_before(head, fragment),
                None => self.push_back(fragment),
            },
        }
    }

    /// Unlink and return the fragment. The id goes permanently stale.
    pub fn remove(&mut self, id: FragmentId) -> Option<Fragment> {
        let (prev, next) = {
            let entry = self.entry(id)?;
            (entry.prev, entry.next)
        };
        match prev {
            Some(p) => self.entry_mut(p).unwrap().next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.entry_mut(n).unwrap().prev = prev,
            None => self.tail = prev,
        }
        let slot = &mut self.slots[id.index as usize];
        let entry = slot.entry.take().unwrap();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(entry.fragment)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Fragment ids in document order.
    pub fn iter(&self) -> Ids<'_> {
        Ids {
            seq: self,
            cursor: self.head,
        }
    }

    /// Reconstruct the document text.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for id in self.iter() {
            match self.get(id) {
                Some(Fragment::Text(t)) => out.push_str(&t.text),
                Some(Fragment::Break(_)) => out.push('\n'),
                None => {}
            }
        }
        out
    }

    pub fn text_len(&self) -> usize {
        self.iter()
            .filter_map(|id| self.get(id))
            .map(Fragment::len_bytes)
            .sum()
    }

    /// Locate the fragment containing byte offset `pos`, together with the
    /// offset inside it. `None` when `pos` is at or past the end.
    pub fn find_offset(&self, pos: usize) -> Option<(FragmentId, usize)> {
        let mut consumed = 0;
        for id in self.iter() {
            let len = self.get(id).map_or(0, Fragment::len_bytes);
            if pos < consumed + len {
                return Some((id, pos - consumed));
            }
            consumed += len;
        }
        None
    }

    /// Byte offset of the start of `id` in the document text.
    pub fn offset_of(&self, id: FragmentId) -> Option<usize> {
        let mut consumed = 0;
        for cursor in self.iter() {
            if cursor == id {
                return Some(consumed);
            }
            consumed += self.get(cursor).map_or(0, Fragment::len_bytes);
        }
        None
    }
}

pub struct Ids<'a> {
    seq: &'a FragmentSeq,
    cursor: Option<FragmentId>,
}

impl Iterator for Ids<'_> {
    type Item = FragmentId;

    fn next(&mut self) -> Option<FragmentId> {
        let id = self.cursor?;
        self.cursor = self.seq.next(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_round_trip() {
        let cases = ["", "one line", "a\nb\nc", "trailing\n", "\n\n", "  indented\n}"];
        for case in cases {
            let seq = FragmentSeq::from_text(case);
            assert_eq!(seq.text(), *case, "round-trip failed for {case:?}");
        }
    }

    #[test]
    fn test_crlf_normalized() {
        let seq = FragmentSeq::from_text("a\r\nb\rc");
        assert_eq!(seq.text(), "a\nb\nc");
    }

    #[test]
    fn test_insert_and_remove_keep_order() {
        let mut seq = FragmentSeq::new();
        let a = seq.push_back(Fragment::text("a", Style::Plain));
        let c = seq.push_back(Fragment::text("c", Style::Plain));
        let b = seq.insert_before(c, Fragment::text("b", Style::Plain));
        assert_eq!(seq.text(), "abc");
        assert_eq!(seq.next(a), Some(b));
        assert_eq!(seq.prev(c), Some(b));

        seq.remove(b);
        assert_eq!(seq.text(), "ac");
        assert_eq!(seq.next(a), Some(c));
        assert!(!seq.contains(b));
        assert!(seq.contains(a));
    }

    #[test]
    fn test_stale_id_never_aliases_reused_slot() {
        let mut seq = FragmentSeq::new();
        let a = seq.push_back(Fragment::text("a", Style::Plain));
        seq.remove(a);
        let b = seq.push_back(Fragment::text("b", Style::Plain));
        // b reuses a's slot but a must stay stale.
        assert!(!seq.contains(a));
        assert!(seq.contains(b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_insert_after_head_and_none() {
        let mut seq = FragmentSeq::new();
        let b = seq.push_back(Fragment::text("b", Style::Plain));
        seq.insert_after(None, Fragment::text("a", Style::Plain));
        seq.insert_after(Some(b), Fragment::text("c", Style::Plain));
        assert_eq!(seq.text(), "abc");
    }

    #[test]
    fn test_find_offset() {
        let seq = FragmentSeq::from_text("ab\ncd");
        let (frag, off) = seq.find_offset(0).unwrap();
        assert_eq!(off, 0);
        assert_eq!(seq.get(frag).unwrap().as_text().unwrap().text, "ab");

        let (frag, off) = seq.find_offset(2).unwrap();
        assert!(seq.get(frag).unwrap().is_break());
        assert_eq!(off, 0);

        let (frag, off) = seq.find_offset(4).unwrap();
        assert_eq!(seq.get(frag).unwrap().as_text().unwrap().text, "cd");
        assert_eq!(off, 1);

        assert!(seq.find_offset(5).is_none());
        assert_eq!(seq.text_len(), 5);
    }
}
