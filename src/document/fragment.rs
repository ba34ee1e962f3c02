use crate::parse::{Checkpoint, IndentHint, Style};

/// A run of same-styled characters.
#[derive(Debug, Clone)]
pub struct TextFragment {
    pub text: String,
    pub style: Style,
    /// Cached styling may be stale; revalidate on the next pass.
    pub dirty: bool,
    /// The front of this fragment was consumed by a token overlapping into
    /// it. Its text is authoritative but it must be replaced, never
    /// accepted as a match.
    pub reduced: bool,
}

/// An explicit line terminator. Owns the cached state that makes the
/// following line resumable: the parser checkpoint and the indentation
/// rule, both only trustworthy while every fragment on the line ending
/// here is clean.
#[derive(Debug, Clone, Default)]
pub struct BreakFragment {
    pub dirty: bool,
    pub checkpoint: Option<Checkpoint>,
    pub indent: Option<IndentHint>,
}

/// The atomic unit of the document representation.
#[derive(Debug, Clone)]
pub enum Fragment {
    Text(TextFragment),
    Break(BreakFragment),
}

impl Fragment {
    pub fn text(text: impl Into<String>, style: Style) -> Self {
        Fragment::Text(TextFragment {
            text: text.into(),
            style,
            dirty: false,
            reduced: false,
        })
    }

    pub fn dirty_text(text: impl Into<String>, style: Style) -> Self {
        Fragment::Text(TextFragment {
            text: text.into(),
            style,
            dirty: true,
            reduced: false,
        })
    }

    pub fn line_break() -> Self {
        Fragment::Break(BreakFragment::default())
    }

    pub fn dirty_break() -> Self {
        Fragment::Break(BreakFragment {
            dirty: true,
            ..BreakFragment::default()
        })
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Fragment::Break(_))
    }

    /// Bytes this fragment contributes to the document text. A break is
    /// one byte, its newline.
    pub fn len_bytes(&self) -> usize {
        match self {
            Fragment::Text(t) => t.text.len(),
            Fragment::Break(_) => 1,
        }
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            Fragment::Text(t) => t.dirty,
            Fragment::Break(b) => b.dirty,
        }
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        match self {
            Fragment::Text(t) => t.dirty = dirty,
            Fragment::Break(b) => b.dirty = dirty,
        }
    }

    pub fn as_text(&self) -> Option<&TextFragment> {
        match self {
            Fragment::Text(t) => Some(t),
            Fragment::Break(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextFragment> {
        match self {
            Fragment::Text(t) => Some(t),
            Fragment::Break(_) => None,
        }
    }

    pub fn as_break(&self) -> Option<&BreakFragment> {
        match self {
            Fragment::Break(b) => Some(b),
            Fragment::Text(_) => None,
        }
    }

    pub fn as_break_mut(&mut self) -> Option<&mut BreakFragment> {
        match self {
            Fragment::Break(b) => Some(b),
            Fragment::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_bytes() {
        assert_eq!(Fragment::text("hello", Style::Plain).len_bytes(), 5);
        assert_eq!(Fragment::line_break().len_bytes(), 1);
        assert_eq!(Fragment::text("", Style::Plain).len_bytes(), 0);
    }

    #[test]
    fn test_dirty_flag() {
        let mut frag = Fragment::dirty_text("x", Style::Plain);
        assert!(frag.is_dirty());
        frag.set_dirty(false);
        assert!(!frag.is_dirty());
        assert!(Fragment::dirty_break().is_dirty());
        assert!(!Fragment::line_break().is_dirty());
    }
}
