//! Re-indentation of a single line.
//!
//! The indentation rule lives on the break fragment that ends the previous
//! line, put there by the highlight pass. Applying it is then pure fragment
//! surgery on the line's leading-whitespace fragment.

use crate::document::{Fragment, FragmentId, FragmentSeq};
use crate::error::{EditorError, Result};
use crate::parse::Style;

/// Adjust the leading whitespace of the line following `after` (`None`
/// means the first line of the document, which always indents to zero).
///
/// The break must carry a fresh indentation rule, i.e. the line must have
/// been highlighted since it last changed. Returns the whitespace fragment
/// that was grown, shrunk or created, or `None` when the line ends up with
/// no leading whitespace.
pub fn line_after(seq: &mut FragmentSeq, after: Option<FragmentId>) -> Result<Option<FragmentId>> {
    // The whitespace fragment at the start of the line, if there is one.
    let first = match after {
        Some(id) => seq.next(id),
        None => seq.head(),
    };
    let whitespace = first.filter(|id| {
        seq.get(*id)
            .and_then(Fragment::as_text)
            .is_some_and(|t| t.style == Style::Whitespace)
    });

    // The first real content of the line can influence the indentation
    // (closing brackets dedent), so fetch it.
    let first_text = match whitespace {
        Some(ws) => seq.next(ws),
        None => first,
    };
    let next_chars = first_text
        .and_then(|id| seq.get(id))
        .and_then(Fragment::as_text)
        .map(|t| t.text.clone())
        .unwrap_or_default();

    let indent = match after {
        Some(id) => {
            let rule = seq
                .get(id)
                .and_then(Fragment::as_break)
                .and_then(|b| b.indent.as_ref())
                .ok_or(EditorError::MissingIndentation)?;
            rule.target(&next_chars)
        }
        None => 0,
    };

    let current = whitespace
        .and_then(|id| seq.get(id))
        .and_then(Fragment::as_text)
        .map(|t| t.text.len())
        .unwrap_or(0);

    if indent == current {
        return Ok(whitespace);
    }

    if indent == 0 {
        if let Some(ws) = whitespace {
            seq.remove(ws);
        }
        return Ok(None);
    }

    match whitespace {
        Some(ws) => {
            if let Some(t) = seq.get_mut(ws).and_then(Fragment::as_text_mut) {
                t.text = " ".repeat(indent);
                t.dirty = true;
            }
            Ok(Some(ws))
        }
        None => {
            let ws = seq.insert_after(
                after,
                Fragment::dirty_text(" ".repeat(indent), Style::Whitespace),
            );
            Ok(Some(ws))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{IndentHint, IndentRule};

    #[derive(Debug, Clone)]
    struct Fixed(usize);

    impl IndentRule for Fixed {
        fn target(&self, next_chars: &str) -> usize {
            if next_chars.starts_with('}') { 0 } else { self.0 }
        }

        fn clone_box(&self) -> Box<dyn IndentRule> {
            Box::new(self.clone())
        }
    }

    fn seq_with_rule(line: &str, indent: usize) -> (FragmentSeq, FragmentId) {
        let mut seq = FragmentSeq::new();
        seq.push_back(Fragment::text("head", Style::Plain));
        let brk = seq.push_back(Fragment::line_break());
        if let Some(b) = seq.get_mut(brk).and_then(Fragment::as_break_mut) {
            b.indent = Some(IndentHint::new(Fixed(indent)));
        }
        if !line.is_empty() {
            seq.push_back(Fragment::text(line, Style::Plain));
        }
        (seq, brk)
    }

    #[test]
    fn test_creates_whitespace_fragment() {
        let (mut seq, brk) = seq_with_rule("body", 2);
        let ws = line_after(&mut seq, Some(brk)).unwrap().unwrap();
        assert_eq!(seq.get(ws).unwrap().as_text().unwrap().text, "  ");
        assert_eq!(seq.text(), "head\n  body");
    }

    #[test]
    fn test_grows_and_shrinks_existing_whitespace() {
        let (mut seq, brk) = seq_with_rule("", 4);
        let ws = seq.push_back(Fragment::text(" ", Style::Whitespace));
        seq.push_back(Fragment::text("body", Style::Plain));
        let got = line_after(&mut seq, Some(brk)).unwrap();
        assert_eq!(got, Some(ws));
        assert_eq!(seq.text(), "head\n    body");
    }

    #[test]
    fn test_closing_brace_dedents_to_zero() {
        let (mut seq, brk) = seq_with_rule("", 2);
        let ws = seq.push_back(Fragment::text("      ", Style::Whitespace));
        seq.push_back(Fragment::text("}", Style::Plain));
        let got = line_after(&mut seq, Some(brk)).unwrap();
        assert_eq!(got, None);
        assert!(!seq.contains(ws));
        assert_eq!(seq.text(), "head\n}");
    }

    #[test]
    fn test_document_start_indents_to_zero() {
        let mut seq = FragmentSeq::new();
        seq.push_back(Fragment::text("  ", Style::Whitespace));
        seq.push_back(Fragment::text("top", Style::Plain));
        let got = line_after(&mut seq, None).unwrap();
        assert_eq!(got, None);
        assert_eq!(seq.text(), "top");
    }

    #[test]
    fn test_missing_rule_is_an_error() {
        let mut seq = FragmentSeq::new();
        seq.push_back(Fragment::text("head", Style::Plain));
        let brk = seq.push_back(Fragment::line_break());
        seq.push_back(Fragment::text("body", Style::Plain));
        assert!(matches!(
            line_after(&mut seq, Some(brk)),
            Err(EditorError::MissingIndentation)
        ));
    }
}
