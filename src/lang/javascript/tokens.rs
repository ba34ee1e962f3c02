//! JavaScript tokenizer.
//!
//! Mode-flag based: the only state that survives a line boundary is
//! whether we are inside a block comment and whether a `/` may start a
//! regexp. Every token absorbs the same-line whitespace that follows it,
//! so token values concatenate back to the source text.

use crate::document::CharStream;
use crate::parse::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum JsKind {
    Whitespace,
    Newline,
    Comment,
    String,
    Regexp,
    Number,
    Atom,
    Variable,
    KeywordA,
    KeywordB,
    KeywordC,
    VarKw,
    FunctionKw,
    CatchKw,
    ForKw,
    CaseKw,
    Operator,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    Comma,
    Semicolon,
    Colon,
    Dot,
}

impl JsKind {
    pub(super) fn is_atomic(self) -> bool {
        matches!(
            self,
            JsKind::Atom | JsKind::Number | JsKind::Variable | JsKind::String | JsKind::Regexp
        )
    }
}

/// Resumable tokenizer state. Stream position is deliberately not part of
/// it; a resumed tokenizer binds to whatever stream it is handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct TokenizerMode {
    pub in_comment: bool,
    pub regexp_ok: bool,
}

impl Default for TokenizerMode {
    fn default() -> Self {
        Self {
            in_comment: false,
            regexp_ok: true,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct RawToken {
    pub kind: JsKind,
    pub style: Style,
    pub value: String,
    /// For identifier-like tokens, the bare word without trailing
    /// whitespace; the grammar dispatches and registers scopes on it.
    pub word: Option<String>,
}

fn is_inline_space(ch: char) -> bool {
    ch != '\n' && ch.is_whitespace()
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

fn is_hex_digit(ch: char) -> bool {
    ch.is_ascii_hexdigit()
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

fn is_operator_char(ch: char) -> bool {
    matches!(ch, '+' | '-' | '*' | '&' | '%' | '/' | '=' | '<' | '>' | '!' | '?')
}

fn keyword(word: &str) -> Option<(JsKind, Style)> {
    let kind = match word {
        "if" | "switch" | "while" | "with" => JsKind::KeywordA,
        "else" | "do" | "try" | "finally" => JsKind::KeywordB,
        "return" | "break" | "continue" | "new" | "delete" | "throw" => JsKind::KeywordC,
        "in" | "typeof" | "instanceof" => JsKind::Operator,
        "var" => JsKind::VarKw,
        "function" => JsKind::FunctionKw,
        "catch" => JsKind::CatchKw,
        "for" => JsKind::ForKw,
        "case" => JsKind::CaseKw,
        "true" | "false" | "null" | "undefined" | "NaN" | "Infinity" => {
            return Some((JsKind::Atom, Style::Atom));
        }
        _ => return None,
    };
    Some((kind, Style::Keyword))
}

fn punctuation(ch: char) -> Option<JsKind> {
    let kind = match ch {
        '[' => JsKind::OpenBracket,
        ']' => JsKind::CloseBracket,
        '{' => JsKind::OpenBrace,
        '}' => JsKind::CloseBrace,
        '(' => JsKind::OpenParen,
        ')' => JsKind::CloseParen,
        ',' => JsKind::Comma,
        ';' => JsKind::Semicolon,
        ':' => JsKind::Colon,
        '.' => JsKind::Dot,
        _ => return None,
    };
    Some(kind)
}

/// Consume until an unescaped `end` or the end of the line. `None` runs to
/// the line end (line comments).
fn until_unescaped(input: &mut CharStream<'_>, end: Option<char>) {
    let mut escaped = false;
    while let Some(next) = input.peek() {
        if next == '\n' {
            break;
        }
        input.next();
        if Some(next) == end && !escaped {
            break;
        }
        escaped = next == '\\';
    }
}

/// Scan (the rest of) a block comment on this line. `start` is the
/// character already consumed: `/` when the comment opens here, or the
/// first character of a continuation line.
fn block_comment(mode: &mut TokenizerMode, input: &mut CharStream<'_>, start: char) -> JsKind {
    mode.in_comment = true;
    let mut maybe_end = start == '*';
    while let Some(next) = input.peek() {
        if next == '\n' {
            break;
        }
        input.next();
        if next == '/' && maybe_end {
            mode.in_comment = false;
            break;
        }
        maybe_end = next == '*';
    }
    JsKind::Comment
}

fn number(input: &mut CharStream<'_>) -> JsKind {
    input.eat_while(is_digit);
    if input.equals('.') {
        input.next();
        input.eat_while(is_digit);
    }
    if input.equals('e') || input.equals('E') {
        input.next();
        if input.equals('-') {
            input.next();
        }
        input.eat_while(is_digit);
    }
    JsKind::Number
}

fn hex_number(input: &mut CharStream<'_>) -> JsKind {
    input.next(); // the x
    input.eat_while(is_hex_digit);
    JsKind::Number
}

fn style_of(kind: JsKind) -> Style {
    match kind {
        JsKind::Whitespace | JsKind::Newline => Style::Whitespace,
        JsKind::Comment => Style::Comment,
        JsKind::String | JsKind::Regexp => Style::String,
        JsKind::Number | JsKind::Atom => Style::Atom,
        JsKind::Variable => Style::Variable,
        JsKind::Operator => Style::Operator,
        JsKind::KeywordA
        | JsKind::KeywordB
        | JsKind::KeywordC
        | JsKind::VarKw
        | JsKind::FunctionKw
        | JsKind::CatchKw
        | JsKind::ForKw
        | JsKind::CaseKw => Style::Keyword,
        _ => Style::Punctuation,
    }
}

pub(super) fn next_raw(mode: &mut TokenizerMode, input: &mut CharStream<'_>) -> Option<RawToken> {
    let ch = input.next()?;

    if ch == '\n' {
        return Some(RawToken {
            kind: JsKind::Newline,
            style: Style::Whitespace,
            value: input.get(),
            word: None,
        });
    }

    let mut word = None;
    let kind = if mode.in_comment {
        block_comment(mode, input, ch)
    } else if is_inline_space(ch) {
        input.eat_while(is_inline_space);
        JsKind::Whitespace
    } else if ch == '"' || ch == '\'' {
        until_unescaped(input, Some(ch));
        JsKind::String
    } else if let Some(kind) = punctuation(ch) {
        kind
    } else if ch == '0' && (input.equals('x') || input.equals('X')) {
        hex_number(input)
    } else if is_digit(ch) {
        number(input)
    } else if ch == '/' {
        match input.peek() {
            Some('*') => block_comment(mode, input, ch),
            Some('/') => {
                until_unescaped(input, None);
                JsKind::Comment
            }
            _ if mode.regexp_ok => {
                until_unescaped(input, Some('/'));
                input.eat_while(|c| c == 'g' || c == 'i');
                JsKind::Regexp
            }
            _ => {
                input.eat_while(is_operator_char);
                JsKind::Operator
            }
        }
    } else if is_operator_char(ch) {
        input.eat_while(is_operator_char);
        JsKind::Operator
    } else {
        input.eat_while(is_word_char);
        let text = input.get();
        let (kind, _) = keyword(&text).unwrap_or((JsKind::Variable, Style::Variable));
        word = Some(text);
        kind
    };

    // Absorb trailing same-line whitespace into the token.
    input.eat_while(is_inline_space);
    let value = match &word {
        Some(w) => {
            let mut v = w.clone();
            v.push_str(&input.get());
            v
        }
        None => input.get(),
    };

    // Track whether a regexp literal may start next. Comments leave the
    // flag untouched.
    if kind != JsKind::Whitespace && kind != JsKind::Comment {
        mode.regexp_ok = matches!(
            kind,
            JsKind::Operator
                | JsKind::KeywordC
                | JsKind::OpenBracket
                | JsKind::OpenBrace
                | JsKind::CloseBrace
                | JsKind::OpenParen
                | JsKind::Comma
                | JsKind::Semicolon
                | JsKind::Colon
        );
    }

    Some(RawToken {
        kind,
        style: style_of(kind),
        value,
        word,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FragmentSeq, StreamPos};

    fn tokenize(text: &str) -> Vec<RawToken> {
        let seq = FragmentSeq::from_text(text);
        let mut pos = StreamPos::start(&seq);
        let mut mode = TokenizerMode::default();
        let mut out = Vec::new();
        loop {
            let mut stream = CharStream::new(&seq, &mut pos);
            match next_raw(&mut mode, &mut stream) {
                Some(tok) => out.push(tok),
                None => break,
            }
        }
        out
    }

    fn kinds(tokens: &[RawToken]) -> Vec<JsKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_values_concatenate_to_source() {
        let src = "if (x) {\n  y;\n}";
        let joined: String = tokenize(src).iter().map(|t| t.value.as_str()).collect();
        assert_eq!(joined, src);
    }

    #[test]
    fn test_trailing_whitespace_absorbed() {
        let tokens = tokenize("if (x) {");
        assert_eq!(tokens[0].value, "if ");
        assert_eq!(tokens[0].kind, JsKind::KeywordA);
        assert_eq!(tokens[3].value, ") ");
    }

    #[test]
    fn test_scenario_kinds() {
        let tokens = tokenize("if (x) {\n  y;\n}");
        assert_eq!(
            kinds(&tokens),
            vec![
                JsKind::KeywordA,
                JsKind::OpenParen,
                JsKind::Variable,
                JsKind::CloseParen,
                JsKind::OpenBrace,
                JsKind::Newline,
                JsKind::Whitespace,
                JsKind::Variable,
                JsKind::Semicolon,
                JsKind::Newline,
                JsKind::CloseBrace,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("0x1F 3.14 1e-9 42");
        assert!(tokens.iter().all(|t| t.kind == JsKind::Number));
        assert_eq!(tokens[0].value, "0x1F ");
        assert_eq!(tokens[2].value, "1e-9 ");
    }

    #[test]
    fn test_strings_end_at_line_end() {
        let tokens = tokenize("\"ab\\\"c\" 'd");
        assert_eq!(tokens[0].kind, JsKind::String);
        assert_eq!(tokens[0].value, "\"ab\\\"c\" ");
        // Unterminated string stops at end of input without an error.
        assert_eq!(tokens[1].kind, JsKind::String);
        assert_eq!(tokens[1].value, "'d");
    }

    #[test]
    fn test_block_comment_mode_spans_lines() {
        let tokens = tokenize("/* one\ntwo */ x");
        assert_eq!(tokens[0].kind, JsKind::Comment);
        assert_eq!(tokens[1].kind, JsKind::Newline);
        assert_eq!(tokens[2].kind, JsKind::Comment);
        assert_eq!(tokens[3].kind, JsKind::Variable);

        // The mode flag alone must be enough to resume mid-comment.
        let seq = FragmentSeq::from_text("still comment */ y");
        let mut pos = StreamPos::start(&seq);
        let mut mode = TokenizerMode {
            in_comment: true,
            regexp_ok: false,
        };
        let mut stream = CharStream::new(&seq, &mut pos);
        let tok = next_raw(&mut mode, &mut stream).unwrap();
        assert_eq!(tok.kind, JsKind::Comment);
        assert!(!mode.in_comment);
    }

    #[test]
    fn test_regexp_versus_division() {
        let tokens = tokenize("a = /re/g;");
        assert_eq!(tokens[2].kind, JsKind::Regexp);
        assert_eq!(tokens[2].value, "/re/g");

        let tokens = tokenize("a / b");
        assert_eq!(tokens[1].kind, JsKind::Operator);
    }

    #[test]
    fn test_keyword_classes() {
        let tokens = tokenize("return typeof true");
        assert_eq!(tokens[0].kind, JsKind::KeywordC);
        assert_eq!(tokens[1].kind, JsKind::Operator);
        assert_eq!(tokens[1].style, Style::Keyword);
        assert_eq!(tokens[2].kind, JsKind::Atom);
        assert_eq!(tokens[2].word.as_deref(), Some("true"));
    }
}
