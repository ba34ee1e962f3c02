//! CSS language module.
//!
//! CSS barely nests, so the parser is flat: two booleans — inside a brace
//! block, inside a declaration — are enough to restyle identifiers as
//! values and hashes as color codes, and to drive indentation. The
//! tokenizer still carries real state for comments and strings, which can
//! span lines (a string continues when the line ends in a backslash).

use crate::document::CharStream;
use crate::parse::{
    Checkpoint, IndentHint, IndentRule, Language, ParserState, Style, Token, TokenParser,
};

pub struct Css;

impl Language for Css {
    fn name(&self) -> &'static str {
        "css"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["css"]
    }

    fn start_parser(&self) -> Box<dyn TokenParser> {
        Box::new(CssParser::new())
    }

    fn electric_chars(&self) -> &'static str {
        "}"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokState {
    Normal,
    CComment,
    SgmlComment,
    InString(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CssToken {
    At,
    Comment,
    Compare,
    String,
    Hash,
    Important,
    Unit,
    SelectOp,
    Punctuation,
    Identifier,
    Whitespace,
}

#[derive(Debug)]
struct RawToken {
    kind: CssToken,
    content: String,
    value: String,
}

fn is_inline_space(ch: char) -> bool {
    ch != '\n' && ch.is_whitespace()
}

fn is_word(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn normal(state: &mut TokState, input: &mut CharStream<'_>) -> CssToken {
    let Some(ch) = input.next() else {
        return CssToken::Whitespace;
    };
    match ch {
        '@' => {
            input.eat_while(is_word);
            CssToken::At
        }
        '/' if input.equals('*') => {
            *state = TokState::CComment;
            c_comment(state, input)
        }
        '<' if input.equals('!') => {
            *state = TokState::SgmlComment;
            sgml_comment(state, input)
        }
        '=' => CssToken::Compare,
        '~' | '|' if input.equals('=') => {
            input.next();
            CssToken::Compare
        }
        '"' | '\'' => {
            *state = TokState::InString(ch);
            in_string(state, input, ch)
        }
        '#' => {
            input.eat_while(is_word);
            CssToken::Hash
        }
        '!' => {
            input.eat_while(|c| c == ' ' || c == '\t');
            input.eat_while(is_word);
            CssToken::Important
        }
        _ if ch.is_ascii_digit() => {
            input.eat_while(|c| is_word(c) || c == '.' || c == '%');
            CssToken::Unit
        }
        ',' | '.' | '+' | '>' | '*' | '/' => CssToken::SelectOp,
        ';' | '{' | '}' | ':' | '[' | ']' => CssToken::Punctuation,
        _ => {
            input.eat_while(|c| is_word(c) || c == '\\' || c == '-');
            CssToken::Identifier
        }
    }
}

fn c_comment(state: &mut TokState, input: &mut CharStream<'_>) -> CssToken {
    let mut maybe_end = false;
    while !input.end_of_line() {
        let Some(ch) = input.next() else { break };
        if maybe_end && ch == '/' {
            *state = TokState::Normal;
            break;
        }
        maybe_end = ch == '*';
    }
    CssToken::Comment
}

fn sgml_comment(state: &mut TokState, input: &mut CharStream<'_>) -> CssToken {
    let mut dashes = 0;
    while !input.end_of_line() {
        let Some(ch) = input.next() else { break };
        if dashes >= 2 && ch == '>' {
            *state = TokState::Normal;
            break;
        }
        dashes = if ch == '-' { dashes + 1 } else { 0 };
    }
    CssToken::Comment
}

fn in_string(state: &mut TokState, input: &mut CharStream<'_>, quote: char) -> CssToken {
    let mut escaped = false;
    while !input.end_of_line() {
        let Some(ch) = input.next() else { break };
        if ch == quote && !escaped {
            break;
        }
        escaped = ch == '\\';
    }
    // A trailing backslash continues the string on the next line.
    if !escaped {
        *state = TokState::Normal;
    }
    CssToken::String
}

fn next_raw(state: &mut TokState, input: &mut CharStream<'_>) -> Option<RawToken> {
    if !input.more() {
        return None;
    }
    let kind = if input.equals('\n') {
        input.next();
        let content = input.get();
        return Some(RawToken {
            kind: CssToken::Whitespace,
            value: content.clone(),
            content,
        });
    } else if *state == TokState::Normal && input.applies(is_inline_space) {
        input.eat_while(is_inline_space);
        CssToken::Whitespace
    } else {
        match *state {
            TokState::Normal => normal(state, input),
            TokState::CComment => c_comment(state, input),
            TokState::SgmlComment => sgml_comment(state, input),
            TokState::InString(quote) => in_string(state, input, quote),
        }
    };
    let content = input.get();
    input.eat_while(is_inline_space);
    let mut value = content.clone();
    value.push_str(&input.get());
    Some(RawToken {
        kind,
        content,
        value,
    })
}

#[derive(Debug)]
struct CssParser {
    state: TokState,
    in_braces: bool,
    in_rule: bool,
}

impl CssParser {
    fn new() -> Self {
        Self {
            state: TokState::Normal,
            in_braces: false,
            in_rule: false,
        }
    }

    fn style(&self, kind: CssToken) -> Style {
        match kind {
            CssToken::At => Style::At,
            CssToken::Comment => Style::Comment,
            CssToken::Compare => Style::Compare,
            CssToken::String => Style::String,
            CssToken::Hash => {
                if self.in_rule {
                    Style::ColorCode
                } else {
                    Style::Identifier
                }
            }
            CssToken::Important => Style::Important,
            CssToken::Unit => Style::Unit,
            CssToken::SelectOp => Style::SelectOp,
            CssToken::Punctuation => Style::Punctuation,
            CssToken::Identifier => {
                if self.in_rule {
                    Style::Value
                } else {
                    Style::Identifier
                }
            }
            CssToken::Whitespace => Style::Whitespace,
        }
    }
}

impl TokenParser for CssParser {
    fn next_token(&mut self, input: &mut CharStream<'_>) -> Option<Token> {
        let raw = next_raw(&mut self.state, input)?;

        if raw.content == "\n" {
            let hint = IndentHint::new(CssIndent {
                in_braces: self.in_braces,
                in_rule: self.in_rule,
            });
            return Some(Token::newline(hint));
        }

        let style = self.style(raw.kind);

        if raw.content == "{" {
            self.in_braces = true;
        } else if raw.content == "}" {
            self.in_braces = false;
        } else if self.in_braces && raw.content == ";" {
            self.in_rule = false;
        } else if self.in_braces
            && raw.kind != CssToken::Comment
            && raw.kind != CssToken::Whitespace
        {
            self.in_rule = true;
        }

        Some(Token::text(raw.value, style))
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(CssState {
            state: self.state,
            in_braces: self.in_braces,
            in_rule: self.in_rule,
        })
    }
}

#[derive(Debug, Clone)]
struct CssState {
    state: TokState,
    in_braces: bool,
    in_rule: bool,
}

impl ParserState for CssState {
    fn resume(&self) -> Box<dyn TokenParser> {
        Box::new(CssParser {
            state: self.state,
            in_braces: self.in_braces,
            in_rule: self.in_rule,
        })
    }

    fn clone_box(&self) -> Box<dyn ParserState> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Clone)]
struct CssIndent {
    in_braces: bool,
    in_rule: bool,
}

impl IndentRule for CssIndent {
    fn target(&self, next_chars: &str) -> usize {
        if !self.in_braces || next_chars.starts_with('}') {
            0
        } else if self.in_rule {
            4
        } else {
            2
        }
    }

    fn clone_box(&self) -> Box<dyn IndentRule> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FragmentSeq, StreamPos};

    fn parse(text: &str) -> Vec<Token> {
        let seq = FragmentSeq::from_text(text);
        let mut pos = StreamPos::start(&seq);
        let mut parser = CssParser::new();
        let mut out = Vec::new();
        loop {
            let mut stream = CharStream::new(&seq, &mut pos);
            match parser.next_token(&mut stream) {
                Some(tok) => out.push(tok),
                None => break,
            }
        }
        out
    }

    fn style_of<'a>(tokens: &'a [Token], value: &str) -> Style {
        tokens
            .iter()
            .find(|t| t.value.trim_end() == value)
            .unwrap_or_else(|| panic!("no token {value:?}"))
            .style
    }

    #[test]
    fn test_values_round_trip() {
        let src = "h1 {\n  color: red;\n}";
        let joined: String = parse(src).iter().map(|t| t.value.as_str()).collect();
        assert_eq!(joined, src);
    }

    #[test]
    fn test_selector_versus_value() {
        let tokens = parse("h1 { color: red; }");
        assert_eq!(style_of(&tokens, "h1"), Style::Identifier);
        assert_eq!(style_of(&tokens, "color"), Style::Identifier);
        assert_eq!(style_of(&tokens, "red"), Style::Value);
    }

    #[test]
    fn test_hash_restyling() {
        let tokens = parse("#id { color: #fff; }");
        assert_eq!(style_of(&tokens, "#id"), Style::Identifier);
        assert_eq!(style_of(&tokens, "#fff"), Style::ColorCode);
    }

    #[test]
    fn test_units_and_important() {
        let tokens = parse("p { margin: 10px !important; }");
        assert_eq!(style_of(&tokens, "10px"), Style::Unit);
        assert_eq!(style_of(&tokens, "!important"), Style::Important);
    }

    #[test]
    fn test_comment_spans_lines() {
        let tokens = parse("/* a\nb */ h1");
        assert_eq!(tokens[0].style, Style::Comment);
        assert!(tokens[1].newline);
        assert_eq!(tokens[2].style, Style::Comment);
        assert_eq!(style_of(&tokens, "h1"), Style::Identifier);
    }

    #[test]
    fn test_indentation_levels() {
        let tokens = parse("h1 {\n  color:\nred;\n}");
        let hints: Vec<_> = tokens
            .iter()
            .filter(|t| t.newline)
            .map(|t| t.indent.as_ref().unwrap())
            .collect();
        // After `{`: one step; mid-declaration: two; `}` dedents fully.
        assert_eq!(hints[0].target("color"), 2);
        assert_eq!(hints[0].target("}"), 0);
        assert_eq!(hints[1].target("red"), 4);
    }

    #[test]
    fn test_at_rule() {
        let tokens = parse("@import url;");
        assert_eq!(style_of(&tokens, "@import"), Style::At);
    }
}
