//! XML language module, with a couple of kludges that make it usable for
//! HTML: known self-closing tags do not open a context, and the content of
//! `<pre>` is never re-indented.
//!
//! The tokenizer is a state machine over functions-as-states in spirit: the
//! current state decides how to label what comes next, and quoted
//! attributes and comment/CDATA blocks carry their state across line
//! boundaries.

use crate::document::CharStream;
use crate::parse::machine::RuleStack;
use crate::parse::{
    Checkpoint, IndentHint, IndentRule, Language, ParserState, Style, Token, TokenParser,
};

const AUTO_SELF_CLOSERS: &[&str] = &["br", "img", "hr", "link", "input", "meta"];
const DO_NOT_INDENT: &[&str] = &["pre"];

pub struct Xml;

impl Language for Xml {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["xml", "html", "htm", "svg"]
    }

    fn start_parser(&self) -> Box<dyn TokenParser> {
        Box::new(XmlParser::new())
    }

    fn electric_chars(&self) -> &'static str {
        "/"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Cdata,
    Comment,
}

impl BlockKind {
    fn terminator(self) -> &'static str {
        match self {
            BlockKind::Cdata => "]]>",
            BlockKind::Comment => "-->",
        }
    }

    fn style(self) -> Style {
        match self {
            BlockKind::Cdata => Style::Cdata,
            BlockKind::Comment => Style::Comment,
        }
    }
}

/// Tokenizer state, resumable across lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokState {
    Text,
    Tag,
    Attribute(char),
    Block(BlockKind),
}

fn is_inline_space(ch: char) -> bool {
    ch != '\n' && ch.is_whitespace()
}

fn is_name_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '=' | '<' | '>' | '"' | '\'' | '/' | '?')
}

#[derive(Debug)]
struct RawToken {
    style: Style,
    /// The token's own text, without the trailing whitespace `value` adds.
    content: String,
    value: String,
}

fn in_text(state: &mut TokState, input: &mut CharStream<'_>) -> Style {
    let Some(ch) = input.next() else {
        return Style::Text;
    };
    match ch {
        '<' => {
            if input.equals('!') {
                input.next();
                if input.equals('[') {
                    input.next();
                    *state = TokState::Block(BlockKind::Cdata);
                    in_block(state, input, BlockKind::Cdata)
                } else if input.equals('-') {
                    input.next();
                    *state = TokState::Block(BlockKind::Comment);
                    in_block(state, input, BlockKind::Comment)
                } else {
                    Style::Text
                }
            } else {
                if input.applies(|c| c == '?' || c == '/') {
                    input.next();
                }
                *state = TokState::Tag;
                Style::Punctuation
            }
        }
        '&' => {
            while input.applies(|c| c != '\n') {
                if input.next() == Some(';') {
                    break;
                }
            }
            Style::Entity
        }
        _ if is_inline_space(ch) => {
            input.eat_while(is_inline_space);
            Style::Whitespace
        }
        _ => {
            input.eat_while(|c| c != '&' && c != '<' && c != '\n');
            Style::Text
        }
    }
}

fn in_tag(state: &mut TokState, input: &mut CharStream<'_>) -> Style {
    let Some(ch) = input.next() else {
        return Style::Text;
    };
    match ch {
        '>' => {
            *state = TokState::Text;
            Style::Punctuation
        }
        '?' | '/' if input.equals('>') => {
            input.next();
            *state = TokState::Text;
            Style::Punctuation
        }
        '=' => Style::Punctuation,
        '"' | '\'' => {
            *state = TokState::Attribute(ch);
            in_attribute(state, input, ch)
        }
        _ if is_inline_space(ch) => {
            input.eat_while(is_inline_space);
            Style::Whitespace
        }
        _ => {
            input.eat_while(is_name_char);
            Style::TagName
        }
    }
}

fn in_attribute(state: &mut TokState, input: &mut CharStream<'_>, quote: char) -> Style {
    let mut escaped = false;
    while input.applies(|c| c != '\n') {
        let Some(ch) = input.next() else { break };
        if ch == quote && !escaped {
            *state = TokState::Tag;
            break;
        }
        escaped = ch == '\\';
    }
    Style::Attribute
}

fn in_block(state: &mut TokState, input: &mut CharStream<'_>, kind: BlockKind) -> Style {
    let terminator = kind.terminator();
    let mut rest = terminator;
    while input.applies(|c| c != '\n') {
        let Some(ch) = input.next() else { break };
        if rest.starts_with(ch) {
            rest = &rest[ch.len_utf8()..];
            if rest.is_empty() {
                *state = TokState::Text;
                break;
            }
        } else {
            rest = terminator;
        }
    }
    kind.style()
}

fn next_raw(state: &mut TokState, input: &mut CharStream<'_>) -> Option<RawToken> {
    if !input.more() {
        return None;
    }
    let style = if input.equals('\n') {
        input.next();
        Style::Whitespace
    } else {
        match *state {
            TokState::Text => in_text(state, input),
            TokState::Tag => in_tag(state, input),
            TokState::Attribute(quote) => in_attribute(state, input, quote),
            TokState::Block(kind) => in_block(state, input, kind),
        }
    };
    let content = input.get();
    if content != "\n" {
        input.eat_while(is_inline_space);
    }
    let mut value = content.clone();
    value.push_str(&input.get());
    Some(RawToken {
        style,
        content,
        value,
    })
}

/// One open tag on the context chain.
#[derive(Debug, Clone, PartialEq)]
struct TagContext {
    name: Option<String>,
    indent: usize,
    start_of_line: bool,
    no_indent: bool,
    parent: Option<Box<TagContext>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Rule {
    Base,
    Element,
    Tagname,
    CloseTagname,
    EndTag { start_of_line: bool },
    Attributes,
    Attribute,
    Value,
    Expect(&'static str),
}

#[derive(Debug)]
struct XmlParser {
    state: TokState,
    rules: RuleStack<Rule>,
    context: Option<Box<TagContext>>,
    current_tag: Option<String>,
    token_nr: usize,
    indented: usize,
}

impl XmlParser {
    fn new() -> Self {
        Self {
            state: TokState::Text,
            rules: RuleStack::new(Rule::Base),
            context: None,
            current_tag: None,
            token_nr: 0,
            indented: 0,
        }
    }

    fn push_context(&mut self, start_of_line: bool) {
        let name = self.current_tag.clone();
        let no_indent = name
            .as_deref()
            .is_some_and(|n| DO_NOT_INDENT.contains(&n))
            || self.context.as_deref().is_some_and(|c| c.no_indent);
        self.context = Some(Box::new(TagContext {
            name,
            indent: self.indented,
            start_of_line,
            no_indent,
            parent: self.context.take(),
        }));
    }

    fn pop_context(&mut self) {
        if let Some(ctx) = self.context.take() {
            self.context = ctx.parent;
        }
    }

    fn dispatch(&mut self, rule: Rule, style: Style, content: &str) {
        use Rule::*;
        match rule {
            Base => self.rules.pass(&[Element, Base]),

            Element => match content {
                "<" => {
                    let start_of_line = self.token_nr == 1;
                    self.rules
                        .cont(&[Tagname, Attributes, EndTag { start_of_line }]);
                }
                "</" => self.rules.cont(&[CloseTagname, Expect(">")]),
                "<?" => self.rules.cont(&[Tagname, Attributes, Expect("?>")]),
                _ => {
                    if !matches!(
                        style,
                        Style::Text | Style::Entity | Style::Comment | Style::Cdata
                    ) {
                        self.rules.mark(Style::Error);
                    }
                    self.rules.cont(&[]);
                }
            },

            Tagname => {
                if style == Style::TagName {
                    self.current_tag = Some(content.to_string());
                    self.rules.mark(Style::TagName);
                    self.rules.cont(&[]);
                } else {
                    self.current_tag = None;
                    self.rules.pass(&[]);
                }
            }

            CloseTagname => {
                let matches_open = style == Style::TagName
                    && self
                        .context
                        .as_deref()
                        .is_some_and(|c| c.name.as_deref() == Some(content));
                if matches_open {
                    self.pop_context();
                    self.rules.mark(Style::TagName);
                } else {
                    self.rules.mark(Style::Error);
                }
                self.rules.cont(&[]);
            }

            EndTag { start_of_line } => match content {
                "/>" => self.rules.cont(&[]),
                ">" => {
                    let self_closing = self
                        .current_tag
                        .as_deref()
                        .is_some_and(|t| AUTO_SELF_CLOSERS.contains(&t));
                    if !self_closing {
                        self.push_context(start_of_line);
                    }
                    self.rules.cont(&[]);
                }
                _ => {
                    self.rules.mark(Style::Error);
                    self.rules.cont(&[EndTag { start_of_line }]);
                }
            },

            Attributes => {
                if style == Style::TagName {
                    self.rules.mark(Style::AttName);
                    self.rules.cont(&[Attribute, Attributes]);
                } else {
                    self.rules.pass(&[]);
                }
            }

            Attribute => match content {
                "=" => self.rules.cont(&[Value]),
                _ => self.rules.pass(&[]),
            },

            Value => {
                if style == Style::Attribute {
                    self.rules.cont(&[Value]);
                } else {
                    self.rules.pass(&[]);
                }
            }

            Expect(text) => {
                if content == text {
                    self.rules.cont(&[]);
                } else {
                    self.rules.mark(Style::Error);
                    self.rules.cont(&[Expect(text)]);
                }
            }
        }
    }
}

impl TokenParser for XmlParser {
    fn next_token(&mut self, input: &mut CharStream<'_>) -> Option<Token> {
        let raw = next_raw(&mut self.state, input)?;

        if raw.style == Style::Whitespace && self.token_nr == 0 {
            self.indented = raw.value.chars().count();
        } else {
            self.token_nr += 1;
        }

        if raw.content == "\n" {
            self.indented = 0;
            self.token_nr = 0;
            let hint = IndentHint::new(XmlIndent {
                context: self.context.clone(),
            });
            return Some(Token::newline(hint));
        }

        if raw.style == Style::Whitespace {
            return Some(Token::text(raw.value, raw.style));
        }

        self.rules.begin_token();
        let mut rounds = 0;
        loop {
            let Some(rule) = self.rules.pop() else {
                self.rules.mark(Style::Error);
                self.rules.cont(&[Rule::Base]);
                break;
            };
            self.dispatch(rule, raw.style, &raw.content);
            if self.rules.consumed() {
                break;
            }
            rounds += 1;
            if rounds > 200 {
                self.rules.mark(Style::Error);
                self.rules.cont(&[]);
                break;
            }
        }

        let style = self.rules.marked().unwrap_or(raw.style);
        Some(Token::text(raw.value, style))
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(XmlState {
            state: self.state,
            rules: self.rules.snapshot(),
            context: self.context.clone(),
            current_tag: self.current_tag.clone(),
        })
    }
}

#[derive(Debug, Clone)]
struct XmlState {
    state: TokState,
    rules: Vec<Rule>,
    context: Option<Box<TagContext>>,
    current_tag: Option<String>,
}

impl ParserState for XmlState {
    fn resume(&self) -> Box<dyn TokenParser> {
        Box::new(XmlParser {
            state: self.state,
            rules: RuleStack::restore(self.rules.clone()),
            context: self.context.clone(),
            current_tag: self.current_tag.clone(),
            token_nr: 0,
            indented: 0,
        })
    }

    fn clone_box(&self) -> Box<dyn ParserState> {
        Box::new(self.clone())
    }
}

/// Indent to two past the nearest enclosing tag that started its own line;
/// a line starting with a closing tag hangs one level further out.
#[derive(Debug, Clone)]
struct XmlIndent {
    context: Option<Box<TagContext>>,
}

impl IndentRule for XmlIndent {
    fn target(&self, next_chars: &str) -> usize {
        let mut context = self.context.as_deref();
        if context.is_some_and(|c| c.no_indent) {
            return 0;
        }
        if next_chars.starts_with("</") {
            context = context.and_then(|c| c.parent.as_deref());
        }
        while let Some(ctx) = context {
            if ctx.start_of_line {
                return ctx.indent + 2;
            }
            context = ctx.parent.as_deref();
        }
        0
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
        let mut parser = XmlParser::new();
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
        let src = "<ul>\n  <li>one</li>\n</ul>";
        let joined: String = parse(src).iter().map(|t| t.value.as_str()).collect();
        assert_eq!(joined, src);
    }

    #[test]
    fn test_tag_and_attribute_styles() {
        let tokens = parse("<a href=\"x\">text</a>");
        assert_eq!(style_of(&tokens, "a"), Style::TagName);
        assert_eq!(style_of(&tokens, "href"), Style::AttName);
        assert_eq!(style_of(&tokens, "\"x\""), Style::Attribute);
        assert_eq!(style_of(&tokens, "text"), Style::Text);
    }

    #[test]
    fn test_mismatched_close_tag_marked_error() {
        let tokens = parse("<a>text</b>");
        assert_eq!(style_of(&tokens, "b"), Style::Error);
    }

    #[test]
    fn test_comment_block_spans_lines() {
        let tokens = parse("<!-- one\ntwo -->x");
        assert_eq!(tokens[0].style, Style::Comment);
        assert!(tokens[1].newline);
        assert_eq!(tokens[2].style, Style::Comment);
        assert_eq!(style_of(&tokens, "x"), Style::Text);
    }

    #[test]
    fn test_indentation_from_context() {
        let tokens = parse("<ul>\n  <li>one</li>\n</ul>");
        let hints: Vec<_> = tokens
            .iter()
            .filter(|t| t.newline)
            .map(|t| t.indent.as_ref().unwrap())
            .collect();
        // Inside <ul>: children indent one step, a closing tag dedents.
        assert_eq!(hints[0].target("<li>"), 2);
        assert_eq!(hints[0].target("</ul>"), 0);
        assert_eq!(hints[1].target("</ul>"), 0);
    }

    #[test]
    fn test_self_closers_open_no_context() {
        let tokens = parse("<p><br>\nx");
        let hint = tokens
            .iter()
            .find(|t| t.newline)
            .and_then(|t| t.indent.as_ref())
            .unwrap();
        // <br> did not nest; <p> opened at the start of the line.
        assert_eq!(hint.target("x"), 2);
    }

    #[test]
    fn test_entity_token() {
        let tokens = parse("a &amp; b");
        assert_eq!(style_of(&tokens, "&amp;"), Style::Entity);
    }
}
