//! Language-independent parsing contract.
//!
//! A language module supplies a [`Language`] implementation whose parsers
//! turn a [`CharStream`] into a flat stream of [`Token`]s. Parsers are
//! resumable: [`TokenParser::checkpoint`] captures the complete parse state
//! by value, and the resulting [`Checkpoint`] can later rebuild an
//! equivalent parser bound to a different stream. This is what lets the
//! highlight pass restart mid-document instead of at the top.

pub mod machine;

use std::fmt;

use crate::document::stream::CharStream;

/// Style tag attached to every token and text fragment. Opaque to the
/// engine apart from equality and `Whitespace` (which the indentation
/// engine uses to find the leading-whitespace fragment of a line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Unstyled text, as produced by importing a document.
    Plain,
    Whitespace,
    Punctuation,
    Operator,
    Keyword,
    Atom,
    Variable,
    LocalVariable,
    VariableDef,
    Property,
    Comment,
    String,
    Error,
    // XML family
    Text,
    Entity,
    TagName,
    AttName,
    Attribute,
    Cdata,
    // CSS family
    At,
    Compare,
    Identifier,
    ColorCode,
    Important,
    Unit,
    SelectOp,
    Value,
}

impl Style {
    /// Stable lowercase name, usable as a CSS class or display label.
    pub fn as_str(self) -> &'static str {
        match self {
            Style::Plain => "plain",
            Style::Whitespace => "whitespace",
            Style::Punctuation => "punctuation",
            Style::Operator => "operator",
            Style::Keyword => "keyword",
            Style::Atom => "atom",
            Style::Variable => "variable",
            Style::LocalVariable => "localvariable",
            Style::VariableDef => "variabledef",
            Style::Property => "property",
            Style::Comment => "comment",
            Style::String => "string",
            Style::Error => "error",
            Style::Text => "text",
            Style::Entity => "entity",
            Style::TagName => "tagname",
            Style::AttName => "attname",
            Style::Attribute => "attribute",
            Style::Cdata => "cdata",
            Style::At => "at",
            Style::Compare => "compare",
            Style::Identifier => "identifier",
            Style::ColorCode => "colorcode",
            Style::Important => "important",
            Style::Unit => "unit",
            Style::SelectOp => "select-op",
            Style::Value => "value",
        }
    }
}

/// One unit of parser output. Concatenating the `value`s of the tokens a
/// parser emits reproduces the scanned text exactly; same-line whitespace
/// is either absorbed into the preceding token or surfaced as a whitespace
/// token of its own.
#[derive(Debug, Clone)]
pub struct Token {
    pub value: String,
    pub style: Style,
    /// Newline tokens always stand alone with `value == "\n"`; they are the
    /// synchronization anchor against break fragments.
    pub newline: bool,
    /// On newline tokens, the indentation rule for the line just ended.
    pub indent: Option<IndentHint>,
}

impl Token {
    pub fn text(value: String, style: Style) -> Self {
        Self {
            value,
            style,
            newline: false,
            indent: None,
        }
    }

    pub fn newline(indent: IndentHint) -> Self {
        Self {
            value: "\n".to_string(),
            style: Style::Whitespace,
            newline: true,
            indent: Some(indent),
        }
    }
}

/// A resumable token producer. `next_token` returns `None` at end of
/// input; running off the end of the stream mid-token is not an error, the
/// token simply ends there.
pub trait TokenParser {
    fn next_token(&mut self, input: &mut CharStream<'_>) -> Option<Token>;

    /// Capture the full parse state (rule stack, lexical contexts, scopes,
    /// tokenizer mode) by value. Column and indentation counters restart at
    /// zero when the checkpoint is resumed, which is correct because
    /// resumption always happens immediately after a line break.
    fn checkpoint(&self) -> Checkpoint;
}

/// Captured parser state, owned by a break fragment. Cloning is structural;
/// a parser resumed from a checkpoint can never disturb the checkpoint it
/// came from.
pub struct Checkpoint(Box<dyn ParserState>);

pub trait ParserState: fmt::Debug {
    fn resume(&self) -> Box<dyn TokenParser>;
    fn clone_box(&self) -> Box<dyn ParserState>;
}

impl Checkpoint {
    pub fn new(state: impl ParserState + 'static) -> Self {
        Self(Box::new(state))
    }

    /// Build a parser equivalent to the one that produced this checkpoint,
    /// ready to read from a new stream.
    pub fn resume(&self) -> Box<dyn TokenParser> {
        self.0.resume()
    }
}

impl Clone for Checkpoint {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl fmt::Debug for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checkpoint({:?})", self.0)
    }
}

/// Per-line indentation rule, owned by a break fragment. Given the first
/// characters of the following line (grammars dedent closing brackets),
/// yields the target indentation width.
pub struct IndentHint(Box<dyn IndentRule>);

pub trait IndentRule: fmt::Debug {
    fn target(&self, next_chars: &str) -> usize;
    fn clone_box(&self) -> Box<dyn IndentRule>;
}

impl IndentHint {
    pub fn new(rule: impl IndentRule + 'static) -> Self {
        Self(Box::new(rule))
    }

    pub fn target(&self, next_chars: &str) -> usize {
        self.0.target(next_chars)
    }
}

impl Clone for IndentHint {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl fmt::Debug for IndentHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndentHint({:?})", self.0)
    }
}

/// A pluggable language module: a parser factory plus the metadata the
/// editor needs to wire it up.
pub trait Language {
    fn name(&self) -> &'static str;

    /// File extensions this language claims, for registry detection.
    fn extensions(&self) -> &'static [&'static str];

    /// A fresh parser positioned at the start of a document.
    fn start_parser(&self) -> Box<dyn TokenParser>;

    /// Characters whose typing should immediately re-indent the current
    /// line (typically closing brackets).
    fn electric_chars(&self) -> &'static str;
}
