//! JavaScript grammar: a continuation-stack parser over the tokenizer.
//!
//! The rule stack drives statement/expression dispatch; lexical frames
//! track the nesting that indentation derives from; function scopes
//! reclassify identifiers as parameters, definitions or locals.

use super::tokens::{self, JsKind, TokenizerMode};
use crate::document::CharStream;
use crate::parse::machine::{LexFrame, RuleStack, ScopeChain};
use crate::parse::{Checkpoint, IndentHint, IndentRule, ParserState, Style, Token, TokenParser};

/// What kind of construct a lexical frame was opened for. `Block` doubles
/// as the root frame of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FrameKind {
    Block,
    Bracket,
    Paren,
    Stat,
    VarDef,
}

impl FrameKind {
    fn closing(self) -> Option<char> {
        match self {
            FrameKind::Block => Some('}'),
            FrameKind::Bracket => Some(']'),
            FrameKind::Paren => Some(')'),
            FrameKind::Stat | FrameKind::VarDef => None,
        }
    }
}

/// Which rule a comma-separated list repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Sep {
    Expr,
    ObjProp,
    FunArg,
}

impl Sep {
    fn rule(self) -> Rule {
        match self {
            Sep::Expr => Rule::Expression,
            Sep::ObjProp => Rule::ObjProp,
            Sep::FunArg => Rule::FunArg,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Rule {
    Statements,
    Statement,
    Expression,
    MaybeOperator,
    MaybeLabel,
    Property,
    ObjProp,
    Block,
    VarDef1,
    VarDef2,
    ForSpec1,
    ForSpec2,
    FunctionDef,
    FunArg,
    CommaSep(Sep),
    Proceed(Sep),
    Expect(JsKind),
    PushLex(FrameKind),
    PopLex,
    PushScope,
    PopScope,
}

impl Rule {
    /// Lexical-bookkeeping rules run for their side effect before the next
    /// token is even pulled.
    fn is_lex(&self) -> bool {
        matches!(self, Rule::PushLex(_) | Rule::PopLex)
    }

    fn is_side_effect(&self) -> bool {
        matches!(
            self,
            Rule::PushLex(_) | Rule::PopLex | Rule::PushScope | Rule::PopScope
        )
    }
}

#[derive(Debug)]
pub(super) struct JsParser {
    mode: TokenizerMode,
    rules: RuleStack<Rule>,
    scopes: ScopeChain,
    lexical: LexFrame<FrameKind>,
    column: i32,
    indented: i32,
}

impl JsParser {
    pub(super) fn new() -> Self {
        Self {
            mode: TokenizerMode::default(),
            rules: RuleStack::new(Rule::Statements),
            scopes: ScopeChain::new(),
            lexical: LexFrame::new(-2, 0, FrameKind::Block, Some(false)),
            column: 0,
            indented: 0,
        }
    }

    fn apply_side_effect(&mut self, rule: &Rule) {
        match rule {
            Rule::PushLex(kind) => {
                let frame = LexFrame::new(self.indented, self.column, *kind, None);
                self.lexical.push(frame);
            }
            Rule::PopLex => self.lexical.pop(),
            Rule::PushScope => self.scopes.push_with(&["this", "arguments"]),
            Rule::PopScope => self.scopes.pop(),
            _ => {}
        }
    }

    fn register(&mut self, word: Option<&str>) {
        let Some(word) = word else { return };
        if self.scopes.active() {
            self.rules.mark(Style::VariableDef);
            self.scopes.register(word);
        }
    }

    fn dispatch(&mut self, rule: Rule, kind: JsKind, word: Option<&str>) {
        use Rule::*;
        match rule {
            Statements => self.rules.pass(&[Statement, Statements]),

            Statement => match kind {
                JsKind::VarKw => self.rules.cont(&[
                    PushLex(FrameKind::VarDef),
                    VarDef1,
                    Expect(JsKind::Semicolon),
                    PopLex,
                ]),
                JsKind::KeywordA => {
                    self.rules
                        .cont(&[PushLex(FrameKind::Stat), Expression, Statement, PopLex])
                }
                JsKind::KeywordB => self.rules.cont(&[PushLex(FrameKind::Stat), Statement, PopLex]),
                JsKind::OpenBrace => self.rules.cont(&[PushLex(FrameKind::Block), Block, PopLex]),
                JsKind::FunctionKw => self.rules.cont(&[FunctionDef]),
                JsKind::ForKw => self.rules.cont(&[
                    PushLex(FrameKind::Stat),
                    Expect(JsKind::OpenParen),
                    PushLex(FrameKind::Paren),
                    ForSpec1,
                    Expect(JsKind::CloseParen),
                    PopLex,
                    Statement,
                    PopLex,
                ]),
                JsKind::CaseKw => self.rules.cont(&[Expression, Expect(JsKind::Colon)]),
                JsKind::Variable => self.rules.cont(&[PushLex(FrameKind::Stat), MaybeLabel]),
                JsKind::CatchKw => self.rules.cont(&[
                    PushLex(FrameKind::Stat),
                    PushScope,
                    Expect(JsKind::OpenParen),
                    FunArg,
                    Expect(JsKind::CloseParen),
                    Statement,
                    PopLex,
                    PopScope,
                ]),
                _ => self.rules.pass(&[
                    PushLex(FrameKind::Stat),
                    Expression,
                    Expect(JsKind::Semicolon),
                    PopLex,
                ]),
            },

            Expression => match kind {
                k if k.is_atomic() => self.rules.cont(&[MaybeOperator]),
                JsKind::FunctionKw => self.rules.cont(&[FunctionDef]),
                JsKind::KeywordC => self.rules.cont(&[Expression]),
                JsKind::OpenParen => self.rules.cont(&[
                    PushLex(FrameKind::Paren),
                    Expression,
                    Expect(JsKind::CloseParen),
                    PopLex,
                ]),
                JsKind::Operator => self.rules.cont(&[Expression]),
                JsKind::OpenBracket => self.rules.cont(&[
                    PushLex(FrameKind::Bracket),
                    CommaSep(Sep::Expr),
                    Expect(JsKind::CloseBracket),
                    PopLex,
                ]),
                JsKind::OpenBrace => self.rules.cont(&[
                    PushLex(FrameKind::Block),
                    CommaSep(Sep::ObjProp),
                    Expect(JsKind::CloseBrace),
                    PopLex,
                ]),
                _ => {}
            },

            MaybeOperator => match kind {
                JsKind::Operator => self.rules.cont(&[Expression]),
                JsKind::OpenParen => self.rules.cont(&[
                    PushLex(FrameKind::Paren),
                    Expression,
                    CommaSep(Sep::Expr),
                    Expect(JsKind::CloseParen),
                    PopLex,
                ]),
                JsKind::Dot => self.rules.cont(&[Property, MaybeOperator]),
                JsKind::OpenBracket => self.rules.cont(&[
                    PushLex(FrameKind::Bracket),
                    Expression,
                    Expect(JsKind::CloseBracket),
                    PopLex,
                ]),
                _ => {}
            },

            MaybeLabel => match kind {
                JsKind::Colon => self.rules.cont(&[PopLex, Statement]),
                _ => self
                    .rules
                    .pass(&[MaybeOperator, Expect(JsKind::Semicolon), PopLex]),
            },

            Property => {
                if kind == JsKind::Variable {
                    self.rules.mark(Style::Property);
                    self.rules.cont(&[]);
                }
            }

            ObjProp => {
                if kind == JsKind::Variable {
                    self.rules.mark(Style::Property);
                }
                if kind.is_atomic() {
                    self.rules.cont(&[Expect(JsKind::Colon), Expression]);
                }
            }

            Block => match kind {
                JsKind::CloseBrace => self.rules.cont(&[]),
                _ => self.rules.pass(&[Statement, Block]),
            },

            VarDef1 => match kind {
                JsKind::Variable => {
                    self.register(word);
                    self.rules.cont(&[VarDef2]);
                }
                _ => self.rules.cont(&[]),
            },

            VarDef2 => match kind {
                JsKind::Operator => self.rules.cont(&[Expression, VarDef2]),
                JsKind::Comma => self.rules.cont(&[VarDef1]),
                _ => {}
            },

            ForSpec1 => match kind {
                JsKind::VarKw => self.rules.cont(&[VarDef1, ForSpec2]),
                _ => self.rules.cont(&[Expression, ForSpec2]),
            },

            ForSpec2 => match kind {
                JsKind::Comma => self.rules.cont(&[ForSpec1]),
                JsKind::Semicolon => self
                    .rules
                    .cont(&[Expression, Expect(JsKind::Semicolon), Expression]),
                _ => {}
            },

            FunctionDef => match kind {
                JsKind::Variable => {
                    self.register(word);
                    self.rules.cont(&[FunctionDef]);
                }
                JsKind::OpenParen => self.rules.cont(&[
                    PushScope,
                    CommaSep(Sep::FunArg),
                    Expect(JsKind::CloseParen),
                    Statement,
                    PopScope,
                ]),
                _ => {}
            },

            FunArg => {
                if kind == JsKind::Variable {
                    self.register(word);
                    self.rules.cont(&[]);
                }
            }

            CommaSep(sep) => self.rules.pass(&[sep.rule(), Proceed(sep)]),

            Proceed(sep) => {
                if kind == JsKind::Comma {
                    self.rules.cont(&[sep.rule(), Proceed(sep)]);
                }
            }

            Expect(wanted) => {
                if kind == wanted {
                    self.rules.cont(&[]);
                } else {
                    // Wrong token: flag it and keep expecting.
                    self.rules.mark(Style::Error);
                    self.rules.cont(&[Expect(wanted)]);
                }
            }

            PushLex(_) | PopLex | PushScope | PopScope => {
                // Handled by the caller via apply_side_effect.
            }
        }
    }
}

impl TokenParser for JsParser {
    fn next_token(&mut self, input: &mut CharStream<'_>) -> Option<Token> {
        // Lexical bookkeeping queued by the previous token runs before the
        // next one is pulled, so frames capture this line's indentation.
        while self.rules.top().is_some_and(Rule::is_lex) {
            if let Some(rule) = self.rules.pop() {
                self.apply_side_effect(&rule);
            }
        }

        let raw = tokens::next_raw(&mut self.mode, input)?;
        let width = raw.value.chars().count() as i32;
        if raw.kind == JsKind::Whitespace && self.column == 0 {
            self.indented = width;
        }
        self.column += width;

        if raw.kind == JsKind::Newline {
            self.indented = 0;
            self.column = 0;
            if self.lexical.align.is_none() {
                self.lexical.align = Some(false);
            }
            let hint = IndentHint::new(JsIndent {
                frame: self.lexical.detached(),
            });
            return Some(Token::newline(hint));
        }

        if matches!(raw.kind, JsKind::Whitespace | JsKind::Comment) {
            return Some(Token::text(raw.value, raw.style));
        }

        if self.lexical.align.is_none() {
            self.lexical.align = Some(true);
        }

        self.rules.begin_token();
        let mut rounds = 0;
        loop {
            let Some(rule) = self.rules.pop() else {
                // The base rule replenishes itself, so an empty stack means
                // the grammar lost its footing; resynchronize.
                self.rules.mark(Style::Error);
                self.rules.cont(&[Rule::Statements]);
                break;
            };
            if rule.is_side_effect() {
                self.apply_side_effect(&rule);
                continue;
            }
            self.dispatch(rule, raw.kind, raw.word.as_deref());
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

        let style = match self.rules.marked() {
            Some(marked) => marked,
            None => {
                let local = raw.kind == JsKind::Variable
                    && raw.word.as_deref().is_some_and(|w| self.scopes.contains(w));
                if local { Style::LocalVariable } else { raw.style }
            }
        };
        Some(Token::text(raw.value, style))
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(JsState {
            mode: self.mode,
            rules: self.rules.snapshot(),
            scopes: self.scopes.clone(),
            lexical: self.lexical.clone(),
        })
    }
}

/// Checkpointed parser state: everything but the stream and the per-line
/// counters, which restart at zero after the break that owns this state.
#[derive(Debug, Clone)]
struct JsState {
    mode: TokenizerMode,
    rules: Vec<Rule>,
    scopes: ScopeChain,
    lexical: LexFrame<FrameKind>,
}

impl ParserState for JsState {
    fn resume(&self) -> Box<dyn TokenParser> {
        Box::new(JsParser {
            mode: self.mode,
            rules: RuleStack::restore(self.rules.clone()),
            scopes: self.scopes.clone(),
            lexical: self.lexical.clone(),
            column: 0,
            indented: 0,
        })
    }

    fn clone_box(&self) -> Box<dyn ParserState> {
        Box::new(self.clone())
    }
}

/// Indentation for the line after a break: a snapshot of the innermost
/// lexical frame at that point.
#[derive(Debug, Clone)]
struct JsIndent {
    frame: LexFrame<FrameKind>,
}

impl IndentRule for JsIndent {
    fn target(&self, next_chars: &str) -> usize {
        let f = &self.frame;
        let closing = f
            .kind
            .closing()
            .is_some_and(|c| next_chars.starts_with(c));
        let width = match f.kind {
            FrameKind::VarDef => f.indented + 4,
            FrameKind::Stat => f.indented + 2,
            _ if f.align == Some(true) => f.column - if closing { 1 } else { 0 },
            _ => f.indented + if closing { 0 } else { 2 },
        };
        width.max(0) as usize
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
        let mut parser = JsParser::new();
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
        let src = "function f(a) {\n  return a + b;\n}";
        let joined: String = parse(src).iter().map(|t| t.value.as_str()).collect();
        assert_eq!(joined, src);
    }

    #[test]
    fn test_scope_classification() {
        let tokens = parse("function f(a) {\n  return a + b;\n}");
        // The parameter is a definition, its use is a local, and an
        // unknown name stays a plain variable.
        assert_eq!(style_of(&tokens, "f"), Style::Variable);
        let mut a_styles = tokens
            .iter()
            .filter(|t| t.value.trim_end() == "a")
            .map(|t| t.style);
        assert_eq!(a_styles.next(), Some(Style::VariableDef));
        assert_eq!(a_styles.next(), Some(Style::LocalVariable));
        assert_eq!(style_of(&tokens, "b"), Style::Variable);
    }

    #[test]
    fn test_var_definition_and_property() {
        let tokens = parse("function g() {\n  var x = obj.field;\n}");
        assert_eq!(style_of(&tokens, "x"), Style::VariableDef);
        assert_eq!(style_of(&tokens, "field"), Style::Property);
        assert_eq!(style_of(&tokens, "obj"), Style::Variable);
    }

    #[test]
    fn test_block_indentation() {
        let tokens = parse("if (x) {\n  y;\n}");
        let hints: Vec<_> = tokens.iter().filter(|t| t.newline).collect();
        assert_eq!(hints.len(), 2);
        // Inside the brace block: one step in, closing brace dedents.
        let first = hints[0].indent.as_ref().unwrap();
        assert_eq!(first.target("y;"), 2);
        assert_eq!(first.target("}"), 0);
        // After `y;` the block frame is still the context.
        let second = hints[1].indent.as_ref().unwrap();
        assert_eq!(second.target("}"), 0);
        assert_eq!(second.target("z"), 2);
    }

    #[test]
    fn test_alignment_under_open_paren() {
        // The opener has trailing content, so children align under it.
        let tokens = parse("f(one,\ntwo);");
        let hint = tokens
            .iter()
            .find(|t| t.newline)
            .and_then(|t| t.indent.as_ref())
            .unwrap();
        // "two" aligns under "one" (column 2); a closing paren tucks in
        // under the opener.
        assert_eq!(hint.target("two"), 2);
        assert_eq!(hint.target(")"), 1);
    }

    #[test]
    fn test_vardef_continuation_indent() {
        let tokens = parse("var a = 1,\nb = 2;");
        let hint = tokens
            .iter()
            .find(|t| t.newline)
            .and_then(|t| t.indent.as_ref())
            .unwrap();
        assert_eq!(hint.target("b"), 4);
    }

    #[test]
    fn test_checkpoint_resume_matches_fresh_parse() {
        let src = "function f(a) {\n  var q = /re/g;\n  return a;\n}";
        let full = parse(src);

        // Parse the first line, checkpoint, resume against the rest.
        let seq = FragmentSeq::from_text(src);
        let mut pos = StreamPos::start(&seq);
        let mut parser = JsParser::new();
        let mut consumed = 0usize;
        loop {
            let tok = {
                let mut stream = CharStream::new(&seq, &mut pos);
                parser.next_token(&mut stream)
            };
            let tok = tok.unwrap();
            consumed += 1;
            if tok.newline {
                break;
            }
        }
        let checkpoint = parser.checkpoint();

        let rest = FragmentSeq::from_text(&src[src.find('\n').unwrap() + 1..]);
        let mut rest_pos = StreamPos::start(&rest);
        let mut resumed = checkpoint.resume();
        let mut tail = Vec::new();
        loop {
            let tok = {
                let mut stream = CharStream::new(&rest, &mut rest_pos);
                resumed.next_token(&mut stream)
            };
            match tok {
                Some(tok) => tail.push(tok),
                None => break,
            }
        }

        let expected = &full[consumed..];
        assert_eq!(tail.len(), expected.len());
        for (got, want) in tail.iter().zip(expected) {
            assert_eq!(got.value, want.value);
            assert_eq!(got.style, want.style);
            assert_eq!(got.newline, want.newline);
        }
    }

    #[test]
    fn test_unexpected_token_marked_error_and_parse_continues() {
        let tokens = parse("if (x { y(); }");
        // The `{` arrives while `)` is expected; it is flagged, not fatal.
        assert!(tokens.iter().any(|t| t.style == Style::Error));
        let joined: String = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(joined, "if (x { y(); }");
    }
}
