//! Continuation machinery shared by the grammar modules.
//!
//! Grammars here are not recursive-descent functions but an explicit stack
//! of pending rules, so a parse can be frozen between any two tokens and
//! thawed against a different stream. A rule reacts to the current token by
//! either consuming it (`cont`, pushing the rules that handle what follows)
//! or declining it (`pass`, pushing rules that get a shot at this same
//! token).

use crate::parse::Style;

/// Explicit stack of pending grammar rules plus the per-token dispatch
/// flags (`consumed`, `marked`).
#[derive(Debug, Clone)]
pub struct RuleStack<R> {
    rules: Vec<R>,
    consumed: bool,
    marked: Option<Style>,
}

impl<R: Clone> RuleStack<R> {
    pub fn new(start: R) -> Self {
        Self {
            rules: vec![start],
            consumed: false,
            marked: None,
        }
    }

    /// Rebuild a stack from a checkpoint snapshot.
    pub fn restore(rules: Vec<R>) -> Self {
        Self {
            rules,
            consumed: false,
            marked: None,
        }
    }

    /// Snapshot for checkpointing.
    pub fn snapshot(&self) -> Vec<R> {
        self.rules.clone()
    }

    /// Reset the dispatch flags before handling a new token.
    pub fn begin_token(&mut self) {
        self.consumed = false;
        self.marked = None;
    }

    /// Accept the current token and queue `rules` to run against what
    /// follows, first rule first.
    pub fn cont(&mut self, rules: &[R]) {
        self.push_rules(rules);
        self.consumed = true;
    }

    /// Queue `rules` without accepting the current token; the top rule is
    /// re-dispatched with the same token.
    pub fn pass(&mut self, rules: &[R]) {
        self.push_rules(rules);
        self.consumed = false;
    }

    fn push_rules(&mut self, rules: &[R]) {
        for rule in rules.iter().rev() {
            self.rules.push(rule.clone());
        }
    }

    pub fn pop(&mut self) -> Option<R> {
        self.rules.pop()
    }

    pub fn top(&self) -> Option<&R> {
        self.rules.last()
    }

    /// Override the style of the token being dispatched.
    pub fn mark(&mut self, style: Style) {
        self.marked = Some(style);
    }

    pub fn marked(&self) -> Option<Style> {
        self.marked
    }

    pub fn consumed(&self) -> bool {
        self.consumed
    }
}

/// One lexical-context frame: the nesting state a grammar tracks per open
/// construct, used to compute indentation for the lines inside it.
///
/// `align` starts out undecided. It becomes `true` when a token follows the
/// opener on the same line (children then align under that token) and
/// `false` when the line ends first (children indent by a fixed step).
#[derive(Debug, Clone, PartialEq)]
pub struct LexFrame<K> {
    pub indented: i32,
    pub column: i32,
    pub kind: K,
    pub align: Option<bool>,
    pub parent: Option<Box<LexFrame<K>>>,
}

impl<K> LexFrame<K> {
    pub fn new(indented: i32, column: i32, kind: K, align: Option<bool>) -> Self {
        Self {
            indented,
            column,
            kind,
            align,
            parent: None,
        }
    }

    /// Push `frame` on top of `self`, making `self` its parent.
    pub fn push(&mut self, mut frame: LexFrame<K>) {
        std::mem::swap(self, &mut frame);
        self.parent = Some(Box::new(frame));
    }

    /// Pop back to the parent frame. The root frame stays put.
    pub fn pop(&mut self) {
        if let Some(parent) = self.parent.take() {
            *self = *parent;
        }
    }
}

impl<K: Clone> LexFrame<K> {
    /// Copy of this frame's own fields, without the parent chain. Grammars
    /// whose indentation only consults the innermost frame snapshot this
    /// into their indent rules.
    pub fn detached(&self) -> LexFrame<K> {
        LexFrame {
            indented: self.indented,
            column: self.column,
            kind: self.kind.clone(),
            align: self.align,
            parent: None,
        }
    }
}

/// Chain of identifier scopes for variable classification. Empty outside
/// any function body.
#[derive(Debug, Clone, Default)]
pub struct ScopeChain {
    top: Option<Box<ScopeFrame>>,
}

#[derive(Debug, Clone)]
struct ScopeFrame {
    vars: Vec<String>,
    parent: Option<Box<ScopeFrame>>,
}

impl ScopeChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope pre-seeded with `predeclared` names.
    pub fn push_with(&mut self, predeclared: &[&str]) {
        let parent = self.top.take();
        self.top = Some(Box::new(ScopeFrame {
            vars: predeclared.iter().map(|s| s.to_string()).collect(),
            parent,
        }));
    }

    pub fn pop(&mut self) {
        if let Some(frame) = self.top.take() {
            self.top = frame.parent;
        }
    }

    /// True while at least one scope is open.
    pub fn active(&self) -> bool {
        self.top.is_some()
    }

    /// Record `name` in the innermost scope. Returns false when no scope is
    /// open (top-level definitions are not tracked).
    pub fn register(&mut self, name: &str) -> bool {
        match self.top.as_mut() {
            Some(frame) => {
                if !frame.vars.iter().any(|v| v == name) {
                    frame.vars.push(name.to_string());
                }
                true
            }
            None => false,
        }
    }

    /// Walk the chain looking for `name`.
    pub fn contains(&self, name: &str) -> bool {
        let mut cursor = self.top.as_deref();
        while let Some(frame) = cursor {
            if frame.vars.iter().any(|v| v == name) {
                return true;
            }
            cursor = frame.parent.as_deref();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum R {
        A,
        B,
        C,
    }

    #[test]
    fn test_cont_pushes_first_rule_on_top() {
        let mut stack = RuleStack::new(R::C);
        stack.begin_token();
        stack.cont(&[R::A, R::B]);
        assert!(stack.consumed());
        assert_eq!(stack.pop(), Some(R::A));
        assert_eq!(stack.pop(), Some(R::B));
        assert_eq!(stack.pop(), Some(R::C));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_pass_does_not_consume() {
        let mut stack = RuleStack::new(R::A);
        stack.begin_token();
        stack.pass(&[R::B]);
        assert!(!stack.consumed());
        assert_eq!(stack.top(), Some(&R::B));
    }

    #[test]
    fn test_mark_resets_per_token() {
        let mut stack = RuleStack::new(R::A);
        stack.mark(Style::Error);
        assert_eq!(stack.marked(), Some(Style::Error));
        stack.begin_token();
        assert_eq!(stack.marked(), None);
    }

    #[test]
    fn test_lex_frame_push_pop() {
        let mut frame = LexFrame::new(-2, 0, 0u8, Some(false));
        frame.push(LexFrame::new(4, 9, 1u8, None));
        assert_eq!(frame.kind, 1);
        assert_eq!(frame.column, 9);
        frame.pop();
        assert_eq!(frame.kind, 0);
        assert_eq!(frame.indented, -2);
        // Popping the root is a no-op.
        frame.pop();
        assert_eq!(frame.kind, 0);
    }

    #[test]
    fn test_scope_chain_shadowing() {
        let mut scopes = ScopeChain::new();
        assert!(!scopes.register("x"));
        scopes.push_with(&["this"]);
        assert!(scopes.register("x"));
        scopes.push_with(&[]);
        assert!(scopes.contains("x"));
        assert!(scopes.contains("this"));
        assert!(!scopes.contains("y"));
        scopes.pop();
        scopes.pop();
        assert!(!scopes.contains("x"));
        assert!(!scopes.active());
    }
}
