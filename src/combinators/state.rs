use std::collections::HashMap;

use crate::lexer::Token;

use super::RuleId;

type MemoTable<V> = HashMap<(RuleId, usize), Option<(Vec<V>, usize)>>;

/// How many times a parse may re-enter a self-referential rule before it
/// gives up. Each level costs a chain of rule frames on the native stack.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Per-parse state threaded through every rule.
///
/// Holds the token slice, the cursor, the furthest failure seen so far and,
/// for memoizing grammars, the packrat table. Rules never store any of this
/// themselves, so one grammar can serve any number of parses.
pub struct ParseState<'t, V> {
    tokens: &'t [Token],
    index: usize,
    furthest: usize,
    expected: Vec<String>,
    depth: usize,
    too_deep: Option<usize>,
    memo: Option<MemoTable<V>>,
}

impl<'t, V> ParseState<'t, V> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            index: 0,
            furthest: 0,
            expected: Vec::new(),
            depth: 0,
            too_deep: None,
            memo: None,
        }
    }

    /// A state with an empty packrat table; memoizing rules cache their
    /// results in it.
    pub fn with_memo(tokens: &'t [Token]) -> Self {
        Self {
            memo: Some(HashMap::new()),
            ..Self::new(tokens)
        }
    }

    pub fn tokens(&self) -> &'t [Token] {
        self.tokens
    }

    pub fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.index)
    }

    pub fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.index)?;
        self.index += 1;
        Some(token)
    }

    pub fn has_next(&self) -> bool {
        self.index < self.tokens.len()
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn restore(&mut self, position: usize) {
        self.index = position;
    }

    /// Notes that a rule expecting `what` failed at the cursor. Only the
    /// furthest failure position is kept.
    pub fn record_failure(&mut self, what: impl FnOnce() -> String) {
        if self.index > self.furthest {
            self.furthest = self.index;
            self.expected.clear();
        }
        if self.index == self.furthest {
            let what = what();
            if !self.expected.contains(&what) {
                self.expected.push(what);
            }
        }
    }

    /// Token index of the furthest recorded failure.
    pub fn furthest_failure(&self) -> usize {
        self.furthest
    }

    /// What the rules failing at the furthest position expected.
    pub fn expected(&self) -> &[String] {
        &self.expected
    }

    /// Enters one nesting level. Returns `false`, and from then on keeps
    /// returning `false`, once [`MAX_NESTING_DEPTH`] is exceeded.
    pub fn enter_nested(&mut self) -> bool {
        if self.too_deep.is_some() {
            return false;
        }
        if self.depth >= MAX_NESTING_DEPTH {
            tracing::debug!(index = self.index, depth = self.depth, "nesting limit reached");
            self.too_deep = Some(self.index);
            return false;
        }
        self.depth += 1;
        true
    }

    pub fn exit_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Token index where the nesting limit was hit, if it was.
    pub fn nesting_overflow(&self) -> Option<usize> {
        self.too_deep
    }

    pub fn is_memoizing(&self) -> bool {
        self.memo.is_some()
    }

    pub(crate) fn memo_lookup(&self, rule: RuleId) -> Option<Option<(Vec<V>, usize)>>
    where
        V: Clone,
    {
        self.memo.as_ref()?.get(&(rule, self.index)).cloned()
    }

    pub(crate) fn memo_store(&mut self, rule: RuleId, start: usize, result: Option<(Vec<V>, usize)>) {
        if let Some(memo) = self.memo.as_mut() {
            memo.insert((rule, start), result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::lexer::TokenKind;

    fn tokens() -> Vec<Token> {
        vec![
            Token::new(TokenKind::Identifier, "a", Span::new(0, 1), 1, 1),
            Token::new(TokenKind::Verbatim, "+", Span::new(2, 3), 1, 3),
        ]
    }

    #[test]
    fn advance_and_restore() {
        let tokens = tokens();
        let mut state: ParseState<'_, ()> = ParseState::new(&tokens);
        assert_eq!(state.advance().map(|t| t.text.as_str()), Some("a"));
        assert_eq!(state.position(), 1);
        state.restore(0);
        assert_eq!(state.peek().map(|t| t.text.as_str()), Some("a"));
    }

    #[test]
    fn keeps_only_furthest_expectations() {
        let tokens = tokens();
        let mut state: ParseState<'_, ()> = ParseState::new(&tokens);
        state.record_failure(|| "number".into());
        state.advance();
        state.record_failure(|| "identifier".into());
        state.record_failure(|| "identifier".into());
        state.restore(0);
        state.record_failure(|| "string".into());
        assert_eq!(state.furthest_failure(), 1);
        assert_eq!(state.expected(), ["identifier".to_string()]);
    }

    #[test]
    fn nesting_limit_sticks_once_hit() {
        let tokens = tokens();
        let mut state: ParseState<'_, ()> = ParseState::new(&tokens);
        for _ in 0..MAX_NESTING_DEPTH {
            assert!(state.enter_nested());
        }
        assert!(!state.enter_nested());
        assert_eq!(state.nesting_overflow(), Some(0));

        state.exit_nested();
        assert!(!state.enter_nested());
    }
}
