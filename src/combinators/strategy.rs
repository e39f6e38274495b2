//! Strategies implementing the primitive algebra.

use std::marker::PhantomData;

use crate::lexer::TokenClassifier;

use super::{memoize, node, Capture, Combinators, NodeContext, Rule};

/// Plain recursive descent with backtracking: every primitive keeps its
/// default.
#[derive(Debug, Clone)]
pub struct Backtracking<V> {
    classifier: TokenClassifier,
    _value: PhantomData<fn() -> V>,
}

impl<V> Backtracking<V> {
    pub fn new() -> Self {
        Self {
            classifier: TokenClassifier::new(),
            _value: PhantomData,
        }
    }
}

impl<V> Default for Backtracking<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Capture> Combinators for Backtracking<V> {
    type Value = V;

    fn classifier(&self) -> &TokenClassifier {
        &self.classifier
    }

    fn classifier_mut(&mut self) -> &mut TokenClassifier {
        &mut self.classifier
    }

    fn into_classifier(self) -> TokenClassifier {
        self.classifier
    }
}

/// Packrat parsing: node results are cached per start position for the
/// duration of one parse, so retrying an alternative never re-parses a node.
///
/// The cache lives in the parse state; parse with
/// [`ParseState::with_memo`](super::ParseState::with_memo) to enable it.
#[derive(Debug, Clone)]
pub struct Packrat<V> {
    classifier: TokenClassifier,
    _value: PhantomData<fn() -> V>,
}

impl<V> Packrat<V> {
    pub fn new() -> Self {
        Self {
            classifier: TokenClassifier::new(),
            _value: PhantomData,
        }
    }
}

impl<V> Default for Packrat<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Capture> Combinators for Packrat<V> {
    type Value = V;

    fn classifier(&self) -> &TokenClassifier {
        &self.classifier
    }

    fn classifier_mut(&mut self) -> &mut TokenClassifier {
        &mut self.classifier
    }

    fn into_classifier(self) -> TokenClassifier {
        self.classifier
    }

    fn node<F>(&mut self, rule: Rule<V>, reducer: F) -> Rule<V>
    where
        F: Fn(Vec<V>, &NodeContext<'_>) -> Option<V> + Send + Sync + 'static,
    {
        memoize(node(rule, reducer))
    }
}
