//! Triple patterns over [`kgterm`] terms.

pub use kgterm::{BlankNode, GraphName, Literal, NamedNode, NamedNodeRef, Term, Variable};
use std::fmt;

/// A [triple pattern](https://www.w3.org/TR/sparql11-query/#defn_TriplePattern).
///
/// Every position may hold a variable. Blank nodes are matched as constants.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl TriplePattern {
    #[inline]
    pub fn new(
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// The term at a position: 0 for subject, 1 for predicate, 2 for object.
    #[inline]
    pub fn term(&self, position: usize) -> Option<&Term> {
        match position {
            0 => Some(&self.subject),
            1 => Some(&self.predicate),
            2 => Some(&self.object),
            _ => None,
        }
    }

    /// The variables of the pattern in subject, predicate, object order, repeated ones included.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .filter_map(Term::as_variable)
    }

    /// Checks that the pattern holds no variable.
    pub fn is_ground(&self) -> bool {
        self.variables().next().is_none()
    }
}

impl fmt::Display for TriplePattern {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

impl From<kgterm::Edge> for TriplePattern {
    #[inline]
    fn from(edge: kgterm::Edge) -> Self {
        Self {
            subject: edge.subject,
            predicate: edge.predicate,
            object: edge.object,
        }
    }
}
