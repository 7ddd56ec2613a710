use oxrdf::{BlankNode, Literal, NamedNode, NamedNodeRef, Variable};
use std::cmp::Ordering;
use std::fmt;

/// An RDF value or a query variable placeholder.
///
/// Terms are compared by value: two terms built independently from the same
/// components are equal and hash identically.
///
/// The total order implemented by [`Ord`] is structural (kind, then lexical content)
/// and consistent with equality. It is meant for deterministic containers; the
/// value ordering used to sort solutions lives in the evaluator.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Term {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
    Variable(Variable),
}

impl Term {
    #[inline]
    pub fn is_named_node(&self) -> bool {
        matches!(self, Self::NamedNode(_))
    }

    #[inline]
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Self::BlankNode(_))
    }

    #[inline]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// Returns the variable if this term is one.
    #[inline]
    pub fn as_variable(&self) -> Option<&Variable> {
        if let Self::Variable(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// Whether this term may stand in the subject position of a stored edge.
    #[inline]
    pub fn is_valid_subject(&self) -> bool {
        matches!(self, Self::NamedNode(_) | Self::BlankNode(_))
    }

    /// Whether this term may stand in the predicate position of a stored edge.
    #[inline]
    pub fn is_valid_predicate(&self) -> bool {
        matches!(self, Self::NamedNode(_))
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::BlankNode(_) => 0,
            Self::NamedNode(_) => 1,
            Self::Literal(_) => 2,
            Self::Variable(_) => 3,
        }
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::NamedNode(a), Self::NamedNode(b)) => a.cmp(b),
            (Self::BlankNode(a), Self::BlankNode(b)) => a.as_str().cmp(b.as_str()),
            (Self::Literal(a), Self::Literal(b)) => cmp_literals(a, b),
            (Self::Variable(a), Self::Variable(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

/// Lexical form, then datatype, then language tag.
fn cmp_literals(a: &Literal, b: &Literal) -> Ordering {
    a.value()
        .cmp(b.value())
        .then_with(|| a.datatype().as_str().cmp(b.datatype().as_str()))
        .then_with(|| a.language().cmp(&b.language()))
}

impl PartialOrd for Term {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Term {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => node.fmt(f),
            Self::BlankNode(node) => node.fmt(f),
            Self::Literal(literal) => literal.fmt(f),
            Self::Variable(variable) => variable.fmt(f),
        }
    }
}

impl From<NamedNode> for Term {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<NamedNodeRef<'_>> for Term {
    #[inline]
    fn from(node: NamedNodeRef<'_>) -> Self {
        Self::NamedNode(node.into_owned())
    }
}

impl From<BlankNode> for Term {
    #[inline]
    fn from(node: BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

impl From<Literal> for Term {
    #[inline]
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<Variable> for Term {
    #[inline]
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<GraphName> for Option<Term> {
    #[inline]
    fn from(graph_name: GraphName) -> Self {
        match graph_name {
            GraphName::NamedNode(node) => Some(node.into()),
            GraphName::BlankNode(node) => Some(node.into()),
            GraphName::DefaultGraph => None,
        }
    }
}

/// The owned name of an [RDF graph](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-graph) in a dataset.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub enum GraphName {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    #[default]
    DefaultGraph,
}

impl GraphName {
    #[inline]
    pub fn is_default_graph(&self) -> bool {
        matches!(self, Self::DefaultGraph)
    }

    /// The graph name as a term, `None` for the default graph.
    #[inline]
    pub fn to_term(&self) -> Option<Term> {
        self.clone().into()
    }
}

impl fmt::Display for GraphName {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => node.fmt(f),
            Self::BlankNode(node) => node.fmt(f),
            Self::DefaultGraph => f.write_str("DEFAULT"),
        }
    }
}

impl From<NamedNode> for GraphName {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<NamedNodeRef<'_>> for GraphName {
    #[inline]
    fn from(node: NamedNodeRef<'_>) -> Self {
        Self::NamedNode(node.into_owned())
    }
}

impl From<BlankNode> for GraphName {
    #[inline]
    fn from(node: BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

impl TryFrom<Term> for GraphName {
    type Error = Term;

    /// Named nodes and blank nodes are valid graph names, other terms are given back.
    #[inline]
    fn try_from(term: Term) -> Result<Self, Term> {
        match term {
            Term::NamedNode(node) => Ok(node.into()),
            Term::BlankNode(node) => Ok(node.into()),
            term @ (Term::Literal(_) | Term::Variable(_)) => Err(term),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_equality() {
        let a = Term::from(NamedNode::new_unchecked("http://example.com/a"));
        let b = Term::from(NamedNode::new("http://example.com/a").unwrap());
        assert_eq!(a, b);
        assert_ne!(a, Term::from(Literal::from("http://example.com/a")));
    }

    #[test]
    fn kinds_are_ordered() {
        let mut terms = vec![
            Term::from(Variable::new_unchecked("v")),
            Term::from(Literal::from("l")),
            Term::from(NamedNode::new_unchecked("http://example.com/n")),
            Term::from(BlankNode::new_unchecked("b")),
        ];
        terms.sort();
        assert!(terms[0].is_blank_node());
        assert!(terms[1].is_named_node());
        assert!(terms[2].is_literal());
        assert!(terms[3].is_variable());
    }

    #[test]
    fn literals_are_ordered_by_lexical_form_then_datatype() {
        let mut terms = vec![
            Term::from(Literal::new_language_tagged_literal_unchecked("b", "en")),
            Term::from(Literal::from(1)),
            Term::from(Literal::from("1")),
            Term::from(Literal::from("a")),
        ];
        terms.sort();
        assert_eq!(
            terms,
            [
                Term::from(Literal::from(1)),
                Term::from(Literal::from("1")),
                Term::from(Literal::from("a")),
                Term::from(Literal::new_language_tagged_literal_unchecked("b", "en")),
            ]
        );
    }

    #[test]
    fn graph_name_conversion() {
        let literal = Term::from(Literal::from("g"));
        assert_eq!(GraphName::try_from(literal.clone()), Err(literal));
        assert_eq!(GraphName::DefaultGraph.to_term(), None);
    }
}
