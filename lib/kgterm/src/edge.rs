use crate::term::{GraphName, Term};
use std::fmt;
use std::hash::{Hash, Hasher};

/// How an [`Edge`] entered the store.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash, Default)]
pub enum Provenance {
    /// Loaded or inserted by an explicit update.
    #[default]
    Asserted,
    /// Produced by rule entailment.
    Derived,
}

/// A stored triple with an optional named graph context.
///
/// Equality and hashing only look at the four positions: an edge already exists
/// in a store whatever its [`Provenance`].
///
/// ```
/// use kgterm::{Edge, GraphName, NamedNode, Provenance};
///
/// let ex = NamedNode::new("http://example.com")?;
/// let asserted = Edge::new(ex.clone(), ex.clone(), ex.clone(), GraphName::DefaultGraph);
/// let derived = asserted.clone().with_provenance(Provenance::Derived);
/// assert_eq!(asserted, derived);
/// assert_eq!(
///     asserted.to_string(),
///     "<http://example.com> <http://example.com> <http://example.com>"
/// );
/// # Result::<_,kgterm::IriParseError>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct Edge {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph_name: GraphName,
    pub provenance: Provenance,
}

impl Edge {
    /// Builds an asserted edge.
    #[inline]
    pub fn new(
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
        graph_name: impl Into<GraphName>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph_name: graph_name.into(),
            provenance: Provenance::Asserted,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    #[inline]
    pub fn is_derived(&self) -> bool {
        self.provenance == Provenance::Derived
    }

    /// Whether the positions hold terms allowed in a stored edge: no variables,
    /// a named or blank subject and a named predicate.
    pub fn is_valid(&self) -> bool {
        self.subject.is_valid_subject()
            && self.predicate.is_valid_predicate()
            && !self.object.is_variable()
    }
}

impl PartialEq for Edge {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject
            && self.predicate == other.predicate
            && self.object == other.object
            && self.graph_name == other.graph_name
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.subject.hash(state);
        self.predicate.hash(state);
        self.object.hash(state);
        self.graph_name.hash(state);
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if !self.graph_name.is_default_graph() {
            write!(f, " {}", self.graph_name)?;
        }
        Ok(())
    }
}
