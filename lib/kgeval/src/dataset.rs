use kgterm::{Edge, Graph, GraphName, Term};
use rustc_hash::FxHashSet;
use std::convert::Infallible;
use std::error::Error;

/// A store of [`Edge`]s the evaluator can match patterns against.
///
/// To evaluate patterns against your own storage, implement this trait.
/// [`Graph`] is the in-memory implementation.
pub trait EdgeAccessor {
    /// Error returned by the storage.
    type Error: Error + Send + Sync + 'static;

    /// Fetches the edges matching a pattern.
    ///
    /// `None` means "any" in every position. A `None` graph name matches the edges of the
    /// default graph and of every named graph.
    fn edges_for_pattern<'a>(
        &'a self,
        subject: Option<&'a Term>,
        predicate: Option<&'a Term>,
        object: Option<&'a Term>,
        graph_name: Option<&'a GraphName>,
    ) -> impl Iterator<Item = Result<Edge, Self::Error>> + 'a;

    /// Returns if an edge equal to the given one is stored, whatever its provenance.
    fn contains(&self, edge: &Edge) -> Result<bool, Self::Error> {
        Ok(self
            .edges_for_pattern(
                Some(&edge.subject),
                Some(&edge.predicate),
                Some(&edge.object),
                Some(&edge.graph_name),
            )
            .next()
            .transpose()?
            .is_some())
    }

    /// The distinct named graphs, in first appearance order.
    fn named_graphs(&self) -> Result<Vec<GraphName>, Self::Error> {
        let mut seen = FxHashSet::default();
        let mut graphs = Vec::new();
        for edge in self.edges_for_pattern(None, None, None, None) {
            let graph_name = edge?.graph_name;
            if !graph_name.is_default_graph() && seen.insert(graph_name.clone()) {
                graphs.push(graph_name);
            }
        }
        Ok(graphs)
    }
}

/// An [`EdgeAccessor`] that can be written to, used by entailment.
pub trait MutableEdgeAccessor: EdgeAccessor {
    /// Inserts an edge, returns `false` if an equal edge was already stored.
    fn insert(&mut self, edge: Edge) -> Result<bool, Self::Error>;

    /// Removes an edge, returns `false` if it was not stored.
    fn remove(&mut self, edge: &Edge) -> Result<bool, Self::Error>;

    /// Removes every [derived](kgterm::Provenance::Derived) edge and returns them.
    fn remove_derived(&mut self) -> Result<Vec<Edge>, Self::Error> {
        let mut derived = Vec::new();
        for edge in self.edges_for_pattern(None, None, None, None) {
            let edge = edge?;
            if edge.is_derived() {
                derived.push(edge);
            }
        }
        for edge in &derived {
            self.remove(edge)?;
        }
        Ok(derived)
    }
}

impl EdgeAccessor for Graph {
    type Error = Infallible;

    fn edges_for_pattern<'a>(
        &'a self,
        subject: Option<&'a Term>,
        predicate: Option<&'a Term>,
        object: Option<&'a Term>,
        graph_name: Option<&'a GraphName>,
    ) -> impl Iterator<Item = Result<Edge, Infallible>> + 'a {
        Graph::edges_for_pattern(self, subject, predicate, object, graph_name)
            .map(|edge| Ok(edge.clone()))
    }

    fn contains(&self, edge: &Edge) -> Result<bool, Infallible> {
        Ok(Graph::contains(self, edge))
    }
}

impl MutableEdgeAccessor for Graph {
    fn insert(&mut self, edge: Edge) -> Result<bool, Infallible> {
        Ok(Graph::insert(self, edge))
    }

    fn remove(&mut self, edge: &Edge) -> Result<bool, Infallible> {
        Ok(Graph::remove(self, edge))
    }

    fn remove_derived(&mut self) -> Result<Vec<Edge>, Infallible> {
        Ok(Graph::remove_derived(self))
    }
}
