//! [In-memory implementation](Graph) of an edge store.
//!
//! Usage example:
//! ```
//! use kgterm::*;
//!
//! let mut graph = Graph::new();
//!
//! // insertion
//! let ex = NamedNode::new("http://example.com")?;
//! let edge = Edge::new(ex.clone(), ex.clone(), ex.clone(), GraphName::DefaultGraph);
//! assert!(graph.insert(edge.clone()));
//! assert!(!graph.insert(edge.clone()));
//!
//! // simple filter
//! let results: Vec<_> = graph
//!     .edges_for_pattern(Some(&ex.into()), None, None, None)
//!     .collect();
//! assert_eq!(vec![&edge], results);
//! # Result::<_,Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::edge::{Edge, Provenance};
use crate::term::{GraphName, Term};
use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, btree_set};
use std::ops::Range;
use std::{fmt, mem, slice};

/// Holes left by removals are reclaimed once they exceed both this count and the number of edges.
const COMPACTION_THRESHOLD: usize = 64;

/// An in-memory store of [`Edge`]s spanning the default graph and any number of named graphs.
///
/// Edges are kept in insertion order and indexed by subject, predicate and object.
/// Removal leaves a hole in the insertion order, and holes are compacted away once they outnumber
/// the edges: iteration order of the remaining edges never changes.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    slots: Vec<Option<Edge>>,
    ids: FxHashMap<Edge, usize>,
    subjects: FxHashMap<Term, BTreeSet<usize>>,
    predicates: FxHashMap<Term, BTreeSet<usize>>,
    objects: FxHashMap<Term, BTreeSet<usize>>,
}

impl Graph {
    /// Creates a new graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all the edges contained by the graph, in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.slots.iter(),
        }
    }

    /// Returns the edges matching a pattern, in insertion order.
    ///
    /// `None` means "any" in every position. A `None` graph name matches the default graph
    /// and every named graph.
    pub fn edges_for_pattern<'a, 'b>(
        &'a self,
        subject: Option<&'b Term>,
        predicate: Option<&'b Term>,
        object: Option<&'b Term>,
        graph_name: Option<&'b GraphName>,
    ) -> EdgesForPattern<'a, 'b> {
        let mut candidates = Candidates::All(0..self.slots.len());
        let mut best = usize::MAX;
        for (index, term) in [
            (&self.subjects, subject),
            (&self.predicates, predicate),
            (&self.objects, object),
        ] {
            let Some(term) = term else {
                continue;
            };
            match index.get(term) {
                Some(ids) if ids.len() < best => {
                    best = ids.len();
                    candidates = Candidates::Indexed(ids.iter());
                }
                Some(_) => (),
                None => {
                    candidates = Candidates::Empty;
                    break;
                }
            }
        }
        EdgesForPattern {
            graph: self,
            candidates,
            subject,
            predicate,
            object,
            graph_name,
        }
    }

    /// Checks if the graph contains the given edge, whatever its provenance.
    pub fn contains(&self, edge: &Edge) -> bool {
        self.ids.contains_key(edge)
    }

    /// Returns the number of edges in this graph.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Checks if this graph contains an edge.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Adds an edge to the graph.
    ///
    /// Returns `false` if an equal edge was already there. Asserting an edge that was
    /// previously derived marks it as asserted so entailment cleanup keeps it.
    pub fn insert(&mut self, edge: Edge) -> bool {
        if let Some(id) = self.ids.get(&edge) {
            if edge.provenance == Provenance::Asserted {
                if let Some(Some(existing)) = self.slots.get_mut(*id) {
                    existing.provenance = Provenance::Asserted;
                }
            }
            return false;
        }
        self.push(edge);
        true
    }

    /// Removes a concrete edge from this graph.
    ///
    /// Returns `false` if it was not there.
    pub fn remove(&mut self, edge: &Edge) -> bool {
        let Some(id) = self.ids.remove(edge) else {
            return false;
        };
        Self::unindex(&mut self.subjects, &edge.subject, id);
        Self::unindex(&mut self.predicates, &edge.predicate, id);
        Self::unindex(&mut self.objects, &edge.object, id);
        if let Some(slot) = self.slots.get_mut(id) {
            *slot = None;
        }
        let holes = self.slots.len() - self.ids.len();
        if holes > COMPACTION_THRESHOLD && holes > self.ids.len() {
            self.compact();
        }
        true
    }

    /// Removes every edge produced by entailment and returns them in insertion order.
    pub fn remove_derived(&mut self) -> Vec<Edge> {
        let derived = self
            .iter()
            .filter(|edge| edge.is_derived())
            .cloned()
            .collect::<Vec<_>>();
        for edge in &derived {
            self.remove(edge);
        }
        derived
    }

    /// Clears the graph.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.ids.clear();
        self.subjects.clear();
        self.predicates.clear();
        self.objects.clear();
    }

    fn push(&mut self, edge: Edge) {
        let id = self.slots.len();
        for (index, term) in [
            (&mut self.subjects, &edge.subject),
            (&mut self.predicates, &edge.predicate),
            (&mut self.objects, &edge.object),
        ] {
            index.entry(term.clone()).or_default().insert(id);
        }
        self.ids.insert(edge.clone(), id);
        self.slots.push(Some(edge));
    }

    /// Renumbers the edges without holes, keeping their order.
    fn compact(&mut self) {
        let slots = mem::take(&mut self.slots);
        self.ids.clear();
        self.subjects.clear();
        self.predicates.clear();
        self.objects.clear();
        for edge in slots.into_iter().flatten() {
            self.push(edge);
        }
    }

    fn unindex(index: &mut FxHashMap<Term, BTreeSet<usize>>, term: &Term, id: usize) {
        if let Some(ids) = index.get_mut(term) {
            ids.remove(&id);
            if ids.is_empty() {
                index.remove(term);
            }
        }
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|edge| other.contains(edge))
    }
}

impl Eq for Graph {}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Edge;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Edge> for Graph {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        let mut g = Self::new();
        g.extend(iter);
        g
    }
}

impl Extend<Edge> for Graph {
    fn extend<I: IntoIterator<Item = Edge>>(&mut self, iter: I) {
        for edge in iter {
            self.insert(edge);
        }
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for edge in self {
            writeln!(f, "{edge} .")?;
        }
        Ok(())
    }
}

/// Iterator returned by [`Graph::iter`].
pub struct Iter<'a> {
    inner: slice::Iter<'a, Option<Edge>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Edge;

    fn next(&mut self) -> Option<&'a Edge> {
        self.inner.by_ref().flatten().next()
    }
}

enum Candidates<'a> {
    All(Range<usize>),
    Indexed(btree_set::Iter<'a, usize>),
    Empty,
}

/// Iterator returned by [`Graph::edges_for_pattern`].
pub struct EdgesForPattern<'a, 'b> {
    graph: &'a Graph,
    candidates: Candidates<'a>,
    subject: Option<&'b Term>,
    predicate: Option<&'b Term>,
    object: Option<&'b Term>,
    graph_name: Option<&'b GraphName>,
}

impl EdgesForPattern<'_, '_> {
    fn matches(&self, edge: &Edge) -> bool {
        self.subject.is_none_or(|t| *t == edge.subject)
            && self.predicate.is_none_or(|t| *t == edge.predicate)
            && self.object.is_none_or(|t| *t == edge.object)
            && self.graph_name.is_none_or(|g| *g == edge.graph_name)
    }
}

impl<'a> Iterator for EdgesForPattern<'a, '_> {
    type Item = &'a Edge;

    fn next(&mut self) -> Option<&'a Edge> {
        loop {
            let id = match &mut self.candidates {
                Candidates::All(range) => range.next()?,
                Candidates::Indexed(ids) => *ids.next()?,
                Candidates::Empty => return None,
            };
            let graph = self.graph;
            if let Some(Some(edge)) = graph.slots.get(id) {
                if self.matches(edge) {
                    return Some(edge);
                }
            }
        }
    }
}
