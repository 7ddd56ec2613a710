//! Transitive rules, applied as one closure computation instead of one join step per iteration.

use kgalgebra::Rule;
use kgalgebra::algebra::GraphPattern;
use kgalgebra::term::TriplePattern;
use kgeval::EdgeAccessor;
use kgterm::Term;
use rustc_hash::{FxHashMap, FxHashSet};

/// The predicate `p` of a rule `?x p ?y . ?y p ?z => ?x p ?z`, with a constant `p` and three
/// distinct variables. The body patterns may come in any order.
pub(crate) fn transitive_predicate(rule: &Rule) -> Option<&Term> {
    if rule.is_constraint() {
        return None;
    }
    let [head] = rule.head.as_slice() else {
        return None;
    };
    let [GraphPattern::Edge(first), GraphPattern::Edge(second)] = rule.body.as_slice() else {
        return None;
    };
    let predicate = &head.predicate;
    if predicate.is_variable() || first.predicate != *predicate || second.predicate != *predicate
    {
        return None;
    }
    let (start, end) = (head.subject.as_variable()?, head.object.as_variable()?);
    let chained = |a: &TriplePattern, b: &TriplePattern| {
        a.subject.as_variable() == Some(start)
            && b.object.as_variable() == Some(end)
            && a.object == b.subject
            && a.object.as_variable().is_some_and(|middle| middle != start && middle != end)
    };
    (start != end && (chained(first, second) || chained(second, first))).then_some(predicate)
}

/// The `(subject, object)` pairs where `object` is reachable from `subject` along `predicate`
/// edges, in discovery order.
pub(crate) fn closure<A: EdgeAccessor>(
    accessor: &A,
    predicate: &Term,
) -> Result<Vec<(Term, Term)>, A::Error> {
    let mut subjects = Vec::new();
    let mut successors = FxHashMap::<Term, Vec<Term>>::default();
    for edge in accessor.edges_for_pattern(None, Some(predicate), None, None) {
        let edge = edge?;
        let targets = successors.entry(edge.subject.clone()).or_insert_with(|| {
            subjects.push(edge.subject.clone());
            Vec::new()
        });
        if !targets.contains(&edge.object) {
            targets.push(edge.object);
        }
    }
    let mut pairs = Vec::new();
    for subject in subjects {
        let mut reached = FxHashSet::default();
        let mut stack = successors
            .get(&subject)
            .into_iter()
            .flatten()
            .rev()
            .collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            if !reached.insert(node) {
                continue;
            }
            pairs.push((subject.clone(), node.clone()));
            if let Some(next) = successors.get(node) {
                stack.extend(next.iter().rev().filter(|n| !reached.contains(n)));
            }
        }
    }
    Ok(pairs)
}
