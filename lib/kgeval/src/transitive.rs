use crate::dataset::EdgeAccessor;
use crate::error::QueryEvaluationError;
use kgterm::Term;
use rustc_hash::FxHashSet;
use tracing::trace;

/// Checks if `object` is reachable from `subject` by following one or more `predicate` edges,
/// in any graph.
///
/// The traversal keeps a visited set local to the call so cyclic graphs terminate.
/// `is_transitive(n, p, n)` is only true if there is a cycle through `p` back to `n`.
/// Nothing is cached between calls.
///
/// ```
/// use kgeval::is_transitive;
/// use kgterm::{Edge, Graph, GraphName, NamedNode};
///
/// let ex = |name: &str| NamedNode::new_unchecked(format!("http://example.com/{name}"));
/// let graph = [("a", "b"), ("b", "c"), ("c", "a")]
///     .into_iter()
///     .map(|(s, o)| Edge::new(ex(s), ex("p"), ex(o), GraphName::DefaultGraph))
///     .collect::<Graph>();
/// assert!(is_transitive(&graph, &ex("a").into(), &ex("p").into(), &ex("c").into())?);
/// assert!(is_transitive(&graph, &ex("a").into(), &ex("p").into(), &ex("a").into())?);
/// assert!(!is_transitive(&graph, &ex("a").into(), &ex("q").into(), &ex("c").into())?);
/// # Result::<_, kgeval::QueryEvaluationError>::Ok(())
/// ```
pub fn is_transitive<A: EdgeAccessor>(
    accessor: &A,
    subject: &Term,
    predicate: &Term,
    object: &Term,
) -> Result<bool, QueryEvaluationError> {
    let mut visited = FxHashSet::default();
    let mut stack = vec![subject.clone()];
    while let Some(node) = stack.pop() {
        if !visited.insert(node.clone()) {
            continue;
        }
        for edge in accessor.edges_for_pattern(Some(&node), Some(predicate), None, None) {
            let edge = edge.map_err(QueryEvaluationError::dataset)?;
            if edge.object == *object {
                trace!(%subject, %predicate, %object, visited = visited.len(), "reached");
                return Ok(true);
            }
            if !visited.contains(&edge.object) {
                stack.push(edge.object);
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgterm::{Edge, Graph, GraphName, NamedNode};

    fn ex(name: &str) -> Term {
        NamedNode::new_unchecked(format!("http://example.com/{name}")).into()
    }

    fn chain(edges: &[(&str, &str)]) -> Graph {
        edges
            .iter()
            .map(|(s, o)| Edge::new(ex(s), ex("p"), ex(o), GraphName::DefaultGraph))
            .collect()
    }

    #[test]
    fn self_loop_needs_a_cycle() -> Result<(), QueryEvaluationError> {
        let acyclic = chain(&[("a", "b"), ("b", "c")]);
        assert!(!is_transitive(&acyclic, &ex("a"), &ex("p"), &ex("a"))?);
        let cyclic = chain(&[("a", "b"), ("b", "c"), ("c", "b")]);
        assert!(!is_transitive(&cyclic, &ex("a"), &ex("p"), &ex("a"))?);
        assert!(is_transitive(&cyclic, &ex("b"), &ex("p"), &ex("b"))?);
        Ok(())
    }

    #[test]
    fn unreachable_in_cyclic_graph_terminates() -> Result<(), QueryEvaluationError> {
        let graph = chain(&[("a", "b"), ("b", "a"), ("a", "a"), ("c", "d")]);
        assert!(!is_transitive(&graph, &ex("a"), &ex("p"), &ex("d"))?);
        assert!(is_transitive(&graph, &ex("c"), &ex("p"), &ex("d"))?);
        Ok(())
    }
}
