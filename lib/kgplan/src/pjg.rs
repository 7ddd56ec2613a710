use crate::cost::{JoinType, MAX_COST, join_cost, join_type};
use kgalgebra::algebra::GraphPattern;
use kgalgebra::term::Variable;
use std::fmt;
use tracing::trace;

/// A node of a [`PatternJoinGraph`]: one item of the group.
#[derive(Debug, Clone)]
pub struct PjgNode<'a> {
    /// Declaration index in the group.
    pub index: usize,
    pub pattern: &'a GraphPattern,
    /// Distinct in-scope variables not bound before the group.
    pub variables: Vec<&'a Variable>,
}

impl PjgNode<'_> {
    pub fn is_evaluable(&self) -> bool {
        self.pattern.is_evaluable()
    }
}

/// A candidate join between two evaluable nodes sharing at least one variable.
#[derive(Debug, Clone)]
pub struct JoinEdge<'a> {
    /// The node declared first.
    pub left: usize,
    pub right: usize,
    pub shared: Vec<&'a Variable>,
    pub join_type: JoinType,
    pub cost: f64,
}

impl JoinEdge<'_> {
    /// The other end of the edge.
    pub fn opposite(&self, node: usize) -> usize {
        if self.left == node {
            self.right
        } else {
            self.left
        }
    }
}

/// The graph of candidate joins between the items of a group.
///
/// Filters, binds, values, optional, union and minus blocks are nodes without edges.
#[derive(Debug, Clone)]
pub struct PatternJoinGraph<'a> {
    pub nodes: Vec<PjgNode<'a>>,
    /// Sorted by left then right node.
    pub edges: Vec<JoinEdge<'a>>,
}

impl<'a> PatternJoinGraph<'a> {
    /// Builds the graph of a group, `bound` being the variables bound before the group is evaluated.
    pub fn new(group: &'a [GraphPattern], bound: &[Variable]) -> Self {
        let nodes = group
            .iter()
            .enumerate()
            .map(|(index, pattern)| {
                let mut variables = Vec::new();
                pattern.on_in_scope_variable(|v| {
                    if !bound.contains(v) && !variables.contains(&v) {
                        variables.push(v);
                    }
                });
                PjgNode {
                    index,
                    pattern,
                    variables,
                }
            })
            .collect::<Vec<_>>();
        let mut edges = Vec::new();
        for (i, left) in nodes.iter().enumerate() {
            if !left.is_evaluable() {
                continue;
            }
            for right in nodes.iter().skip(i + 1) {
                if !right.is_evaluable() {
                    continue;
                }
                let shared = left
                    .variables
                    .iter()
                    .filter(|v| right.variables.contains(*v))
                    .copied()
                    .collect::<Vec<_>>();
                if shared.is_empty() {
                    continue;
                }
                let join_type = match (left.pattern, right.pattern) {
                    (GraphPattern::Edge(l), GraphPattern::Edge(r)) => {
                        let owned = shared.iter().map(|v| (*v).clone()).collect::<Vec<_>>();
                        join_type(l, r, &owned)
                    }
                    _ => JoinType::Graph,
                };
                let cost = join_cost(join_type, shared.len());
                trace!(
                    left = left.index,
                    right = right.index,
                    shared = shared.len(),
                    %join_type,
                    cost,
                    "join edge"
                );
                edges.push(JoinEdge {
                    left: left.index,
                    right: right.index,
                    shared,
                    join_type,
                    cost,
                });
            }
        }
        Self { nodes, edges }
    }

    /// The join edges touching a node.
    pub fn edges_of(&self, node: usize) -> impl Iterator<Item = &JoinEdge<'a>> {
        self.edges
            .iter()
            .filter(move |e| e.left == node || e.right == node)
    }

    /// The join edge between two nodes, if any.
    pub fn edge(&self, a: usize, b: usize) -> Option<&JoinEdge<'a>> {
        let (left, right) = if a < b { (a, b) } else { (b, a) };
        self.edges
            .iter()
            .find(|e| e.left == left && e.right == right)
    }
}

impl fmt::Display for PatternJoinGraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            let kind = if node.is_evaluable() { "pattern" } else { "block" };
            writeln!(f, "{} {kind} {}", node.index, node.pattern)?;
        }
        for edge in &self.edges {
            write!(f, "{} -- {} [", edge.left, edge.right)?;
            for (i, v) in edge.shared.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{v}")?;
            }
            write!(f, "] {}", edge.join_type)?;
            if edge.cost.total_cmp(&MAX_COST).is_eq() {
                writeln!(f, " cost MAX")?;
            } else {
                writeln!(f, " cost {:.3}", edge.cost)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgalgebra::algebra::Expression;
    use kgterm::NamedNode;

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    fn iri(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    #[test]
    fn blocks_have_no_join_edges() {
        let group = vec![
            GraphPattern::edge(var("x"), iri("type"), var("c")),
            GraphPattern::filter(Expression::Bound(var("x"))),
            GraphPattern::edge(var("x"), iri("name"), var("n")),
            GraphPattern::edge(var("y"), iri("name"), var("m")),
        ];
        let graph = PatternJoinGraph::new(&group, &[]);
        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.edge(2, 0).is_some());
        assert_eq!(graph.edges_of(3).count(), 0);
        assert_eq!(graph.edges_of(1).count(), 0);
    }

    #[test]
    fn graph_blocks_join_cheaply() {
        let group = vec![
            GraphPattern::edge(var("g"), iri("owner"), var("x")),
            GraphPattern::Graph {
                name: var("g").into(),
                inner: vec![GraphPattern::edge(var("x"), iri("name"), var("n"))],
            },
        ];
        let graph = PatternJoinGraph::new(&group, &[]);
        let edge = graph.edge(0, 1).unwrap();
        assert_eq!(edge.join_type, JoinType::Graph);
        assert_eq!(edge.shared.len(), 2);
        assert!((edge.cost - 2. / 3.).abs() < f64::EPSILON);
    }

    #[test]
    fn bound_variables_are_not_shared() {
        let group = vec![
            GraphPattern::edge(var("x"), iri("type"), var("c")),
            GraphPattern::edge(var("x"), iri("name"), var("n")),
        ];
        let graph = PatternJoinGraph::new(&group, &[var("x")]);
        assert!(graph.edges.is_empty());
        assert!(graph.to_string().contains("0 pattern"));
    }
}
