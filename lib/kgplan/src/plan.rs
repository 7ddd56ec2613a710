use kgalgebra::algebra::Expression;
use kgalgebra::term::{Term, TriplePattern, Variable};
use std::fmt;

/// An ordered evaluation plan for one group.
///
/// Blocks hold the plans of their nested groups.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct Plan {
    pub nodes: Vec<PlanNode>,
}

/// One scheduled item of a [`Plan`].
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum PlanNode {
    Edge(TriplePattern),
    /// A group evaluated against the named graphs, `name` being an IRI or a variable.
    Graph {
        name: Term,
        inner: Plan,
    },
    Filter(Expression),
    Bind {
        variable: Variable,
        expression: Expression,
    },
    Values {
        variables: Vec<Variable>,
        bindings: Vec<Vec<Option<Term>>>,
    },
    Optional {
        inner: Plan,
        expression: Option<Expression>,
    },
    Union {
        branches: Vec<Plan>,
    },
    /// `variables` are the in-scope variables of the inner group: a solution is only
    /// removed if it shares one of them.
    Minus {
        inner: Plan,
        variables: Vec<Variable>,
    },
}

impl Plan {
    /// The edge patterns of this plan level, in evaluation order.
    pub fn edges(&self) -> impl Iterator<Item = &TriplePattern> {
        self.nodes.iter().filter_map(|node| {
            if let PlanNode::Edge(pattern) = node {
                Some(pattern)
            } else {
                None
            }
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for node in &self.nodes {
            node.fmt_indented(f, depth)?;
        }
        Ok(())
    }
}

impl PlanNode {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = depth * 2;
        match self {
            Self::Edge(pattern) => writeln!(f, "{:indent$}edge {pattern}", ""),
            Self::Graph { name, inner } => {
                writeln!(f, "{:indent$}graph {name}", "")?;
                inner.fmt_indented(f, depth + 1)
            }
            Self::Filter(expression) => writeln!(f, "{:indent$}filter {expression}", ""),
            Self::Bind {
                variable,
                expression,
            } => writeln!(f, "{:indent$}bind {variable} := {expression}", ""),
            Self::Values {
                variables,
                bindings,
            } => {
                write!(f, "{:indent$}values", "")?;
                for variable in variables {
                    write!(f, " {variable}")?;
                }
                writeln!(f, " ({} rows)", bindings.len())
            }
            Self::Optional { inner, expression } => {
                write!(f, "{:indent$}optional", "")?;
                if let Some(expression) = expression {
                    write!(f, " filter {expression}")?;
                }
                writeln!(f)?;
                inner.fmt_indented(f, depth + 1)
            }
            Self::Union { branches } => {
                writeln!(f, "{:indent$}union", "")?;
                for branch in branches {
                    writeln!(f, "{:indent$}  branch", "")?;
                    branch.fmt_indented(f, depth + 2)?;
                }
                Ok(())
            }
            Self::Minus { inner, .. } => {
                writeln!(f, "{:indent$}minus", "")?;
                inner.fmt_indented(f, depth + 1)
            }
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
