use crate::pjg::PatternJoinGraph;
use crate::plan::{Plan, PlanNode};
use kgalgebra::algebra::{GraphPattern, group_variables};
use kgalgebra::term::Variable;
use rustc_hash::FxHashSet;
use tracing::debug;

/// Builds evaluation [`Plan`]s from groups.
///
/// Planning is deterministic: the same group always gives the same plan.
pub struct Planner;

impl Planner {
    /// Orders a group with the pattern join graph cost model.
    pub fn build_plan(group: &[GraphPattern]) -> Plan {
        Self::build_plan_with_bound(group, &[])
    }

    /// Orders a group evaluated when the `bound` variables already have a value.
    pub fn build_plan_with_bound(group: &[GraphPattern], bound: &[Variable]) -> Plan {
        let plan = CostPlanner::new(group, bound, Strategy::Cost).plan();
        debug!(items = group.len(), "built plan:\n{plan}");
        plan
    }

    /// Keeps the declaration order of patterns, nested groups included.
    ///
    /// Filters, binds and nested blocks still wait until the variables they read are bound.
    pub fn declaration_order(group: &[GraphPattern]) -> Plan {
        Self::declaration_order_with_bound(group, &[])
    }

    fn declaration_order_with_bound(group: &[GraphPattern], bound: &[Variable]) -> Plan {
        CostPlanner::new(group, bound, Strategy::Declaration).plan()
    }

    /// The pattern join graph of a group, for inspection.
    pub fn join_graph<'a>(group: &'a [GraphPattern], bound: &[Variable]) -> PatternJoinGraph<'a> {
        PatternJoinGraph::new(group, bound)
    }
}

/// Converts a group item into a plan node, planning its nested groups with `plan_inner`.
fn to_plan_node(
    pattern: &GraphPattern,
    mut plan_inner: impl FnMut(&[GraphPattern], &[Variable]) -> Plan,
    bound: &[Variable],
) -> PlanNode {
    match pattern {
        GraphPattern::Edge(pattern) => PlanNode::Edge(pattern.clone()),
        GraphPattern::Graph { name, inner } => PlanNode::Graph {
            name: name.clone(),
            inner: {
                // the graph name is bound before the inner group is matched
                let mut bound = bound.to_vec();
                if let Some(v) = name.as_variable() {
                    bound.push(v.clone());
                }
                plan_inner(inner, &bound)
            },
        },
        GraphPattern::Filter { expr } => PlanNode::Filter(expr.clone()),
        GraphPattern::Bind {
            variable,
            expression,
        } => PlanNode::Bind {
            variable: variable.clone(),
            expression: expression.clone(),
        },
        GraphPattern::Values {
            variables,
            bindings,
        } => PlanNode::Values {
            variables: variables.clone(),
            bindings: bindings.clone(),
        },
        GraphPattern::Optional { inner, expression } => PlanNode::Optional {
            inner: plan_inner(inner, bound),
            expression: expression.clone(),
        },
        GraphPattern::Union { branches } => PlanNode::Union {
            branches: branches
                .iter()
                .map(|branch| plan_inner(branch, bound))
                .collect(),
        },
        GraphPattern::Minus { inner } => PlanNode::Minus {
            inner: plan_inner(inner, bound),
            variables: group_variables(inner).into_iter().cloned().collect(),
        },
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// Cheapest join edge first.
    Cost,
    /// Evaluable patterns in the order they are declared.
    Declaration,
}

struct CostPlanner<'a> {
    strategy: Strategy,
    group: &'a [GraphPattern],
    graph: PatternJoinGraph<'a>,
    /// Variables a block waits for before being scheduled.
    required: Vec<Vec<&'a Variable>>,
    bound: FxHashSet<&'a Variable>,
    outer: Vec<Variable>,
    placed: Vec<bool>,
    nodes: Vec<PlanNode>,
}

impl<'a> CostPlanner<'a> {
    fn new(group: &'a [GraphPattern], outer: &[Variable], strategy: Strategy) -> Self {
        let graph = PatternJoinGraph::new(group, outer);
        let required = (0..group.len())
            .map(|i| required_variables(group, i, &graph))
            .collect();
        Self {
            strategy,
            group,
            graph,
            required,
            bound: FxHashSet::default(),
            outer: outer.to_vec(),
            placed: vec![false; group.len()],
            nodes: Vec::with_capacity(group.len()),
        }
    }

    fn plan(mut self) -> Plan {
        self.place_ready_blocks();
        while let Some(next) = self.next_evaluable() {
            self.place(next.0);
            if let Some(second) = next.1 {
                self.place(second);
            }
        }
        // blocks whose variables are never bound
        for i in 0..self.group.len() {
            if !self.placed[i] {
                self.place(i);
            }
        }
        Plan { nodes: self.nodes }
    }

    /// Picks the next evaluable node, with the other end of the seed edge when a new
    /// connected component is started.
    fn next_evaluable(&self) -> Option<(usize, Option<usize>)> {
        let remaining = (0..self.group.len())
            .filter(|i| !self.placed[*i] && self.graph.nodes[*i].is_evaluable())
            .collect::<Vec<_>>();
        if remaining.is_empty() {
            return None;
        }
        if self.strategy == Strategy::Declaration {
            return Some((remaining[0], None));
        }
        // Fully bound patterns only check the current solution
        if let Some(i) = remaining
            .iter()
            .find(|i| self.graph.nodes[**i].variables.iter().all(|v| self.bound.contains(v)))
        {
            return Some((*i, None));
        }
        // Cheapest join with the already scheduled nodes
        let mut best: Option<(f64, usize)> = None;
        for i in &remaining {
            for edge in self.graph.edges_of(*i) {
                if !self.placed[edge.opposite(*i)] {
                    continue;
                }
                if best.is_none_or(|(cost, index)| {
                    edge.cost.total_cmp(&cost).then(i.cmp(&index)).is_lt()
                }) {
                    best = Some((edge.cost, *i));
                }
            }
        }
        if let Some((_, i)) = best {
            return Some((i, None));
        }
        // Seed of a new connected component: the cheapest edge between unscheduled nodes
        let seed = self
            .graph
            .edges
            .iter()
            .filter(|e| !self.placed[e.left] && !self.placed[e.right])
            .min_by(|a, b| {
                a.cost
                    .total_cmp(&b.cost)
                    .then(a.left.cmp(&b.left))
                    .then(a.right.cmp(&b.right))
            });
        if let Some(seed) = seed {
            return Some((seed.left, Some(seed.right)));
        }
        // Cartesian product in declaration order
        remaining.first().map(|i| (*i, None))
    }

    fn place(&mut self, index: usize) {
        let outer = self
            .outer
            .iter()
            .chain(self.bound.iter().copied())
            .cloned()
            .collect::<Vec<_>>();
        let strategy = self.strategy;
        let node = to_plan_node(
            &self.group[index],
            |inner, bound| match strategy {
                Strategy::Cost => Planner::build_plan_with_bound(inner, bound),
                Strategy::Declaration => Planner::declaration_order_with_bound(inner, bound),
            },
            &outer,
        );
        self.nodes.push(node);
        self.placed[index] = true;
        self.bound.extend(self.graph.nodes[index].variables.iter().copied());
        self.place_ready_blocks();
    }

    fn place_ready_blocks(&mut self) {
        while let Some(i) = (0..self.group.len()).find(|i| {
            !self.placed[*i]
                && !self.graph.nodes[*i].is_evaluable()
                && self.required[*i].iter().all(|v| self.bound.contains(v))
        }) {
            self.place(i);
        }
    }
}

/// The variables a block needs bound before it is scheduled: the ones it reads that some
/// other item of the group may bind.
fn required_variables<'a>(
    group: &'a [GraphPattern],
    index: usize,
    graph: &PatternJoinGraph<'a>,
) -> Vec<&'a Variable> {
    let mut read = Vec::new();
    match &group[index] {
        GraphPattern::Edge(_) | GraphPattern::Graph { .. } | GraphPattern::Values { .. } => {
            return read;
        }
        GraphPattern::Filter { expr } => read = expr.used_variables(),
        GraphPattern::Bind { expression, .. } => read = expression.used_variables(),
        GraphPattern::Optional { inner, expression } => {
            read = group_variables(inner);
            if let Some(expression) = expression {
                read.extend(expression.used_variables());
            }
        }
        GraphPattern::Union { branches } => {
            read = branches.iter().flat_map(|b| group_variables(b)).collect();
        }
        GraphPattern::Minus { inner } => read = group_variables(inner),
    }
    let mut required = Vec::new();
    for v in read {
        let bindable = graph
            .nodes
            .iter()
            .any(|node| node.index != index && node.variables.contains(&v));
        if bindable && !required.contains(&v) {
            required.push(v);
        }
    }
    required
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
    fn ground_patterns_come_first() {
        let group = vec![
            GraphPattern::edge(var("x"), iri("p"), var("y")),
            GraphPattern::edge(iri("a"), iri("p"), iri("b")),
        ];
        let plan = Planner::build_plan(&group);
        assert_eq!(plan.nodes[0], PlanNode::Edge(match &group[1] {
            GraphPattern::Edge(p) => p.clone(),
            _ => unreachable!(),
        }));
    }

    #[test]
    fn filter_waits_for_its_variables() {
        let group = vec![
            GraphPattern::filter(Expression::Bound(var("n"))),
            GraphPattern::edge(var("x"), iri("type"), var("c")),
            GraphPattern::edge(var("x"), iri("name"), var("n")),
        ];
        let plan = Planner::build_plan(&group);
        assert!(matches!(plan.nodes[2], PlanNode::Filter(_)));
    }

    #[test]
    fn unbindable_filter_variables_are_ignored() {
        let group = vec![
            GraphPattern::edge(var("x"), iri("type"), var("c")),
            GraphPattern::filter(Expression::Bound(var("unknown"))),
        ];
        let plan = Planner::build_plan(&group);
        assert!(matches!(plan.nodes[0], PlanNode::Filter(_)));
    }

    #[test]
    fn outer_bindings_make_patterns_ground() {
        let group = vec![
            GraphPattern::edge(var("y"), iri("p"), var("z")),
            GraphPattern::edge(var("x"), iri("p"), iri("b")),
        ];
        let plan = Planner::build_plan_with_bound(&group, &[var("x")]);
        assert_eq!(plan.edges().next().map(|p| p.object.clone()), Some(iri("b").into()));
    }

    #[test]
    fn declaration_order_keeps_patterns_and_defers_blocks() {
        let group = vec![
            GraphPattern::edge(var("y"), iri("knows"), var("z")),
            GraphPattern::filter(Expression::Bound(var("x"))),
            GraphPattern::edge(var("x"), iri("knows"), var("y")),
            GraphPattern::edge(iri("a"), iri("p"), iri("b")),
        ];
        let plan = Planner::declaration_order(&group);
        let objects = plan.edges().map(|p| p.object.clone()).collect::<Vec<_>>();
        assert_eq!(objects, [var("z").into(), var("y").into(), iri("b").into()]);
        assert!(matches!(plan.nodes[2], PlanNode::Filter(_)));

        let nested = vec![GraphPattern::optional(group.clone())];
        let plan = Planner::declaration_order(&nested);
        let PlanNode::Optional { inner, .. } = &plan.nodes[0] else {
            panic!("expected an optional block");
        };
        assert!(matches!(inner.nodes[2], PlanNode::Filter(_)));
    }
}
