use crate::aggregate::Aggregate;
use crate::dataset::EdgeAccessor;
use crate::error::QueryEvaluationError;
use crate::expression::{
    ExpressionTerm, Operator, arithmetic, call_function, cmp_terms, equals, partial_cmp,
    unary_minus, unary_plus,
};
use crate::limits::EvaluationLimits;
use crate::model::Mapping;
use crate::transitive::is_transitive;
use kgalgebra::Query;
use kgalgebra::algebra::{Expression, Function, GraphPattern, OrderExpression};
use kgalgebra::term::TriplePattern;
use kgplan::{Plan, PlanNode, Planner};
use kgterm::{Edge, GraphName, Term, Variable};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::time::{Duration, Instant};
use tracing::debug;

/// Receives each solution of a plan, the mapping being restored after the call.
type Emit<'e> = dyn FnMut(&mut Mapping) -> Result<(), QueryEvaluationError> + 'e;

/// Depth-first backtracking evaluation of [`Plan`]s against an accessor.
pub(crate) struct SimpleEvaluator<'a, A: EdgeAccessor> {
    accessor: &'a A,
    optimize: bool,
    limits: &'a EvaluationLimits,
    deadline: Option<Instant>,
}

impl<'a, A: EdgeAccessor> SimpleEvaluator<'a, A> {
    pub(crate) fn new(accessor: &'a A, optimize: bool, limits: &'a EvaluationLimits) -> Self {
        Self {
            accessor,
            optimize,
            limits,
            deadline: limits
                .timeout
                .and_then(|timeout| Instant::now().checked_add(timeout)),
        }
    }

    /// All the solutions of a plan, in depth-first order.
    pub(crate) fn solutions(
        &self,
        plan: &Plan,
        max_rows: Option<usize>,
    ) -> Result<Vec<Mapping>, QueryEvaluationError> {
        let mut solutions = Vec::new();
        self.eval_nodes(&plan.nodes, None, &mut Mapping::new(), &mut |mapping: &mut Mapping| {
            if let Some(max) = max_rows {
                if solutions.len() >= max {
                    return Err(QueryEvaluationError::ResultLimitExceeded(max));
                }
            }
            solutions.push(mapping.clone());
            Ok(())
        })?;
        debug!(solutions = solutions.len(), "evaluated plan");
        Ok(solutions)
    }

    /// Evaluates the solution modifiers of a query over its where group solutions.
    pub(crate) fn execute(&self, query: &Query, plan: &Plan) -> Result<Vec<Mapping>, QueryEvaluationError> {
        let mut solutions = self.solutions(plan, None)?;
        if query.is_grouped() {
            solutions = self.group(query, solutions)?;
        }
        if let Some(having) = &query.having {
            let mut kept = Vec::with_capacity(solutions.len());
            for solution in solutions {
                if self.effective_boolean_value(having, None, &solution)? == Some(true) {
                    kept.push(solution);
                }
            }
            solutions = kept;
        }
        if !query.order_by.is_empty() {
            solutions = self.order(&query.order_by, solutions)?;
        }
        let variables = query.result_variables();
        let mut solutions = solutions
            .into_iter()
            .map(|solution| solution.project(&variables))
            .collect::<Vec<_>>();
        if query.distinct {
            let mut seen = FxHashSet::default();
            solutions.retain(|solution| seen.insert(solution.key(&variables)));
        }
        let solutions = solutions
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect::<Vec<_>>();
        if let Some(max) = self.limits.max_result_rows {
            if solutions.len() > max {
                return Err(QueryEvaluationError::ResultLimitExceeded(max));
            }
        }
        Ok(solutions)
    }

    fn group(&self, query: &Query, solutions: Vec<Mapping>) -> Result<Vec<Mapping>, QueryEvaluationError> {
        let mut indexes = FxHashMap::<Vec<Option<Term>>, usize>::default();
        let mut groups = Vec::<(Vec<Option<Term>>, Vec<Mapping>)>::new();
        if query.group_by.is_empty() {
            // a single group, even without solution
            indexes.insert(Vec::new(), 0);
            groups.push((Vec::new(), Vec::new()));
        }
        for solution in solutions {
            let index = match indexes.entry(solution.key(&query.group_by)) {
                Entry::Occupied(e) => *e.get(),
                Entry::Vacant(e) => {
                    if let Some(max) = self.limits.max_groups {
                        if groups.len() >= max {
                            return Err(QueryEvaluationError::GroupLimitExceeded(max));
                        }
                    }
                    groups.push((e.key().clone(), Vec::new()));
                    *e.insert(groups.len() - 1)
                }
            };
            groups[index].1.push(solution);
        }
        debug!(groups = groups.len(), "grouped solutions");

        let mut aggregates = query
            .aggregates
            .iter()
            .map(|(variable, aggregate)| (variable, Aggregate::new(aggregate)))
            .collect::<Vec<_>>();
        let mut grouped = Vec::with_capacity(groups.len());
        for (key, members) in groups {
            let mut mapping = Mapping::new();
            for (variable, value) in query.group_by.iter().zip(key) {
                if let Some(value) = value {
                    if !mapping.contains(variable) {
                        mapping.bind(variable.clone(), value);
                    }
                }
            }
            for (variable, aggregate) in &mut aggregates {
                aggregate.start();
                for member in &members {
                    aggregate.accumulate(member, |expression, member| {
                        self.eval_expression(expression, None, member)
                    })?;
                }
                if let Some(value) = aggregate.result() {
                    if !mapping.contains(variable) {
                        mapping.bind((*variable).clone(), value);
                    }
                }
            }
            mapping.set_group(members);
            grouped.push(mapping);
        }
        Ok(grouped)
    }

    /// Stable sort on the comparators, unbound and failed values first.
    fn order(
        &self,
        comparators: &[OrderExpression],
        solutions: Vec<Mapping>,
    ) -> Result<Vec<Mapping>, QueryEvaluationError> {
        let mut keyed = Vec::with_capacity(solutions.len());
        for solution in solutions {
            let keys = comparators
                .iter()
                .map(|c| self.eval_expression(c.expression(), None, &solution))
                .collect::<Result<Vec<_>, _>>()?;
            keyed.push((keys, solution));
        }
        keyed.sort_by(|(a, _), (b, _)| {
            for ((a, b), comparator) in a.iter().zip(b).zip(comparators) {
                let ordering = cmp_terms(a.as_ref(), b.as_ref());
                let ordering = match comparator {
                    OrderExpression::Asc(_) => ordering,
                    OrderExpression::Desc(_) => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        Ok(keyed.into_iter().map(|(_, solution)| solution).collect())
    }

    fn check_timeout(&self) -> Result<(), QueryEvaluationError> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(QueryEvaluationError::Timeout(
                    self.limits.timeout.unwrap_or(Duration::ZERO),
                ));
            }
        }
        Ok(())
    }

    /// Matches `nodes` in order from `mapping`, calling `emit` on each solution.
    ///
    /// `graph` is the named graph of the enclosing `GRAPH` block, `None` matching every graph.
    fn eval_nodes(
        &self,
        nodes: &[PlanNode],
        graph: Option<&GraphName>,
        mapping: &mut Mapping,
        emit: &mut Emit<'_>,
    ) -> Result<(), QueryEvaluationError> {
        self.check_timeout()?;
        let Some((node, rest)) = nodes.split_first() else {
            return emit(mapping);
        };
        match node {
            PlanNode::Edge(pattern) => {
                let edges = self.matching_edges(pattern, graph, mapping)?;
                for edge in edges {
                    if graph.is_some() && edge.graph_name.is_default_graph() {
                        return Err(QueryEvaluationError::UnexpectedDefaultGraph);
                    }
                    let len = mapping.len();
                    if unify(pattern, &edge, mapping) {
                        self.eval_nodes(rest, graph, mapping, emit)?;
                    }
                    mapping.retract(len);
                }
                Ok(())
            }
            PlanNode::Graph { name, inner } => {
                let Term::Variable(variable) = name else {
                    let Ok(name) = GraphName::try_from(name.clone()) else {
                        return Ok(());
                    };
                    return self.eval_nodes(&inner.nodes, Some(&name), mapping, &mut |m: &mut Mapping| {
                        self.eval_nodes(rest, graph, m, &mut *emit)
                    });
                };
                if let Some(value) = mapping.get(variable) {
                    let Ok(name) = GraphName::try_from(value.clone()) else {
                        return Ok(());
                    };
                    return self.eval_nodes(&inner.nodes, Some(&name), mapping, &mut |m: &mut Mapping| {
                        self.eval_nodes(rest, graph, m, &mut *emit)
                    });
                }
                for name in self
                    .accessor
                    .named_graphs()
                    .map_err(QueryEvaluationError::dataset)?
                {
                    let Some(value) = name.to_term() else {
                        continue;
                    };
                    let len = mapping.len();
                    mapping.bind(variable.clone(), value);
                    self.eval_nodes(&inner.nodes, Some(&name), mapping, &mut |m: &mut Mapping| {
                        self.eval_nodes(rest, graph, m, &mut *emit)
                    })?;
                    mapping.retract(len);
                }
                Ok(())
            }
            PlanNode::Filter(expression) => {
                if self.effective_boolean_value(expression, graph, mapping)? == Some(true) {
                    self.eval_nodes(rest, graph, mapping, emit)
                } else {
                    Ok(())
                }
            }
            PlanNode::Bind {
                variable,
                expression,
            } => {
                let Some(value) = self.eval_expression(expression, graph, mapping)? else {
                    // an expression error leaves the variable unbound
                    return self.eval_nodes(rest, graph, mapping, emit);
                };
                let value = Term::from(value);
                if let Some(existing) = mapping.get(variable) {
                    return if *existing == value {
                        self.eval_nodes(rest, graph, mapping, emit)
                    } else {
                        Ok(())
                    };
                }
                let len = mapping.len();
                mapping.bind(variable.clone(), value);
                self.eval_nodes(rest, graph, mapping, emit)?;
                mapping.retract(len);
                Ok(())
            }
            PlanNode::Values {
                variables,
                bindings,
            } => {
                'rows: for row in bindings {
                    let len = mapping.len();
                    for (variable, value) in variables.iter().zip(row) {
                        let Some(value) = value else {
                            continue;
                        };
                        match mapping.get(variable) {
                            Some(existing) if existing != value => {
                                mapping.retract(len);
                                continue 'rows;
                            }
                            Some(_) => (),
                            None => mapping.bind(variable.clone(), value.clone()),
                        }
                    }
                    self.eval_nodes(rest, graph, mapping, emit)?;
                    mapping.retract(len);
                }
                Ok(())
            }
            PlanNode::Optional { inner, expression } => {
                let mut found = false;
                self.eval_nodes(&inner.nodes, graph, mapping, &mut |m: &mut Mapping| {
                    if let Some(expression) = expression {
                        if self.effective_boolean_value(expression, graph, m)? != Some(true) {
                            return Ok(());
                        }
                    }
                    found = true;
                    self.eval_nodes(rest, graph, m, &mut *emit)
                })?;
                if found {
                    Ok(())
                } else {
                    self.eval_nodes(rest, graph, mapping, emit)
                }
            }
            PlanNode::Union { branches } => {
                for branch in branches {
                    self.eval_nodes(&branch.nodes, graph, mapping, &mut |m: &mut Mapping| {
                        self.eval_nodes(rest, graph, m, &mut *emit)
                    })?;
                }
                Ok(())
            }
            PlanNode::Minus { inner, variables } => {
                let mut excluded = false;
                if variables.iter().any(|v| mapping.contains(v)) {
                    self.eval_nodes(&inner.nodes, graph, mapping, &mut |_: &mut Mapping| {
                        excluded = true;
                        Ok(())
                    })?;
                }
                if excluded {
                    Ok(())
                } else {
                    self.eval_nodes(rest, graph, mapping, emit)
                }
            }
        }
    }

    /// Fetches the edges matching a pattern with the bound variables substituted.
    fn matching_edges(
        &self,
        pattern: &TriplePattern,
        graph: Option<&GraphName>,
        mapping: &Mapping,
    ) -> Result<Vec<Edge>, QueryEvaluationError> {
        let subject = resolve(&pattern.subject, mapping);
        let predicate = resolve(&pattern.predicate, mapping);
        let object = resolve(&pattern.object, mapping);
        self.accessor
            .edges_for_pattern(subject, predicate, object, graph)
            .collect::<Result<Vec<_>, _>>()
            .map_err(QueryEvaluationError::dataset)
    }

    fn effective_boolean_value(
        &self,
        expression: &Expression,
        graph: Option<&GraphName>,
        mapping: &Mapping,
    ) -> Result<Option<bool>, QueryEvaluationError> {
        Ok(self
            .eval_expression(expression, graph, mapping)?
            .and_then(|value| value.effective_boolean_value()))
    }

    /// Evaluates an expression, `Ok(None)` being an expression error.
    pub(crate) fn eval_expression(
        &self,
        expression: &Expression,
        graph: Option<&GraphName>,
        mapping: &Mapping,
    ) -> Result<Option<ExpressionTerm>, QueryEvaluationError> {
        Ok(match expression {
            Expression::NamedNode(node) => Some(node.clone().into()),
            Expression::Literal(literal) => Some(literal.clone().into()),
            Expression::Variable(variable) => mapping
                .get(variable)
                .and_then(|value| ExpressionTerm::try_from(value.clone()).ok()),
            Expression::Or(a, b) => {
                let a = self.effective_boolean_value(a, graph, mapping)?;
                if a == Some(true) {
                    return Ok(Some(true.into()));
                }
                match (a, self.effective_boolean_value(b, graph, mapping)?) {
                    (_, Some(true)) => Some(true.into()),
                    (Some(false), Some(false)) => Some(false.into()),
                    _ => None,
                }
            }
            Expression::And(a, b) => {
                let a = self.effective_boolean_value(a, graph, mapping)?;
                if a == Some(false) {
                    return Ok(Some(false.into()));
                }
                match (a, self.effective_boolean_value(b, graph, mapping)?) {
                    (_, Some(false)) => Some(false.into()),
                    (Some(true), Some(true)) => Some(true.into()),
                    _ => None,
                }
            }
            Expression::Equal(a, b) => self
                .eval_pair(a, b, graph, mapping)?
                .and_then(|(a, b)| equals(&a, &b))
                .map(Into::into),
            Expression::SameTerm(a, b) => self
                .eval_pair(a, b, graph, mapping)?
                .map(|(a, b)| (a == b).into()),
            Expression::Greater(a, b) => self.compare(a, b, graph, mapping, |o| o == Ordering::Greater)?,
            Expression::GreaterOrEqual(a, b) => {
                self.compare(a, b, graph, mapping, |o| o != Ordering::Less)?
            }
            Expression::Less(a, b) => self.compare(a, b, graph, mapping, |o| o == Ordering::Less)?,
            Expression::LessOrEqual(a, b) => {
                self.compare(a, b, graph, mapping, |o| o != Ordering::Greater)?
            }
            Expression::In(needle, list) => {
                let Some(needle) = self.eval_expression(needle, graph, mapping)? else {
                    return Ok(None);
                };
                let mut error = false;
                for candidate in list {
                    match self
                        .eval_expression(candidate, graph, mapping)?
                        .and_then(|candidate| equals(&needle, &candidate))
                    {
                        Some(true) => return Ok(Some(true.into())),
                        Some(false) => (),
                        None => error = true,
                    }
                }
                (!error).then(|| false.into())
            }
            Expression::Add(a, b) => self.eval_arithmetic(Operator::Add, a, b, graph, mapping)?,
            Expression::Subtract(a, b) => {
                self.eval_arithmetic(Operator::Subtract, a, b, graph, mapping)?
            }
            Expression::Multiply(a, b) => {
                self.eval_arithmetic(Operator::Multiply, a, b, graph, mapping)?
            }
            Expression::Divide(a, b) => {
                self.eval_arithmetic(Operator::Divide, a, b, graph, mapping)?
            }
            Expression::UnaryPlus(e) => self.eval_expression(e, graph, mapping)?.and_then(unary_plus),
            Expression::UnaryMinus(e) => self
                .eval_expression(e, graph, mapping)?
                .and_then(|value| unary_minus(&value)),
            Expression::Not(e) => self
                .effective_boolean_value(e, graph, mapping)?
                .map(|value| (!value).into()),
            Expression::Exists(group) => Some(self.exists(group, graph, mapping)?.into()),
            Expression::Bound(variable) => Some(mapping.contains(variable).into()),
            Expression::If(condition, then, otherwise) => {
                match self.effective_boolean_value(condition, graph, mapping)? {
                    Some(true) => self.eval_expression(then, graph, mapping)?,
                    Some(false) => self.eval_expression(otherwise, graph, mapping)?,
                    None => None,
                }
            }
            Expression::Coalesce(list) => {
                for e in list {
                    if let Some(value) = self.eval_expression(e, graph, mapping)? {
                        return Ok(Some(value));
                    }
                }
                None
            }
            Expression::FunctionCall(Function::IsTransitive, args) => {
                let [subject, predicate, object] = args.as_slice() else {
                    return Ok(None);
                };
                let (Some(subject), Some(predicate), Some(object)) = (
                    self.eval_expression(subject, graph, mapping)?,
                    self.eval_expression(predicate, graph, mapping)?,
                    self.eval_expression(object, graph, mapping)?,
                ) else {
                    return Ok(None);
                };
                Some(
                    is_transitive(
                        self.accessor,
                        &subject.into(),
                        &predicate.into(),
                        &object.into(),
                    )?
                    .into(),
                )
            }
            Expression::FunctionCall(function, args) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    let Some(value) = self.eval_expression(arg, graph, mapping)? else {
                        return Ok(None);
                    };
                    values.push(value);
                }
                call_function(*function, values)
            }
        })
    }

    fn eval_pair(
        &self,
        a: &Expression,
        b: &Expression,
        graph: Option<&GraphName>,
        mapping: &Mapping,
    ) -> Result<Option<(ExpressionTerm, ExpressionTerm)>, QueryEvaluationError> {
        let Some(a) = self.eval_expression(a, graph, mapping)? else {
            return Ok(None);
        };
        Ok(self.eval_expression(b, graph, mapping)?.map(|b| (a, b)))
    }

    fn eval_arithmetic(
        &self,
        operator: Operator,
        a: &Expression,
        b: &Expression,
        graph: Option<&GraphName>,
        mapping: &Mapping,
    ) -> Result<Option<ExpressionTerm>, QueryEvaluationError> {
        Ok(self
            .eval_pair(a, b, graph, mapping)?
            .and_then(|(a, b)| arithmetic(operator, &a, &b)))
    }

    fn compare(
        &self,
        a: &Expression,
        b: &Expression,
        graph: Option<&GraphName>,
        mapping: &Mapping,
        test: impl FnOnce(Ordering) -> bool,
    ) -> Result<Option<ExpressionTerm>, QueryEvaluationError> {
        Ok(self
            .eval_pair(a, b, graph, mapping)?
            .and_then(|(a, b)| partial_cmp(&a, &b))
            .map(|ordering| test(ordering).into()))
    }

    /// `EXISTS`: the group is planned with the bindings of the current solution.
    fn exists(
        &self,
        group: &[GraphPattern],
        graph: Option<&GraphName>,
        mapping: &Mapping,
    ) -> Result<bool, QueryEvaluationError> {
        let plan = if self.optimize {
            let bound = mapping.variables().cloned().collect::<Vec<_>>();
            Planner::build_plan_with_bound(group, &bound)
        } else {
            Planner::declaration_order(group)
        };
        let mut found = false;
        self.eval_nodes(&plan.nodes, graph, &mut mapping.clone(), &mut |_: &mut Mapping| {
            found = true;
            Ok(())
        })?;
        Ok(found)
    }
}

/// The value of a pattern position: its bound value, `None` for an unbound variable.
fn resolve<'b>(term: &'b Term, mapping: &'b Mapping) -> Option<&'b Term> {
    match term {
        Term::Variable(variable) => mapping.get(variable),
        term => Some(term),
    }
}

/// Binds the variables of `pattern` to the terms of `edge`.
///
/// Returns `false` if a variable is already bound to another term, the mapping must then be
/// retracted by the caller.
fn unify(pattern: &TriplePattern, edge: &Edge, mapping: &mut Mapping) -> bool {
    for (term, value) in [
        (&pattern.subject, &edge.subject),
        (&pattern.predicate, &edge.predicate),
        (&pattern.object, &edge.object),
    ] {
        match term {
            Term::Variable(variable) => match mapping.get(variable) {
                Some(bound) => {
                    if bound != value {
                        return false;
                    }
                }
                None => mapping.bind(variable.clone(), value.clone()),
            },
            constant => {
                if constant != value {
                    return false;
                }
            }
        }
    }
    true
}

/// The variables a plan may bind, in first occurrence order.
pub(crate) fn plan_variables(plan: &Plan) -> Vec<Variable> {
    fn add(variables: &mut Vec<Variable>, variable: &Variable) {
        if !variables.contains(variable) {
            variables.push(variable.clone());
        }
    }

    fn visit(plan: &Plan, variables: &mut Vec<Variable>) {
        for node in &plan.nodes {
            match node {
                PlanNode::Edge(pattern) => {
                    for variable in pattern.variables() {
                        add(variables, variable);
                    }
                }
                PlanNode::Graph { name, inner } => {
                    if let Some(variable) = name.as_variable() {
                        add(variables, variable);
                    }
                    visit(inner, variables);
                }
                PlanNode::Bind { variable, .. } => add(variables, variable),
                PlanNode::Values { variables: v, .. } => {
                    for variable in v {
                        add(variables, variable);
                    }
                }
                PlanNode::Optional { inner, .. } => visit(inner, variables),
                PlanNode::Union { branches } => {
                    for branch in branches {
                        visit(branch, variables);
                    }
                }
                PlanNode::Filter(_) | PlanNode::Minus { .. } => {}
            }
        }
    }

    let mut variables = Vec::new();
    visit(plan, &mut variables);
    variables
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgterm::{Graph, Literal, NamedNode};

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    #[test]
    fn repeated_variable_unification() {
        let pattern = TriplePattern::new(var("x"), ex("p"), var("x"));
        let mut mapping = Mapping::new();
        let self_loop = Edge::new(ex("a"), ex("p"), ex("a"), GraphName::DefaultGraph);
        assert!(unify(&pattern, &self_loop, &mut mapping));
        assert_eq!(mapping.len(), 1);
        let mut mapping = Mapping::new();
        let other = Edge::new(ex("a"), ex("p"), ex("b"), GraphName::DefaultGraph);
        assert!(!unify(&pattern, &other, &mut mapping));
    }

    #[test]
    fn filter_errors_discard_the_branch() -> Result<(), QueryEvaluationError> {
        let graph = [
            Edge::new(ex("a"), ex("v"), Literal::from(2), GraphName::DefaultGraph),
            Edge::new(ex("b"), ex("v"), Literal::from("x"), GraphName::DefaultGraph),
        ]
        .into_iter()
        .collect::<Graph>();
        let plan = Planner::build_plan(&[
            GraphPattern::edge(var("s"), ex("v"), var("o")),
            GraphPattern::filter(Expression::greater(var("o"), Literal::from(1))),
        ]);
        let limits = EvaluationLimits::default();
        let solutions = SimpleEvaluator::new(&graph, true, &limits).solutions(&plan, None)?;
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0]["s"], ex("a").into());
        Ok(())
    }

    #[test]
    fn plan_variables_skip_minus() {
        let plan = Planner::declaration_order(&[
            GraphPattern::edge(var("s"), ex("p"), var("o")),
            GraphPattern::Minus {
                inner: vec![GraphPattern::edge(var("s"), ex("q"), var("m"))],
            },
            GraphPattern::Bind {
                variable: var("b"),
                expression: var("o").into(),
            },
        ]);
        assert_eq!(plan_variables(&plan), [var("s"), var("o"), var("b")]);
    }
}
