#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod aggregate;
mod dataset;
mod error;
mod eval;
mod expression;
mod limits;
mod model;
mod transitive;

pub use crate::aggregate::{
    Accumulator, AvgAccumulator, CountAccumulator, ExtremumAccumulator, GroupConcatAccumulator,
    ListAccumulator, SampleAccumulator, SumAccumulator,
};
pub use crate::dataset::{EdgeAccessor, MutableEdgeAccessor};
pub use crate::error::QueryEvaluationError;
use crate::eval::{SimpleEvaluator, plan_variables};
pub use crate::expression::ExpressionTerm;
pub use crate::limits::EvaluationLimits;
pub use crate::model::{Mapping, Mappings};
pub use crate::transitive::is_transitive;
use kgalgebra::Query;
use kgplan::{Plan, Planner};

/// Evaluates queries and plans against an [`EdgeAccessor`].
///
/// The evaluator holds no state between calls: each call allocates its own solutions.
///
/// ```
/// use kgalgebra::algebra::GraphPattern;
/// use kgalgebra::Query;
/// use kgeval::QueryEvaluator;
/// use kgterm::{Edge, Graph, GraphName, NamedNode, Variable};
///
/// let ex = NamedNode::new("http://example.com")?;
/// let graph = Graph::from_iter([Edge::new(
///     ex.clone(),
///     ex.clone(),
///     ex.clone(),
///     GraphName::DefaultGraph,
/// )]);
/// let s = Variable::new("s")?;
/// let query = Query::new(vec![GraphPattern::edge(s, ex.clone(), ex.clone())]);
/// let solutions = QueryEvaluator::new().execute(&graph, &query)?;
/// assert_eq!(solutions.len(), 1);
/// assert_eq!(solutions[0]["s"], ex.into());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone, Default, Debug)]
pub struct QueryEvaluator {
    without_optimizations: bool,
    limits: EvaluationLimits,
}

impl QueryEvaluator {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates the where group of a query then its solution modifiers.
    pub fn execute<A: EdgeAccessor>(
        &self,
        accessor: &A,
        query: &Query,
    ) -> Result<Mappings, QueryEvaluationError> {
        let plan = self.plan(query);
        let solutions = SimpleEvaluator::new(accessor, !self.without_optimizations, &self.limits)
            .execute(query, &plan)?;
        Ok(Mappings::new(query.result_variables(), solutions))
    }

    /// Evaluates a plan, returning its solutions in depth-first order.
    ///
    /// The selected variables are all the variables the plan may bind.
    pub fn evaluate<A: EdgeAccessor>(
        &self,
        accessor: &A,
        plan: &Plan,
    ) -> Result<Mappings, QueryEvaluationError> {
        let solutions = SimpleEvaluator::new(accessor, !self.without_optimizations, &self.limits)
            .solutions(plan, self.limits.max_result_rows)?;
        Ok(Mappings::new(plan_variables(plan), solutions))
    }

    /// The plan [`execute`](Self::execute) would evaluate for the where group of the query.
    ///
    /// ```
    /// use kgalgebra::algebra::GraphPattern;
    /// use kgalgebra::Query;
    /// use kgeval::QueryEvaluator;
    /// use kgterm::{NamedNode, Variable};
    ///
    /// let (x, c) = (Variable::new("x")?, Variable::new("c")?);
    /// let query = Query::new(vec![
    ///     GraphPattern::edge(c.clone(), NamedNode::new("http://example.com/label")?, Variable::new("l")?),
    ///     GraphPattern::edge(x, NamedNode::new("http://example.com/type")?, c),
    /// ]);
    /// let explanation = QueryEvaluator::new().without_optimizations().plan(&query).to_string();
    /// assert!(explanation.starts_with("edge ?c <http://example.com/label> ?l"));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn plan(&self, query: &Query) -> Plan {
        if self.without_optimizations {
            Planner::declaration_order(&query.pattern)
        } else {
            Planner::build_plan(&query.pattern)
        }
    }

    /// Disables join reordering: groups are evaluated in declaration order.
    #[inline]
    #[must_use]
    pub fn without_optimizations(mut self) -> Self {
        self.without_optimizations = true;
        self
    }

    /// Sets the resource limits of the evaluations.
    #[inline]
    #[must_use]
    pub fn with_limits(mut self, limits: EvaluationLimits) -> Self {
        self.limits = limits;
        self
    }
}
