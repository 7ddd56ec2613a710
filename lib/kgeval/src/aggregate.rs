//! Set functions reducing the members of a group to one value.

use crate::error::QueryEvaluationError;
use crate::expression::{ExpressionTerm, Operator, arithmetic, cmp_terms, plain_literal, to_str};
use crate::model::Mapping;
use kgalgebra::algebra::{AggregateExpression, AggregateFunction, Expression};
use kgterm::vocab::dt;
use kgterm::{Literal, Term, Variable};
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::fmt::Write;

/// The state of one set function.
///
/// An accumulator is reused across the groups of a query: [`start`](Self::start) resets it,
/// then [`accumulate`](Self::accumulate) is called once per group member and
/// [`result`](Self::result) gives the value of the group.
///
/// ```
/// use kgeval::{Accumulator, ExpressionTerm, SumAccumulator};
///
/// let mut sum = SumAccumulator::default();
/// sum.start();
/// for value in [3, 5, 7] {
///     sum.accumulate(Some(ExpressionTerm::IntegerLiteral(value.into())));
/// }
/// assert_eq!(sum.result(), Some(ExpressionTerm::IntegerLiteral(15.into())));
/// ```
pub trait Accumulator {
    /// Forgets every accumulated value.
    fn start(&mut self);

    /// Folds one value, `None` if the aggregated expression failed on the member.
    fn accumulate(&mut self, value: Option<ExpressionTerm>);

    /// The aggregated value, `None` on error.
    fn result(&self) -> Option<ExpressionTerm>;
}

/// `COUNT(expr)`: the number of members the expression has a value for.
#[derive(Default, Debug)]
pub struct CountAccumulator {
    count: i64,
}

impl Accumulator for CountAccumulator {
    fn start(&mut self) {
        self.count = 0;
    }

    fn accumulate(&mut self, value: Option<ExpressionTerm>) {
        if value.is_some() {
            self.count += 1;
        }
    }

    fn result(&self) -> Option<ExpressionTerm> {
        Some(ExpressionTerm::IntegerLiteral(self.count.into()))
    }
}

/// `SUM(expr)`: fails on any non-numeric value, has no value if nothing was accepted.
#[derive(Debug)]
pub struct SumAccumulator {
    sum: Option<ExpressionTerm>,
    count: i64,
}

impl Default for SumAccumulator {
    fn default() -> Self {
        Self {
            sum: Some(ExpressionTerm::IntegerLiteral(0.into())),
            count: 0,
        }
    }
}

impl SumAccumulator {
    /// The running total, even if nothing was accepted yet.
    fn total(&self) -> Option<&ExpressionTerm> {
        self.sum.as_ref()
    }
}

impl Accumulator for SumAccumulator {
    fn start(&mut self) {
        *self = Self::default();
    }

    fn accumulate(&mut self, value: Option<ExpressionTerm>) {
        let (Some(sum), Some(value)) = (&self.sum, value) else {
            self.sum = None;
            return;
        };
        self.sum = arithmetic(Operator::Add, sum, &value);
        self.count += 1;
    }

    fn result(&self) -> Option<ExpressionTerm> {
        if self.count == 0 {
            return None;
        }
        self.sum.clone()
    }
}

/// `AVG(expr)`: zero over no member, integers average to a decimal.
#[derive(Default, Debug)]
pub struct AvgAccumulator {
    sum: SumAccumulator,
    count: i64,
}

impl Accumulator for AvgAccumulator {
    fn start(&mut self) {
        self.sum.start();
        self.count = 0;
    }

    fn accumulate(&mut self, value: Option<ExpressionTerm>) {
        self.sum.accumulate(value);
        self.count += 1;
    }

    fn result(&self) -> Option<ExpressionTerm> {
        let sum = self.sum.total()?;
        if self.count == 0 {
            return Some(ExpressionTerm::IntegerLiteral(0.into()));
        }
        let count = ExpressionTerm::IntegerLiteral(self.count.into());
        arithmetic(Operator::Divide, sum, &count)
    }
}

/// `MIN(expr)` and `MAX(expr)` in the value ordering used by `ORDER BY`.
#[derive(Debug)]
#[allow(clippy::option_option)]
pub struct ExtremumAccumulator {
    keep: Ordering,
    /// `Some(None)` once a failed member was seen.
    extremum: Option<Option<ExpressionTerm>>,
}

impl ExtremumAccumulator {
    pub fn min() -> Self {
        Self {
            keep: Ordering::Less,
            extremum: None,
        }
    }

    pub fn max() -> Self {
        Self {
            keep: Ordering::Greater,
            extremum: None,
        }
    }
}

impl Accumulator for ExtremumAccumulator {
    fn start(&mut self) {
        self.extremum = None;
    }

    fn accumulate(&mut self, value: Option<ExpressionTerm>) {
        let Some(value) = value else {
            self.extremum = Some(None);
            return;
        };
        match &self.extremum {
            Some(None) => (),
            Some(Some(current)) => {
                if cmp_terms(Some(&value), Some(current)) == self.keep {
                    self.extremum = Some(Some(value));
                }
            }
            None => self.extremum = Some(Some(value)),
        }
    }

    fn result(&self) -> Option<ExpressionTerm> {
        self.extremum.clone().flatten()
    }
}

/// `SAMPLE(expr)`: the first value found.
#[derive(Default, Debug)]
pub struct SampleAccumulator {
    value: Option<ExpressionTerm>,
}

impl Accumulator for SampleAccumulator {
    fn start(&mut self) {
        self.value = None;
    }

    fn accumulate(&mut self, value: Option<ExpressionTerm>) {
        if self.value.is_none() {
            self.value = value;
        }
    }

    fn result(&self) -> Option<ExpressionTerm> {
        self.value.clone()
    }
}

/// `GROUP_CONCAT(expr; SEPARATOR = sep)` over the string values of the members.
///
/// The language tag is kept if all values share it, a blank node fails the group.
#[derive(Debug)]
#[allow(clippy::option_option)]
pub struct GroupConcatAccumulator {
    concat: Option<String>,
    language: Option<Option<String>>,
    separator: String,
}

impl GroupConcatAccumulator {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            concat: Some(String::new()),
            language: None,
            separator: separator.into(),
        }
    }
}

impl Default for GroupConcatAccumulator {
    fn default() -> Self {
        Self::new(" ")
    }
}

impl Accumulator for GroupConcatAccumulator {
    fn start(&mut self) {
        self.concat = Some(String::new());
        self.language = None;
    }

    fn accumulate(&mut self, value: Option<ExpressionTerm>) {
        let Some(concat) = self.concat.as_mut() else {
            return;
        };
        let Some((value, language)) = value.and_then(to_str) else {
            self.concat = None;
            return;
        };
        if let Some(lang) = &self.language {
            if *lang != language {
                self.language = Some(None)
            }
            concat.push_str(&self.separator);
        } else {
            self.language = Some(language)
        }
        concat.push_str(&value);
    }

    fn result(&self) -> Option<ExpressionTerm> {
        self.concat
            .clone()
            .map(|result| plain_literal(result, self.language.clone().flatten()))
    }
}

/// `LIST(expr)`: the values in member order, as one composite literal.
///
/// Members without a value are skipped.
#[derive(Default, Debug)]
pub struct ListAccumulator {
    values: Vec<ExpressionTerm>,
}

impl Accumulator for ListAccumulator {
    fn start(&mut self) {
        self.values.clear();
    }

    fn accumulate(&mut self, value: Option<ExpressionTerm>) {
        if let Some(value) = value {
            self.values.push(value);
        }
    }

    fn result(&self) -> Option<ExpressionTerm> {
        let mut lexical = String::from("(");
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                lexical.push(' ');
            }
            write!(lexical, "{}", Term::from(value.clone())).ok()?;
        }
        lexical.push(')');
        Some(Literal::new_typed_literal(lexical, dt::LIST).into())
    }
}

fn accumulator(function: &AggregateFunction) -> Box<dyn Accumulator> {
    match function {
        AggregateFunction::Count => Box::new(CountAccumulator::default()),
        AggregateFunction::Sum => Box::new(SumAccumulator::default()),
        AggregateFunction::Avg => Box::new(AvgAccumulator::default()),
        AggregateFunction::Min => Box::new(ExtremumAccumulator::min()),
        AggregateFunction::Max => Box::new(ExtremumAccumulator::max()),
        AggregateFunction::Sample => Box::new(SampleAccumulator::default()),
        AggregateFunction::GroupConcat { separator } => Box::new(GroupConcatAccumulator::new(
            separator.as_deref().unwrap_or(" "),
        )),
        AggregateFunction::List => Box::new(ListAccumulator::default()),
    }
}

/// One aggregate of a grouped query, handling `DISTINCT` in front of its accumulator.
pub(crate) enum Aggregate {
    CountSolutions {
        seen: Option<FxHashSet<Vec<(Variable, Term)>>>,
        count: i64,
    },
    Expression {
        expression: Expression,
        seen: Option<FxHashSet<ExpressionTerm>>,
        accumulator: Box<dyn Accumulator>,
    },
}

impl Aggregate {
    pub(crate) fn new(aggregate: &AggregateExpression) -> Self {
        match aggregate {
            AggregateExpression::CountSolutions { distinct } => Self::CountSolutions {
                seen: distinct.then(FxHashSet::default),
                count: 0,
            },
            AggregateExpression::FunctionCall {
                name,
                expr,
                distinct,
            } => Self::Expression {
                expression: expr.clone(),
                seen: distinct.then(FxHashSet::default),
                accumulator: accumulator(name),
            },
        }
    }

    pub(crate) fn start(&mut self) {
        match self {
            Self::CountSolutions { seen, count } => {
                if let Some(seen) = seen {
                    seen.clear();
                }
                *count = 0;
            }
            Self::Expression {
                seen, accumulator, ..
            } => {
                if let Some(seen) = seen {
                    seen.clear();
                }
                accumulator.start();
            }
        }
    }

    /// Folds one group member, `evaluate` computing the aggregated expression.
    pub(crate) fn accumulate(
        &mut self,
        member: &Mapping,
        evaluate: impl FnOnce(&Expression, &Mapping) -> Result<Option<ExpressionTerm>, QueryEvaluationError>,
    ) -> Result<(), QueryEvaluationError> {
        match self {
            Self::CountSolutions { seen, count } => {
                if let Some(seen) = seen {
                    let mut key = member
                        .iter()
                        .map(|(v, t)| (v.clone(), t.clone()))
                        .collect::<Vec<_>>();
                    key.sort();
                    if !seen.insert(key) {
                        return Ok(());
                    }
                }
                *count += 1;
            }
            Self::Expression {
                expression,
                seen,
                accumulator,
            } => {
                let value = evaluate(expression, member)?;
                if let (Some(seen), Some(value)) = (seen, &value) {
                    if !seen.insert(value.clone()) {
                        return Ok(());
                    }
                }
                accumulator.accumulate(value);
            }
        }
        Ok(())
    }

    pub(crate) fn result(&self) -> Option<Term> {
        match self {
            Self::CountSolutions { count, .. } => {
                Some(ExpressionTerm::IntegerLiteral((*count).into()).into())
            }
            Self::Expression { accumulator, .. } => accumulator.result().map(Into::into),
        }
    }
}
