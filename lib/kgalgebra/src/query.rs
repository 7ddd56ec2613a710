use crate::algebra::*;
use crate::term::*;
use std::fmt;

/// A `SELECT` query: a where group followed by the solution modifiers.
///
/// The modifiers are applied in this order: grouping and aggregation, `HAVING`,
/// `ORDER BY`, projection, `DISTINCT`, `OFFSET` and `LIMIT`.
///
/// ```
/// use kgalgebra::algebra::{AggregateExpression, AggregateFunction, GraphPattern};
/// use kgalgebra::Query;
/// use kgterm::{NamedNode, Variable};
///
/// let s = Variable::new("s")?;
/// let age = Variable::new("age")?;
/// let avg = Variable::new("avg")?;
/// let query = Query::new(vec![GraphPattern::edge(
///     s.clone(),
///     NamedNode::new("http://example.com/age")?,
///     age.clone(),
/// )])
/// .with_aggregate(avg.clone(), AggregateExpression::call(AggregateFunction::Avg, age))
/// .with_projection([avg]);
/// assert_eq!(
///     query.to_string(),
///     "SELECT (AVG(?age) AS ?avg) WHERE { ?s <http://example.com/age> ?age . }"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct Query {
    /// The where group.
    pub pattern: Vec<GraphPattern>,
    /// The selected variables, `None` selecting every in-scope variable.
    pub projection: Option<Vec<Variable>>,
    pub group_by: Vec<Variable>,
    pub aggregates: Vec<(Variable, AggregateExpression)>,
    pub having: Option<Expression>,
    pub order_by: Vec<OrderExpression>,
    pub distinct: bool,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(pattern: Vec<GraphPattern>) -> Self {
        Self {
            pattern,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_projection(mut self, variables: impl IntoIterator<Item = Variable>) -> Self {
        self.projection = Some(variables.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_group_by(mut self, variables: impl IntoIterator<Item = Variable>) -> Self {
        self.group_by = variables.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_aggregate(mut self, target: Variable, aggregate: AggregateExpression) -> Self {
        self.aggregates.push((target, aggregate));
        self
    }

    #[must_use]
    pub fn with_having(mut self, expression: Expression) -> Self {
        self.having = Some(expression);
        self
    }

    #[must_use]
    pub fn with_order_by(mut self, comparator: OrderExpression) -> Self {
        self.order_by.push(comparator);
        self
    }

    #[must_use]
    pub fn with_distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether the solutions are grouped, either explicitly or because of an aggregate.
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty() || !self.aggregates.is_empty()
    }

    /// The variables of the result, in order.
    ///
    /// Without an explicit projection, a grouped query returns its group keys then its
    /// aggregates and any other query returns the in-scope variables of its where group.
    pub fn result_variables(&self) -> Vec<Variable> {
        if let Some(projection) = &self.projection {
            return projection.clone();
        }
        if self.is_grouped() {
            return self
                .group_by
                .iter()
                .chain(self.aggregates.iter().map(|(v, _)| v))
                .cloned()
                .collect();
        }
        group_variables(&self.pattern)
            .into_iter()
            .cloned()
            .collect()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT")?;
        if self.distinct {
            f.write_str(" DISTINCT")?;
        }
        if let Some(projection) = &self.projection {
            for variable in projection {
                if let Some((_, aggregate)) = self.aggregates.iter().find(|(v, _)| v == variable)
                {
                    write!(f, " ({aggregate} AS {variable})")?;
                } else {
                    write!(f, " {variable}")?;
                }
            }
        } else if self.is_grouped() {
            for variable in &self.group_by {
                write!(f, " {variable}")?;
            }
            for (variable, aggregate) in &self.aggregates {
                write!(f, " ({aggregate} AS {variable})")?;
            }
        } else {
            f.write_str(" *")?;
        }
        write!(f, " WHERE {}", GroupDisplay(&self.pattern))?;
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY")?;
            for variable in &self.group_by {
                write!(f, " {variable}")?;
            }
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING({having})")?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY")?;
            for comparator in &self.order_by {
                write!(f, " {comparator}")?;
            }
        }
        if self.offset > 0 {
            write!(f, " OFFSET {}", self.offset)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        Ok(())
    }
}
