//! The group, expression and aggregate algebra.

use crate::term::*;
use std::fmt;

/// An [expression](https://www.w3.org/TR/sparql11-query/#expressions).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Expression {
    NamedNode(NamedNode),
    Literal(Literal),
    Variable(Variable),
    /// [Logical-or](https://www.w3.org/TR/sparql11-query/#func-logical-or).
    Or(Box<Self>, Box<Self>),
    /// [Logical-and](https://www.w3.org/TR/sparql11-query/#func-logical-and).
    And(Box<Self>, Box<Self>),
    /// [RDFterm-equal](https://www.w3.org/TR/sparql11-query/#func-RDFterm-equal) and the numeric equalities.
    Equal(Box<Self>, Box<Self>),
    /// [sameTerm](https://www.w3.org/TR/sparql11-query/#func-sameTerm).
    SameTerm(Box<Self>, Box<Self>),
    Greater(Box<Self>, Box<Self>),
    GreaterOrEqual(Box<Self>, Box<Self>),
    Less(Box<Self>, Box<Self>),
    LessOrEqual(Box<Self>, Box<Self>),
    /// [IN](https://www.w3.org/TR/sparql11-query/#func-in)
    In(Box<Self>, Vec<Self>),
    Add(Box<Self>, Box<Self>),
    Subtract(Box<Self>, Box<Self>),
    Multiply(Box<Self>, Box<Self>),
    Divide(Box<Self>, Box<Self>),
    UnaryPlus(Box<Self>),
    UnaryMinus(Box<Self>),
    /// [fn:not](https://www.w3.org/TR/xpath-functions/#func-not).
    Not(Box<Self>),
    /// [EXISTS](https://www.w3.org/TR/sparql11-query/#func-filter-exists) over a group.
    Exists(Vec<GraphPattern>),
    /// [BOUND](https://www.w3.org/TR/sparql11-query/#func-bound).
    Bound(Variable),
    /// [IF](https://www.w3.org/TR/sparql11-query/#func-if).
    If(Box<Self>, Box<Self>, Box<Self>),
    /// [COALESCE](https://www.w3.org/TR/sparql11-query/#func-coalesce).
    Coalesce(Vec<Self>),
    /// A regular function call.
    FunctionCall(Function, Vec<Self>),
}

impl Expression {
    pub fn and(left: impl Into<Self>, right: impl Into<Self>) -> Self {
        Self::And(Box::new(left.into()), Box::new(right.into()))
    }

    pub fn equal(left: impl Into<Self>, right: impl Into<Self>) -> Self {
        Self::Equal(Box::new(left.into()), Box::new(right.into()))
    }

    pub fn greater(left: impl Into<Self>, right: impl Into<Self>) -> Self {
        Self::Greater(Box::new(left.into()), Box::new(right.into()))
    }

    pub fn less(left: impl Into<Self>, right: impl Into<Self>) -> Self {
        Self::Less(Box::new(left.into()), Box::new(right.into()))
    }

    pub fn not(inner: impl Into<Self>) -> Self {
        Self::Not(Box::new(inner.into()))
    }

    pub fn call(function: Function, args: impl IntoIterator<Item = impl Into<Self>>) -> Self {
        Self::FunctionCall(function, args.into_iter().map(Into::into).collect())
    }

    /// Calls `callback` on each variable occurrence the expression reads.
    ///
    /// `EXISTS` reads the in-scope variables of its group.
    pub fn on_used_variable<'a>(&'a self, mut callback: impl FnMut(&'a Variable)) {
        self.lookup_used_variables(&mut callback)
    }

    fn lookup_used_variables<'a>(&'a self, callback: &mut impl FnMut(&'a Variable)) {
        match self {
            Self::NamedNode(_) | Self::Literal(_) => {}
            Self::Variable(v) | Self::Bound(v) => callback(v),
            Self::UnaryPlus(e) | Self::UnaryMinus(e) | Self::Not(e) => {
                e.lookup_used_variables(callback)
            }
            Self::Or(a, b)
            | Self::And(a, b)
            | Self::Equal(a, b)
            | Self::SameTerm(a, b)
            | Self::Greater(a, b)
            | Self::GreaterOrEqual(a, b)
            | Self::Less(a, b)
            | Self::LessOrEqual(a, b)
            | Self::Add(a, b)
            | Self::Subtract(a, b)
            | Self::Multiply(a, b)
            | Self::Divide(a, b) => {
                a.lookup_used_variables(callback);
                b.lookup_used_variables(callback);
            }
            Self::If(a, b, c) => {
                a.lookup_used_variables(callback);
                b.lookup_used_variables(callback);
                c.lookup_used_variables(callback);
            }
            Self::In(a, list) => {
                a.lookup_used_variables(callback);
                for e in list {
                    e.lookup_used_variables(callback);
                }
            }
            Self::Coalesce(list) | Self::FunctionCall(_, list) => {
                for e in list {
                    e.lookup_used_variables(callback);
                }
            }
            Self::Exists(group) => {
                for p in group {
                    p.lookup_in_scope_variables(callback);
                }
            }
        }
    }

    /// The distinct variables read by the expression, in first occurrence order.
    pub fn used_variables(&self) -> Vec<&Variable> {
        let mut variables = Vec::new();
        self.on_used_variable(|v| {
            if !variables.contains(&v) {
                variables.push(v);
            }
        });
        variables
    }

    /// Calls `callback` on every triple pattern nested in an `EXISTS`.
    pub fn on_triple_pattern<'a>(&'a self, mut callback: impl FnMut(&'a TriplePattern)) {
        self.lookup_triple_patterns(&mut callback)
    }

    fn lookup_triple_patterns<'a>(&'a self, callback: &mut impl FnMut(&'a TriplePattern)) {
        match self {
            Self::NamedNode(_) | Self::Literal(_) | Self::Variable(_) | Self::Bound(_) => {}
            Self::UnaryPlus(e) | Self::UnaryMinus(e) | Self::Not(e) => {
                e.lookup_triple_patterns(callback)
            }
            Self::Or(a, b)
            | Self::And(a, b)
            | Self::Equal(a, b)
            | Self::SameTerm(a, b)
            | Self::Greater(a, b)
            | Self::GreaterOrEqual(a, b)
            | Self::Less(a, b)
            | Self::LessOrEqual(a, b)
            | Self::Add(a, b)
            | Self::Subtract(a, b)
            | Self::Multiply(a, b)
            | Self::Divide(a, b) => {
                a.lookup_triple_patterns(callback);
                b.lookup_triple_patterns(callback);
            }
            Self::If(a, b, c) => {
                a.lookup_triple_patterns(callback);
                b.lookup_triple_patterns(callback);
                c.lookup_triple_patterns(callback);
            }
            Self::In(a, list) => {
                a.lookup_triple_patterns(callback);
                for e in list {
                    e.lookup_triple_patterns(callback);
                }
            }
            Self::Coalesce(list) | Self::FunctionCall(_, list) => {
                for e in list {
                    e.lookup_triple_patterns(callback);
                }
            }
            Self::Exists(group) => {
                for p in group {
                    p.lookup_triple_patterns(callback);
                }
            }
        }
    }

    /// Calls `callback` on every function call of the expression, nested ones included.
    pub fn on_function_call<'a>(&'a self, mut callback: impl FnMut(&'a Function, &'a [Self])) {
        self.lookup_function_calls(&mut callback)
    }

    fn lookup_function_calls<'a>(&'a self, callback: &mut impl FnMut(&'a Function, &'a [Self])) {
        match self {
            Self::NamedNode(_) | Self::Literal(_) | Self::Variable(_) | Self::Bound(_) => {}
            Self::UnaryPlus(e) | Self::UnaryMinus(e) | Self::Not(e) => {
                e.lookup_function_calls(callback)
            }
            Self::Or(a, b)
            | Self::And(a, b)
            | Self::Equal(a, b)
            | Self::SameTerm(a, b)
            | Self::Greater(a, b)
            | Self::GreaterOrEqual(a, b)
            | Self::Less(a, b)
            | Self::LessOrEqual(a, b)
            | Self::Add(a, b)
            | Self::Subtract(a, b)
            | Self::Multiply(a, b)
            | Self::Divide(a, b) => {
                a.lookup_function_calls(callback);
                b.lookup_function_calls(callback);
            }
            Self::If(a, b, c) => {
                a.lookup_function_calls(callback);
                b.lookup_function_calls(callback);
                c.lookup_function_calls(callback);
            }
            Self::In(a, list) => {
                a.lookup_function_calls(callback);
                for e in list {
                    e.lookup_function_calls(callback);
                }
            }
            Self::Coalesce(list) => {
                for e in list {
                    e.lookup_function_calls(callback);
                }
            }
            Self::FunctionCall(function, args) => {
                callback(function, args.as_slice());
                for e in args {
                    e.lookup_function_calls(callback);
                }
            }
            Self::Exists(group) => {
                for p in group {
                    p.lookup_function_calls(callback);
                }
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => node.fmt(f),
            Self::Literal(l) => l.fmt(f),
            Self::Variable(var) => var.fmt(f),
            Self::Or(a, b) => write!(f, "({a} || {b})"),
            Self::And(a, b) => write!(f, "({a} && {b})"),
            Self::Equal(a, b) => write!(f, "({a} = {b})"),
            Self::SameTerm(a, b) => write!(f, "sameTerm({a}, {b})"),
            Self::Greater(a, b) => write!(f, "({a} > {b})"),
            Self::GreaterOrEqual(a, b) => write!(f, "({a} >= {b})"),
            Self::Less(a, b) => write!(f, "({a} < {b})"),
            Self::LessOrEqual(a, b) => write!(f, "({a} <= {b})"),
            Self::In(a, b) => {
                write!(f, "({a} IN ")?;
                write_arg_list(b, f)?;
                f.write_str(")")
            }
            Self::Add(a, b) => write!(f, "({a} + {b})"),
            Self::Subtract(a, b) => write!(f, "({a} - {b})"),
            Self::Multiply(a, b) => write!(f, "({a} * {b})"),
            Self::Divide(a, b) => write!(f, "({a} / {b})"),
            Self::UnaryPlus(e) => write!(f, "+{e}"),
            Self::UnaryMinus(e) => write!(f, "-{e}"),
            Self::Not(e) => match e.as_ref() {
                Self::Exists(p) => write!(f, "NOT EXISTS {}", GroupDisplay(p)),
                e => write!(f, "!{e}"),
            },
            Self::FunctionCall(function, parameters) => {
                write!(f, "{function}")?;
                write_arg_list(parameters, f)
            }
            Self::Bound(v) => write!(f, "BOUND({v})"),
            Self::Exists(p) => write!(f, "EXISTS {}", GroupDisplay(p)),
            Self::If(a, b, c) => write!(f, "IF({a}, {b}, {c})"),
            Self::Coalesce(parameters) => {
                f.write_str("COALESCE")?;
                write_arg_list(parameters, f)
            }
        }
    }
}

impl From<NamedNode> for Expression {
    fn from(p: NamedNode) -> Self {
        Self::NamedNode(p)
    }
}

impl From<NamedNodeRef<'_>> for Expression {
    fn from(p: NamedNodeRef<'_>) -> Self {
        Self::NamedNode(p.into_owned())
    }
}

impl From<Literal> for Expression {
    fn from(p: Literal) -> Self {
        Self::Literal(p)
    }
}

impl From<Variable> for Expression {
    fn from(v: Variable) -> Self {
        Self::Variable(v)
    }
}

impl From<&Variable> for Expression {
    fn from(v: &Variable) -> Self {
        Self::Variable(v.clone())
    }
}

fn write_arg_list(
    params: impl IntoIterator<Item = impl fmt::Display>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.write_str("(")?;
    let mut cont = false;
    for p in params {
        if cont {
            f.write_str(", ")?;
        }
        p.fmt(f)?;
        cont = true;
    }
    f.write_str(")")
}

/// A function name.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Function {
    Str,
    Lang,
    Datatype,
    IsIri,
    IsBlank,
    IsLiteral,
    IsNumeric,
    StrLen,
    UCase,
    LCase,
    Contains,
    StrStarts,
    StrEnds,
    Concat,
    Regex,
    Abs,
    /// `isTransitive(?subject, ?predicate, ?object)`: whether `?object` is reachable from
    /// `?subject` by following `?predicate` edges.
    IsTransitive,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Str => "STR",
            Self::Lang => "LANG",
            Self::Datatype => "DATATYPE",
            Self::IsIri => "isIRI",
            Self::IsBlank => "isBLANK",
            Self::IsLiteral => "isLITERAL",
            Self::IsNumeric => "isNUMERIC",
            Self::StrLen => "STRLEN",
            Self::UCase => "UCASE",
            Self::LCase => "LCASE",
            Self::Contains => "CONTAINS",
            Self::StrStarts => "STRSTARTS",
            Self::StrEnds => "STRENDS",
            Self::Concat => "CONCAT",
            Self::Regex => "REGEX",
            Self::Abs => "ABS",
            Self::IsTransitive => "isTransitive",
        })
    }
}

/// One item of a group graph pattern.
///
/// A group is a `Vec<GraphPattern>`: the planner decides in which order its items are
/// evaluated, so the declaration order only breaks ties.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum GraphPattern {
    /// A [triple pattern](https://www.w3.org/TR/sparql11-query/#defn_TriplePattern).
    Edge(TriplePattern),
    /// A group matched against the named graphs only, `name` being an IRI or a variable.
    Graph { name: Term, inner: Vec<Self> },
    /// [Filter](https://www.w3.org/TR/sparql11-query/#defn_algFilter).
    Filter { expr: Expression },
    /// [Extend](https://www.w3.org/TR/sparql11-query/#defn_extend).
    Bind {
        variable: Variable,
        expression: Expression,
    },
    /// A table of inline solutions, `None` standing for `UNDEF`.
    Values {
        variables: Vec<Variable>,
        bindings: Vec<Vec<Option<Term>>>,
    },
    /// [LeftJoin](https://www.w3.org/TR/sparql11-query/#defn_algLeftJoin) with an optional filter.
    Optional {
        inner: Vec<Self>,
        expression: Option<Expression>,
    },
    /// [Union](https://www.w3.org/TR/sparql11-query/#defn_algUnion) of any number of branches.
    Union { branches: Vec<Vec<Self>> },
    /// [Minus](https://www.w3.org/TR/sparql11-query/#defn_algMinus).
    Minus { inner: Vec<Self> },
}

impl GraphPattern {
    pub fn edge(
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
    ) -> Self {
        Self::Edge(TriplePattern::new(subject, predicate, object))
    }

    pub fn filter(expr: Expression) -> Self {
        Self::Filter { expr }
    }

    pub fn optional(inner: Vec<Self>) -> Self {
        Self::Optional {
            inner,
            expression: None,
        }
    }

    /// Ordinary edge and graph patterns: the items the cost model can estimate.
    pub fn is_evaluable(&self) -> bool {
        matches!(self, Self::Edge(_) | Self::Graph { .. })
    }

    /// Calls `callback` on each [in-scope variable](https://www.w3.org/TR/sparql11-query/#variableScope) occurrence.
    pub fn on_in_scope_variable<'a>(&'a self, mut callback: impl FnMut(&'a Variable)) {
        self.lookup_in_scope_variables(&mut callback)
    }

    fn lookup_in_scope_variables<'a>(&'a self, callback: &mut impl FnMut(&'a Variable)) {
        match self {
            Self::Edge(pattern) => {
                for v in pattern.variables() {
                    callback(v);
                }
            }
            Self::Graph { name, inner } => {
                if let Term::Variable(v) = name {
                    callback(v);
                }
                for p in inner {
                    p.lookup_in_scope_variables(callback);
                }
            }
            Self::Filter { .. } | Self::Minus { .. } => {}
            Self::Bind { variable, .. } => callback(variable),
            Self::Values { variables, .. } => {
                for v in variables {
                    callback(v);
                }
            }
            Self::Optional { inner, .. } => {
                for p in inner {
                    p.lookup_in_scope_variables(callback);
                }
            }
            Self::Union { branches } => {
                for p in branches.iter().flatten() {
                    p.lookup_in_scope_variables(callback);
                }
            }
        }
    }

    /// Calls `callback` on every triple pattern of the item, including the nested groups
    /// and the groups of `EXISTS` expressions.
    pub fn on_triple_pattern<'a>(&'a self, mut callback: impl FnMut(&'a TriplePattern)) {
        self.lookup_triple_patterns(&mut callback)
    }

    fn lookup_triple_patterns<'a>(&'a self, callback: &mut impl FnMut(&'a TriplePattern)) {
        match self {
            Self::Edge(pattern) => callback(pattern),
            Self::Graph { inner, .. } | Self::Minus { inner } => {
                for p in inner {
                    p.lookup_triple_patterns(callback);
                }
            }
            Self::Optional { inner, expression } => {
                for p in inner {
                    p.lookup_triple_patterns(callback);
                }
                if let Some(expression) = expression {
                    expression.lookup_triple_patterns(callback);
                }
            }
            Self::Union { branches } => {
                for p in branches.iter().flatten() {
                    p.lookup_triple_patterns(callback);
                }
            }
            Self::Filter { expr: expression } | Self::Bind { expression, .. } => {
                expression.lookup_triple_patterns(callback)
            }
            Self::Values { .. } => {}
        }
    }

    fn lookup_function_calls<'a>(
        &'a self,
        callback: &mut impl FnMut(&'a Function, &'a [Expression]),
    ) {
        match self {
            Self::Edge(_) | Self::Values { .. } => {}
            Self::Graph { inner, .. } | Self::Minus { inner } => {
                for p in inner {
                    p.lookup_function_calls(callback);
                }
            }
            Self::Optional { inner, expression } => {
                for p in inner {
                    p.lookup_function_calls(callback);
                }
                if let Some(expression) = expression {
                    expression.lookup_function_calls(callback);
                }
            }
            Self::Union { branches } => {
                for p in branches.iter().flatten() {
                    p.lookup_function_calls(callback);
                }
            }
            Self::Filter { expr: expression } | Self::Bind { expression, .. } => {
                expression.lookup_function_calls(callback)
            }
        }
    }

    /// Calls `callback` on every function call of the item, nested groups included.
    pub fn on_function_call<'a>(
        &'a self,
        mut callback: impl FnMut(&'a Function, &'a [Expression]),
    ) {
        self.lookup_function_calls(&mut callback)
    }
}

/// The distinct in-scope variables of a group, in first occurrence order.
pub fn group_variables(group: &[GraphPattern]) -> Vec<&Variable> {
    let mut variables = Vec::new();
    for pattern in group {
        pattern.on_in_scope_variable(|v| {
            if !variables.contains(&v) {
                variables.push(v);
            }
        });
    }
    variables
}

impl fmt::Display for GraphPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edge(pattern) => write!(f, "{pattern} ."),
            Self::Graph { name, inner } => write!(f, "GRAPH {name} {}", GroupDisplay(inner)),
            Self::Filter { expr } => write!(f, "FILTER({expr})"),
            Self::Bind {
                variable,
                expression,
            } => write!(f, "BIND({expression} AS {variable})"),
            Self::Values {
                variables,
                bindings,
            } => {
                f.write_str("VALUES (")?;
                for var in variables {
                    write!(f, " {var}")?;
                }
                f.write_str(" ) {")?;
                for row in bindings {
                    f.write_str(" (")?;
                    for value in row {
                        match value {
                            Some(value) => write!(f, " {value}"),
                            None => f.write_str(" UNDEF"),
                        }?;
                    }
                    f.write_str(" )")?;
                }
                f.write_str(" }")
            }
            Self::Optional { inner, expression } => {
                f.write_str("OPTIONAL { ")?;
                for p in inner {
                    write!(f, "{p} ")?;
                }
                if let Some(expression) = expression {
                    write!(f, "FILTER({expression}) ")?;
                }
                f.write_str("}")
            }
            Self::Union { branches } => {
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" UNION ")?;
                    }
                    GroupDisplay(branch).fmt(f)?;
                }
                Ok(())
            }
            Self::Minus { inner } => write!(f, "MINUS {}", GroupDisplay(inner)),
        }
    }
}

/// Formats a group between braces.
pub struct GroupDisplay<'a>(pub &'a [GraphPattern]);

impl fmt::Display for GroupDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{ ")?;
        for p in self.0 {
            write!(f, "{p} ")?;
        }
        f.write_str("}")
    }
}

/// A set function used in aggregates (c.f. [`AggregateExpression`]).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum AggregateFunction {
    /// [Count](https://www.w3.org/TR/sparql11-query/#defn_aggCount) with *.
    Count,
    /// [Sum](https://www.w3.org/TR/sparql11-query/#defn_aggSum).
    Sum,
    /// [Avg](https://www.w3.org/TR/sparql11-query/#defn_aggAvg).
    Avg,
    /// [Min](https://www.w3.org/TR/sparql11-query/#defn_aggMin).
    Min,
    /// [Max](https://www.w3.org/TR/sparql11-query/#defn_aggMax).
    Max,
    /// [GroupConcat](https://www.w3.org/TR/sparql11-query/#defn_aggGroupConcat).
    GroupConcat { separator: Option<String> },
    /// [Sample](https://www.w3.org/TR/sparql11-query/#defn_aggSample).
    Sample,
    /// The values of the group gathered in one composite list literal.
    List,
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::GroupConcat { .. } => "GROUP_CONCAT",
            Self::Sample => "SAMPLE",
            Self::List => "LIST",
        })
    }
}

/// A set function call.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum AggregateExpression {
    /// [Count](https://www.w3.org/TR/sparql11-query/#defn_aggCount) with *.
    CountSolutions { distinct: bool },
    FunctionCall {
        name: AggregateFunction,
        expr: Expression,
        distinct: bool,
    },
}

impl AggregateExpression {
    pub fn call(name: AggregateFunction, expr: impl Into<Expression>) -> Self {
        Self::FunctionCall {
            name,
            expr: expr.into(),
            distinct: false,
        }
    }
}

impl fmt::Display for AggregateExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountSolutions { distinct } => {
                if *distinct {
                    f.write_str("COUNT(DISTINCT *)")
                } else {
                    f.write_str("COUNT(*)")
                }
            }
            Self::FunctionCall {
                name,
                expr,
                distinct,
            } => {
                write!(f, "{name}(")?;
                if *distinct {
                    f.write_str("DISTINCT ")?;
                }
                write!(f, "{expr}")?;
                if let AggregateFunction::GroupConcat {
                    separator: Some(separator),
                } = name
                {
                    f.write_str("; SEPARATOR = ")?;
                    write!(f, "{}", Literal::new_simple_literal(separator.as_str()))?;
                }
                f.write_str(")")
            }
        }
    }
}

/// An ordering comparator.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum OrderExpression {
    /// Ascending order
    Asc(Expression),
    /// Descending order
    Desc(Expression),
}

impl OrderExpression {
    pub fn expression(&self) -> &Expression {
        match self {
            Self::Asc(e) | Self::Desc(e) => e,
        }
    }
}

impl fmt::Display for OrderExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc(e) => write!(f, "ASC({e})"),
            Self::Desc(e) => write!(f, "DESC({e})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    #[test]
    fn in_scope_variables_skip_filters_and_minus() {
        let group = vec![
            GraphPattern::edge(var("s"), var("p"), var("s")),
            GraphPattern::filter(Expression::Bound(var("f"))),
            GraphPattern::Minus {
                inner: vec![GraphPattern::edge(var("m"), var("p"), var("o"))],
            },
            GraphPattern::optional(vec![GraphPattern::edge(var("s"), var("q"), var("o"))]),
        ];
        let names = group_variables(&group)
            .into_iter()
            .map(Variable::as_str)
            .collect::<Vec<_>>();
        assert_eq!(names, ["s", "p", "q", "o"]);
    }

    #[test]
    fn exists_reads_its_group_variables() {
        let expr = Expression::not(Expression::Exists(vec![GraphPattern::edge(
            var("x"),
            NamedNode::new_unchecked("http://example.com/p"),
            var("y"),
        )]));
        let names = expr
            .used_variables()
            .into_iter()
            .map(Variable::as_str)
            .collect::<Vec<_>>();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(
            expr.to_string(),
            "NOT EXISTS { ?x <http://example.com/p> ?y . }"
        );
    }

    #[test]
    fn aggregate_display() {
        let concat = AggregateExpression::FunctionCall {
            name: AggregateFunction::GroupConcat {
                separator: Some(", ".into()),
            },
            expr: var("x").into(),
            distinct: true,
        };
        assert_eq!(
            concat.to_string(),
            "GROUP_CONCAT(DISTINCT ?x; SEPARATOR = \", \")"
        );
        assert_eq!(
            AggregateExpression::CountSolutions { distinct: false }.to_string(),
            "COUNT(*)"
        );
    }
}
