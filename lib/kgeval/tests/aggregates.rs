use kgalgebra::Query;
use kgalgebra::algebra::{AggregateExpression, AggregateFunction, Expression, GraphPattern};
use kgeval::{EvaluationLimits, ExpressionTerm, QueryEvaluationError, QueryEvaluator};
use kgterm::{Edge, Graph, GraphName, Literal, NamedNode, Term, Variable};
use oxsdatatypes::Decimal;

fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

/// `(team, member, score)` edges as `member team team` and `member score score`.
fn scores(rows: &[(&str, &str, i64)]) -> Graph {
    let mut graph = Graph::new();
    for (team, member, score) in rows {
        graph.insert(Edge::new(ex(member), ex("team"), ex(team), GraphName::DefaultGraph));
        graph.insert(Edge::new(
            ex(member),
            ex("score"),
            Literal::from(*score),
            GraphName::DefaultGraph,
        ));
    }
    graph
}

fn score_pattern() -> Vec<GraphPattern> {
    vec![
        GraphPattern::edge(var("m"), ex("team"), var("t")),
        GraphPattern::edge(var("m"), ex("score"), var("s")),
    ]
}

fn aggregate_all(graph: &Graph) -> Result<kgeval::Mappings, QueryEvaluationError> {
    let query = Query::new(score_pattern())
        .with_aggregate(var("sum"), AggregateExpression::call(AggregateFunction::Sum, var("s")))
        .with_aggregate(var("avg"), AggregateExpression::call(AggregateFunction::Avg, var("s")))
        .with_aggregate(var("min"), AggregateExpression::call(AggregateFunction::Min, var("s")))
        .with_aggregate(var("max"), AggregateExpression::call(AggregateFunction::Max, var("s")))
        .with_aggregate(var("count"), AggregateExpression::CountSolutions {
            distinct: false,
        });
    QueryEvaluator::new().execute(graph, &query)
}

fn numeric(term: Option<&Term>) -> Option<ExpressionTerm> {
    ExpressionTerm::try_from(term?.clone()).ok()
}

#[test]
fn aggregates_over_one_group() -> Result<(), QueryEvaluationError> {
    let graph = scores(&[("red", "a", 3), ("red", "b", 5), ("blue", "c", 7)]);
    let solutions = aggregate_all(&graph)?;
    assert_eq!(solutions.len(), 1);
    let solution = &solutions[0];
    assert_eq!(solution["sum"], Literal::from(15).into());
    assert_eq!(
        numeric(solution.get(&var("avg"))),
        Some(ExpressionTerm::DecimalLiteral(Decimal::from(5)))
    );
    assert_eq!(solution["min"], Literal::from(3).into());
    assert_eq!(solution["max"], Literal::from(7).into());
    assert_eq!(solution["count"], Literal::from(3).into());
    assert_eq!(solution.group().len(), 3);
    Ok(())
}

#[test]
fn aggregates_without_solutions() -> Result<(), QueryEvaluationError> {
    let solutions = aggregate_all(&Graph::new())?;
    assert_eq!(solutions.len(), 1);
    let solution = &solutions[0];
    assert_eq!(solution["count"], Literal::from(0).into());
    assert_eq!(solution["avg"], Literal::from(0).into());
    assert!(solution.get(&var("sum")).is_none());
    assert!(solution.get(&var("min")).is_none());
    assert!(solution.get(&var("max")).is_none());
    assert!(solution.group().is_empty());
    Ok(())
}

#[test]
fn groups_in_first_appearance_order() -> Result<(), QueryEvaluationError> {
    let graph = scores(&[
        ("red", "a", 3),
        ("blue", "b", 5),
        ("red", "c", 7),
        ("green", "d", 1),
    ]);
    let query = Query::new(score_pattern())
        .with_group_by([var("t")])
        .with_aggregate(var("total"), AggregateExpression::call(AggregateFunction::Sum, var("s")))
        .with_aggregate(var("members"), AggregateExpression::call(AggregateFunction::List, var("m")));
    let solutions = QueryEvaluator::new()
        .without_optimizations()
        .execute(&graph, &query)?;
    assert_eq!(solutions.variables(), [var("t"), var("total"), var("members")]);
    let teams = solutions
        .iter()
        .map(|s| (s["t"].clone(), s["total"].clone(), s.group().len()))
        .collect::<Vec<_>>();
    assert_eq!(teams, [
        (ex("red").into(), Literal::from(10).into(), 2),
        (ex("blue").into(), Literal::from(5).into(), 1),
        (ex("green").into(), Literal::from(1).into(), 1),
    ]);
    let Term::Literal(members) = &solutions[0]["members"] else {
        panic!("LIST must return a literal");
    };
    assert_eq!(
        members.value(),
        "(<http://example.com/a> <http://example.com/c>)"
    );
    Ok(())
}

#[test]
fn having_filters_groups() -> Result<(), QueryEvaluationError> {
    let graph = scores(&[("red", "a", 3), ("blue", "b", 5), ("red", "c", 7)]);
    let query = Query::new(score_pattern())
        .with_group_by([var("t")])
        .with_aggregate(var("n"), AggregateExpression::CountSolutions { distinct: false })
        .with_having(Expression::greater(var("n"), Literal::from(1)));
    let solutions = QueryEvaluator::new().execute(&graph, &query)?;
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0]["t"], ex("red").into());
    Ok(())
}

#[test]
fn distinct_aggregates_and_errors() -> Result<(), QueryEvaluationError> {
    let mut graph = scores(&[("red", "a", 3), ("red", "b", 3), ("red", "c", 4)]);
    graph.insert(Edge::new(ex("d"), ex("team"), ex("red"), GraphName::DefaultGraph));
    graph.insert(Edge::new(
        ex("d"),
        ex("score"),
        Literal::from("none"),
        GraphName::DefaultGraph,
    ));
    let query = Query::new(score_pattern())
        .with_aggregate(var("distinct"), AggregateExpression::FunctionCall {
            name: AggregateFunction::Count,
            expr: var("s").into(),
            distinct: true,
        })
        .with_aggregate(var("sum"), AggregateExpression::call(AggregateFunction::Sum, var("s")))
        .with_aggregate(var("sample"), AggregateExpression::call(AggregateFunction::Sample, var("s")))
        .with_aggregate(
            var("concat"),
            AggregateExpression::call(
                AggregateFunction::GroupConcat {
                    separator: Some(", ".into()),
                },
                var("s"),
            ),
        );
    let solutions = QueryEvaluator::new().execute(&graph, &query)?;
    let solution = &solutions[0];
    assert_eq!(solution["distinct"], Literal::from(3).into());
    // the string score makes the sum fail
    assert!(solution.get(&var("sum")).is_none());
    assert_eq!(solution["sample"], Literal::from(3).into());
    assert_eq!(solution["concat"], Literal::from("3, 3, 4, none").into());
    Ok(())
}

#[test]
fn group_limit() {
    let graph = scores(&[("red", "a", 3), ("blue", "b", 5), ("green", "c", 7)]);
    let query = Query::new(score_pattern()).with_group_by([var("t")]);
    let evaluator = QueryEvaluator::new().with_limits(EvaluationLimits {
        max_groups: Some(2),
        ..EvaluationLimits::default()
    });
    assert!(matches!(
        evaluator.execute(&graph, &query),
        Err(QueryEvaluationError::GroupLimitExceeded(2))
    ));
}
