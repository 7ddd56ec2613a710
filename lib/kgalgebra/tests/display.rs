use kgalgebra::Query;
use kgalgebra::algebra::{Expression, Function, GraphPattern, OrderExpression};
use kgterm::vocab::rdfs;
use kgterm::{Literal, NamedNode, Variable};

fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

#[test]
fn test_group_blocks_display() {
    let knows = NamedNode::new_unchecked("http://example.com/knows");
    let query = Query::new(vec![
        GraphPattern::edge(var("a"), knows.clone(), var("b")),
        GraphPattern::optional(vec![GraphPattern::edge(var("b"), rdfs::LABEL, var("l"))]),
        GraphPattern::Union {
            branches: vec![
                vec![GraphPattern::edge(var("a"), knows.clone(), var("c"))],
                vec![GraphPattern::edge(var("c"), knows.clone(), var("a"))],
            ],
        },
        GraphPattern::Minus {
            inner: vec![GraphPattern::edge(var("b"), knows, var("a"))],
        },
        GraphPattern::Bind {
            variable: var("u"),
            expression: Expression::call(Function::UCase, [var("l")]),
        },
        GraphPattern::Values {
            variables: vec![var("l")],
            bindings: vec![vec![Some(Literal::from("x").into())], vec![None]],
        },
        GraphPattern::filter(Expression::Bound(var("l"))),
    ])
    .with_order_by(OrderExpression::Desc(var("l").into()))
    .with_distinct()
    .with_offset(1)
    .with_limit(2);
    assert_eq!(
        query.to_string(),
        concat!(
            "SELECT DISTINCT * WHERE { ?a <http://example.com/knows> ?b . ",
            "OPTIONAL { ?b <http://www.w3.org/2000/01/rdf-schema#label> ?l . } ",
            "{ ?a <http://example.com/knows> ?c . } UNION { ?c <http://example.com/knows> ?a . } ",
            "MINUS { ?b <http://example.com/knows> ?a . } ",
            "BIND(UCASE(?l) AS ?u) ",
            "VALUES ( ?l ) { ( \"x\" ) ( UNDEF ) } ",
            "FILTER(BOUND(?l)) } ",
            "ORDER BY DESC(?l) OFFSET 1 LIMIT 2"
        )
    );
    let names = query
        .result_variables()
        .into_iter()
        .map(Variable::into_string)
        .collect::<Vec<_>>();
    assert_eq!(names, ["a", "b", "l", "c", "u"]);
}
