use kgalgebra::algebra::{Expression, Function, GraphPattern};
use kgalgebra::term::TriplePattern;
use kgalgebra::{Rule, RuleSet};
use kgreason::{
    EntailmentConfig, EntailmentError, EntailmentHooks, EntailmentStatus, RuleEngine, is_transitive,
};
use kgterm::vocab::{owl, rdf, rdfs};
use kgterm::{BlankNode, Edge, Graph, GraphName, Literal, NamedNode, Variable};
use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

fn edge(s: &str, p: &str, o: &str) -> Edge {
    Edge::new(ex(s), ex(p), ex(o), GraphName::DefaultGraph)
}

/// `?x ancestor ?y` from `parent` edges, then its transitive closure.
fn ancestor_rules() -> RuleSet {
    let (x, y, z) = (var("x"), var("y"), var("z"));
    RuleSet::from_iter([
        Rule::new(
            "parent",
            vec![TriplePattern::new(x.clone(), ex("ancestor"), y.clone())],
            vec![GraphPattern::edge(x.clone(), ex("parent"), y.clone())],
        ),
        Rule::new(
            "ancestor",
            vec![TriplePattern::new(x.clone(), ex("ancestor"), z.clone())],
            vec![
                GraphPattern::edge(x, ex("ancestor"), y.clone()),
                GraphPattern::edge(y, ex("ancestor"), z),
            ],
        ),
    ])
}

fn family() -> Graph {
    Graph::from_iter([
        edge("a", "parent", "b"),
        edge("b", "parent", "c"),
        edge("c", "parent", "d"),
    ])
}

#[test]
fn reaches_a_fixpoint() -> Result<(), EntailmentError> {
    let mut graph = family();
    let report = RuleEngine::new(ancestor_rules()).run(&mut graph)?;
    assert_eq!(report.status, EntailmentStatus::Settled);
    assert_eq!(report.inserted, 6);
    assert_eq!(graph.len(), 9);
    assert!(graph.contains(&edge("a", "ancestor", "d")));
    assert_eq!(graph.iter().filter(|e| e.is_derived()).count(), 6);
    Ok(())
}

#[test]
fn rerunning_at_fixpoint_adds_nothing() -> Result<(), EntailmentError> {
    let mut graph = family();
    RuleEngine::new(ancestor_rules()).run(&mut graph)?;

    let produced = Rc::new(RefCell::new(Vec::new()));
    let hooks = EntailmentHooks::<Graph>::new().with_after_rule({
        let produced = Rc::clone(&produced);
        move |_, rule, edges| {
            produced.borrow_mut().push((rule.name.clone(), edges.len()));
            Ok(None)
        }
    });
    let report = RuleEngine::new(ancestor_rules())
        .with_hooks(hooks)
        .run(&mut graph)?;
    assert_eq!(report.status, EntailmentStatus::Settled);
    assert_eq!(report.iterations, 1);
    assert_eq!(report.inserted, 0);
    assert!(produced.borrow().iter().all(|(_, len)| *len == 0));
    Ok(())
}

#[test]
fn unchanged_rules_are_skipped() -> Result<(), EntailmentError> {
    let mut graph = family();
    let report = RuleEngine::new(ancestor_rules()).run(&mut graph)?;
    let parent = &report.rules[0];
    assert_eq!(parent.name, "parent");
    assert_eq!(parent.runs, 1);
    assert_eq!(parent.skipped, report.iterations - 1);
    assert_eq!(report.rules[1].runs, report.iterations);

    let mut naive_graph = family();
    let naive = RuleEngine::new(ancestor_rules())
        .with_config(EntailmentConfig {
            optimize: false,
            ..EntailmentConfig::default()
        })
        .run(&mut naive_graph)?;
    assert_eq!(naive.rules[0].skipped, 0);
    assert_eq!(naive.inserted, report.inserted);
    assert_eq!(naive_graph, graph);
    Ok(())
}

#[test]
fn transitive_rules_are_closed_in_one_step() -> Result<(), EntailmentError> {
    let chain = || {
        Graph::from_iter([
            edge("a", "parent", "b"),
            edge("b", "parent", "c"),
            edge("c", "parent", "d"),
            edge("d", "parent", "e"),
        ])
    };
    let mut graph = chain();
    let report = RuleEngine::new(ancestor_rules()).run(&mut graph)?;
    assert_eq!(report.iterations, 3);
    assert_eq!(report.inserted, 10);

    let mut naive_graph = chain();
    let naive = RuleEngine::new(ancestor_rules())
        .with_config(EntailmentConfig {
            optimize: false,
            ..EntailmentConfig::default()
        })
        .run(&mut naive_graph)?;
    assert_eq!(naive.iterations, 4);
    assert_eq!(naive_graph, graph);
    Ok(())
}

#[test]
fn iterations_see_a_snapshot() -> Result<(), EntailmentError> {
    // without buffering, the second rule would see the edge derived by the first one
    let (x, y) = (var("x"), var("y"));
    let rules = RuleSet::from_iter([
        Rule::new(
            "p-to-q",
            vec![TriplePattern::new(x.clone(), ex("q"), y.clone())],
            vec![GraphPattern::edge(x.clone(), ex("p"), y.clone())],
        ),
        Rule::new(
            "q-to-r",
            vec![TriplePattern::new(x.clone(), ex("r"), y.clone())],
            vec![GraphPattern::edge(x, ex("q"), y)],
        ),
    ]);
    let iterations = Rc::new(RefCell::new(Vec::new()));
    let hooks = EntailmentHooks::<Graph>::new().with_update({
        let iterations = Rc::clone(&iterations);
        move |_, _, inserted| {
            iterations.borrow_mut().push(inserted.to_vec());
            Ok(None)
        }
    });
    let mut graph = Graph::from_iter([edge("a", "p", "b")]);
    let report = RuleEngine::new(rules).with_hooks(hooks).run(&mut graph)?;
    assert_eq!(report.iterations, 3);
    assert_eq!(*iterations.borrow(), [
        vec![edge("a", "q", "b")],
        vec![edge("a", "r", "b")],
    ]);
    Ok(())
}

#[test]
fn iteration_cap_is_reported() -> Result<(), EntailmentError> {
    // every solution gets a fresh blank node so this rule never settles
    let x = var("x");
    let rules = RuleSet::from_iter([Rule::new(
        "successor",
        vec![TriplePattern::new(x.clone(), ex("next"), BlankNode::default())],
        vec![GraphPattern::edge(var("w"), ex("next"), x)],
    )]);
    let mut graph = Graph::from_iter([edge("zero", "next", "one")]);
    let report = RuleEngine::new(rules)
        .with_config(EntailmentConfig {
            max_iterations: 3,
            ..EntailmentConfig::default()
        })
        .run(&mut graph)?;
    assert_eq!(report.status, EntailmentStatus::IterationLimitReached);
    assert!(!report.is_settled());
    assert_eq!(report.iterations, 3);
    // each iteration extends every chain end, old and new
    assert_eq!(report.inserted, 1 + 2 + 4);
    assert_eq!(graph.len(), 8);
    Ok(())
}

#[test]
fn inference_cap_is_reported() -> Result<(), EntailmentError> {
    let mut graph = family();
    let report = RuleEngine::new(ancestor_rules())
        .with_config(EntailmentConfig {
            max_inferred_edges: Some(4),
            ..EntailmentConfig::default()
        })
        .run(&mut graph)?;
    assert_eq!(report.status, EntailmentStatus::InferenceLimitReached);
    assert_eq!(report.inserted, 4);
    assert_eq!(graph.len(), 7);
    Ok(())
}

#[test]
fn timeout_is_reported() -> Result<(), EntailmentError> {
    let mut graph = family();
    let report = RuleEngine::new(ancestor_rules())
        .with_config(EntailmentConfig {
            timeout: Some(Duration::ZERO),
            ..EntailmentConfig::default()
        })
        .run(&mut graph)?;
    assert_eq!(report.status, EntailmentStatus::TimeoutReached);
    assert_eq!(report.inserted, 0);
    assert_eq!(graph.len(), 3);
    Ok(())
}

#[test]
fn hooks_fire_in_lifecycle_order() -> Result<(), EntailmentError> {
    let log = Rc::new(RefCell::new(Vec::<String>::new()));
    let record = |log: &Rc<RefCell<Vec<String>>>, event: &str| {
        log.borrow_mut().push(event.to_owned());
    };
    let hooks = EntailmentHooks::<Graph>::new()
        .with_prepare_entailment({
            let log = Rc::clone(&log);
            move |_, rules| {
                record(&log, &format!("prepare {}", rules.len()));
                Ok(None)
            }
        })
        .with_before_entailment({
            let log = Rc::clone(&log);
            move |_| {
                record(&log, "before");
                Ok(None)
            }
        })
        .with_loop_entailment({
            let log = Rc::clone(&log);
            move |_, iteration| {
                record(&log, &format!("loop {iteration}"));
                Ok(Some(Literal::from(u64::try_from(iteration)?).into()))
            }
        })
        .with_before_rule({
            let log = Rc::clone(&log);
            move |_, rule| {
                record(&log, &format!("before rule {}", rule.name));
                Ok(None)
            }
        })
        .with_after_rule({
            let log = Rc::clone(&log);
            move |_, rule, edges| {
                record(&log, &format!("after rule {} {}", rule.name, edges.len()));
                Ok(None)
            }
        })
        .with_before_update({
            let log = Rc::clone(&log);
            move |_| {
                record(&log, "before update");
                Ok(None)
            }
        })
        .with_update({
            let log = Rc::clone(&log);
            move |graph, deleted, inserted| {
                record(
                    &log,
                    &format!("update -{} +{} in {}", deleted.len(), inserted.len(), graph.len()),
                );
                Ok(None)
            }
        })
        .with_after_update({
            let log = Rc::clone(&log);
            move |_| {
                record(&log, "after update");
                Ok(None)
            }
        })
        .with_after_entailment({
            let log = Rc::clone(&log);
            move |_, report| {
                record(&log, &format!("after {:?}", report.status));
                Ok(None)
            }
        });
    let (x, y) = (var("x"), var("y"));
    let rules = RuleSet::from_iter([Rule::new(
        "inverse",
        vec![TriplePattern::new(y.clone(), ex("child"), x.clone())],
        vec![GraphPattern::edge(x, ex("parent"), y)],
    )]);
    let mut graph = Graph::from_iter([edge("a", "parent", "b")]);
    RuleEngine::new(rules).with_hooks(hooks).run(&mut graph)?;
    assert_eq!(*log.borrow(), [
        "prepare 1",
        "before",
        "loop 1",
        "before rule inverse",
        "after rule inverse 1",
        "before update",
        "update -0 +1 in 2",
        "after update",
        "loop 2",
        "after Settled",
    ]);
    Ok(())
}

#[test]
fn prepare_may_edit_the_rules() -> Result<(), EntailmentError> {
    let hooks = EntailmentHooks::<Graph>::new().with_prepare_entailment(|_, rules| {
        rules.rules.retain(|rule| rule.name != "ancestor");
        Ok(None)
    });
    let mut engine = RuleEngine::new(ancestor_rules()).with_hooks(hooks);
    let mut graph = family();
    let report = engine.run(&mut graph)?;
    assert_eq!(report.inserted, 3);
    assert_eq!(report.rules.len(), 1);
    // the engine rules are untouched
    assert_eq!(engine.rules().len(), 2);
    Ok(())
}

#[test]
fn failing_hooks_abort_the_run() {
    let hooks = EntailmentHooks::<Graph>::new()
        .with_before_rule(|_, rule| Err(io::Error::other(format!("refused {}", rule.name)).into()));
    let mut graph = family();
    let result = RuleEngine::new(ancestor_rules()).with_hooks(hooks).run(&mut graph);
    match result {
        Err(EntailmentError::Hook { hook, source }) => {
            assert_eq!(hook, "before_rule");
            assert_eq!(source.to_string(), "refused parent");
        }
        other => panic!("expected a hook error, found {other:?}"),
    }
    assert_eq!(graph.len(), 3);
}

#[test]
fn constraints_report_violations() -> Result<(), EntailmentError> {
    let x = var("x");
    let rules = RuleSet::from_iter([
        Rule::constraint(
            "no-self-ancestor",
            vec![TriplePattern::new(x.clone(), ex("ancestor"), x.clone())],
            vec![GraphPattern::edge(x.clone(), ex("ancestor"), x)],
        ),
        ancestor_rules().rules.remove(0),
        ancestor_rules().rules.remove(1),
    ]);
    let mut graph = Graph::from_iter([edge("a", "parent", "b"), edge("b", "parent", "a")]);
    let report = RuleEngine::new(rules).run(&mut graph)?;
    assert!(report.is_settled());
    assert_eq!(
        report
            .violations
            .iter()
            .map(|v| v.edges[0].subject.clone())
            .collect::<Vec<_>>(),
        [ex("a").into(), ex("b").into()]
    );
    assert!(report.violations.iter().all(|v| v.rule == "no-self-ancestor"));
    // only the ancestor edges are inserted, never the constraint heads
    assert_eq!(report.inserted, 4);
    Ok(())
}

#[test]
fn derived_edges_go_to_the_target_graph_and_can_be_removed() -> Result<(), EntailmentError> {
    let inferred = GraphName::from(ex("inferred"));
    let deleted = Rc::new(RefCell::new(0));
    let hooks = EntailmentHooks::<Graph>::new().with_update({
        let deleted = Rc::clone(&deleted);
        move |_, removed, _| {
            *deleted.borrow_mut() += removed.len();
            Ok(None)
        }
    });
    let mut engine = RuleEngine::new(ancestor_rules())
        .with_config(EntailmentConfig {
            target_graph: inferred.clone(),
            ..EntailmentConfig::default()
        })
        .with_hooks(hooks);
    let mut graph = family();
    engine.run(&mut graph)?;
    assert!(graph.contains(&Edge::new(ex("a"), ex("ancestor"), ex("d"), inferred)));

    let removed = engine.remove_entailments(&mut graph)?;
    assert_eq!(removed.len(), 6);
    assert_eq!(*deleted.borrow(), 6);
    assert_eq!(graph, family());
    Ok(())
}

#[test]
fn rdfs_rules() -> Result<(), EntailmentError> {
    let mut graph = Graph::from_iter([
        Edge::new(ex("hasPet"), rdfs::DOMAIN, ex("Person"), GraphName::DefaultGraph),
        Edge::new(ex("hasPet"), rdfs::RANGE, ex("Pet"), GraphName::DefaultGraph),
        Edge::new(ex("hasCat"), rdfs::SUB_PROPERTY_OF, ex("hasPet"), GraphName::DefaultGraph),
        Edge::new(ex("Pet"), rdfs::SUB_CLASS_OF, ex("Animal"), GraphName::DefaultGraph),
        Edge::new(ex("name"), rdfs::DOMAIN, ex("Named"), GraphName::DefaultGraph),
        Edge::new(ex("name"), rdfs::RANGE, ex("Name"), GraphName::DefaultGraph),
        Edge::new(ex("alice"), ex("hasCat"), ex("tom"), GraphName::DefaultGraph),
        Edge::new(ex("alice"), ex("name"), Literal::from("Alice"), GraphName::DefaultGraph),
    ]);
    let report = RuleEngine::new(kgreason::rdfs::rules()).run(&mut graph)?;
    assert!(report.is_settled());
    for expected in [
        Edge::new(ex("alice"), ex("hasPet"), ex("tom"), GraphName::DefaultGraph),
        Edge::new(ex("alice"), rdf::TYPE, ex("Person"), GraphName::DefaultGraph),
        Edge::new(ex("tom"), rdf::TYPE, ex("Pet"), GraphName::DefaultGraph),
        Edge::new(ex("tom"), rdf::TYPE, ex("Animal"), GraphName::DefaultGraph),
        Edge::new(ex("alice"), rdf::TYPE, ex("Named"), GraphName::DefaultGraph),
    ] {
        assert!(graph.contains(&expected), "{expected} is missing");
    }
    // literals are never subjects
    assert!(graph.iter().all(|e| !e.subject.is_literal()));
    Ok(())
}

#[test]
fn owl_property_rules() -> Result<(), EntailmentError> {
    let mut graph = Graph::from_iter([
        Edge::new(ex("sibling"), rdf::TYPE, owl::SYMMETRIC_PROPERTY, GraphName::DefaultGraph),
        Edge::new(ex("sameAs"), rdf::TYPE, owl::TRANSITIVE_PROPERTY, GraphName::DefaultGraph),
        Edge::new(ex("parent"), owl::INVERSE_OF, ex("child"), GraphName::DefaultGraph),
        edge("a", "sibling", "b"),
        edge("x", "sameAs", "y"),
        edge("y", "sameAs", "z"),
        edge("z", "sameAs", "x"),
        edge("p", "parent", "a"),
        edge("b", "child", "q"),
    ]);
    let report = RuleEngine::new(kgreason::owl::rules()).run(&mut graph)?;
    assert!(report.is_settled());
    for expected in [
        edge("b", "sibling", "a"),
        edge("x", "sameAs", "z"),
        edge("x", "sameAs", "x"),
        edge("a", "child", "p"),
        edge("q", "parent", "b"),
    ] {
        assert!(graph.contains(&expected), "{expected} is missing");
    }
    Ok(())
}

#[test]
fn transitive_filters_in_rule_bodies() -> Result<(), EntailmentError> {
    let (c, d) = (var("c"), var("d"));
    let rules = RuleSet::from_iter([Rule::new(
        "reachable-class",
        vec![TriplePattern::new(c.clone(), ex("below"), d.clone())],
        vec![
            GraphPattern::edge(c.clone(), rdf::TYPE, rdfs::CLASS),
            GraphPattern::edge(d.clone(), rdf::TYPE, rdfs::CLASS),
            GraphPattern::filter(Expression::call(Function::IsTransitive, [
                Expression::from(c),
                rdfs::SUB_CLASS_OF.into(),
                d.into(),
            ])),
        ],
    )]);
    let mut graph = Graph::from_iter(
        ["A", "B", "C"]
            .into_iter()
            .map(|class| Edge::new(ex(class), rdf::TYPE, rdfs::CLASS, GraphName::DefaultGraph))
            .chain([
                Edge::new(ex("A"), rdfs::SUB_CLASS_OF, ex("B"), GraphName::DefaultGraph),
                Edge::new(ex("B"), rdfs::SUB_CLASS_OF, ex("C"), GraphName::DefaultGraph),
                Edge::new(ex("C"), rdfs::SUB_CLASS_OF, ex("B"), GraphName::DefaultGraph),
            ]),
    );
    assert!(is_transitive(
        &graph,
        &ex("A").into(),
        &rdfs::SUB_CLASS_OF.into(),
        &ex("C").into()
    )?);
    let report = RuleEngine::new(rules).run(&mut graph)?;
    assert!(report.is_settled());
    for expected in [
        edge("A", "below", "B"),
        edge("A", "below", "C"),
        edge("B", "below", "B"),
        edge("C", "below", "C"),
    ] {
        assert!(graph.contains(&expected), "{expected} is missing");
    }
    assert!(!graph.contains(&edge("A", "below", "A")));
    Ok(())
}
