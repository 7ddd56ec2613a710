use crate::closure::{closure, transitive_predicate};
use crate::config::EntailmentConfig;
use crate::error::EntailmentError;
use crate::hooks::EntailmentHooks;
use crate::record::RuleRecord;
use kgalgebra::term::TriplePattern;
use kgalgebra::{Rule, RuleSet};
use kgeval::{Mapping, MutableEdgeAccessor, QueryEvaluator};
use kgplan::{Plan, Planner};
use kgterm::{BlankNode, Edge, GraphName, Provenance, Term};
use rustc_hash::{FxHashMap, FxHashSet};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// How an entailment run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntailmentStatus {
    /// An iteration derived no new edge: the graph is at fixpoint.
    Settled,
    /// The run stopped after [`EntailmentConfig::max_iterations`] iterations that all derived edges.
    IterationLimitReached,
    /// The run stopped after inserting [`EntailmentConfig::max_inferred_edges`] edges.
    InferenceLimitReached,
    /// The run stopped after [`EntailmentConfig::timeout`].
    TimeoutReached,
}

/// The instantiated head of one constraint rule solution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Violation {
    /// The name of the constraint rule.
    pub rule: String,
    pub edges: Vec<Edge>,
}

/// The outcome of a [`RuleEngine::run`].
///
/// The edges inserted before a cap is reached stay in the accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntailmentReport {
    pub status: EntailmentStatus,
    /// Number of started iterations.
    pub iterations: usize,
    /// Number of inserted edges.
    pub inserted: usize,
    /// One record per rule of the run, in rule order.
    pub rules: Vec<RuleRecord>,
    /// The distinct violations found by the constraint rules.
    pub violations: Vec<Violation>,
}

impl EntailmentReport {
    /// If the run reached a fixpoint.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.status == EntailmentStatus::Settled
    }
}

/// A forward-chaining rule engine.
///
/// A run applies every rule of the set to the accessor and inserts the derived edges until an
/// iteration derives no new edge. The rules of one iteration all see the graph as it was at
/// the start of the iteration: derived edges are buffered and written at its end.
///
/// ```
/// use kgreason::{EntailmentStatus, RuleEngine};
/// use kgterm::vocab::{rdf, rdfs};
/// use kgterm::{Edge, Graph, GraphName, NamedNode};
///
/// let ex = |name: &str| NamedNode::new_unchecked(format!("http://example.com/{name}"));
/// let mut graph = Graph::from_iter([
///     Edge::new(ex("Cat"), rdfs::SUB_CLASS_OF, ex("Mammal"), GraphName::DefaultGraph),
///     Edge::new(ex("Mammal"), rdfs::SUB_CLASS_OF, ex("Animal"), GraphName::DefaultGraph),
///     Edge::new(ex("tom"), rdf::TYPE, ex("Cat"), GraphName::DefaultGraph),
/// ]);
/// let report = RuleEngine::new(kgreason::rdfs::rules()).run(&mut graph)?;
/// assert_eq!(report.status, EntailmentStatus::Settled);
/// assert!(graph.contains(&Edge::new(ex("tom"), rdf::TYPE, ex("Animal"), GraphName::DefaultGraph)));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug)]
pub struct RuleEngine<A> {
    rules: RuleSet,
    config: EntailmentConfig,
    hooks: EntailmentHooks<A>,
    evaluator: QueryEvaluator,
}

impl<A> RuleEngine<A> {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            config: EntailmentConfig::default(),
            hooks: EntailmentHooks::default(),
            evaluator: QueryEvaluator::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EntailmentConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: EntailmentHooks<A>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets the evaluator of the rule bodies, for example to bound each evaluation with
    /// [`EvaluationLimits`](kgeval::EvaluationLimits).
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: QueryEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    #[inline]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    #[inline]
    pub fn config(&self) -> &EntailmentConfig {
        &self.config
    }
}

impl<A: MutableEdgeAccessor> RuleEngine<A> {
    /// Applies the rules until fixpoint or until a configured cap is reached.
    pub fn run(&mut self, accessor: &mut A) -> Result<EntailmentReport, EntailmentError> {
        let start = Instant::now();
        let mut rules = self.rules.clone();
        self.hooks.prepare_entailment(accessor, &mut rules)?;
        let plans = rules
            .iter()
            .map(|rule| {
                let plan = Planner::build_plan(&rule.body);
                debug!(rule = %rule.name, %plan, "rule plan");
                plan
            })
            .collect::<Vec<_>>();
        let mut records = rules.iter().map(RuleRecord::new).collect::<Vec<_>>();
        self.hooks.before_entailment(accessor)?;

        let mut state = RunState::default();
        let status = loop {
            if state.iterations >= self.config.max_iterations {
                warn!(
                    max_iterations = self.config.max_iterations,
                    "entailment stopped before fixpoint"
                );
                break EntailmentStatus::IterationLimitReached;
            }
            state.iterations += 1;
            self.hooks.loop_entailment(accessor, state.iterations)?;
            let mut interrupted = None;
            let mut buffer = Vec::new();
            let mut buffered = FxHashSet::default();
            for ((rule, plan), record) in rules.iter().zip(&plans).zip(&mut records) {
                if self.is_timed_out(start) {
                    warn!(timeout = ?self.config.timeout, "entailment timed out");
                    interrupted = Some(EntailmentStatus::TimeoutReached);
                    break;
                }
                if self.config.optimize && !record.must_run(&state.changes) {
                    trace!(rule = %rule.name, "rule inputs unchanged");
                    record.skipped += 1;
                    continue;
                }
                let produced =
                    self.apply_rule(accessor, rule, plan, record, &mut state, &mut buffered)?;
                if !rule.is_constraint() {
                    buffer.extend(produced);
                }
            }
            if let Some(max) = self.config.max_inferred_edges {
                let room = max.saturating_sub(state.inserted);
                if buffer.len() > room {
                    warn!(max_inferred_edges = max, "entailment stopped before fixpoint");
                    buffer.truncate(room);
                    interrupted = Some(EntailmentStatus::InferenceLimitReached);
                }
            }
            if !buffer.is_empty() {
                self.insert(accessor, &buffer, &mut state)?;
            }
            if let Some(status) = interrupted {
                break status;
            }
            if buffer.is_empty() {
                break EntailmentStatus::Settled;
            }
        };

        let report = EntailmentReport {
            status,
            iterations: state.iterations,
            inserted: state.inserted,
            rules: records,
            violations: state.violations,
        };
        info!(
            status = ?report.status,
            iterations = report.iterations,
            inserted = report.inserted,
            violations = report.violations.len(),
            "entailment finished"
        );
        self.hooks.after_entailment(accessor, &report)?;
        Ok(report)
    }

    /// Removes every derived edge from the accessor and returns them.
    ///
    /// The removal is reported to the `update` hook as one batch of deletions.
    pub fn remove_entailments(&mut self, accessor: &mut A) -> Result<Vec<Edge>, EntailmentError> {
        let mut removed = Vec::new();
        for edge in accessor.edges_for_pattern(None, None, None, None) {
            let edge = edge.map_err(EntailmentError::dataset)?;
            if edge.is_derived() {
                removed.push(edge);
            }
        }
        self.hooks.write(accessor, &removed, &[], |accessor| {
            for edge in &removed {
                accessor.remove(edge).map_err(EntailmentError::dataset)?;
            }
            Ok(())
        })?;
        debug!(removed = removed.len(), "entailments removed");
        Ok(removed)
    }

    /// Evaluates one rule and returns the new edges it proposes.
    ///
    /// For constraints, the new violations are recorded and their edges returned.
    fn apply_rule(
        &mut self,
        accessor: &A,
        rule: &Rule,
        plan: &Plan,
        record: &mut RuleRecord,
        state: &mut RunState,
        buffered: &mut FxHashSet<Edge>,
    ) -> Result<Vec<Edge>, EntailmentError> {
        self.hooks.before_rule(accessor, rule)?;
        let start = Instant::now();
        let mut produced = Vec::new();
        let mut propose = |edge: Edge, produced: &mut Vec<Edge>| -> Result<(), EntailmentError> {
            if buffered.contains(&edge)
                || accessor.contains(&edge).map_err(EntailmentError::dataset)?
            {
                return Ok(());
            }
            buffered.insert(edge.clone());
            produced.push(edge);
            Ok(())
        };
        let transitive = transitive_predicate(rule).filter(|_| self.config.optimize);
        let solutions = if let Some(predicate) = transitive {
            let pairs = closure(accessor, predicate).map_err(EntailmentError::dataset)?;
            let solutions = pairs.len();
            for (subject, object) in pairs {
                let edge = Edge::new(
                    subject,
                    predicate.clone(),
                    object,
                    self.config.target_graph.clone(),
                );
                propose(edge.with_provenance(Provenance::Derived), &mut produced)?;
            }
            solutions
        } else {
            let solutions = self.evaluator.evaluate(accessor, plan)?;
            for solution in &solutions {
                let Some(edges) = instantiate(&rule.head, solution, &self.config.target_graph)
                else {
                    trace!(rule = %rule.name, %solution, "unbound head variable");
                    continue;
                };
                if rule.is_constraint() {
                    let violation = Violation {
                        rule: rule.name.clone(),
                        edges,
                    };
                    if state.seen_violations.insert(violation.clone()) {
                        produced.extend(violation.edges.iter().cloned());
                        state.violations.push(violation);
                    }
                    continue;
                }
                for edge in edges {
                    propose(edge, &mut produced)?;
                }
            }
            solutions.len()
        };
        debug!(
            rule = %rule.name,
            iteration = state.iterations,
            solutions,
            produced = produced.len(),
            closure = transitive.is_some(),
            elapsed = ?start.elapsed(),
            "rule applied"
        );
        record.ran(state.iterations, solutions, produced.len(), start.elapsed());
        self.hooks.after_rule(accessor, rule, &produced)?;
        Ok(produced)
    }

    fn insert(
        &mut self,
        accessor: &mut A,
        edges: &[Edge],
        state: &mut RunState,
    ) -> Result<(), EntailmentError> {
        let mut inserted = 0;
        self.hooks.write(accessor, &[], edges, |accessor| {
            for edge in edges {
                if accessor.insert(edge.clone()).map_err(EntailmentError::dataset)? {
                    inserted += 1;
                }
            }
            Ok(())
        })?;
        for edge in edges {
            state.changes.insert(edge.predicate.clone(), state.iterations);
        }
        state.inserted += inserted;
        Ok(())
    }

    fn is_timed_out(&self, start: Instant) -> bool {
        self.config
            .timeout
            .is_some_and(|timeout| start.elapsed() >= timeout)
    }
}

#[derive(Default)]
struct RunState {
    iterations: usize,
    inserted: usize,
    /// The last iteration each predicate received new edges in.
    changes: FxHashMap<Term, usize>,
    violations: Vec<Violation>,
    seen_violations: FxHashSet<Violation>,
}

/// Instantiates the head templates with a solution.
///
/// Returns `None` if a head variable is unbound. Edges that are not valid RDF are dropped.
fn instantiate(
    head: &[TriplePattern],
    solution: &Mapping,
    graph_name: &GraphName,
) -> Option<Vec<Edge>> {
    let mut blank_nodes = FxHashMap::default();
    let mut edges = Vec::with_capacity(head.len());
    for triple in head {
        let subject = resolve(&triple.subject, solution, &mut blank_nodes)?;
        let predicate = resolve(&triple.predicate, solution, &mut blank_nodes)?;
        let object = resolve(&triple.object, solution, &mut blank_nodes)?;
        let edge = Edge::new(subject, predicate, object, graph_name.clone())
            .with_provenance(Provenance::Derived);
        if edge.is_valid() {
            edges.push(edge);
        }
    }
    Some(edges)
}

fn resolve<'a>(
    term: &'a Term,
    solution: &Mapping,
    blank_nodes: &mut FxHashMap<&'a BlankNode, BlankNode>,
) -> Option<Term> {
    match term {
        Term::Variable(variable) => solution.get(variable).cloned(),
        Term::BlankNode(blank_node) => Some(blank_nodes.entry(blank_node).or_default().clone().into()),
        _ => Some(term.clone()),
    }
}
