use kgalgebra::Rule;
use kgalgebra::algebra::{Expression, Function};
use kgterm::Term;
use rustc_hash::{FxHashMap, FxHashSet};
use std::time::Duration;

/// What the engine knows about one rule of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRecord {
    /// The rule name.
    pub name: String,
    /// Number of iterations the rule was applied in.
    pub runs: usize,
    /// Number of iterations the rule was skipped in because its inputs did not change.
    pub skipped: usize,
    /// Total number of body solutions.
    pub solutions: usize,
    /// Number of new edges the rule proposed (or violations for a constraint).
    pub produced: usize,
    /// Time spent evaluating the rule over all its runs.
    pub elapsed: Duration,
    /// The constant predicates the body reads, `None` if it may read any predicate.
    predicates: Option<FxHashSet<Term>>,
    last_run: Option<usize>,
}

impl RuleRecord {
    pub(crate) fn new(rule: &Rule) -> Self {
        Self {
            name: rule.name.clone(),
            runs: 0,
            skipped: 0,
            solutions: 0,
            produced: 0,
            elapsed: Duration::ZERO,
            predicates: body_predicates(rule),
            last_run: None,
        }
    }

    /// If the rule must be applied again, given the iteration each predicate last received new
    /// edges in.
    pub(crate) fn must_run(&self, changes: &FxHashMap<Term, usize>) -> bool {
        let Some(last_run) = self.last_run else {
            return true;
        };
        let Some(predicates) = &self.predicates else {
            return true;
        };
        predicates
            .iter()
            .any(|p| changes.get(p).is_some_and(|changed| *changed >= last_run))
    }

    pub(crate) fn ran(
        &mut self,
        iteration: usize,
        solutions: usize,
        produced: usize,
        elapsed: Duration,
    ) {
        self.last_run = Some(iteration);
        self.runs += 1;
        self.solutions += solutions;
        self.produced += produced;
        self.elapsed += elapsed;
    }
}

fn body_predicates(rule: &Rule) -> Option<FxHashSet<Term>> {
    let mut predicates = FxHashSet::default();
    let mut any = false;
    for pattern in &rule.body {
        pattern.on_triple_pattern(|triple| {
            if triple.predicate.is_variable() {
                any = true;
            } else {
                predicates.insert(triple.predicate.clone());
            }
        });
        pattern.on_function_call(|function, args| {
            if *function != Function::IsTransitive {
                return;
            }
            match args.get(1) {
                Some(Expression::NamedNode(predicate)) => {
                    predicates.insert(predicate.clone().into());
                }
                _ => any = true,
            }
        });
    }
    (!any).then_some(predicates)
}
