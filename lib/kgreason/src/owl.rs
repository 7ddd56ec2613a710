//! OWL 2 RL property rules: prp-symp, prp-trp, prp-inv1 and prp-inv2.

use kgalgebra::algebra::GraphPattern;
use kgalgebra::term::TriplePattern;
use kgalgebra::{Rule, RuleSet};
use kgterm::Variable;
use kgterm::vocab::{owl, rdf};

/// The rules for symmetric, transitive and inverse properties.
pub fn rules() -> RuleSet {
    let [x, y, z, p, q] = ["x", "y", "z", "p", "q"].map(Variable::new_unchecked);
    [
        Rule::new(
            "prp-symp",
            vec![TriplePattern::new(y.clone(), p.clone(), x.clone())],
            vec![
                GraphPattern::edge(p.clone(), rdf::TYPE, owl::SYMMETRIC_PROPERTY),
                GraphPattern::edge(x.clone(), p.clone(), y.clone()),
            ],
        ),
        Rule::new(
            "prp-trp",
            vec![TriplePattern::new(x.clone(), p.clone(), z.clone())],
            vec![
                GraphPattern::edge(p.clone(), rdf::TYPE, owl::TRANSITIVE_PROPERTY),
                GraphPattern::edge(x.clone(), p.clone(), y.clone()),
                GraphPattern::edge(y.clone(), p.clone(), z),
            ],
        ),
        Rule::new(
            "prp-inv1",
            vec![TriplePattern::new(y.clone(), q.clone(), x.clone())],
            vec![
                GraphPattern::edge(p.clone(), owl::INVERSE_OF, q.clone()),
                GraphPattern::edge(x.clone(), p.clone(), y.clone()),
            ],
        ),
        Rule::new(
            "prp-inv2",
            vec![TriplePattern::new(y.clone(), p.clone(), x.clone())],
            vec![
                GraphPattern::edge(p, owl::INVERSE_OF, q.clone()),
                GraphPattern::edge(x, q, y),
            ],
        ),
    ]
    .into_iter()
    .collect()
}
