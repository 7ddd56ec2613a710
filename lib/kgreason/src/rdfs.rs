//! The [RDFS entailment rules](https://www.w3.org/TR/rdf11-mt/#patterns-of-rdfs-entailment-informative)
//! about domains, ranges and the class and property hierarchies.

use kgalgebra::algebra::GraphPattern;
use kgalgebra::term::TriplePattern;
use kgalgebra::{Rule, RuleSet};
use kgterm::Variable;
use kgterm::vocab::{rdf, rdfs};

/// The rules rdfs2, rdfs3, rdfs5, rdfs7, rdfs9 and rdfs11.
///
/// ```
/// let rules = kgreason::rdfs::rules();
/// assert_eq!(rules.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), [
///     "rdfs2", "rdfs3", "rdfs5", "rdfs7", "rdfs9", "rdfs11"
/// ]);
/// ```
pub fn rules() -> RuleSet {
    let [x, y, z, p, q, c, d] = ["x", "y", "z", "p", "q", "c", "d"].map(Variable::new_unchecked);
    [
        Rule::new(
            "rdfs2",
            vec![TriplePattern::new(x.clone(), rdf::TYPE, c.clone())],
            vec![
                GraphPattern::edge(p.clone(), rdfs::DOMAIN, c.clone()),
                GraphPattern::edge(x.clone(), p.clone(), y.clone()),
            ],
        ),
        Rule::new(
            "rdfs3",
            vec![TriplePattern::new(y.clone(), rdf::TYPE, c.clone())],
            vec![
                GraphPattern::edge(p.clone(), rdfs::RANGE, c.clone()),
                GraphPattern::edge(x.clone(), p.clone(), y.clone()),
            ],
        ),
        Rule::new(
            "rdfs5",
            vec![TriplePattern::new(p.clone(), rdfs::SUB_PROPERTY_OF, z.clone())],
            vec![
                GraphPattern::edge(p.clone(), rdfs::SUB_PROPERTY_OF, q.clone()),
                GraphPattern::edge(q.clone(), rdfs::SUB_PROPERTY_OF, z.clone()),
            ],
        ),
        Rule::new(
            "rdfs7",
            vec![TriplePattern::new(x.clone(), q.clone(), y.clone())],
            vec![
                GraphPattern::edge(p.clone(), rdfs::SUB_PROPERTY_OF, q.clone()),
                GraphPattern::edge(x.clone(), p, y),
            ],
        ),
        Rule::new(
            "rdfs9",
            vec![TriplePattern::new(x.clone(), rdf::TYPE, d.clone())],
            vec![
                GraphPattern::edge(c.clone(), rdfs::SUB_CLASS_OF, d.clone()),
                GraphPattern::edge(x, rdf::TYPE, c.clone()),
            ],
        ),
        Rule::new(
            "rdfs11",
            vec![TriplePattern::new(c.clone(), rdfs::SUB_CLASS_OF, z.clone())],
            vec![
                GraphPattern::edge(c, rdfs::SUB_CLASS_OF, d.clone()),
                GraphPattern::edge(d, rdfs::SUB_CLASS_OF, z),
            ],
        ),
    ]
    .into_iter()
    .collect()
}
