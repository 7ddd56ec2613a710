use kgterm::GraphName;
use std::time::Duration;

/// Configuration of a [`RuleEngine`](crate::RuleEngine).
///
/// ```
/// use kgreason::EntailmentConfig;
/// use kgterm::{GraphName, NamedNode};
///
/// let config = EntailmentConfig {
///     max_iterations: 10,
///     target_graph: GraphName::from(NamedNode::new("http://example.com/inferred")?),
///     ..EntailmentConfig::default()
/// };
/// assert!(config.optimize);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntailmentConfig {
    /// Maximum number of whole rule set iterations of one run.
    pub max_iterations: usize,
    /// Maximum duration of one run (None = unlimited).
    ///
    /// Checked before each rule application.
    pub timeout: Option<Duration>,
    /// Maximum number of edges inserted by one run (None = unlimited).
    pub max_inferred_edges: Option<usize>,
    /// Skips the rules whose body predicates did not receive new edges since their last application,
    /// and applies the transitive rules `?x p ?y . ?y p ?z => ?x p ?z` as one closure computation.
    pub optimize: bool,
    /// The graph derived edges are written to.
    pub target_graph: GraphName,
}

impl Default for EntailmentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            timeout: None,
            max_inferred_edges: None,
            optimize: true,
            target_graph: GraphName::DefaultGraph,
        }
    }
}
