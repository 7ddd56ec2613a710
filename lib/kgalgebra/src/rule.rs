use crate::algebra::*;
use crate::term::*;
use std::fmt;

/// What the solutions of a rule body produce.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum RuleKind {
    /// The instantiated head edges are added to the graph.
    #[default]
    Inference,
    /// The instantiated head edges are reported as violations and never added.
    Constraint,
}

/// An if/then rule: every solution of `body` instantiates the `head` templates.
///
/// ```
/// use kgalgebra::algebra::GraphPattern;
/// use kgalgebra::term::TriplePattern;
/// use kgalgebra::Rule;
/// use kgterm::vocab::rdfs;
/// use kgterm::Variable;
///
/// let (c, d, x) = (Variable::new("c")?, Variable::new("d")?, Variable::new("x")?);
/// let rule = Rule::new(
///     "subclass",
///     vec![TriplePattern::new(x.clone(), rdfs::SUB_CLASS_OF, d.clone())],
///     vec![
///         GraphPattern::edge(x, rdfs::SUB_CLASS_OF, c.clone()),
///         GraphPattern::edge(c, rdfs::SUB_CLASS_OF, d),
///     ],
/// );
/// assert_eq!(rule.head_predicates().count(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Rule {
    /// A name unique in its rule set, used in logs and reports.
    pub name: String,
    /// The construction template.
    pub head: Vec<TriplePattern>,
    /// The rule body group.
    pub body: Vec<GraphPattern>,
    pub kind: RuleKind,
}

impl Rule {
    pub fn new(name: impl Into<String>, head: Vec<TriplePattern>, body: Vec<GraphPattern>) -> Self {
        Self {
            name: name.into(),
            head,
            body,
            kind: RuleKind::Inference,
        }
    }

    /// A rule whose solutions are violations.
    pub fn constraint(
        name: impl Into<String>,
        head: Vec<TriplePattern>,
        body: Vec<GraphPattern>,
    ) -> Self {
        Self {
            kind: RuleKind::Constraint,
            ..Self::new(name, head, body)
        }
    }

    pub fn is_constraint(&self) -> bool {
        self.kind == RuleKind::Constraint
    }

    /// The constant predicates of the head templates.
    pub fn head_predicates(&self) -> impl Iterator<Item = &Term> {
        self.head
            .iter()
            .map(|t| &t.predicate)
            .filter(|p| !p.is_variable())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constraint() {
            f.write_str("CONSTRAINT ")?;
        }
        write!(f, "{}: IF {} THEN {{ ", self.name, GroupDisplay(&self.body))?;
        for triple in &self.head {
            write!(f, "{triple} . ")?;
        }
        f.write_str("}")
    }
}

/// An ordered set of rules.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in &self.rules {
            writeln!(f, "{r} ;")?;
        }
        Ok(())
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl Extend<Rule> for RuleSet {
    fn extend<I: IntoIterator<Item = Rule>>(&mut self, iter: I) {
        self.rules.extend(iter);
    }
}

impl IntoIterator for RuleSet {
    type Item = Rule;
    type IntoIter = std::vec::IntoIter<Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let x = Variable::new_unchecked("x");
        let p = NamedNode::new_unchecked("http://example.com/p");
        let rule = Rule::constraint(
            "no-self-loop",
            vec![TriplePattern::new(x.clone(), p.clone(), x.clone())],
            vec![GraphPattern::edge(x.clone(), p, x)],
        );
        assert_eq!(
            rule.to_string(),
            "CONSTRAINT no-self-loop: IF { ?x <http://example.com/p> ?x . } THEN { ?x <http://example.com/p> ?x . }"
        );
        let set = [rule].into_iter().collect::<RuleSet>();
        assert_eq!(set.len(), 1);
    }
}
