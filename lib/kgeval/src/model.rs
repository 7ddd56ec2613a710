use kgterm::{Term, Variable};
use std::fmt;
use std::ops::Index;

/// One solution: a partial function from variables to terms.
///
/// Solutions of a grouped query also carry the members of their group.
///
/// ```
/// use kgeval::Mapping;
/// use kgterm::{Literal, Variable};
///
/// let mapping = Mapping::from_iter([(Variable::new("x")?, Literal::from(1).into())]);
/// assert_eq!(mapping["x"], Literal::from(1).into());
/// assert!(mapping.get(&Variable::new("y")?).is_none());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Mapping {
    bindings: Vec<(Variable, Term)>,
    group: Vec<Mapping>,
}

impl Mapping {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The value of a variable, if bound.
    #[inline]
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        self.bindings
            .iter()
            .find_map(|(v, t)| (v == variable).then_some(t))
    }

    #[inline]
    pub fn contains(&self, variable: &Variable) -> bool {
        self.get(variable).is_some()
    }

    /// The bound variables, in binding order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.bindings.iter().map(|(v, _)| v)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.bindings.iter().map(|(v, t)| (v, t))
    }

    /// Number of bound variables.
    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The solutions this one aggregates, empty if the query is not grouped.
    #[inline]
    pub fn group(&self) -> &[Mapping] {
        &self.group
    }

    /// Binds a variable, it must be unbound.
    #[inline]
    pub(crate) fn bind(&mut self, variable: Variable, value: Term) {
        debug_assert!(!self.contains(&variable), "{variable} is already bound");
        self.bindings.push((variable, value));
    }

    /// Unbinds the variables bound after the mapping had `len` bindings.
    #[inline]
    pub(crate) fn retract(&mut self, len: usize) {
        self.bindings.truncate(len);
    }

    pub(crate) fn set_group(&mut self, group: Vec<Mapping>) {
        self.group = group;
    }

    /// Restriction to the given variables, the group is kept.
    pub(crate) fn project(self, variables: &[Variable]) -> Self {
        let mut bindings = Vec::with_capacity(variables.len());
        for variable in variables {
            if let Some(value) = self.get(variable) {
                bindings.push((variable.clone(), value.clone()));
            }
        }
        Self {
            bindings,
            group: self.group,
        }
    }

    /// The values of the given variables, the key used for grouping and `DISTINCT`.
    pub(crate) fn key(&self, variables: &[Variable]) -> Vec<Option<Term>> {
        variables.iter().map(|v| self.get(v).cloned()).collect()
    }
}

impl FromIterator<(Variable, Term)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (Variable, Term)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (variable, value) in iter {
            if !mapping.contains(&variable) {
                mapping.bind(variable, value);
            }
        }
        mapping
    }
}

impl Index<&str> for Mapping {
    type Output = Term;

    /// Panics if the variable is not bound.
    #[inline]
    fn index(&self, variable: &str) -> &Term {
        self.bindings
            .iter()
            .find_map(|(v, t)| (v.as_str() == variable).then_some(t))
            .unwrap_or_else(|| panic!("The variable ?{variable} is not bound"))
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (variable, value)) in self.bindings.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {variable} = {value}")?;
        }
        f.write_str(" }")
    }
}

/// The ordered solutions of an evaluation.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Mappings {
    variables: Vec<Variable>,
    solutions: Vec<Mapping>,
}

impl Mappings {
    pub fn new(variables: Vec<Variable>, solutions: Vec<Mapping>) -> Self {
        Self {
            variables,
            solutions,
        }
    }

    /// The selected variables.
    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    #[inline]
    pub fn solutions(&self) -> &[Mapping] {
        &self.solutions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Mapping> {
        self.solutions.iter()
    }

    /// The values of one variable, in solution order.
    pub fn values<'a>(&'a self, variable: &'a Variable) -> impl Iterator<Item = Option<&'a Term>> {
        self.solutions.iter().map(move |s| s.get(variable))
    }
}

impl Index<usize> for Mappings {
    type Output = Mapping;

    #[inline]
    fn index(&self, index: usize) -> &Mapping {
        &self.solutions[index]
    }
}

impl IntoIterator for Mappings {
    type Item = Mapping;
    type IntoIter = std::vec::IntoIter<Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.into_iter()
    }
}

impl<'a> IntoIterator for &'a Mappings {
    type Item = &'a Mapping;
    type IntoIter = std::slice::Iter<'a, Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Mappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, variable) in self.variables.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{variable}")?;
        }
        writeln!(f)?;
        for solution in &self.solutions {
            for (i, variable) in self.variables.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                match solution.get(variable) {
                    Some(value) => write!(f, "{value}")?,
                    None => f.write_str("UNDEF")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgterm::Literal;

    #[test]
    fn scoped_bindings() {
        let (x, y) = (Variable::new_unchecked("x"), Variable::new_unchecked("y"));
        let mut mapping = Mapping::new();
        mapping.bind(x.clone(), Literal::from(1).into());
        let len = mapping.len();
        mapping.bind(y.clone(), Literal::from(2).into());
        assert!(mapping.contains(&y));
        mapping.retract(len);
        assert!(!mapping.contains(&y));
        assert_eq!(mapping.get(&x), Some(&Literal::from(1).into()));
    }

    #[test]
    fn projection_keeps_requested_order() {
        let (x, y) = (Variable::new_unchecked("x"), Variable::new_unchecked("y"));
        let mapping = Mapping::from_iter([
            (x.clone(), Literal::from(1).into()),
            (y.clone(), Literal::from(2).into()),
        ]);
        let projected = mapping.project(&[y.clone(), Variable::new_unchecked("z")]);
        assert_eq!(projected.variables().collect::<Vec<_>>(), [&y]);
        assert_eq!(projected.to_string(), "{ ?y = \"2\"^^<http://www.w3.org/2001/XMLSchema#integer> }");
    }
}
