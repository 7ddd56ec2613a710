//! Join typing and join cost of two evaluable patterns.

use kgalgebra::term::{Term, TriplePattern, Variable};
use std::fmt;

/// The cost of a join that cannot be ranked. Such joins are evaluated last.
pub const MAX_COST: f64 = f64::MAX;

/// Weight of a join touching a `GRAPH` block, per shared variable.
pub const GRAPH_JOIN_WEIGHT: f64 = 1.0 / 3.0;

/// A position in a triple pattern.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Position {
    Subject,
    Predicate,
    Object,
}

impl Position {
    fn of(self, pattern: &TriplePattern) -> &Term {
        match self {
            Self::Subject => &pattern.subject,
            Self::Predicate => &pattern.predicate,
            Self::Object => &pattern.object,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Subject => "S",
            Self::Predicate => "P",
            Self::Object => "O",
        })
    }
}

/// The positional overlaps a join can be ranked by, most selective first.
///
/// The first entry is ranked `6` and the last one `1`.
pub const JOIN_PATTERNS: [(Position, Position); 6] = [
    (Position::Predicate, Position::Object),
    (Position::Subject, Position::Predicate),
    (Position::Subject, Position::Object),
    (Position::Object, Position::Object),
    (Position::Subject, Position::Subject),
    (Position::Predicate, Position::Predicate),
];

/// The structural classification of a join edge.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum JoinType {
    /// Two edge patterns sharing a variable at the given positions of the first and second pattern.
    Ranked {
        left: Position,
        right: Position,
        rank: u8,
    },
    /// Two edge patterns whose shared variables match none of the [`JOIN_PATTERNS`].
    Unranked,
    /// At least one side is a `GRAPH` block.
    Graph,
}

impl JoinType {
    /// The numeric rank, `-1` when the join cannot be ranked.
    pub fn rank(self) -> i8 {
        match self {
            // the rank never exceeds 6
            Self::Ranked { rank, .. } => rank.try_into().unwrap_or(i8::MAX),
            Self::Unranked => -1,
            Self::Graph => 0,
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ranked { left, right, rank } => write!(f, "({left},{right})={rank}"),
            Self::Unranked => f.write_str("-1"),
            Self::Graph => f.write_str("graph"),
        }
    }
}

/// Classifies the join between `left`, declared first, and `right`.
///
/// The [`JOIN_PATTERNS`] are tried in order and the first one where `left` and `right`
/// hold the same variable wins, even if a later one would also match. Only
/// `shared` variables are considered.
///
/// Positions are read from the declared-first side only, so the classification depends on
/// declaration order: `?c :label ?l` declared before `?x :type ?c` is `(S,O)=4`, while the
/// reverse order matches no pair and is unranked.
pub fn join_type(left: &TriplePattern, right: &TriplePattern, shared: &[Variable]) -> JoinType {
    for ((left_position, right_position), rank) in JOIN_PATTERNS.into_iter().zip((1..=6).rev()) {
        if let Term::Variable(v) = left_position.of(left) {
            if right_position.of(right) == left_position.of(left) && shared.contains(v) {
                return JoinType::Ranked {
                    left: left_position,
                    right: right_position,
                    rank,
                };
            }
        }
    }
    JoinType::Unranked
}

/// The cost of a join edge, lower is evaluated earlier.
///
/// * `GRAPH` joins cost a third per shared variable.
/// * Edge joins cost `1/rank × 1/shared`, or [`MAX_COST`] if unranked or nothing is shared.
pub fn join_cost(join_type: JoinType, shared_count: usize) -> f64 {
    // a handful of variables at most
    let shared = f64::from(u32::try_from(shared_count).unwrap_or(u32::MAX));
    match join_type {
        JoinType::Graph => GRAPH_JOIN_WEIGHT * shared,
        JoinType::Ranked { rank, .. } if shared_count > 0 => 1. / f64::from(rank) * (1. / shared),
        JoinType::Ranked { .. } | JoinType::Unranked => MAX_COST,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgterm::NamedNode;

    fn var(name: &str) -> Term {
        Variable::new_unchecked(name).into()
    }

    fn iri(name: &str) -> Term {
        NamedNode::new_unchecked(format!("http://example.com/{name}")).into()
    }

    fn shared(names: &[&str]) -> Vec<Variable> {
        names.iter().map(|n| Variable::new_unchecked(*n)).collect()
    }

    #[test]
    fn subject_subject_join() {
        let p1 = TriplePattern::new(var("x"), iri("type"), var("c"));
        let p2 = TriplePattern::new(var("x"), iri("name"), var("n"));
        let join = join_type(&p1, &p2, &shared(&["x"]));
        assert_eq!(join.rank(), 2);
        assert!((join_cost(join, 1) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn object_subject_join_is_unranked() {
        let p1 = TriplePattern::new(var("x"), iri("type"), var("c"));
        let p3 = TriplePattern::new(var("c"), iri("label"), var("l"));
        let join = join_type(&p1, &p3, &shared(&["c"]));
        assert_eq!(join, JoinType::Unranked);
        assert_eq!(join_cost(join, 1).total_cmp(&MAX_COST), std::cmp::Ordering::Equal);
    }

    #[test]
    fn first_listed_overlap_wins() {
        // ?a ?p ?b / ?a ?b ?p: (P,O) is listed before (S,S) and (S,P)
        let left = TriplePattern::new(var("a"), var("p"), var("b"));
        let right = TriplePattern::new(var("a"), var("b"), var("p"));
        let join = join_type(&left, &right, &shared(&["a", "b", "p"]));
        assert_eq!(
            join,
            JoinType::Ranked {
                left: Position::Predicate,
                right: Position::Object,
                rank: 6
            }
        );
        assert!((join_cost(join, 3) - 1. / 18.).abs() < f64::EPSILON);
    }

    #[test]
    fn bound_variables_are_not_joined_on() {
        let p1 = TriplePattern::new(var("x"), iri("type"), var("c"));
        let p2 = TriplePattern::new(var("x"), iri("name"), var("n"));
        assert_eq!(join_type(&p1, &p2, &[]), JoinType::Unranked);
    }

    #[test]
    fn graph_join() {
        assert!((join_cost(JoinType::Graph, 2) - 2. / 3.).abs() < f64::EPSILON);
    }
}
