//! Values of expressions, with the operators and built-in functions working on them.

use kgalgebra::algebra::Function;
use kgterm::vocab::{rdf, xsd};
use kgterm::{BlankNode, Literal, NamedNode, Term};
use oxsdatatypes::{Boolean, Decimal, Double, Float, Integer};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

const REGEX_SIZE_LIMIT: usize = 1_000_000;
const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

/// A term as understood by the expression evaluator: literals of the known datatypes are parsed.
#[derive(Debug, Clone)]
pub enum ExpressionTerm {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    StringLiteral(String),
    LangStringLiteral { value: String, language: String },
    BooleanLiteral(Boolean),
    IntegerLiteral(Integer),
    DecimalLiteral(Decimal),
    FloatLiteral(Float),
    DoubleLiteral(Double),
    OtherTypedLiteral { value: String, datatype: NamedNode },
}

/// What makes two terms the same term. Floating point values are compared bitwise.
#[derive(PartialEq, Eq, Hash)]
enum Identity<'a> {
    NamedNode(&'a str),
    BlankNode(&'a str),
    String(&'a str),
    LangString(&'a str, &'a str),
    Boolean(bool),
    Integer(Integer),
    Decimal(Decimal),
    Float([u8; 4]),
    Double([u8; 8]),
    Other(&'a str, &'a str),
}

impl ExpressionTerm {
    fn identity(&self) -> Identity<'_> {
        match self {
            Self::NamedNode(node) => Identity::NamedNode(node.as_str()),
            Self::BlankNode(node) => Identity::BlankNode(node.as_str()),
            Self::StringLiteral(value) => Identity::String(value),
            Self::LangStringLiteral { value, language } => Identity::LangString(value, language),
            Self::BooleanLiteral(value) => Identity::Boolean((*value).into()),
            Self::IntegerLiteral(value) => Identity::Integer(*value),
            Self::DecimalLiteral(value) => Identity::Decimal(*value),
            Self::FloatLiteral(value) => Identity::Float(value.to_be_bytes()),
            Self::DoubleLiteral(value) => Identity::Double(value.to_be_bytes()),
            Self::OtherTypedLiteral { value, datatype } => Identity::Other(value, datatype.as_str()),
        }
    }

    /// Parses the lexical form of the XSD datatypes the operators know about.
    fn typed(value: String, datatype: NamedNode) -> Self {
        let parsed = datatype
            .as_str()
            .strip_prefix(XSD_NAMESPACE)
            .and_then(|local| match local {
                "string" => Some(Self::StringLiteral(value.clone())),
                "boolean" => value.parse().ok().map(Self::BooleanLiteral),
                "decimal" => value.parse().ok().map(Self::DecimalLiteral),
                "float" => value.parse().ok().map(Self::FloatLiteral),
                "double" => value.parse().ok().map(Self::DoubleLiteral),
                "integer" | "long" | "int" | "short" | "byte" | "unsignedLong" | "unsignedInt"
                | "unsignedShort" | "unsignedByte" | "positiveInteger" | "negativeInteger"
                | "nonPositiveInteger" | "nonNegativeInteger" => {
                    value.parse().ok().map(Self::IntegerLiteral)
                }
                _ => None,
            });
        parsed.unwrap_or(Self::OtherTypedLiteral { value, datatype })
    }

    /// Computes the term [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv).
    pub fn effective_boolean_value(&self) -> Option<bool> {
        match self {
            Self::BooleanLiteral(value) => Some((*value).into()),
            Self::StringLiteral(value) => Some(!value.is_empty()),
            _ => Some(Boolean::from(self.numeric()?.to_double()).into()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric().is_some()
    }

    pub(crate) fn numeric(&self) -> Option<Numeric> {
        Some(match self {
            Self::IntegerLiteral(value) => Numeric::Integer(*value),
            Self::DecimalLiteral(value) => Numeric::Decimal(*value),
            Self::FloatLiteral(value) => Numeric::Float(*value),
            Self::DoubleLiteral(value) => Numeric::Double(*value),
            _ => return None,
        })
    }

    /// Rank of the term kind in the `ORDER BY` ordering.
    fn order_rank(&self) -> u8 {
        match self {
            Self::BlankNode(_) => 0,
            Self::NamedNode(_) => 1,
            Self::IntegerLiteral(_)
            | Self::DecimalLiteral(_)
            | Self::FloatLiteral(_)
            | Self::DoubleLiteral(_) => 2,
            Self::BooleanLiteral(_) => 3,
            Self::StringLiteral(_) => 4,
            Self::LangStringLiteral { .. } => 5,
            Self::OtherTypedLiteral { .. } => 6,
        }
    }
}

impl PartialEq for ExpressionTerm {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for ExpressionTerm {}

impl Hash for ExpressionTerm {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl TryFrom<Term> for ExpressionTerm {
    type Error = Term;

    /// Variables are not values and are given back.
    #[inline]
    fn try_from(term: Term) -> Result<Self, Term> {
        match term {
            Term::NamedNode(node) => Ok(Self::NamedNode(node)),
            Term::BlankNode(node) => Ok(Self::BlankNode(node)),
            Term::Literal(literal) => Ok(literal.into()),
            Term::Variable(_) => Err(term),
        }
    }
}

impl From<Literal> for ExpressionTerm {
    fn from(literal: Literal) -> Self {
        match literal.destruct() {
            (value, _, Some(language)) => Self::LangStringLiteral { value, language },
            (value, Some(datatype), None) => Self::typed(value, datatype),
            (value, None, None) => Self::StringLiteral(value),
        }
    }
}

impl From<ExpressionTerm> for Term {
    fn from(term: ExpressionTerm) -> Self {
        let (lexical, datatype) = match term {
            ExpressionTerm::NamedNode(node) => return node.into(),
            ExpressionTerm::BlankNode(node) => return node.into(),
            ExpressionTerm::StringLiteral(value) => {
                return Literal::new_simple_literal(value).into();
            }
            ExpressionTerm::LangStringLiteral { value, language } => {
                return Literal::new_language_tagged_literal_unchecked(value, language).into();
            }
            ExpressionTerm::OtherTypedLiteral { value, datatype } => {
                return Literal::new_typed_literal(value, datatype).into();
            }
            ExpressionTerm::BooleanLiteral(value) => (value.to_string(), xsd::BOOLEAN),
            ExpressionTerm::IntegerLiteral(value) => (value.to_string(), xsd::INTEGER),
            ExpressionTerm::DecimalLiteral(value) => (value.to_string(), xsd::DECIMAL),
            ExpressionTerm::FloatLiteral(value) => (value.to_string(), xsd::FLOAT),
            ExpressionTerm::DoubleLiteral(value) => (value.to_string(), xsd::DOUBLE),
        };
        Literal::new_typed_literal(lexical, datatype).into()
    }
}

impl From<NamedNode> for ExpressionTerm {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<bool> for ExpressionTerm {
    #[inline]
    fn from(value: bool) -> Self {
        Self::BooleanLiteral(value.into())
    }
}

/// A number, in the promotion chain `integer < decimal < float < double`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Numeric {
    Integer(Integer),
    Decimal(Decimal),
    Float(Float),
    Double(Double),
}

impl Numeric {
    fn into_term(self) -> ExpressionTerm {
        match self {
            Self::Integer(value) => ExpressionTerm::IntegerLiteral(value),
            Self::Decimal(value) => ExpressionTerm::DecimalLiteral(value),
            Self::Float(value) => ExpressionTerm::FloatLiteral(value),
            Self::Double(value) => ExpressionTerm::DoubleLiteral(value),
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::Integer(_) => 0,
            Self::Decimal(_) => 1,
            Self::Float(_) => 2,
            Self::Double(_) => 3,
        }
    }

    /// Converts to the type of the given rank, never to a narrower one.
    fn promote(self, rank: u8) -> Option<Self> {
        Some(match (self, rank) {
            (value, rank) if value.rank() == rank => value,
            (Self::Integer(v), 1) => Self::Decimal(v.into()),
            (Self::Integer(v), 2) => Self::Float(v.into()),
            (Self::Decimal(v), 2) => Self::Float(v.into()),
            (Self::Integer(v), 3) => Self::Double(v.into()),
            (Self::Decimal(v), 3) => Self::Double(v.into()),
            (Self::Float(v), 3) => Self::Double(v.into()),
            _ => return None,
        })
    }

    fn to_double(self) -> Double {
        match self {
            Self::Integer(v) => v.into(),
            Self::Decimal(v) => v.into(),
            Self::Float(v) => v.into(),
            Self::Double(v) => v,
        }
    }
}

/// Compares two numbers after promoting them to their common type.
fn compare_numbers(a: Numeric, b: Numeric) -> Option<Ordering> {
    let rank = a.rank().max(b.rank());
    match (a.promote(rank)?, b.promote(rank)?) {
        (Numeric::Integer(a), Numeric::Integer(b)) => Some(a.cmp(&b)),
        (Numeric::Decimal(a), Numeric::Decimal(b)) => Some(a.cmp(&b)),
        (Numeric::Float(a), Numeric::Float(b)) => a.partial_cmp(&b),
        (Numeric::Double(a), Numeric::Double(b)) => a.partial_cmp(&b),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Numeric arithmetic, `None` on a non-numeric operand, an overflow or an exact division by zero.
///
/// Dividing two integers gives a decimal.
pub(crate) fn arithmetic(
    operator: Operator,
    a: &ExpressionTerm,
    b: &ExpressionTerm,
) -> Option<ExpressionTerm> {
    let (a, b) = (a.numeric()?, b.numeric()?);
    let mut rank = a.rank().max(b.rank());
    if operator == Operator::Divide {
        rank = rank.max(1);
    }
    let result = match (a.promote(rank)?, b.promote(rank)?) {
        (Numeric::Integer(a), Numeric::Integer(b)) => Numeric::Integer(match operator {
            Operator::Add => a.checked_add(b),
            Operator::Subtract => a.checked_sub(b),
            Operator::Multiply => a.checked_mul(b),
            Operator::Divide => None,
        }?),
        (Numeric::Decimal(a), Numeric::Decimal(b)) => Numeric::Decimal(match operator {
            Operator::Add => a.checked_add(b),
            Operator::Subtract => a.checked_sub(b),
            Operator::Multiply => a.checked_mul(b),
            Operator::Divide => a.checked_div(b),
        }?),
        (Numeric::Float(a), Numeric::Float(b)) => Numeric::Float(match operator {
            Operator::Add => a + b,
            Operator::Subtract => a - b,
            Operator::Multiply => a * b,
            Operator::Divide => a / b,
        }),
        (Numeric::Double(a), Numeric::Double(b)) => Numeric::Double(match operator {
            Operator::Add => a + b,
            Operator::Subtract => a - b,
            Operator::Multiply => a * b,
            Operator::Divide => a / b,
        }),
        _ => return None,
    };
    Some(result.into_term())
}

pub(crate) fn unary_plus(a: ExpressionTerm) -> Option<ExpressionTerm> {
    a.is_numeric().then_some(a)
}

pub(crate) fn unary_minus(a: &ExpressionTerm) -> Option<ExpressionTerm> {
    let negated = match a.numeric()? {
        Numeric::Integer(v) => Numeric::Integer(v.checked_neg()?),
        Numeric::Decimal(v) => Numeric::Decimal(v.checked_neg()?),
        Numeric::Float(v) => Numeric::Float(-v),
        Numeric::Double(v) => Numeric::Double(-v),
    };
    Some(negated.into_term())
}

fn absolute(a: &ExpressionTerm) -> Option<ExpressionTerm> {
    let absolute = match a.numeric()? {
        Numeric::Integer(v) => Numeric::Integer(v.checked_abs()?),
        Numeric::Decimal(v) => Numeric::Decimal(v.checked_abs()?),
        Numeric::Float(v) => Numeric::Float(v.abs()),
        Numeric::Double(v) => Numeric::Double(v.abs()),
    };
    Some(absolute.into_term())
}

/// Evaluates a function that only depends on its arguments.
///
/// Returns `None` on error, and for [`Function::IsTransitive`] that needs the edges.
pub(crate) fn call_function(function: Function, args: Vec<ExpressionTerm>) -> Option<ExpressionTerm> {
    match function {
        Function::IsTransitive => None,
        Function::Concat => concat(args),
        Function::Regex => regex_match(args),
        Function::Contains | Function::StrStarts | Function::StrEnds => {
            let [haystack, needle] = <[_; 2]>::try_from(args).ok()?;
            let (haystack, language) = lexical_and_language(haystack)?;
            let (needle, needle_language) = lexical_and_language(needle)?;
            if needle_language.is_some() && needle_language != language {
                return None;
            }
            Some(
                match function {
                    Function::Contains => haystack.contains(&needle),
                    Function::StrStarts => haystack.starts_with(&needle),
                    _ => haystack.ends_with(&needle),
                }
                .into(),
            )
        }
        unary => {
            let [arg] = <[_; 1]>::try_from(args).ok()?;
            call_unary_function(unary, arg)
        }
    }
}

fn call_unary_function(function: Function, arg: ExpressionTerm) -> Option<ExpressionTerm> {
    let is_resource = matches!(arg, ExpressionTerm::NamedNode(_) | ExpressionTerm::BlankNode(_));
    Some(match function {
        Function::Str => ExpressionTerm::StringLiteral(to_str(arg)?.0),
        Function::Lang => match arg {
            ExpressionTerm::LangStringLiteral { language, .. } => ExpressionTerm::StringLiteral(language),
            _ if is_resource => return None,
            _ => ExpressionTerm::StringLiteral(String::new()),
        },
        Function::Datatype => ExpressionTerm::NamedNode(
            match arg {
                ExpressionTerm::NamedNode(_) | ExpressionTerm::BlankNode(_) => return None,
                ExpressionTerm::OtherTypedLiteral { datatype, .. } => return Some(datatype.into()),
                ExpressionTerm::StringLiteral(_) => xsd::STRING,
                ExpressionTerm::LangStringLiteral { .. } => rdf::LANG_STRING,
                ExpressionTerm::BooleanLiteral(_) => xsd::BOOLEAN,
                ExpressionTerm::IntegerLiteral(_) => xsd::INTEGER,
                ExpressionTerm::DecimalLiteral(_) => xsd::DECIMAL,
                ExpressionTerm::FloatLiteral(_) => xsd::FLOAT,
                ExpressionTerm::DoubleLiteral(_) => xsd::DOUBLE,
            }
            .into_owned(),
        ),
        Function::IsIri => matches!(arg, ExpressionTerm::NamedNode(_)).into(),
        Function::IsBlank => matches!(arg, ExpressionTerm::BlankNode(_)).into(),
        Function::IsLiteral => (!is_resource).into(),
        Function::IsNumeric => arg.is_numeric().into(),
        Function::StrLen => {
            let (value, _) = lexical_and_language(arg)?;
            ExpressionTerm::IntegerLiteral(i64::try_from(value.chars().count()).ok()?.into())
        }
        Function::UCase => {
            let (value, language) = lexical_and_language(arg)?;
            plain_literal(value.to_uppercase(), language)
        }
        Function::LCase => {
            let (value, language) = lexical_and_language(arg)?;
            plain_literal(value.to_lowercase(), language)
        }
        Function::Abs => absolute(&arg)?,
        Function::Contains
        | Function::StrStarts
        | Function::StrEnds
        | Function::Concat
        | Function::Regex
        | Function::IsTransitive => return None,
    })
}

/// The language tag is kept only if every argument has the same one.
fn concat(args: Vec<ExpressionTerm>) -> Option<ExpressionTerm> {
    let mut args = args.into_iter().map(lexical_and_language);
    let Some(first) = args.next() else {
        return Some(ExpressionTerm::StringLiteral(String::new()));
    };
    let (mut result, mut language) = first?;
    for arg in args {
        let (value, arg_language) = arg?;
        if language != arg_language {
            language = None;
        }
        result.push_str(&value);
    }
    Some(plain_literal(result, language))
}

fn regex_match(args: Vec<ExpressionTerm>) -> Option<ExpressionTerm> {
    let (text, pattern, flags) = match <[_; 3]>::try_from(args) {
        Ok([text, pattern, flags]) => (text, pattern, Some(flags)),
        Err(args) => {
            let [text, pattern] = <[_; 2]>::try_from(args).ok()?;
            (text, pattern, None)
        }
    };
    let (text, _) = lexical_and_language(text)?;
    let ExpressionTerm::StringLiteral(pattern) = pattern else {
        return None;
    };
    let flags = match flags {
        Some(ExpressionTerm::StringLiteral(flags)) => flags,
        Some(_) => return None,
        None => String::new(),
    };
    Some(compile_regex(&pattern, &flags)?.is_match(&text).into())
}

fn compile_regex(pattern: &str, flags: &str) -> Option<Regex> {
    let pattern = if flags.contains('q') {
        regex::escape(pattern)
    } else {
        pattern.to_owned()
    };
    let mut builder = RegexBuilder::new(&pattern);
    builder.size_limit(REGEX_SIZE_LIMIT);
    for flag in flags.chars() {
        match flag {
            's' => builder.dot_matches_new_line(true),
            'm' => builder.multi_line(true),
            'i' => builder.case_insensitive(true),
            'x' => builder.ignore_whitespace(true),
            'q' => &mut builder,
            _ => return None,
        };
    }
    builder.build().ok()
}

/// The lexical form of a term, with its language tag for language-tagged strings.
///
/// Blank nodes have no string value.
pub(crate) fn to_str(term: ExpressionTerm) -> Option<(String, Option<String>)> {
    Some(match term {
        ExpressionTerm::BlankNode(_) => return None,
        ExpressionTerm::NamedNode(node) => (node.into_string(), None),
        ExpressionTerm::LangStringLiteral { value, language } => (value, Some(language)),
        ExpressionTerm::StringLiteral(value) | ExpressionTerm::OtherTypedLiteral { value, .. } => {
            (value, None)
        }
        ExpressionTerm::BooleanLiteral(value) => (value.to_string(), None),
        ExpressionTerm::IntegerLiteral(value) => (value.to_string(), None),
        ExpressionTerm::DecimalLiteral(value) => (value.to_string(), None),
        ExpressionTerm::FloatLiteral(value) => (value.to_string(), None),
        ExpressionTerm::DoubleLiteral(value) => (value.to_string(), None),
    })
}

/// The value and language tag of a string literal, `None` for any other term.
fn lexical_and_language(term: ExpressionTerm) -> Option<(String, Option<String>)> {
    match term {
        ExpressionTerm::StringLiteral(value) => Some((value, None)),
        ExpressionTerm::LangStringLiteral { value, language } => Some((value, Some(language))),
        _ => None,
    }
}

pub(crate) fn plain_literal(value: String, language: Option<String>) -> ExpressionTerm {
    match language {
        Some(language) => ExpressionTerm::LangStringLiteral { value, language },
        None => ExpressionTerm::StringLiteral(value),
    }
}

/// The `=` operator: `None` when the two values cannot be compared.
pub(crate) fn equals(a: &ExpressionTerm, b: &ExpressionTerm) -> Option<bool> {
    if let (Some(x), Some(y)) = (a.numeric(), b.numeric()) {
        return Some(compare_numbers(x, y) == Some(Ordering::Equal));
    }
    if a == b {
        return Some(true);
    }
    // a literal of an unknown datatype may still denote the same value as another typed literal
    let unknown = |t: &ExpressionTerm| matches!(t, ExpressionTerm::OtherTypedLiteral { .. });
    let typed = |t: &ExpressionTerm| {
        unknown(t)
            || t.is_numeric()
            || matches!(t, ExpressionTerm::StringLiteral(_) | ExpressionTerm::BooleanLiteral(_))
    };
    if (unknown(a) && typed(b)) || (unknown(b) && typed(a)) {
        None
    } else {
        Some(false)
    }
}

/// The `<`, `>`, `<=` and `>=` operators: `None` when the two values are not comparable.
pub(crate) fn partial_cmp(a: &ExpressionTerm, b: &ExpressionTerm) -> Option<Ordering> {
    if a == b {
        return Some(Ordering::Equal);
    }
    match (a, b) {
        (ExpressionTerm::StringLiteral(a), ExpressionTerm::StringLiteral(b)) => Some(a.cmp(b)),
        (
            ExpressionTerm::LangStringLiteral {
                value: a,
                language: la,
            },
            ExpressionTerm::LangStringLiteral {
                value: b,
                language: lb,
            },
        ) => (la == lb).then(|| a.cmp(b)),
        (ExpressionTerm::BooleanLiteral(a), ExpressionTerm::BooleanLiteral(b)) => {
            Some(bool::from(*a).cmp(&bool::from(*b)))
        }
        _ => compare_numbers(a.numeric()?, b.numeric()?),
    }
}

/// The total order of `ORDER BY`, `MIN` and `MAX`.
///
/// Unbound values come first, then blank nodes, IRIs and literals. Literals are ranked numbers,
/// booleans, simple strings, language-tagged strings and other datatypes, and compared within
/// their rank. Numbers are compared as doubles.
pub(crate) fn cmp_terms(a: Option<&ExpressionTerm>, b: Option<&ExpressionTerm>) -> Ordering {
    let (Some(a), Some(b)) = (a, b) else {
        return a.is_some().cmp(&b.is_some());
    };
    a.order_rank().cmp(&b.order_rank()).then_with(|| match (a, b) {
        (ExpressionTerm::BlankNode(a), ExpressionTerm::BlankNode(b)) => a.as_str().cmp(b.as_str()),
        (ExpressionTerm::NamedNode(a), ExpressionTerm::NamedNode(b)) => a.as_str().cmp(b.as_str()),
        (ExpressionTerm::BooleanLiteral(a), ExpressionTerm::BooleanLiteral(b)) => {
            bool::from(*a).cmp(&bool::from(*b))
        }
        (ExpressionTerm::StringLiteral(a), ExpressionTerm::StringLiteral(b)) => a.cmp(b),
        (
            ExpressionTerm::LangStringLiteral {
                value: a,
                language: la,
            },
            ExpressionTerm::LangStringLiteral {
                value: b,
                language: lb,
            },
        ) => la.cmp(lb).then_with(|| a.cmp(b)),
        (
            ExpressionTerm::OtherTypedLiteral {
                value: a,
                datatype: da,
            },
            ExpressionTerm::OtherTypedLiteral {
                value: b,
                datatype: db,
            },
        ) => da.as_str().cmp(db.as_str()).then_with(|| a.cmp(b)),
        _ => match (a.numeric(), b.numeric()) {
            (Some(a), Some(b)) => f64::from(a.to_double()).total_cmp(&f64::from(b.to_double())),
            _ => Ordering::Equal,
        },
    })
}
