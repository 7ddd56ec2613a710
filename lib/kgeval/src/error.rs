use std::convert::Infallible;
use std::error::Error;
use std::time::Duration;

/// A graph pattern evaluation error.
///
/// Expression errors never show up here: they only make the enclosing filter, bind or
/// aggregate produce no value.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryEvaluationError {
    /// Error from the underlying edge accessor
    #[error(transparent)]
    Dataset(Box<dyn Error + Send + Sync>),
    /// The evaluation took longer than the configured timeout
    #[error("The evaluation exceeded its timeout of {0:?}")]
    Timeout(Duration),
    /// The evaluation produced more solutions than allowed
    #[error("The evaluation produced more than {0} solutions")]
    ResultLimitExceeded(usize),
    /// The grouping produced more groups than allowed
    #[error("The evaluation produced more than {0} groups")]
    GroupLimitExceeded(usize),
    /// Error if the accessor returns the default graph even if a named graph is expected
    #[error("The edge accessor returned the default graph even if a named graph is expected")]
    UnexpectedDefaultGraph,
}

impl QueryEvaluationError {
    pub(crate) fn dataset(error: impl Error + Send + Sync + 'static) -> Self {
        Self::Dataset(Box::new(error))
    }
}

impl From<Infallible> for QueryEvaluationError {
    #[inline]
    fn from(error: Infallible) -> Self {
        match error {}
    }
}
