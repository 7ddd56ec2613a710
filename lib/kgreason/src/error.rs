use kgeval::QueryEvaluationError;
use std::convert::Infallible;
use std::error::Error;

/// An error aborting an entailment run.
///
/// Reaching a configured cap is not an error, it is reported in the
/// [`EntailmentStatus`](crate::EntailmentStatus) of the run.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EntailmentError {
    /// Error while evaluating a rule body
    #[error(transparent)]
    Evaluation(#[from] QueryEvaluationError),
    /// Error from the underlying edge accessor while writing entailments
    #[error(transparent)]
    Dataset(Box<dyn Error + Send + Sync>),
    /// A lifecycle hook failed
    #[error("The {hook} hook failed: {source}")]
    Hook {
        hook: &'static str,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl EntailmentError {
    pub(crate) fn dataset(error: impl Error + Send + Sync + 'static) -> Self {
        Self::Dataset(Box::new(error))
    }
}

impl From<Infallible> for EntailmentError {
    #[inline]
    fn from(error: Infallible) -> Self {
        match error {}
    }
}
