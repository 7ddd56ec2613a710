use std::time::Duration;

/// Resource limits of an evaluation.
///
/// ```
/// use kgeval::EvaluationLimits;
/// use std::time::Duration;
///
/// let limits = EvaluationLimits {
///     timeout: Some(Duration::from_secs(10)),
///     ..EvaluationLimits::strict()
/// };
/// assert_eq!(limits.max_groups, Some(100));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvaluationLimits {
    /// Maximum evaluation time
    ///
    /// Checked each time the evaluator moves to the next scheduled item.
    pub timeout: Option<Duration>,

    /// Maximum number of returned solutions
    pub max_result_rows: Option<usize>,

    /// Maximum number of groups of a `GROUP BY`
    pub max_groups: Option<usize>,
}

impl Default for EvaluationLimits {
    #[inline]
    fn default() -> Self {
        Self::unlimited()
    }
}

impl EvaluationLimits {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits suitable for untrusted queries
    ///
    /// - Timeout: 5 seconds
    /// - Max result rows: 1,000
    /// - Max groups: 100
    #[must_use]
    pub fn strict() -> Self {
        Self {
            timeout: Some(Duration::from_secs(5)),
            max_result_rows: Some(1_000),
            max_groups: Some(100),
        }
    }

    /// Limits suitable for trusted internal queries
    ///
    /// - Timeout: 5 minutes
    /// - Max result rows: 100,000
    /// - Max groups: 10,000
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            timeout: Some(Duration::from_secs(300)),
            max_result_rows: Some(100_000),
            max_groups: Some(10_000),
        }
    }

    /// No limit at all, the default.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            timeout: None,
            max_result_rows: None,
            max_groups: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        assert_eq!(EvaluationLimits::default(), EvaluationLimits::unlimited());
    }

    #[test]
    fn test_strict_limits() {
        let limits = EvaluationLimits::strict();
        assert_eq!(limits.timeout, Some(Duration::from_secs(5)));
        assert_eq!(limits.max_result_rows, Some(1_000));
        assert_eq!(limits.max_groups, Some(100));
    }

    #[test]
    fn test_permissive_limits() {
        let limits = EvaluationLimits::permissive();
        assert_eq!(limits.timeout, Some(Duration::from_secs(300)));
        assert_eq!(limits.max_result_rows, Some(100_000));
    }

    #[test]
    fn test_unlimited() {
        let limits = EvaluationLimits::unlimited();
        assert_eq!(limits.timeout, None);
        assert_eq!(limits.max_result_rows, None);
        assert_eq!(limits.max_groups, None);
    }
}
