use crate::engine::EntailmentReport;
use crate::error::EntailmentError;
use kgalgebra::{Rule, RuleSet};
use kgterm::{Edge, Term};
use std::error::Error;
use std::fmt;
use tracing::{debug, warn};

/// What a hook returns: an optional value, logged by the engine, or a failure aborting the run.
pub type HookResult = Result<Option<Term>, Box<dyn Error + Send + Sync>>;

type Hook<A> = Box<dyn FnMut(&A) -> HookResult>;

/// Lifecycle callbacks of a [`RuleEngine`](crate::RuleEngine).
///
/// Every hook is optional and only observes the run: the accessor is given read-only so a hook may
/// evaluate a nested query, its returned value is logged and never changes the control flow.
/// The exception is [`with_prepare_entailment`](Self::with_prepare_entailment) that may edit the
/// rules of the run. A failing hook aborts the run with [`EntailmentError::Hook`].
///
/// ```
/// use kgreason::EntailmentHooks;
/// use kgterm::{Graph, Literal};
///
/// let hooks = EntailmentHooks::<Graph>::new()
///     .with_loop_entailment(|_, iteration| Ok(Some(Literal::from(u64::try_from(iteration)?).into())))
///     .with_update(|_, deleted, inserted| {
///         assert!(deleted.is_empty() || inserted.is_empty());
///         Ok(None)
///     });
/// # let _ = hooks;
/// ```
pub struct EntailmentHooks<A> {
    prepare_entailment: Option<Box<dyn FnMut(&A, &mut RuleSet) -> HookResult>>,
    before_entailment: Option<Hook<A>>,
    loop_entailment: Option<Box<dyn FnMut(&A, usize) -> HookResult>>,
    after_entailment: Option<Box<dyn FnMut(&A, &EntailmentReport) -> HookResult>>,
    before_rule: Option<Box<dyn FnMut(&A, &Rule) -> HookResult>>,
    after_rule: Option<Box<dyn FnMut(&A, &Rule, &[Edge]) -> HookResult>>,
    before_update: Option<Hook<A>>,
    after_update: Option<Hook<A>>,
    update: Option<Box<dyn FnMut(&A, &[Edge], &[Edge]) -> HookResult>>,
}

impl<A> EntailmentHooks<A> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fired once before the first iteration with the rules of the run, that it may edit.
    #[must_use]
    pub fn with_prepare_entailment(
        mut self,
        hook: impl FnMut(&A, &mut RuleSet) -> HookResult + 'static,
    ) -> Self {
        self.prepare_entailment = Some(Box::new(hook));
        self
    }

    /// Fired once after the preparation.
    #[must_use]
    pub fn with_before_entailment(mut self, hook: impl FnMut(&A) -> HookResult + 'static) -> Self {
        self.before_entailment = Some(Box::new(hook));
        self
    }

    /// Fired at the start of each iteration with its number, starting from 1.
    #[must_use]
    pub fn with_loop_entailment(
        mut self,
        hook: impl FnMut(&A, usize) -> HookResult + 'static,
    ) -> Self {
        self.loop_entailment = Some(Box::new(hook));
        self
    }

    /// Fired once at the end of a run that did not fail.
    #[must_use]
    pub fn with_after_entailment(
        mut self,
        hook: impl FnMut(&A, &EntailmentReport) -> HookResult + 'static,
    ) -> Self {
        self.after_entailment = Some(Box::new(hook));
        self
    }

    /// Fired before each rule application.
    #[must_use]
    pub fn with_before_rule(mut self, hook: impl FnMut(&A, &Rule) -> HookResult + 'static) -> Self {
        self.before_rule = Some(Box::new(hook));
        self
    }

    /// Fired after each rule application with the new edges it proposes.
    ///
    /// For constraint rules, these are the violations found.
    #[must_use]
    pub fn with_after_rule(
        mut self,
        hook: impl FnMut(&A, &Rule, &[Edge]) -> HookResult + 'static,
    ) -> Self {
        self.after_rule = Some(Box::new(hook));
        self
    }

    /// Fired before a batch of edges is written.
    #[must_use]
    pub fn with_before_update(mut self, hook: impl FnMut(&A) -> HookResult + 'static) -> Self {
        self.before_update = Some(Box::new(hook));
        self
    }

    /// Fired after a batch of edges is written.
    #[must_use]
    pub fn with_after_update(mut self, hook: impl FnMut(&A) -> HookResult + 'static) -> Self {
        self.after_update = Some(Box::new(hook));
        self
    }

    /// Fired with each written batch as `(deleted, inserted)`.
    #[must_use]
    pub fn with_update(
        mut self,
        hook: impl FnMut(&A, &[Edge], &[Edge]) -> HookResult + 'static,
    ) -> Self {
        self.update = Some(Box::new(hook));
        self
    }

    pub(crate) fn prepare_entailment(
        &mut self,
        accessor: &A,
        rules: &mut RuleSet,
    ) -> Result<(), EntailmentError> {
        match &mut self.prepare_entailment {
            Some(hook) => fire("prepare_entailment", hook(accessor, rules)),
            None => Ok(()),
        }
    }

    pub(crate) fn before_entailment(&mut self, accessor: &A) -> Result<(), EntailmentError> {
        match &mut self.before_entailment {
            Some(hook) => fire("before_entailment", hook(accessor)),
            None => Ok(()),
        }
    }

    pub(crate) fn loop_entailment(
        &mut self,
        accessor: &A,
        iteration: usize,
    ) -> Result<(), EntailmentError> {
        match &mut self.loop_entailment {
            Some(hook) => fire("loop_entailment", hook(accessor, iteration)),
            None => Ok(()),
        }
    }

    pub(crate) fn after_entailment(
        &mut self,
        accessor: &A,
        report: &EntailmentReport,
    ) -> Result<(), EntailmentError> {
        match &mut self.after_entailment {
            Some(hook) => fire("after_entailment", hook(accessor, report)),
            None => Ok(()),
        }
    }

    pub(crate) fn before_rule(&mut self, accessor: &A, rule: &Rule) -> Result<(), EntailmentError> {
        match &mut self.before_rule {
            Some(hook) => fire("before_rule", hook(accessor, rule)),
            None => Ok(()),
        }
    }

    pub(crate) fn after_rule(
        &mut self,
        accessor: &A,
        rule: &Rule,
        produced: &[Edge],
    ) -> Result<(), EntailmentError> {
        match &mut self.after_rule {
            Some(hook) => fire("after_rule", hook(accessor, rule, produced)),
            None => Ok(()),
        }
    }

    /// Fires `before_update`, `update` then `after_update` around a written batch.
    pub(crate) fn write(
        &mut self,
        accessor: &mut A,
        deleted: &[Edge],
        inserted: &[Edge],
        apply: impl FnOnce(&mut A) -> Result<(), EntailmentError>,
    ) -> Result<(), EntailmentError> {
        if let Some(hook) = &mut self.before_update {
            fire("before_update", hook(&*accessor))?;
        }
        apply(accessor)?;
        if let Some(hook) = &mut self.update {
            fire("update", hook(&*accessor, deleted, inserted))?;
        }
        if let Some(hook) = &mut self.after_update {
            fire("after_update", hook(&*accessor))?;
        }
        Ok(())
    }
}

impl<A> Default for EntailmentHooks<A> {
    fn default() -> Self {
        Self {
            prepare_entailment: None,
            before_entailment: None,
            loop_entailment: None,
            after_entailment: None,
            before_rule: None,
            after_rule: None,
            before_update: None,
            after_update: None,
            update: None,
        }
    }
}

impl<A> fmt::Debug for EntailmentHooks<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntailmentHooks")
            .field("prepare_entailment", &self.prepare_entailment.is_some())
            .field("before_entailment", &self.before_entailment.is_some())
            .field("loop_entailment", &self.loop_entailment.is_some())
            .field("after_entailment", &self.after_entailment.is_some())
            .field("before_rule", &self.before_rule.is_some())
            .field("after_rule", &self.after_rule.is_some())
            .field("before_update", &self.before_update.is_some())
            .field("after_update", &self.after_update.is_some())
            .field("update", &self.update.is_some())
            .finish()
    }
}

fn fire(hook: &'static str, result: HookResult) -> Result<(), EntailmentError> {
    match result {
        Ok(Some(value)) => {
            debug!(hook, %value, "hook returned a value");
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(source) => {
            warn!(hook, error = %source, "hook failed");
            Err(EntailmentError::Hook { hook, source })
        }
    }
}
