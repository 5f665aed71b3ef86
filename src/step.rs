//! Navigation Step
//!
//! A step moves the session from one confirmed state to the next. It owns an
//! ordered list of [`Strategy`]s (primary first) and tries them in turn until
//! one of them confirms the target state. Every attempt is reduced to a named
//! [`StrategyOutcome`] and logged, so swallowing a failure and moving on is a
//! visible decision rather than a side effect.

use crate::{browser::Driver,
            error::{NavError, Result},
            interact::{InteractOptions, Interactor},
            locator::Locator,
            session::{Session, SessionState}};
use std::time::Duration;

/// Everything a strategy may use while it runs
pub struct StepContext<'a, 's> {
    pub locator: Locator<'a>,
    pub interact: InteractOptions,

    /// Budget for the strategy's own mandatory confirmation
    pub budget: Duration,

    pub session: &'s mut Session,
}

impl<'a> StepContext<'a, '_> {
    pub fn driver(&self) -> &'a dyn Driver {
        self.locator.driver()
    }

    pub fn interactor(&self) -> Interactor<'a> {
        Interactor::new(self.locator, self.interact)
    }

    /// Record a navigation event with the current URL
    pub fn record(&mut self, message: impl Into<String>) {
        let driver = self.driver();
        self.session.record(driver, message);
    }

    /// Record a swallowed failure
    pub fn record_warning(&mut self, message: impl Into<String>) {
        let driver = self.driver();
        self.session.record_warning(driver, message);
    }
}

/// One way of completing a step
pub trait Strategy {
    /// Name used in logs and outcomes
    fn name(&self) -> &str;

    /// Drive the page and confirm the target state, returning the confirmed URL
    fn attempt(&self, context: &mut StepContext<'_, '_>) -> Result<String>;
}

/// How one strategy attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Succeeded(String),
    Raised(String),
    TimedOut(String),
}

impl StrategyOutcome {
    fn from_result(result: &Result<String>) -> Self {
        match result {
            Ok(url) => StrategyOutcome::Succeeded(url.clone()),
            Err(e) if e.is_timeout() => StrategyOutcome::TimedOut(e.to_string()),
            Err(e) => StrategyOutcome::Raised(e.to_string()),
        }
    }
}

/// Result of running a step
#[derive(Debug)]
pub enum StepOutcome {
    Succeeded { url: String, strategy: String },
    Failed(NavError),
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded { .. })
    }
}

/// A named transition with a primary strategy and ordered fallbacks
pub struct NavigationStep {
    name: String,
    strategies: Vec<Box<dyn Strategy>>,
    budget: Duration,
    accepts: Vec<SessionState>,
    reaches: SessionState,
}

impl NavigationStep {
    /// A step entered from one of `accepts` that ends in `reaches`
    pub fn new(name: impl Into<String>, accepts: &[SessionState], reaches: SessionState, budget: Duration) -> Self {
        Self { name: name.into(), strategies: Vec::new(), budget, accepts: accepts.to_vec(), reaches }
    }

    /// Builder method: append a strategy (the first one added is the primary)
    pub fn strategy(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Names of the strategies in the order they are tried
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the strategies in order until one confirms.
    ///
    /// The entry precondition is checked first; strategies after the first success are
    /// never attempted. An invocation-deadline error stops the step immediately.
    pub fn run(&self, session: &mut Session, locator: Locator<'_>, interact: InteractOptions) -> StepOutcome {
        if !self.accepts.contains(&session.state()) {
            let expected = self.accepts.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ");
            return StepOutcome::Failed(NavError::PreconditionFailed {
                step: self.name.clone(),
                expected,
                actual: session.state().to_string(),
            });
        }

        let mut failures = Vec::new();
        for strategy in &self.strategies {
            let mut context = StepContext { locator, interact, budget: self.budget, session: &mut *session };
            let result = strategy.attempt(&mut context);
            let outcome = StrategyOutcome::from_result(&result);

            match (result, outcome) {
                (Ok(url), _) => {
                    session.record(locator.driver(), format!("{}: {} succeeded", self.name, strategy.name()));
                    if let Err(e) = session.advance(self.reaches) {
                        return StepOutcome::Failed(e);
                    }
                    return StepOutcome::Succeeded { url, strategy: strategy.name().to_string() };
                }
                (Err(e), _) if e.is_deadline() => {
                    session.record_warning(locator.driver(), format!("{}: {} stopped: {}", self.name, strategy.name(), e));
                    return StepOutcome::Failed(e);
                }
                (Err(_), outcome) => {
                    session.record_warning(
                        locator.driver(),
                        format!("{}: {} failed, {:?}", self.name, strategy.name(), outcome),
                    );
                    failures.push(format!("{}: {:?}", strategy.name(), outcome));
                }
            }
        }

        StepOutcome::Failed(NavError::NavigationFailure {
            step: self.name.clone(),
            reason: if failures.is_empty() { "no strategies configured".to_string() } else { failures.join("; ") },
        })
    }
}
