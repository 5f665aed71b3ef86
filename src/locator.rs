//! Element Locator
//!
//! Resolves a logical UI target to a concrete element by trying an ordered list
//! of selectors. All selectors share one wait budget: each poll walks the list
//! in order and stops at the first element that satisfies the condition.

use crate::{browser::{Driver, ElementRef, Selector},
            error::{NavError, Result},
            wait::{Deadline, Wait, WaitOutcome, poll_until}};
use std::time::Duration;

/// What a candidate element must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Attached to the document
    Present,
    /// Attached and rendered visibly
    Visible,
}

/// How to find one logical element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorSpec {
    /// Human-readable target name used in logs and errors
    pub name: String,

    /// Selectors, most specific first
    pub selectors: Vec<Selector>,

    /// Shared budget across all selectors
    pub budget: Duration,

    pub condition: Condition,
}

impl LocatorSpec {
    pub fn new(name: impl Into<String>, selector: Selector) -> Self {
        Self {
            name: name.into(),
            selectors: vec![selector],
            budget: Duration::from_secs(10),
            condition: Condition::Present,
        }
    }

    /// Builder method: add a fallback selector
    pub fn or(mut self, selector: Selector) -> Self {
        self.selectors.push(selector);
        self
    }

    /// Builder method: set the shared wait budget
    pub fn budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Builder method: require visibility
    pub fn visible(mut self) -> Self {
        self.condition = Condition::Visible;
        self
    }
}

/// Finds elements for [`LocatorSpec`]s against a driver
#[derive(Clone, Copy)]
pub struct Locator<'a> {
    driver: &'a dyn Driver,
    poll_interval: Duration,
    deadline: Deadline,
}

impl<'a> Locator<'a> {
    pub fn new(driver: &'a dyn Driver, poll_interval: Duration, deadline: Deadline) -> Self {
        Self { driver, poll_interval, deadline }
    }

    pub fn driver(&self) -> &'a dyn Driver {
        self.driver
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Navigate to `url`, bounding the page load by what is left of the deadline
    pub fn navigate(&self, url: &str) -> Result<()> {
        let (timeout, clipped) = self.deadline.clamp(Duration::MAX);
        if clipped && timeout.is_zero() {
            return Err(NavError::DeadlineExceeded(format!("navigation to {}", url)));
        }

        match self.driver.navigate(url, timeout) {
            Err(e) if clipped && self.deadline.is_expired() => {
                log::debug!("Navigation cut short by the deadline: {}", e);
                Err(NavError::DeadlineExceeded(format!("navigation to {}", url)))
            }
            loaded => loaded,
        }
    }

    /// Find the element described by `spec`, optionally within `scope`.
    ///
    /// Fails with [`NavError::ElementNotFound`] once the shared budget is spent, or
    /// [`NavError::DeadlineExceeded`] if the invocation deadline ran out first.
    pub fn locate(&self, spec: &LocatorSpec, scope: Option<&ElementRef>) -> Result<ElementRef> {
        let wait = Wait::new(spec.budget).poll_interval(self.poll_interval);

        match poll_until(wait, self.deadline, || self.first_match(spec, scope)) {
            WaitOutcome::Ready(element) => Ok(element),
            WaitOutcome::TimedOut => Err(NavError::ElementNotFound(format!(
                "{} (tried {} selector(s) for {:?})",
                spec.name,
                spec.selectors.len(),
                spec.budget
            ))),
            WaitOutcome::DeadlineExceeded => Err(NavError::DeadlineExceeded(spec.name.clone())),
        }
    }

    /// Like [`Locator::locate`] but a plain timeout becomes `None`
    pub fn try_locate(&self, spec: &LocatorSpec, scope: Option<&ElementRef>) -> Result<Option<ElementRef>> {
        match self.locate(spec, scope) {
            Ok(element) => Ok(Some(element)),
            Err(NavError::ElementNotFound(reason)) => {
                log::debug!("Optional target not found: {}", reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn first_match(&self, spec: &LocatorSpec, scope: Option<&ElementRef>) -> Option<ElementRef> {
        for selector in &spec.selectors {
            let candidates = match self.driver.find_all(selector, scope) {
                Ok(candidates) => candidates,
                Err(e) => {
                    log::debug!("Query {} for '{}' failed: {}", selector, spec.name, e);
                    continue;
                }
            };

            let hit = candidates.into_iter().find(|candidate| self.satisfies(candidate, spec.condition));
            if let Some(element) = hit {
                log::debug!("Located '{}' via {}", spec.name, selector);
                return Some(element);
            }
        }
        None
    }

    fn satisfies(&self, element: &ElementRef, condition: Condition) -> bool {
        match condition {
            Condition::Present => true,
            Condition::Visible => self.driver.is_visible(element).unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{MockDriver, MockElement};

    fn locator(driver: &MockDriver) -> Locator<'_> {
        Locator::new(driver, Duration::from_millis(5), Deadline::none())
    }

    #[test]
    fn test_first_selector_wins() {
        let driver = MockDriver::new("https://site/reports")
            .with_element(MockElement::new("#specific"))
            .with_element(MockElement::new("a.generic"));
        let spec = LocatorSpec::new("link", Selector::css("#specific")).or(Selector::css("a.generic"));

        let found = locator(&driver).locate(&spec, None).unwrap();

        assert_eq!(found.selector, Selector::css("#specific"));
        assert_eq!(driver.queries(), vec!["css=#specific"]);
    }

    #[test]
    fn test_falls_through_to_later_selector() {
        let driver = MockDriver::new("https://site/reports").with_element(MockElement::new("a[href*='/reports']"));
        let spec = LocatorSpec::new("link", Selector::css("#specific")).or(Selector::css("a[href*='/reports']"));

        let found = locator(&driver).locate(&spec, None).unwrap();
        assert_eq!(found.selector, Selector::css("a[href*='/reports']"));
    }

    #[test]
    fn test_hidden_element_does_not_satisfy_visibility() {
        let driver = MockDriver::new("https://site/reports")
            .with_element(MockElement::new("h1").hidden())
            .with_element(MockElement::new(".page-title"));
        let spec = LocatorSpec::new("header", Selector::css("h1"))
            .or(Selector::css(".page-title"))
            .visible()
            .budget(Duration::from_millis(50));

        let found = locator(&driver).locate(&spec, None).unwrap();
        assert_eq!(found.selector, Selector::css(".page-title"));

        let present = LocatorSpec::new("header", Selector::css("h1")).budget(Duration::from_millis(50));
        assert!(locator(&driver).locate(&present, None).is_ok());
    }

    #[test]
    fn test_zero_budget_is_immediate_not_found() {
        let driver = MockDriver::new("https://site/reports").with_element(MockElement::new("table"));
        let spec = LocatorSpec::new("table", Selector::css("table")).budget(Duration::ZERO);

        let result = locator(&driver).locate(&spec, None);

        assert!(matches!(result, Err(NavError::ElementNotFound(_))));
        assert!(driver.queries().is_empty());
    }

    #[test]
    fn test_budget_is_shared_not_multiplied() {
        let driver = MockDriver::new("https://site/reports");
        let spec = LocatorSpec::new("nothing", Selector::css("#a"))
            .or(Selector::css("#b"))
            .or(Selector::css("#c"))
            .budget(Duration::from_millis(60));

        let start = std::time::Instant::now();
        let result = locator(&driver).locate(&spec, None);

        assert!(matches!(result, Err(NavError::ElementNotFound(_))));
        assert!(start.elapsed() < Duration::from_millis(60 * 3));
    }

    #[test]
    fn test_waits_for_late_element() {
        let driver =
            MockDriver::new("https://site/reports").with_element(MockElement::new("table").appears_after(Duration::from_millis(30)));
        let spec = LocatorSpec::new("table", Selector::css("table")).budget(Duration::from_secs(2));

        assert!(locator(&driver).locate(&spec, None).is_ok());
        assert!(driver.queries().len() > 1);
    }

    #[test]
    fn test_try_locate_tolerates_absence() {
        let driver = MockDriver::new("https://site/reports");
        let spec = LocatorSpec::new("marker", Selector::css("#x")).budget(Duration::from_millis(10));

        assert_eq!(locator(&driver).try_locate(&spec, None).unwrap(), None);
    }

    #[test]
    fn test_navigation_bounded_by_deadline() {
        let driver = MockDriver::new("about:blank");

        locator(&driver).navigate("https://site/reports").unwrap();
        assert_eq!(driver.last_navigation_timeout(), Some(Duration::MAX));

        let bounded = Locator::new(&driver, Duration::from_millis(5), Deadline::after(Duration::from_secs(5)));
        bounded.navigate("https://site/reports/attendance").unwrap();
        assert!(driver.last_navigation_timeout().is_some_and(|t| t <= Duration::from_secs(5)));
    }

    #[test]
    fn test_navigation_after_deadline_never_starts() {
        let driver = MockDriver::new("about:blank");
        let expired = Locator::new(&driver, Duration::from_millis(5), Deadline::after(Duration::ZERO));

        assert!(matches!(expired.navigate("https://site/reports"), Err(NavError::DeadlineExceeded(_))));
        assert!(driver.navigations().is_empty());
    }

    #[test]
    fn test_deadline_is_reported() {
        let driver = MockDriver::new("https://site/reports");
        let spec = LocatorSpec::new("marker", Selector::css("#x")).budget(Duration::from_secs(5));
        let locator = Locator::new(&driver, Duration::from_millis(5), Deadline::after(Duration::from_millis(10)));

        assert!(matches!(locator.locate(&spec, None), Err(NavError::DeadlineExceeded(_))));
        assert!(matches!(locator.try_locate(&spec, None), Err(NavError::DeadlineExceeded(_))));
    }
}
