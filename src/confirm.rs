//! Page Confirmation
//!
//! Verifies that the browser reached an expected page. Only the URL check is
//! mandatory; structural markers are read best-effort with short budgets and
//! their absence is recorded, never raised.

use crate::{error::{NavError, Result},
            locator::{Locator, LocatorSpec},
            wait::{Wait, WaitOutcome, poll_until}};
use serde::Serialize;
use std::{fmt, time::Duration};

/// Condition on the current URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPattern {
    /// URL contains the fragment
    Contains(String),
    /// URL does not contain the fragment
    Excludes(String),
}

impl UrlPattern {
    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlPattern::Contains(fragment) => url.contains(fragment.as_str()),
            UrlPattern::Excludes(fragment) => !url.contains(fragment.as_str()),
        }
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlPattern::Contains(fragment) => write!(f, "URL containing '{}'", fragment),
            UrlPattern::Excludes(fragment) => write!(f, "URL without '{}'", fragment),
        }
    }
}

/// A specific marker with a weaker generic stand-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCheck {
    pub specific: LocatorSpec,
    pub container: LocatorSpec,
}

/// What a confirmed page looks like
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub url: UrlPattern,

    /// Budget for the mandatory URL check
    pub url_budget: Duration,

    /// Heading whose text becomes the confirmation title
    pub primary: Option<LocatorSpec>,

    /// Title used when the heading is missing or unreadable
    pub default_label: String,

    /// Independently tolerated markers
    pub secondary: Vec<LocatorSpec>,

    pub content: Option<ContentCheck>,
}

impl Expectation {
    pub fn url(pattern: UrlPattern, budget: Duration) -> Self {
        Self {
            url: pattern,
            url_budget: budget,
            primary: None,
            default_label: String::new(),
            secondary: Vec::new(),
            content: None,
        }
    }

    /// Builder method: set the heading marker and its fallback label
    pub fn with_primary(mut self, marker: LocatorSpec, default_label: impl Into<String>) -> Self {
        self.primary = Some(marker);
        self.default_label = default_label.into();
        self
    }

    /// Builder method: add a tolerated marker
    pub fn with_secondary(mut self, marker: LocatorSpec) -> Self {
        self.secondary.push(marker);
        self
    }

    /// Builder method: set the specific content marker and its generic container
    pub fn with_content(mut self, specific: LocatorSpec, container: LocatorSpec) -> Self {
        self.content = Some(ContentCheck { specific, container });
        self
    }
}

/// How a best-effort marker turned out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStatus {
    Found,
    Missing,
    /// The specific marker was missing but the generic container was present
    ContainerOnly,
}

/// A confirmed page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub title: String,
    pub url: String,
    pub markers: Vec<(String, MarkerStatus)>,
}

impl Confirmation {
    pub fn marker(&self, name: &str) -> Option<MarkerStatus> {
        self.markers.iter().find(|(n, _)| n == name).map(|(_, status)| *status)
    }
}

/// Block until the URL satisfies `pattern` or `budget` runs out
pub fn wait_for_url(locator: &Locator<'_>, pattern: &UrlPattern, budget: Duration) -> Result<String> {
    let driver = locator.driver();
    let wait = Wait::new(budget).poll_interval(locator.poll_interval());

    let outcome = poll_until(wait, locator.deadline(), || match driver.current_url() {
        Ok(url) if pattern.matches(&url) => Some(url),
        Ok(_) => None,
        Err(e) => {
            log::debug!("Could not read URL while waiting for {}: {}", pattern, e);
            None
        }
    });

    match outcome {
        WaitOutcome::Ready(url) => Ok(url),
        WaitOutcome::TimedOut => Err(NavError::ConfirmationTimeout { what: pattern.to_string(), waited: budget }),
        WaitOutcome::DeadlineExceeded => Err(NavError::DeadlineExceeded(pattern.to_string())),
    }
}

/// Confirm the page described by `expectation`.
///
/// Only a URL timeout (or the invocation deadline) fails; every marker is best-effort.
pub fn confirm(locator: &Locator<'_>, expectation: &Expectation) -> Result<Confirmation> {
    let url = wait_for_url(locator, &expectation.url, expectation.url_budget)?;
    let mut markers = Vec::new();

    let mut title = String::new();
    if let Some(primary) = &expectation.primary {
        match locator.try_locate(primary, None)? {
            Some(heading) => {
                title = locator.driver().text(&heading).unwrap_or_default();
                markers.push((primary.name.clone(), MarkerStatus::Found));
            }
            None => markers.push((primary.name.clone(), MarkerStatus::Missing)),
        }
    }
    if title.is_empty() {
        title = expectation.default_label.clone();
    }

    for marker in &expectation.secondary {
        let status = match locator.try_locate(marker, None)? {
            Some(_) => MarkerStatus::Found,
            None => MarkerStatus::Missing,
        };
        markers.push((marker.name.clone(), status));
    }

    if let Some(content) = &expectation.content {
        let status = if locator.try_locate(&content.specific, None)?.is_some() {
            MarkerStatus::Found
        } else if locator.try_locate(&content.container, None)?.is_some() {
            MarkerStatus::ContainerOnly
        } else {
            log::warn!("Neither '{}' nor '{}' found", content.specific.name, content.container.name);
            MarkerStatus::Missing
        };
        markers.push((content.specific.name.clone(), status));
    }

    Ok(Confirmation { title, url, markers })
}
