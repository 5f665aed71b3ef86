//! Browser capability used by the navigation core
//!
//! The core never talks to Chrome directly. It sees a [`Driver`]: navigate,
//! read the current URL, find elements by selector, run a scripted DOM action,
//! terminate. [`chrome::ChromeDriver`] implements it over `headless_chrome`;
//! with the `mock` feature, `mock::MockDriver` implements it over an in-memory
//! page model.

pub mod chrome;
pub mod config;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use chrome::{ChromeDriver, ChromeProvider};
pub use config::LaunchOptions;
#[cfg(any(test, feature = "mock"))]
pub use mock::{Effect, MockDriver, MockElement, MockProvider};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

/// A selector expression understood by the driver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn css(expression: impl Into<String>) -> Self {
        Selector::Css(expression.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Selector::XPath(expression.into())
    }

    /// The raw selector expression
    pub fn expression(&self) -> &str {
        match self {
            Selector::Css(expr) | Selector::XPath(expr) => expr,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(expr) => write!(f, "css={}", expr),
            Selector::XPath(expr) => write!(f, "xpath={}", expr),
        }
    }
}

/// Handle to an element previously returned by [`Driver::find_all`].
///
/// The handle is re-resolved on every use, so an element that disappeared in the
/// meantime surfaces as an error from the driver instead of acting on a stale node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    /// Selector that matched the element
    pub selector: Selector,

    /// Position among the selector's matches
    pub index: usize,

    /// Element the selector was evaluated within
    pub scope: Option<Box<ElementRef>>,
}

impl ElementRef {
    pub fn new(selector: Selector, index: usize, scope: Option<&ElementRef>) -> Self {
        Self { selector, index, scope: scope.map(|s| Box::new(s.clone())) }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.scope {
            write!(f, "{} >> ", scope)?;
        }
        write!(f, "{}[{}]", self.selector, self.index)
    }
}

/// A single scripted action against an element
#[derive(Clone, PartialEq, Eq)]
pub enum DomAction {
    /// `element.scrollIntoView({block: 'center'})`
    ScrollIntoView,
    /// `element.click()` from script
    ScriptClick,
    /// Move the pointer over the element, pause, then press and release
    PointerClick { pause: Duration },
    /// Move the pointer over the element and pause
    Hover { pause: Duration },
    /// Dispatch a synthetic bubbling mouse event (`click`, `mouseover`, ...)
    Dispatch { event: String },
    /// Clear the element's value
    Clear,
    /// Type text into the element
    TypeText(String),
    /// Submit the element (a form)
    Submit,
}

impl DomAction {
    /// Short name used in logs; never includes typed text
    pub fn kind(&self) -> &'static str {
        match self {
            DomAction::ScrollIntoView => "scroll_into_view",
            DomAction::ScriptClick => "script_click",
            DomAction::PointerClick { .. } => "pointer_click",
            DomAction::Hover { .. } => "hover",
            DomAction::Dispatch { .. } => "dispatch",
            DomAction::Clear => "clear",
            DomAction::TypeText(_) => "type_text",
            DomAction::Submit => "submit",
        }
    }
}

impl fmt::Debug for DomAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomAction::PointerClick { pause } | DomAction::Hover { pause } => {
                write!(f, "{}({:?})", self.kind(), pause)
            }
            DomAction::Dispatch { event } => write!(f, "dispatch({})", event),
            DomAction::TypeText(text) => write!(f, "type_text(<{} chars>)", text.chars().count()),
            _ => f.write_str(self.kind()),
        }
    }
}

/// Opaque browser capability driven by the navigation core
pub trait Driver {
    /// Navigate to a URL and wait up to `timeout` for the load to finish
    fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// URL currently shown by the page
    fn current_url(&self) -> Result<String>;

    /// All elements currently matching `selector`, in document order
    fn find_all(&self, selector: &Selector, scope: Option<&ElementRef>) -> Result<Vec<ElementRef>>;

    /// Whether the element is rendered with a non-empty box and not hidden by style
    fn is_visible(&self, element: &ElementRef) -> Result<bool>;

    /// Trimmed visible text of the element
    fn text(&self, element: &ElementRef) -> Result<String>;

    /// Value of an attribute, if set
    fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>>;

    /// Perform a scripted action on the element
    fn perform(&self, element: &ElementRef, action: &DomAction) -> Result<()>;

    /// Terminate the browser
    fn close(&self) -> Result<()>;
}

/// Supplies a launched browser for one session
pub trait BrowserProvider {
    fn launch(&self) -> Result<Box<dyn Driver>>;
}

/// Owns a driver for the duration of a session and terminates it on every exit path.
///
/// Termination errors are logged and suppressed so they never replace the session's result.
pub struct DriverGuard {
    driver: Box<dyn Driver>,
}

impl DriverGuard {
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }
}

impl Drop for DriverGuard {
    fn drop(&mut self) {
        match self.driver.close() {
            Ok(()) => log::debug!("Browser terminated"),
            Err(e) => log::warn!("Failed to terminate browser cleanly: {}", e),
        }
    }
}
