//! In-memory page model implementing [`Driver`]
//!
//! Elements are declared up front with the exact selector expression they answer
//! to, the page they live on, and what happens when they are clicked, hovered or
//! submitted. Every query and action is recorded so tests can assert on the order
//! in which the navigation core touched the page.

use crate::{browser::{BrowserProvider, DomAction, Driver, ElementRef, Selector},
            error::{NavError, Result}};
use std::{cell::{Cell, RefCell},
          collections::HashMap,
          rc::Rc,
          time::{Duration, Instant}};

/// Page change triggered by an interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Load another URL (redirects apply)
    Navigate(String),
    /// Make every element with this selector visible
    Reveal(String),
    /// Set an attribute on every element with this selector
    SetAttribute { selector: String, name: String, value: String },
}

/// A scripted element of the mock page
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Exact selector expression this element answers to
    pub selector: String,

    /// Selector expression of the scope element it is nested in
    pub scope: Option<String>,

    /// Only present while the URL contains this
    pub url_contains: Option<String>,

    pub visible: bool,
    pub text: String,
    pub attributes: HashMap<String, String>,

    /// Appears this long after the last page load
    pub delay: Duration,

    pub on_click: Vec<Effect>,
    pub on_hover: Vec<Effect>,
    pub on_submit: Vec<Effect>,

    /// Action kinds that raise an error
    pub raises: Vec<&'static str>,

    /// Action kinds that succeed silently without any effect
    pub inert: Vec<&'static str>,
}

impl MockElement {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            scope: None,
            url_contains: None,
            visible: true,
            text: String::new(),
            attributes: HashMap::new(),
            delay: Duration::ZERO,
            on_click: Vec::new(),
            on_hover: Vec::new(),
            on_submit: Vec::new(),
            raises: Vec::new(),
            inert: Vec::new(),
        }
    }

    /// Builder method: nest inside the element with this selector
    pub fn within(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Builder method: only present on pages whose URL contains `fragment`
    pub fn on_page(mut self, fragment: impl Into<String>) -> Self {
        self.url_contains = Some(fragment.into());
        self
    }

    /// Builder method: present but not visible
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder method: set an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder method: appear only after `delay` has passed since the page loaded
    pub fn appears_after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn on_click(mut self, effect: Effect) -> Self {
        self.on_click.push(effect);
        self
    }

    pub fn on_hover(mut self, effect: Effect) -> Self {
        self.on_hover.push(effect);
        self
    }

    pub fn on_submit(mut self, effect: Effect) -> Self {
        self.on_submit.push(effect);
        self
    }

    /// Builder method: make an action kind (see [`DomAction::kind`]) raise
    pub fn raises_on(mut self, kind: &'static str) -> Self {
        self.raises.push(kind);
        self
    }

    /// Builder method: make an action kind succeed without effect
    pub fn inert_on(mut self, kind: &'static str) -> Self {
        self.inert.push(kind);
        self
    }

    fn is_present(&self, url: &str, loaded_at: Instant) -> bool {
        self.url_contains.as_deref().is_none_or(|fragment| url.contains(fragment)) && loaded_at.elapsed() >= self.delay
    }
}

#[derive(Debug)]
struct MockState {
    url: String,
    loaded_at: Instant,
    elements: Vec<MockElement>,
    redirects: HashMap<String, String>,
    last_navigation_timeout: Option<Duration>,
    fail_close: bool,
    closed: bool,
    close_attempts: usize,
    queries: Vec<String>,
    actions: Vec<String>,
    navigations: Vec<String>,
    typed: HashMap<String, String>,
}

impl MockState {
    fn load(&mut self, url: &str) {
        let target = self.redirects.get(url).cloned().unwrap_or_else(|| url.to_string());
        self.url = target;
        self.loaded_at = Instant::now();
    }

    fn matches(&self, selector: &str, scope: Option<&str>) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.selector == selector && e.scope.as_deref() == scope)
            .filter(|(_, e)| e.is_present(&self.url, self.loaded_at))
            .map(|(position, _)| position)
            .collect()
    }

    fn resolve(&self, element: &ElementRef) -> Result<usize> {
        let scope = element.scope.as_ref().map(|s| s.selector.expression());
        self.matches(element.selector.expression(), scope)
            .get(element.index)
            .copied()
            .ok_or_else(|| NavError::ElementNotFound(format!("{} is no longer attached", element)))
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Navigate(url) => self.load(&url),
                Effect::Reveal(selector) => {
                    self.elements.iter_mut().filter(|e| e.selector == selector).for_each(|e| e.visible = true);
                }
                Effect::SetAttribute { selector, name, value } => {
                    self.elements
                        .iter_mut()
                        .filter(|e| e.selector == selector)
                        .for_each(|e| {
                            e.attributes.insert(name.clone(), value.clone());
                        });
                }
            }
        }
    }
}

/// Scriptable [`Driver`]. Clones share the same page.
#[derive(Debug, Clone)]
pub struct MockDriver {
    state: Rc<RefCell<MockState>>,
}

impl MockDriver {
    /// A page currently showing `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                url: url.into(),
                loaded_at: Instant::now(),
                elements: Vec::new(),
                redirects: HashMap::new(),
                last_navigation_timeout: None,
                fail_close: false,
                closed: false,
                close_attempts: 0,
                queries: Vec::new(),
                actions: Vec::new(),
                navigations: Vec::new(),
                typed: HashMap::new(),
            })),
        }
    }

    /// Builder method: add an element
    pub fn with_element(self, element: MockElement) -> Self {
        self.state.borrow_mut().elements.push(element);
        self
    }

    /// Builder method: loading `from` ends up on `to`
    pub fn with_redirect(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.state.borrow_mut().redirects.insert(from.into(), to.into());
        self
    }

    /// Builder method: `close` fails
    pub fn fail_on_close(self) -> Self {
        self.state.borrow_mut().fail_close = true;
        self
    }

    /// Selectors queried so far, in order (`css=...` / `xpath=...`)
    pub fn queries(&self) -> Vec<String> {
        self.state.borrow().queries.clone()
    }

    /// Actions performed so far, as `"<kind> <selector>"`
    pub fn actions(&self) -> Vec<String> {
        self.state.borrow().actions.clone()
    }

    /// URLs passed to `navigate`, in order
    pub fn navigations(&self) -> Vec<String> {
        self.state.borrow().navigations.clone()
    }

    /// Load timeout passed to the most recent `navigate`
    pub fn last_navigation_timeout(&self) -> Option<Duration> {
        self.state.borrow().last_navigation_timeout
    }

    /// Text typed into the element with this selector
    pub fn typed_value(&self, selector: &str) -> Option<String> {
        self.state.borrow().typed.get(selector).cloned()
    }

    pub fn url(&self) -> String {
        self.state.borrow().url.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    pub fn close_attempts(&self) -> usize {
        self.state.borrow().close_attempts
    }
}

impl Driver for MockDriver {
    fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.navigations.push(url.to_string());
        state.last_navigation_timeout = Some(timeout);
        state.load(url);
        Ok(())
    }

    fn current_url(&self) -> Result<String> {
        Ok(self.state.borrow().url.clone())
    }

    fn find_all(&self, selector: &Selector, scope: Option<&ElementRef>) -> Result<Vec<ElementRef>> {
        let mut state = self.state.borrow_mut();
        state.queries.push(selector.to_string());

        if let Some(scope) = scope {
            state.resolve(scope)?;
        }
        let count = state.matches(selector.expression(), scope.map(|s| s.selector.expression())).len();
        Ok((0..count).map(|index| ElementRef::new(selector.clone(), index, scope)).collect())
    }

    fn is_visible(&self, element: &ElementRef) -> Result<bool> {
        let state = self.state.borrow();
        let position = state.resolve(element)?;
        Ok(state.elements[position].visible)
    }

    fn text(&self, element: &ElementRef) -> Result<String> {
        let state = self.state.borrow();
        let position = state.resolve(element)?;
        Ok(state.elements[position].text.trim().to_string())
    }

    fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        let state = self.state.borrow();
        let position = state.resolve(element)?;
        Ok(state.elements[position].attributes.get(name).cloned())
    }

    fn perform(&self, element: &ElementRef, action: &DomAction) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let kind = action.kind();
        state.actions.push(format!("{} {}", kind, element.selector.expression()));

        let position = state.resolve(element)?;
        let target = state.elements[position].clone();

        if target.raises.contains(&kind) {
            return Err(NavError::DriverFailed(format!("{} on {} raised", kind, element)));
        }
        if target.inert.contains(&kind) {
            return Ok(());
        }

        match action {
            DomAction::ScriptClick | DomAction::PointerClick { .. } => state.apply(target.on_click),
            DomAction::Dispatch { event } if event == "click" => state.apply(target.on_click),
            DomAction::Dispatch { event } if event == "mouseover" => state.apply(target.on_hover),
            DomAction::Hover { .. } => state.apply(target.on_hover),
            DomAction::Submit => state.apply(target.on_submit),
            DomAction::Clear => {
                state.typed.remove(&target.selector);
            }
            DomAction::TypeText(text) => {
                state.typed.entry(target.selector.clone()).or_default().push_str(text);
            }
            DomAction::Dispatch { .. } | DomAction::ScrollIntoView => {}
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.close_attempts += 1;
        if state.fail_close {
            return Err(NavError::DriverFailed("browser already gone".to_string()));
        }
        state.closed = true;
        Ok(())
    }
}

/// Hands out clones of one [`MockDriver`] and counts launches
#[derive(Debug)]
pub struct MockProvider {
    driver: MockDriver,
    launches: Cell<usize>,
    failure: Option<String>,
}

impl MockProvider {
    pub fn new(driver: MockDriver) -> Self {
        Self { driver, launches: Cell::new(0), failure: None }
    }

    /// Builder method: every launch fails with `reason`
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    pub fn launch_count(&self) -> usize {
        self.launches.get()
    }

    pub fn driver(&self) -> &MockDriver {
        &self.driver
    }
}

impl BrowserProvider for MockProvider {
    fn launch(&self) -> Result<Box<dyn Driver>> {
        self.launches.set(self.launches.get() + 1);
        match &self.failure {
            Some(reason) => Err(NavError::LaunchFailed(reason.clone())),
            None => Ok(Box::new(self.driver.clone())),
        }
    }
}
