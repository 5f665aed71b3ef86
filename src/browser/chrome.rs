use crate::{browser::{BrowserProvider, DomAction, Driver, ElementRef, LaunchOptions, Selector},
            error::{NavError, Result}};
use headless_chrome::{Browser, Element, Tab};
use serde_json::json;
use std::{ffi::OsStr, sync::Arc, time::Duration};

const SCROLL_INTO_VIEW_JS: &str = "function() { this.scrollIntoView({block: 'center', inline: 'center'}); return true; }";

const SCRIPT_CLICK_JS: &str = "function() { this.click(); return true; }";

const DISPATCH_JS: &str = r#"
    function(type) {
        this.dispatchEvent(new MouseEvent(type, {bubbles: true, cancelable: true, view: window}));
        return true;
    }
"#;

const CLEAR_JS: &str = r#"
    function() {
        if ('value' in this) {
            this.value = '';
            this.dispatchEvent(new Event('input', {bubbles: true}));
        }
        return true;
    }
"#;

const SUBMIT_JS: &str = r#"
    function() {
        const form = this.tagName === 'FORM' ? this : this.closest('form');
        if (!form) {
            return false;
        }
        if (form.requestSubmit) {
            form.requestSubmit();
        } else {
            form.submit();
        }
        return true;
    }
"#;

const IS_VISIBLE_JS: &str = r#"
    function() {
        const rect = this.getBoundingClientRect();
        const style = window.getComputedStyle(this);
        return rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none';
    }
"#;

const TEXT_JS: &str = "function() { return (this.innerText || this.textContent || '').trim(); }";

const ATTRIBUTE_JS: &str = "function(name) { return this.getAttribute(name); }";

/// Driver backed by a local Chrome/Chromium instance
pub struct ChromeDriver {
    /// The underlying headless_chrome Browser instance; the process ends when it is dropped
    browser: Browser,

    /// Tab the session runs in
    tab: Arc<Tab>,

    /// Default wait for a page load
    page_load_timeout: Duration,
}

impl ChromeDriver {
    /// Launch a new browser instance with the given options
    pub fn launch(options: &LaunchOptions) -> Result<Self> {
        let extra_args = options.chrome_args();
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));
        launch_opts.args.extend(extra_args.iter().map(OsStr::new));

        launch_opts.idle_browser_timeout = options.idle_timeout;
        launch_opts.headless = options.headless;
        launch_opts.sandbox = options.sandbox;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.user_data_dir = Some(options.user_data_dir());
        launch_opts.process_envs = Some(options.process_env());

        if let Some(path) = options.resolve_chrome_path() {
            launch_opts.path = Some(path);
        }

        let browser = Browser::new(launch_opts).map_err(|e| NavError::LaunchFailed(e.to_string()))?;

        let tab = browser.new_tab().map_err(|e| NavError::LaunchFailed(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(options.page_load_timeout);

        log::info!(
            "Browser launched (headless: {}, size: {}x{})",
            options.headless,
            options.window_width,
            options.window_height
        );

        Ok(Self { browser, tab, page_load_timeout: options.page_load_timeout })
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Get the session tab
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    fn query(&self, selector: &Selector, scope: Option<&ElementRef>) -> Result<Vec<Element<'_>>> {
        let found = match (scope, selector) {
            (None, Selector::Css(css)) => self.tab.find_elements(css),
            (None, Selector::XPath(xpath)) => self.tab.find_elements_by_xpath(xpath),
            (Some(scope), Selector::Css(css)) => self.resolve(scope)?.find_elements(css),
            (Some(_), Selector::XPath(_)) => {
                return Err(NavError::DriverFailed(format!(
                    "XPath query '{}' is not supported inside a scope element",
                    selector.expression()
                )));
            }
        };

        // headless_chrome reports an empty match set as an error
        match found {
            Ok(elements) => Ok(elements),
            Err(e) => {
                log::debug!("No match for {}: {}", selector, e);
                Ok(Vec::new())
            }
        }
    }

    fn resolve(&self, element: &ElementRef) -> Result<Element<'_>> {
        let mut matches = self.query(&element.selector, element.scope.as_deref())?;
        if element.index < matches.len() {
            Ok(matches.swap_remove(element.index))
        } else {
            Err(NavError::ElementNotFound(format!("{} is no longer attached", element)))
        }
    }

    fn call(&self, element: &ElementRef, function: &str, args: Vec<serde_json::Value>) -> Result<serde_json::Value> {
        let target = self.resolve(element)?;
        let result = target
            .call_js_fn(function, args, false)
            .map_err(|e| NavError::DriverFailed(format!("Script on {} failed: {}", element, e)))?;

        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }
}

impl Driver for ChromeDriver {
    fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let timeout = timeout.min(self.page_load_timeout);
        self.tab.set_default_timeout(timeout);
        let loaded = self.tab.navigate_to(url).and_then(|tab| tab.wait_until_navigated());
        self.tab.set_default_timeout(self.page_load_timeout);

        loaded
            .map(drop)
            .map_err(|e| NavError::DriverFailed(format!("Navigation to {} did not complete within {:?}: {}", url, timeout, e)))
    }

    fn current_url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    fn find_all(&self, selector: &Selector, scope: Option<&ElementRef>) -> Result<Vec<ElementRef>> {
        let count = self.query(selector, scope)?.len();
        Ok((0..count).map(|index| ElementRef::new(selector.clone(), index, scope)).collect())
    }

    fn is_visible(&self, element: &ElementRef) -> Result<bool> {
        Ok(self.call(element, IS_VISIBLE_JS, Vec::new())?.as_bool().unwrap_or(false))
    }

    fn text(&self, element: &ElementRef) -> Result<String> {
        Ok(self.call(element, TEXT_JS, Vec::new())?.as_str().unwrap_or_default().to_string())
    }

    fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        let value = self.call(element, ATTRIBUTE_JS, vec![json!(name)])?;
        Ok(value.as_str().map(str::to_string))
    }

    fn perform(&self, element: &ElementRef, action: &DomAction) -> Result<()> {
        let failed = |e: anyhow::Error| NavError::DriverFailed(format!("{:?} on {} failed: {}", action, element, e));

        match action {
            DomAction::ScrollIntoView => {
                self.call(element, SCROLL_INTO_VIEW_JS, Vec::new())?;
            }
            DomAction::ScriptClick => {
                self.call(element, SCRIPT_CLICK_JS, Vec::new())?;
            }
            DomAction::Dispatch { event } => {
                self.call(element, DISPATCH_JS, vec![json!(event)])?;
            }
            DomAction::Clear => {
                self.call(element, CLEAR_JS, Vec::new())?;
            }
            DomAction::Submit => {
                if !self.call(element, SUBMIT_JS, Vec::new())?.as_bool().unwrap_or(false) {
                    return Err(NavError::DriverFailed(format!("{} is not inside a form", element)));
                }
            }
            DomAction::PointerClick { pause } => {
                let target = self.resolve(element)?;
                target.move_mouse_over().map_err(failed)?;
                std::thread::sleep(*pause);
                target.click().map_err(failed)?;
            }
            DomAction::Hover { pause } => {
                self.resolve(element)?.move_mouse_over().map_err(failed)?;
                std::thread::sleep(*pause);
            }
            DomAction::TypeText(text) => {
                self.resolve(element)?.type_into(text).map_err(failed)?;
            }
        }

        Ok(())
    }

    fn close(&self) -> Result<()> {
        // The process itself ends when the Browser is dropped; closing tabs first lets pages unload
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| NavError::DriverFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        for tab in tabs {
            let _ = tab.close(false); // Ignore errors on individual tab closes
        }
        Ok(())
    }
}

/// Launches a fresh [`ChromeDriver`] per session
#[derive(Debug, Clone, Default)]
pub struct ChromeProvider {
    options: LaunchOptions,
}

impl ChromeProvider {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }
}

impl BrowserProvider for ChromeProvider {
    fn launch(&self) -> Result<Box<dyn Driver>> {
        for dir in self.options.writable_dirs() {
            std::fs::create_dir_all(&dir)
                .map_err(|e| NavError::LaunchFailed(format!("Cannot create {}: {}", dir.display(), e)))?;
        }

        Ok(Box::new(ChromeDriver::launch(&self.options)?))
    }
}
