//! Flow configuration
//!
//! Everything site-specific or timing-related lives here so the navigation core
//! stays free of constants. Values are fixed at construction and never mutated
//! during a session.

use crate::{error::{NavError, Result},
            interact::InteractOptions,
            wait::{DEFAULT_DEADLINE_SECS, DEFAULT_POLL_INTERVAL_MS}};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://spotc.easytitheplus.com";
pub const DEFAULT_LOGIN_PATH: &str = "/user/login";
pub const DEFAULT_REPORT_PATH: &str = "/reports/attendance";
pub const DEFAULT_TAB_LABEL: &str = "Absences";
pub const DEFAULT_SECRET_ID: &str = "easytithe/login-creds";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Longest accepted invocation deadline (one day)
pub const MAX_DEADLINE_SECS: u64 = 24 * 60 * 60;

/// Upper bounds for every wait in the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budgets {
    /// Login form fields
    pub login_form: Duration,
    /// Leaving the login page after submit
    pub login_redirect: Duration,
    /// Reports menu container
    pub menu: Duration,
    /// Menu items becoming visible after hover
    pub menu_items: Duration,
    /// Attendance link inside the menu
    pub report_link: Duration,
    /// Report URL after clicking or navigating
    pub report_url: Duration,
    /// Each best-effort page marker
    pub marker: Duration,
    /// Tab link lookup
    pub tab: Duration,
    /// Tab showing as active
    pub tab_active: Duration,
    /// URL reflecting the selected tab
    pub tab_url: Duration,
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            login_form: Duration::from_secs(20),
            login_redirect: Duration::from_secs(20),
            menu: Duration::from_secs(20),
            menu_items: Duration::from_secs(5),
            report_link: Duration::from_secs(10),
            report_url: Duration::from_secs(30),
            marker: Duration::from_secs(5),
            tab: Duration::from_secs(20),
            tab_active: Duration::from_secs(10),
            tab_url: Duration::from_secs(5),
        }
    }
}

impl Budgets {
    /// Every budget set to `budget`
    pub fn uniform(budget: Duration) -> Self {
        Self {
            login_form: budget,
            login_redirect: budget,
            menu: budget,
            menu_items: budget,
            report_link: budget,
            report_url: budget,
            marker: budget,
            tab: budget,
            tab_active: budget,
            tab_url: budget,
        }
    }
}

/// Configuration of one navigation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    /// Site origin, e.g. `https://spotc.easytitheplus.com`
    pub base_url: String,
    pub login_path: String,
    pub report_path: String,

    /// Visible label of the report sub-tab to select
    pub tab_label: String,

    /// Key of the credentials in the secret store
    pub secret_id: String,
    pub region: String,

    pub budgets: Budgets,
    pub poll_interval: Duration,

    /// Overall limit for one invocation
    pub deadline: Duration,

    pub interact: InteractOptions,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            report_path: DEFAULT_REPORT_PATH.to_string(),
            tab_label: DEFAULT_TAB_LABEL.to_string(),
            secret_id: DEFAULT_SECRET_ID.to_string(),
            region: DEFAULT_REGION.to_string(),
            budgets: Budgets::default(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            interact: InteractOptions::default(),
        }
    }
}

impl FlowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden from the process environment.
    ///
    /// Reads `SECRET_NAME`, `REGION` (then `AWS_REGION`, `AWS_DEFAULT_REGION`),
    /// `REPORT_NAV_BASE_URL`, `REPORT_NAV_TAB` and `REPORT_NAV_DEADLINE_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`FlowConfig::from_env`] with an explicit variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(secret_id) = lookup("SECRET_NAME") {
            config.secret_id = secret_id;
        }
        if let Some(region) = ["REGION", "AWS_REGION", "AWS_DEFAULT_REGION"].into_iter().find_map(&lookup) {
            config.region = region;
        }
        if let Some(base_url) = lookup("REPORT_NAV_BASE_URL") {
            config = config.base_url(base_url);
        }
        if let Some(tab) = lookup("REPORT_NAV_TAB") {
            config.tab_label = tab;
        }
        if let Some(secs) = lookup("REPORT_NAV_DEADLINE_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| NavError::InvalidConfig(format!("REPORT_NAV_DEADLINE_SECS='{}': {}", secs, e)))?;
            config.deadline = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Builder method: set site origin (a bare host gets `https://`)
    pub fn base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_url(base_url.as_ref()).trim_end_matches('/').to_string();
        self
    }

    /// Builder method: set the tab label
    pub fn tab_label(mut self, label: impl Into<String>) -> Self {
        self.tab_label = label.into();
        self
    }

    /// Builder method: set the secret id
    pub fn secret_id(mut self, secret_id: impl Into<String>) -> Self {
        self.secret_id = secret_id.into();
        self
    }

    /// Builder method: set the region
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Builder method: set wait budgets
    pub fn budgets(mut self, budgets: Budgets) -> Self {
        self.budgets = budgets;
        self
    }

    /// Builder method: set polling interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Builder method: set invocation deadline
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Builder method: set interaction timing
    pub fn interact(mut self, options: InteractOptions) -> Self {
        self.interact = options;
        self
    }

    pub fn login_url(&self) -> String {
        join_url(&self.base_url, &self.login_path)
    }

    pub fn report_url(&self) -> String {
        join_url(&self.base_url, &self.report_path)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(NavError::InvalidConfig(format!("base URL must be http(s): {}", self.base_url)));
        }
        if self.login_path.is_empty() || self.report_path.is_empty() {
            return Err(NavError::InvalidConfig("login and report paths must be set".to_string()));
        }
        if self.tab_label.trim().is_empty() {
            return Err(NavError::InvalidConfig("tab label must not be empty".to_string()));
        }
        if self.tab_label.contains('\'') {
            return Err(NavError::InvalidConfig(format!("tab label cannot contain a quote: {}", self.tab_label)));
        }
        if self.deadline > Duration::from_secs(MAX_DEADLINE_SECS) {
            return Err(NavError::InvalidConfig(format!(
                "deadline must be at most {}s, got {}s",
                MAX_DEADLINE_SECS,
                self.deadline.as_secs()
            )));
        }
        if self.poll_interval.is_zero() || self.poll_interval >= Duration::from_secs(1) {
            return Err(NavError::InvalidConfig(format!(
                "poll interval must be between 0 and 1s, got {:?}",
                self.poll_interval
            )));
        }
        Ok(())
    }
}

/// A bare host gets `https://` (`http://` for localhost); anything with a scheme is kept
fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }

    if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
        return format!("http://{}", trimmed);
    }

    format!("https://{}", trimmed)
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
