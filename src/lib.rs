//! # report-nav
//!
//! Drives a headless Chrome through a login-protected web application to a
//! specific report view, using the Chrome DevTools Protocol via `headless_chrome`.
//! The target UI is brittle (hover menus, collapsible panels, elements that
//! ignore synthetic clicks), so every step carries layered fallbacks and every
//! wait is bounded.
//!
//! ## Features
//!
//! - **Layered strategies**: each navigation step tries a primary strategy and
//!   falls back to the next only when the previous one fails
//! - **Bounded waits**: every element lookup and URL check has its own budget,
//!   clamped by an invocation-wide deadline
//! - **Multi-technique interaction**: scripted click, pointer click and synthetic
//!   event dispatch, with per-attempt outcomes
//! - **Explicit session state machine** with a degraded terminal state when an
//!   optional step fails
//! - **Scoped browser lifetime**: the browser is released on every exit path
//!
//! ## Running the CLI
//!
//! ```bash
//! # Credentials from a JSON file under ./secrets/us-east-1/easytithe/login-creds.json
//! cargo run --bin report-nav -- --secrets-dir ./secrets
//!
//! # Visible browser, credentials from an environment variable
//! REPORT_NAV_CREDENTIALS='{"username":"..","password":".."}' \
//!     cargo run --bin report-nav -- --headed --secret-env REPORT_NAV_CREDENTIALS
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use report_nav::{ChromeProvider, FileSecretStore, FlowConfig, Handler, LaunchOptions};
//! use serde_json::json;
//!
//! # fn main() -> report_nav::Result<()> {
//! let config = FlowConfig::from_env()?;
//! let handler = Handler::new(
//!     config,
//!     FileSecretStore::new("/etc/report-nav/secrets"),
//!     ChromeProvider::new(LaunchOptions::default()),
//! );
//!
//! let result = handler.handle(&json!({}), &json!({}));
//! println!("{}", result.status_code);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: the `Driver` seam, the Chrome implementation, launch options, and
//!   (feature `mock`) an in-memory implementation for tests
//! - [`locator`], [`interact`], [`confirm`]: the element-level primitives
//! - [`step`], [`flow`]: strategies and the concrete steps of the report flow
//! - [`session`]: state machine and orchestration
//! - [`handler`]: the invocation boundary mapping a session to `{statusCode, body}`
//! - [`error`]: Error types and result aliases

pub mod browser;
pub mod config;
pub mod confirm;
pub mod error;
pub mod events;
pub mod flow;
pub mod handler;
pub mod interact;
pub mod locator;
pub mod secrets;
pub mod session;
pub mod step;
pub mod wait;

pub use browser::{BrowserProvider, ChromeDriver, ChromeProvider, Driver, DriverGuard, LaunchOptions};
#[cfg(any(test, feature = "mock"))]
pub use browser::{MockDriver, MockProvider};
pub use config::{Budgets, FlowConfig};
pub use error::{NavError, Result};
pub use handler::{Handler, InvocationResult, ResponseBody};
pub use secrets::{Credentials, EnvSecretStore, FileSecretStore, SecretStore, StaticSecretStore};
pub use session::{SessionController, SessionReport, SessionState, Verdict};
pub use wait::Deadline;
