//! Session Controller
//!
//! Runs the authentication, report and tab steps in a fixed order against one
//! browser, tracks the session state machine, and decides the final verdict
//! from an independent read of the URL once the steps are done.

use crate::{browser::Driver,
            config::FlowConfig,
            confirm::Confirmation,
            error::{NavError, Result},
            events::{EventLog, LogEvent},
            flow,
            locator::Locator,
            secrets::Credentials,
            step::StepOutcome,
            wait::Deadline};
use serde::Serialize;
use std::fmt;

/// Logical state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    MenuExpanded,
    AttendanceReportConfirmed,
    TabSelected,
    Done,
    DoneWithoutTab,
    FailedFatal,
}

impl SessionState {
    /// Whether the state machine has an edge from `self` to `next`
    pub fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, next),
            (Unauthenticated, Authenticated)
                | (Unauthenticated | Authenticated | MenuExpanded, FailedFatal)
                | (Authenticated, MenuExpanded | AttendanceReportConfirmed)
                | (MenuExpanded, AttendanceReportConfirmed)
                | (AttendanceReportConfirmed, TabSelected | DoneWithoutTab)
                | (TabSelected, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Done | SessionState::DoneWithoutTab | SessionState::FailedFatal)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// State carried through one run
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    events: EventLog,
    confirmation: Option<Confirmation>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self { state: SessionState::Unauthenticated, events: EventLog::new(), confirmation: None }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move to `next`; re-entering the current state is a no-op
    pub fn advance(&mut self, next: SessionState) -> Result<()> {
        if next == self.state {
            return Ok(());
        }
        if !self.state.can_advance_to(next) {
            return Err(NavError::InvalidTransition { from: self.state.to_string(), to: next.to_string() });
        }
        log::debug!("Session state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    pub fn record(&mut self, driver: &dyn Driver, message: impl Into<String>) {
        self.events.record(driver, message);
    }

    pub fn record_warning(&mut self, driver: &dyn Driver, message: impl Into<String>) {
        self.events.record_warning(driver, message);
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn set_confirmation(&mut self, confirmation: Confirmation) {
        self.confirmation = Some(confirmation);
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    fn fail(&mut self) {
        if let Err(e) = self.advance(SessionState::FailedFatal) {
            log::warn!("Could not mark session failed: {}", e);
        }
    }
}

/// Overall result of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The final URL is off the login page
    Confirmed,
    /// The session ended on the login page
    LoginPage,
    /// An unrecoverable error
    Fatal(String),
}

impl Verdict {
    /// Decide from the session error and an independent read of the final URL.
    ///
    /// Rejected credentials that leave the browser on the login page are a login
    /// verdict, not a fatal one; any other error is fatal.
    pub fn determine(error: Option<&NavError>, final_url: Option<&str>, login_path: &str) -> Self {
        match (error, final_url) {
            (Some(NavError::AuthenticationFailure(_)) | None, Some(url)) if url.contains(login_path) => Verdict::LoginPage,
            (None, Some(_)) => Verdict::Confirmed,
            (Some(e), _) => Verdict::Fatal(e.to_string()),
            (None, None) => Verdict::Fatal("could not read the final page URL".to_string()),
        }
    }
}

/// What a finished session hands back to the invocation boundary
#[derive(Debug)]
pub struct SessionReport {
    pub state: SessionState,
    pub verdict: Verdict,
    pub current_url: Option<String>,
    pub confirmation: Option<Confirmation>,
    pub events: Vec<LogEvent>,
    pub error: Option<NavError>,
}

impl SessionReport {
    pub fn tab_selected(&self) -> bool {
        self.state == SessionState::Done
    }
}

/// Orchestrates the ordered steps of one session
pub struct SessionController<'a> {
    driver: &'a dyn Driver,
    config: &'a FlowConfig,
    deadline: Deadline,
}

impl<'a> SessionController<'a> {
    pub fn new(driver: &'a dyn Driver, config: &'a FlowConfig, deadline: Deadline) -> Self {
        Self { driver, config, deadline }
    }

    /// Run the whole flow. Never fails: errors end up in the report.
    pub fn run(&self, credentials: Credentials) -> SessionReport {
        let locator = Locator::new(self.driver, self.config.poll_interval, self.deadline);
        let mut session = Session::new();

        let error = self.drive(&mut session, locator, credentials).err();
        if let Some(e) = &error {
            log::error!("Session failed in state {}: {}", session.state(), e);
        }

        // Independent of what the steps reported
        let current_url = match self.driver.current_url() {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Could not read final URL: {}", e);
                None
            }
        };
        let verdict = Verdict::determine(error.as_ref(), current_url.as_deref(), &self.config.login_path);

        SessionReport {
            state: session.state(),
            verdict,
            current_url,
            confirmation: session.confirmation,
            events: session.events.into_events(),
            error,
        }
    }

    fn drive(&self, session: &mut Session, locator: Locator<'_>, credentials: Credentials) -> Result<()> {
        let interact = self.config.interact;

        let authentication = flow::authentication_step(self.config, credentials);
        if let StepOutcome::Failed(e) = authentication.run(session, locator, interact) {
            session.fail();
            return Err(match e {
                NavError::DeadlineExceeded(_) => e,
                other => NavError::AuthenticationFailure(other.to_string()),
            });
        }

        let report = flow::attendance_report_step(self.config);
        match report.run(session, locator, interact) {
            StepOutcome::Succeeded { strategy, .. } => {
                let header = session.confirmation().map(|c| c.title.clone()).unwrap_or_default();
                session.record(self.driver, format!("Confirmed Attendance Reports page via {} | header={}", strategy, header));
            }
            StepOutcome::Failed(e) => {
                session.fail();
                return Err(e);
            }
        }

        // Tab selection never fails the session
        let tab = flow::report_tab_step(self.config);
        match tab.run(session, locator, interact) {
            StepOutcome::Succeeded { .. } => session.advance(SessionState::Done)?,
            StepOutcome::Failed(e) => {
                session.record_warning(self.driver, format!("Tab '{}' not selected: {}", self.config.tab_label, e));
                session.advance(SessionState::DoneWithoutTab)?;
            }
        }

        Ok(())
    }
}
