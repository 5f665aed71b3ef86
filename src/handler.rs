//! Invocation boundary
//!
//! One call to [`Handler::handle`] is one session: fetch credentials, launch a
//! browser, run the flow, release the browser, and reduce everything to a
//! status code and a small JSON body. It never panics and never returns an
//! error; failures become a 500 result.

use crate::{browser::{BrowserProvider, DriverGuard},
            config::FlowConfig,
            error::{NavError, Result},
            secrets::SecretStore,
            session::{SessionController, SessionReport, Verdict},
            wait::Deadline};
use serde::Serialize;
use serde_json::Value;

pub const LOGIN_SUCCEEDED: &str = "Login successful";
pub const LOGIN_UNCERTAIN: &str = "Login may have failed";

/// Body of an invocation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Message {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_url: Option<String>,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_url: Option<String>,
    },
}

impl ResponseBody {
    pub fn current_url(&self) -> Option<&str> {
        match self {
            ResponseBody::Message { current_url, .. } | ResponseBody::Error { current_url, .. } => current_url.as_deref(),
        }
    }
}

/// Structured result of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ResponseBody,
}

impl InvocationResult {
    pub fn error(error: &NavError, current_url: Option<String>) -> Self {
        Self { status_code: 500, body: ResponseBody::Error { error: error.to_string(), current_url } }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

impl From<&SessionReport> for InvocationResult {
    fn from(report: &SessionReport) -> Self {
        let current_url = report.current_url.clone();
        match &report.verdict {
            Verdict::Confirmed => {
                Self { status_code: 200, body: ResponseBody::Message { message: LOGIN_SUCCEEDED.to_string(), current_url } }
            }
            Verdict::LoginPage => {
                Self { status_code: 400, body: ResponseBody::Message { message: LOGIN_UNCERTAIN.to_string(), current_url } }
            }
            Verdict::Fatal(error) => Self { status_code: 500, body: ResponseBody::Error { error: error.clone(), current_url } },
        }
    }
}

/// Entry point binding a config, a secret store and a browser provider
pub struct Handler<S, P> {
    config: FlowConfig,
    secrets: S,
    provider: P,
}

impl<S: SecretStore, P: BrowserProvider> Handler<S, P> {
    pub fn new(config: FlowConfig, secrets: S, provider: P) -> Self {
        Self { config, secrets, provider }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn secrets(&self) -> &S {
        &self.secrets
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run one session. `event` and `context` carry no inputs the flow needs.
    pub fn handle(&self, event: &Value, context: &Value) -> InvocationResult {
        log::debug!("Invocation event={} context={}", event, context);

        match self.run() {
            Ok(report) => {
                let result = InvocationResult::from(&report);
                log::info!(
                    "Session finished in state {} with status {} | url={}",
                    report.state,
                    result.status_code,
                    report.current_url.as_deref().unwrap_or("<unknown>")
                );
                result
            }
            Err(e) => {
                log::error!("Invocation failed before navigation: {}", e);
                InvocationResult::error(&e, None)
            }
        }
    }

    /// Fetch credentials, launch, and run the session.
    ///
    /// Errors here happen before any navigation; the browser is released when
    /// this returns, whatever the session outcome.
    pub fn run(&self) -> Result<SessionReport> {
        self.config.validate()?;
        let deadline = Deadline::after(self.config.deadline);

        let credentials = self.secrets.get_credentials(&self.config.secret_id, &self.config.region)?;
        let guard = DriverGuard::new(self.provider.launch()?);

        let report = SessionController::new(guard.driver(), &self.config, deadline).run(credentials);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{browser::{MockDriver, MockProvider},
                secrets::StaticSecretStore,
                session::SessionState};
    use serde_json::json;

    fn report(verdict: Verdict, url: &str) -> SessionReport {
        SessionReport {
            state: SessionState::Done,
            verdict,
            current_url: Some(url.to_string()),
            confirmation: None,
            events: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn test_status_mapping() {
        let ok = InvocationResult::from(&report(Verdict::Confirmed, "https://x/reports/attendance"));
        assert_eq!(ok.status_code, 200);
        assert_eq!(ok.body.current_url(), Some("https://x/reports/attendance"));

        let login = InvocationResult::from(&report(Verdict::LoginPage, "https://x/user/login"));
        assert_eq!(login.status_code, 400);

        let fatal = InvocationResult::from(&report(Verdict::Fatal("boom".to_string()), "https://x/home"));
        assert_eq!(fatal.status_code, 500);
    }

    #[test]
    fn test_serialized_shape() {
        let ok = InvocationResult::from(&report(Verdict::Confirmed, "https://x/reports/attendance"));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"statusCode": 200, "body": {"message": LOGIN_SUCCEEDED, "current_url": "https://x/reports/attendance"}})
        );

        let error = InvocationResult::error(&NavError::LaunchFailed("no chrome".to_string()), None);
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"statusCode": 500, "body": {"error": "Failed to launch browser: no chrome"}})
        );
    }

    #[test]
    fn test_invalid_config_is_500_without_launch() {
        let config = FlowConfig::new().tab_label("");
        let handler = Handler::new(config, StaticSecretStore::new("a", "b"), MockProvider::new(MockDriver::new("about:blank")));

        let result = handler.handle(&json!({}), &json!({}));

        assert_eq!(result.status_code, 500);
        assert_eq!(handler.provider().launch_count(), 0);
    }

    #[test]
    fn test_oversized_deadline_is_500_not_panic() {
        let config = FlowConfig::new().deadline(std::time::Duration::from_secs(u64::MAX));
        let handler = Handler::new(config, StaticSecretStore::new("a", "b"), MockProvider::new(MockDriver::new("about:blank")));

        let result = handler.handle(&json!({}), &json!({}));

        assert_eq!(result.status_code, 500);
        assert!(matches!(result.body, ResponseBody::Error { ref error, .. } if error.contains("deadline")));
        assert_eq!(handler.provider().launch_count(), 0);
    }

    #[test]
    fn test_launch_failure_is_500() {
        let provider = MockProvider::new(MockDriver::new("about:blank")).failing("chrome missing");
        let handler = Handler::new(FlowConfig::new(), StaticSecretStore::new("a", "b"), provider);

        let result = handler.handle(&json!({}), &json!({}));

        assert_eq!(result.status_code, 500);
        assert!(matches!(result.body, ResponseBody::Error { ref error, .. } if error.contains("chrome missing")));
    }
}
