use crate::{browser::{DomAction, Selector},
            config::FlowConfig,
            confirm::{UrlPattern, wait_for_url},
            error::{NavError, Result},
            interact::Action,
            locator::LocatorSpec,
            secrets::Credentials,
            step::{StepContext, Strategy}};
use std::{cell::RefCell, time::Duration};

/// Fill in the login form and submit it.
///
/// Confirmed once the URL no longer contains the login path. The credentials are
/// taken on the first attempt; a second attempt fails instead of reusing them.
pub struct SubmitCredentials {
    login_url: String,
    login_path: String,
    form_budget: Duration,
    credentials: RefCell<Option<Credentials>>,
}

impl SubmitCredentials {
    pub fn new(config: &FlowConfig, credentials: Credentials) -> Self {
        Self {
            login_url: config.login_url(),
            login_path: config.login_path.clone(),
            form_budget: config.budgets.login_form,
            credentials: RefCell::new(Some(credentials)),
        }
    }

    fn field(&self, name: &str) -> LocatorSpec {
        LocatorSpec::new(format!("{} field", name), Selector::css(format!("input[name='{}']", name)))
            .budget(self.form_budget)
    }
}

impl Strategy for SubmitCredentials {
    fn name(&self) -> &str {
        "submit credentials"
    }

    fn attempt(&self, context: &mut StepContext<'_, '_>) -> Result<String> {
        let credentials = self
            .credentials
            .borrow_mut()
            .take()
            .ok_or_else(|| NavError::AuthenticationFailure("credentials were already used".to_string()))?;
        let (identifier, secret) = credentials.into_parts();

        context.locator.navigate(&self.login_url)?;
        context.record("Opened login page");

        let username = context.locator.locate(&self.field("username").visible(), None)?;
        let password = context.locator.locate(&self.field("password"), None)?;

        let interactor = context.interactor();
        interactor.interact(&username, &Action::Type(identifier)).into_result("username field")?;
        interactor.interact(&password, &Action::Type(secret)).into_result("password field")?;

        let form = context.locator.locate(&LocatorSpec::new("login form", Selector::css("form")).budget(self.form_budget), None)?;
        context.driver().perform(&form, &DomAction::Submit)?;

        let url = wait_for_url(&context.locator, &UrlPattern::Excludes(self.login_path.clone()), context.budget)?;
        context.record("After login redirect");
        Ok(url)
    }
}
