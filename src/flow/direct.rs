use crate::{config::FlowConfig,
            confirm::{Expectation, confirm},
            error::Result,
            flow::report_expectation,
            step::{StepContext, Strategy}};

/// Load the report URL directly and confirm it
pub struct DirectUrl {
    report_url: String,
    expectation: Expectation,
}

impl DirectUrl {
    pub fn new(config: &FlowConfig) -> Self {
        Self { report_url: config.report_url(), expectation: report_expectation(config) }
    }
}

impl Strategy for DirectUrl {
    fn name(&self) -> &str {
        "direct URL"
    }

    fn attempt(&self, context: &mut StepContext<'_, '_>) -> Result<String> {
        context.locator.navigate(&self.report_url)?;

        let confirmation = confirm(&context.locator, &self.expectation)?;
        context.record("Attendance reports (direct nav)");
        let url = confirmation.url.clone();
        context.session.set_confirmation(confirmation);
        Ok(url)
    }
}
