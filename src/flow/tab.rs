use crate::{browser::{Driver, ElementRef, Selector},
            config::{Budgets, FlowConfig},
            confirm::{UrlPattern, wait_for_url},
            error::{NavError, Result},
            interact::{Action, PostCondition},
            locator::LocatorSpec,
            step::{StepContext, Strategy},
            wait::{Wait, WaitOutcome, poll_until}};

/// Click a report tab by its visible label and confirm it became active.
///
/// Active means the link carries `aria-selected='true'` or an `active` class, or
/// the URL picked up the lower-cased label.
pub struct SelectTab {
    label: String,
    budgets: Budgets,
}

impl SelectTab {
    pub fn new(config: &FlowConfig) -> Self {
        Self { label: config.tab_label.clone(), budgets: config.budgets }
    }

    fn link(&self) -> LocatorSpec {
        LocatorSpec::new(format!("'{}' tab", self.label), Selector::xpath(format!("//a[normalize-space()='{}']", self.label)))
            .budget(self.budgets.tab)
    }
}

/// Lower-cased label used to recognise a tab in the URL
fn url_token(label: &str) -> String {
    label.trim().to_lowercase().replace(char::is_whitespace, "-")
}

/// Whether the tab link is marked as the selected one
fn is_active(driver: &dyn Driver, link: &ElementRef) -> bool {
    let selected = driver.attribute(link, "aria-selected").ok().flatten();
    let class = driver.attribute(link, "class").ok().flatten().unwrap_or_default();
    selected.as_deref() == Some("true") || class.split_whitespace().any(|c| c == "active")
}

impl Strategy for SelectTab {
    fn name(&self) -> &str {
        "select tab"
    }

    fn attempt(&self, context: &mut StepContext<'_, '_>) -> Result<String> {
        let locator = context.locator;
        let driver = context.driver();

        let link = locator.locate(&self.link(), None)?;
        context
            .interactor()
            .interact(&link, &Action::Click(PostCondition::None))
            .into_result(&self.link().name)?;

        let wait = Wait::new(self.budgets.tab_active).poll_interval(locator.poll_interval());
        match poll_until(wait, locator.deadline(), || is_active(driver, &link).then_some(())) {
            WaitOutcome::Ready(()) => {
                context.record(format!("Selected tab '{}'", self.label));
                return Ok(driver.current_url()?);
            }
            WaitOutcome::DeadlineExceeded => {
                return Err(NavError::DeadlineExceeded(format!("tab '{}' to become active", self.label)));
            }
            WaitOutcome::TimedOut => log::debug!("Tab '{}' shows no active marker, checking the URL", self.label),
        }

        let in_url = UrlPattern::Contains(url_token(&self.label));
        match wait_for_url(&locator, &in_url, self.budgets.tab_url) {
            Ok(url) => {
                context.record(format!("Selected tab '{}'", self.label));
                Ok(url)
            }
            Err(NavError::ConfirmationTimeout { waited, .. }) => Err(NavError::ConfirmationTimeout {
                what: format!("tab '{}' to become active", self.label),
                waited,
            }),
            Err(e) => Err(e),
        }
    }
}
