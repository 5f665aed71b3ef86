use crate::{browser::Selector,
            config::{Budgets, FlowConfig},
            confirm::{Expectation, UrlPattern, confirm},
            error::Result,
            flow::report_expectation,
            interact::{Action, InteractionOutcome, PostCondition},
            locator::LocatorSpec,
            session::SessionState,
            step::{StepContext, Strategy}};

const MENU: &str = "#main-collapsed-theReports";
const MENU_TRIGGER: &str = "a,button,[role='button'], .collapse-title, .link";

/// Open the reports side menu by hovering it and click the attendance link.
///
/// The hover and the item list are best-effort: collapsed menus often still
/// expose the link, so only failing to find or click the link fails the attempt.
pub struct ReportsMenu {
    report_path: String,
    budgets: Budgets,
    expectation: Expectation,
}

impl ReportsMenu {
    pub fn new(config: &FlowConfig) -> Self {
        Self { report_path: config.report_path.clone(), budgets: config.budgets, expectation: report_expectation(config) }
    }

    fn container(&self) -> LocatorSpec {
        LocatorSpec::new("reports menu", Selector::css(MENU)).budget(self.budgets.menu)
    }

    fn items(&self) -> LocatorSpec {
        LocatorSpec::new("reports menu items", Selector::css(format!("{} .collapse-box-items", MENU)))
            .visible()
            .budget(self.budgets.menu_items)
    }

    fn attendance_link(&self) -> LocatorSpec {
        LocatorSpec::new(
            "attendance report link",
            Selector::css(format!(
                "{} > div > div.collapse-box-items.sub-side-links.sub-link-theAttendanceReports.unity-color > a",
                MENU
            )),
        )
        .or(Selector::css(format!("{} .sub-link-theAttendanceReports a", MENU)))
        .or(Selector::css(format!("a[href*='{}']", self.report_path)))
        .budget(self.budgets.report_link)
    }
}

impl Strategy for ReportsMenu {
    fn name(&self) -> &str {
        "reports menu"
    }

    fn attempt(&self, context: &mut StepContext<'_, '_>) -> Result<String> {
        let locator = context.locator;
        let interactor = context.interactor();

        let menu = locator.locate(&self.container(), None)?;
        if let InteractionOutcome::Failed(attempts) = interactor.interact(&menu, &Action::ScrollIntoView) {
            log::debug!("Scrolling the reports menu failed: {:?}", attempts);
        }

        // Hover whatever inside the container reacts to the pointer, else the container
        let trigger_spec = LocatorSpec::new("reports menu trigger", Selector::css(MENU_TRIGGER))
            .budget(locator.poll_interval());
        let trigger = locator.try_locate(&trigger_spec, Some(&menu))?.unwrap_or_else(|| menu.clone());
        if let InteractionOutcome::Failed(attempts) = interactor.interact(&trigger, &Action::Hover) {
            context.record_warning(format!("Hovering the reports menu failed: {:?}", attempts));
        }

        if locator.try_locate(&self.items(), None)?.is_some() {
            context.session.advance(SessionState::MenuExpanded)?;
            context.record("Reports menu expanded");
        }

        let link = locator.locate(&self.attendance_link(), None)?;
        let opened = PostCondition::Url(UrlPattern::Contains(self.report_path.clone()));
        interactor.interact(&link, &Action::Click(opened)).into_result("attendance report link")?;

        let confirmation = confirm(&locator, &self.expectation)?;
        context.record("Attendance reports (menu click)");
        let url = confirmation.url.clone();
        context.session.set_confirmation(confirmation);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{browser::{Effect, MockDriver, MockElement},
                interact::InteractOptions,
                locator::Locator,
                session::Session,
                wait::Deadline};
    use std::time::Duration;

    const REPORT: &str = "https://site.test/reports/attendance";

    fn config() -> FlowConfig {
        FlowConfig::new()
            .base_url("https://site.test")
            .budgets(Budgets::uniform(Duration::from_millis(40)))
            .poll_interval(Duration::from_millis(5))
    }

    fn attempt(driver: &MockDriver, session: &mut Session) -> Result<String> {
        let config = config();
        let strategy = ReportsMenu::new(&config);
        let options = InteractOptions { pointer_pause: Duration::ZERO, hover_pause: Duration::ZERO, settle: Duration::from_millis(20) };
        let mut context = StepContext {
            locator: Locator::new(driver, Duration::from_millis(5), Deadline::none()),
            interact: options,
            budget: Duration::from_millis(40),
            session,
        };
        strategy.attempt(&mut context)
    }

    fn authenticated() -> Session {
        let mut session = Session::new();
        session.advance(SessionState::Authenticated).unwrap();
        session
    }

    fn menu_page() -> MockDriver {
        MockDriver::new("https://site.test/dashboard")
            .with_element(MockElement::new(MENU))
            .with_element(
                MockElement::new(MENU_TRIGGER).within(MENU).on_hover(Effect::Reveal(format!("{} .collapse-box-items", MENU))),
            )
            .with_element(MockElement::new(format!("{} .collapse-box-items", MENU)).hidden())
    }

    #[test]
    fn test_hover_expands_menu_and_click_confirms() {
        let driver = menu_page().with_element(
            MockElement::new(format!("{} .sub-link-theAttendanceReports a", MENU)).on_click(Effect::Navigate(REPORT.to_string())),
        );
        let mut session = authenticated();

        let url = attempt(&driver, &mut session).unwrap();

        assert_eq!(url, REPORT);
        assert_eq!(session.state(), SessionState::MenuExpanded);
        assert!(session.events().contains("Attendance reports (menu click)"));
        assert_eq!(session.confirmation().map(|c| c.title.as_str()), Some("Attendance Reports"));
    }

    #[test]
    fn test_unexpanded_menu_still_tries_link() {
        let driver = MockDriver::new("https://site.test/dashboard")
            .with_element(MockElement::new(MENU))
            .with_element(MockElement::new("a[href*='/reports/attendance']").on_click(Effect::Navigate(REPORT.to_string())));
        let mut session = authenticated();

        assert!(attempt(&driver, &mut session).is_ok());
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[test]
    fn test_missing_menu_fails_attempt() {
        let driver = MockDriver::new("https://site.test/dashboard");
        let mut session = authenticated();

        assert!(attempt(&driver, &mut session).is_err());
        assert!(driver.actions().is_empty());
    }

    #[test]
    fn test_dead_link_fails_attempt() {
        let driver = menu_page().with_element(MockElement::new(format!("{} .sub-link-theAttendanceReports a", MENU)));
        let mut session = authenticated();

        assert!(attempt(&driver, &mut session).is_err());
        assert_eq!(session.state(), SessionState::MenuExpanded);
    }
}
