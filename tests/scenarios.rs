//! End-to-end sessions against an in-memory model of the target site
#![cfg(feature = "mock")]

use report_nav::{FlowConfig, Handler, InvocationResult, MockDriver, MockProvider, NavError, ResponseBody, SessionState,
                 StaticSecretStore,
                 browser::{Effect, MockElement},
                 config::Budgets,
                 confirm::MarkerStatus,
                 flow,
                 interact::InteractOptions,
                 locator::Locator,
                 session::Session,
                 step::StepOutcome,
                 wait::Deadline};
use serde_json::json;
use std::time::Duration;

const LOGIN: &str = "https://site.test/user/login";
const DASHBOARD: &str = "https://site.test/dashboard";
const REPORT: &str = "https://site.test/reports/attendance";

const MENU: &str = "#main-collapsed-theReports";
const MENU_TRIGGER: &str = "a,button,[role='button'], .collapse-title, .link";
const MENU_ITEMS: &str = "#main-collapsed-theReports .collapse-box-items";
const ATTENDANCE_LINK: &str = "#main-collapsed-theReports .sub-link-theAttendanceReports a";

const HEADER: &str = "//*[self::h1 or self::h2 or contains(@class,'page-title')][contains(., 'Attendance Reports')]";
const SESSIONS: &str = "//a[normalize-space()='Sessions']";
const SESSION_COLUMN: &str = "//table//th[normalize-space()='Session']";
const TAB: &str = "//a[normalize-space()='Absences']";

fn config() -> FlowConfig {
    FlowConfig::new()
        .base_url("https://site.test")
        .budgets(Budgets::uniform(Duration::from_millis(60)))
        .poll_interval(Duration::from_millis(5))
        .deadline(Duration::from_secs(10))
        .interact(InteractOptions {
            pointer_pause: Duration::ZERO,
            hover_pause: Duration::ZERO,
            settle: Duration::from_millis(20),
        })
}

/// Login form whose submit lands on `lands_on`
fn with_login(driver: MockDriver, lands_on: &str) -> MockDriver {
    driver
        .with_element(MockElement::new("input[name='username']").on_page("/user/login"))
        .with_element(MockElement::new("input[name='password']").on_page("/user/login"))
        .with_element(MockElement::new("form").on_page("/user/login").on_submit(Effect::Navigate(lands_on.to_string())))
}

/// Hover-to-expand reports menu on the dashboard
fn with_menu(driver: MockDriver, link: MockElement) -> MockDriver {
    driver
        .with_element(MockElement::new(MENU).on_page("/dashboard"))
        .with_element(
            MockElement::new(MENU_TRIGGER)
                .within(MENU)
                .on_page("/dashboard")
                .on_hover(Effect::Reveal(MENU_ITEMS.to_string())),
        )
        .with_element(MockElement::new(MENU_ITEMS).on_page("/dashboard").hidden())
        .with_element(link.on_page("/dashboard"))
}

fn working_link() -> MockElement {
    MockElement::new(ATTENDANCE_LINK).on_click(Effect::Navigate(REPORT.to_string()))
}

fn with_report(driver: MockDriver) -> MockDriver {
    driver
        .with_element(MockElement::new(HEADER).on_page("/reports/attendance").with_text("Attendance Reports"))
        .with_element(MockElement::new(SESSIONS).on_page("/reports/attendance"))
        .with_element(MockElement::new(SESSION_COLUMN).on_page("/reports/attendance"))
        .with_element(MockElement::new("table").on_page("/reports/attendance"))
}

fn with_tab(driver: MockDriver) -> MockDriver {
    driver
        .with_element(
            MockElement::new(TAB)
                .on_page("/reports/attendance")
                .with_attribute("aria-selected", "false")
                .on_click(Effect::Navigate(format!("{}?tab=absences", REPORT)))
                .on_click(Effect::SetAttribute {
                    selector: TAB.to_string(),
                    name: "aria-selected".to_string(),
                    value: "true".to_string(),
                }),
        )
}

fn full_site() -> MockDriver {
    with_tab(with_report(with_menu(with_login(MockDriver::new("about:blank"), DASHBOARD), working_link())))
}

fn handler(driver: MockDriver) -> Handler<StaticSecretStore, MockProvider> {
    Handler::new(config(), StaticSecretStore::new("alice", "pw"), MockProvider::new(driver))
}

#[test]
fn test_happy_path_through_menu() {
    let handler = handler(full_site());

    let report = handler.run().expect("session should start");
    let result = InvocationResult::from(&report);

    assert_eq!(result.status_code, 200);
    assert_eq!(result.body.current_url(), Some("https://site.test/reports/attendance?tab=absences"));
    assert_eq!(report.state, SessionState::Done);
    assert!(report.tab_selected());

    let driver = handler.provider().driver();
    assert_eq!(driver.navigations(), vec![LOGIN]);
    assert!(driver.is_closed());

    let confirmation = report.confirmation.expect("report page confirmed");
    assert_eq!(confirmation.title, "Attendance Reports");
    assert_eq!(confirmation.marker("session column"), Some(MarkerStatus::Found));

    let messages: Vec<&str> = report.events.iter().map(|e| e.message.as_str()).collect();
    let position = |needle: &str| messages.iter().position(|m| m.contains(needle));
    assert!(position("Opened login page") < position("After login redirect"));
    assert!(position("Reports menu expanded") < position("Attendance reports (menu click)"));
    assert!(position("Attendance reports (menu click)") < position("Selected tab 'Absences'"));
    assert!(report.events.iter().all(|e| e.url.is_some()));
}

#[test]
fn test_menu_failure_falls_back_to_direct_url() {
    let broken_link = MockElement::new(ATTENDANCE_LINK)
        .raises_on("script_click")
        .raises_on("pointer_click")
        .raises_on("dispatch");
    let driver = with_tab(with_report(with_menu(with_login(MockDriver::new("about:blank"), DASHBOARD), broken_link)));
    let handler = handler(driver);

    let report = handler.run().expect("session should start");

    assert_eq!(InvocationResult::from(&report).status_code, 200);
    assert_eq!(report.state, SessionState::Done);
    assert_eq!(handler.provider().driver().navigations(), vec![LOGIN, REPORT]);

    let failed = report.events.iter().position(|e| e.message.contains("reports menu failed, Raised"));
    let direct = report.events.iter().position(|e| e.message.contains("Attendance reports (direct nav)"));
    assert!(failed.is_some());
    assert!(failed < direct);
}

#[test]
fn test_rejected_credentials_end_on_login_page() {
    let driver = with_tab(with_report(with_menu(with_login(MockDriver::new("about:blank"), LOGIN), working_link())));
    let handler = handler(driver);

    let report = handler.run().expect("session should start");
    let result = InvocationResult::from(&report);

    assert_eq!(result.status_code, 400);
    assert!(matches!(result.body, ResponseBody::Message { .. }));
    assert_eq!(report.state, SessionState::FailedFatal);
    assert!(matches!(report.error, Some(NavError::AuthenticationFailure(_))));
    assert_eq!(handler.provider().driver().navigations(), vec![LOGIN]);
    assert!(handler.provider().driver().is_closed());
}

#[test]
fn test_missing_tab_is_degraded_success() {
    let driver = with_report(with_menu(with_login(MockDriver::new("about:blank"), DASHBOARD), working_link()));
    let handler = handler(driver);

    let report = handler.run().expect("session should start");

    assert_eq!(InvocationResult::from(&report).status_code, 200);
    assert_eq!(report.state, SessionState::DoneWithoutTab);
    assert!(!report.tab_selected());
    assert!(report.error.is_none());
    assert!(report.events.iter().any(|e| e.message.contains("Tab 'Absences' not selected")));
}

#[test]
fn test_secret_failure_never_launches_browser() {
    let handler = Handler::new(
        config(),
        StaticSecretStore::failing("access denied"),
        MockProvider::new(full_site()),
    );

    let result = handler.handle(&json!({}), &json!({}));

    assert_eq!(result.status_code, 500);
    assert!(matches!(result.body, ResponseBody::Error { ref error, .. } if error.contains("access denied")));
    assert_eq!(handler.provider().launch_count(), 0);
}

#[test]
fn test_lost_session_mid_flow_is_fatal() {
    // Logged in, but the menu is gone and the report bounces back to login
    let driver = with_login(MockDriver::new("about:blank"), DASHBOARD).with_redirect(REPORT, LOGIN);
    let handler = handler(driver);

    let report = handler.run().expect("session should start");
    let result = InvocationResult::from(&report);

    assert_eq!(result.status_code, 500);
    assert_eq!(report.state, SessionState::FailedFatal);
    assert!(matches!(report.error, Some(NavError::NavigationFailure { .. })));
    assert!(handler.provider().driver().is_closed());
}

#[test]
fn test_expired_deadline_is_fatal() {
    let handler = Handler::new(
        config().deadline(Duration::ZERO),
        StaticSecretStore::new("alice", "pw"),
        MockProvider::new(full_site()),
    );

    let report = handler.run().expect("session should start");

    assert_eq!(InvocationResult::from(&report).status_code, 500);
    assert!(matches!(report.error, Some(NavError::DeadlineExceeded(_))));
    assert!(handler.provider().driver().actions().is_empty());
}

#[test]
fn test_deadline_during_menu_click_skips_direct_url() {
    let dead_link = MockElement::new(ATTENDANCE_LINK)
        .inert_on("script_click")
        .inert_on("pointer_click")
        .inert_on("dispatch");
    let driver = with_tab(with_report(with_menu(with_login(MockDriver::new("about:blank"), DASHBOARD), dead_link)));
    let slow_settle = InteractOptions { pointer_pause: Duration::ZERO, hover_pause: Duration::ZERO, settle: Duration::from_secs(5) };
    let handler = Handler::new(
        config().deadline(Duration::from_millis(400)).interact(slow_settle),
        StaticSecretStore::new("alice", "pw"),
        MockProvider::new(driver),
    );

    let report = handler.run().expect("session should start");

    assert_eq!(InvocationResult::from(&report).status_code, 500);
    assert_eq!(report.state, SessionState::FailedFatal);
    assert!(matches!(report.error, Some(NavError::DeadlineExceeded(_))));
    assert_eq!(handler.provider().driver().navigations(), vec![LOGIN]);
    assert!(report.events.iter().any(|e| e.message.contains("reports menu stopped")));
    assert!(!report.events.iter().any(|e| e.message.contains("direct URL")));
}

#[test]
fn test_close_failure_does_not_change_result() {
    let handler = handler(full_site().fail_on_close());

    let result = handler.handle(&json!({}), &json!({}));

    assert_eq!(result.status_code, 200);
    assert_eq!(handler.provider().driver().close_attempts(), 1);
}

#[test]
fn test_report_step_requires_authentication() {
    let driver = full_site();
    let config = config();
    let mut session = Session::new();
    let locator = Locator::new(&driver, config.poll_interval, Deadline::none());

    let outcome = flow::attendance_report_step(&config).run(&mut session, locator, config.interact);

    assert!(matches!(outcome, StepOutcome::Failed(NavError::PreconditionFailed { .. })));
    assert!(driver.navigations().is_empty());
    assert!(driver.queries().is_empty());
}
