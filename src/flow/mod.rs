//! Attendance report flow
//!
//! The concrete steps of one session: sign in, reach the attendance report
//! (through the reports menu, falling back to the report URL), then select a
//! report tab. Selectors and timing come from [`FlowConfig`].

pub mod direct;
pub mod login;
pub mod reports_menu;
pub mod tab;

pub use direct::DirectUrl;
pub use login::SubmitCredentials;
pub use reports_menu::ReportsMenu;
pub use tab::SelectTab;

use crate::{browser::Selector,
            config::FlowConfig,
            confirm::{Expectation, UrlPattern},
            locator::LocatorSpec,
            secrets::Credentials,
            session::SessionState,
            step::NavigationStep};

pub const REPORT_TITLE: &str = "Attendance Reports";

/// Sign in with `credentials`
pub fn authentication_step(config: &FlowConfig, credentials: Credentials) -> NavigationStep {
    NavigationStep::new(
        "authentication",
        &[SessionState::Unauthenticated],
        SessionState::Authenticated,
        config.budgets.login_redirect,
    )
    .strategy(SubmitCredentials::new(config, credentials))
}

/// Reach and confirm the attendance report, menu first
pub fn attendance_report_step(config: &FlowConfig) -> NavigationStep {
    NavigationStep::new(
        "attendance report",
        &[SessionState::Authenticated],
        SessionState::AttendanceReportConfirmed,
        config.budgets.report_url,
    )
    .strategy(ReportsMenu::new(config))
    .strategy(DirectUrl::new(config))
}

/// Select the configured report tab
pub fn report_tab_step(config: &FlowConfig) -> NavigationStep {
    NavigationStep::new(
        "report tab",
        &[SessionState::AttendanceReportConfirmed],
        SessionState::TabSelected,
        config.budgets.tab,
    )
    .strategy(SelectTab::new(config))
}

/// What the attendance report page looks like
pub fn report_expectation(config: &FlowConfig) -> Expectation {
    let marker = config.budgets.marker;

    Expectation::url(UrlPattern::Contains(config.report_path.clone()), config.budgets.report_url)
        .with_primary(
            LocatorSpec::new(
                "report header",
                Selector::xpath(format!(
                    "//*[self::h1 or self::h2 or contains(@class,'page-title')][contains(., '{}')]",
                    REPORT_TITLE
                )),
            )
            .visible()
            .budget(marker),
            REPORT_TITLE,
        )
        .with_secondary(
            LocatorSpec::new("sessions link", Selector::xpath("//a[normalize-space()='Sessions']"))
                .visible()
                .budget(marker),
        )
        .with_content(
            LocatorSpec::new("session column", Selector::xpath("//table//th[normalize-space()='Session']"))
                .visible()
                .budget(marker),
            LocatorSpec::new("report table", Selector::css("table")).budget(marker),
        )
}
