//! Interaction Primitive
//!
//! Performs one UI action against a located element. Clicking walks a fixed
//! ladder of techniques (scripted click, pointer click, synthetic event) because
//! any one of them can fail silently on a given page state. A raised error in
//! one rung never stops the next; only when every rung is spent does the action
//! report [`InteractionOutcome::Failed`], and the caller decides what that means.
//! The invocation deadline is the exception: once it has passed the ladder stops
//! with [`InteractionOutcome::Aborted`].

use crate::{browser::{DomAction, ElementRef},
            confirm::{UrlPattern, wait_for_url},
            error::{NavError, Result},
            locator::{Locator, LocatorSpec}};
use std::{fmt, time::Duration};

/// What must hold after a click for it to count
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostCondition {
    /// Any click that does not raise counts
    None,
    Url(UrlPattern),
    Element(LocatorSpec),
}

/// A UI action
#[derive(Clone, PartialEq, Eq)]
pub enum Action {
    Click(PostCondition),
    Hover,
    /// Clear the field, then type
    Type(String),
    ScrollIntoView,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Click(post) => write!(f, "Click({:?})", post),
            Action::Hover => f.write_str("Hover"),
            Action::Type(_) => f.write_str("Type(<redacted>)"),
            Action::ScrollIntoView => f.write_str("ScrollIntoView"),
        }
    }
}

/// Technique used for one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Technique {
    ScriptClick,
    PointerClick,
    DispatchClick,
    PointerHover,
    DispatchHover,
    Type,
    Scroll,
}

/// Result of a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Applied,
    Raised(String),
    /// Did not raise, but the post-condition never held
    NoEffect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub technique: Technique,
    pub outcome: AttemptOutcome,
}

/// Result of an interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    Applied(Technique),
    Failed(Vec<Attempt>),
    /// The invocation deadline passed while waiting for the named condition
    Aborted(String),
}

impl InteractionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, InteractionOutcome::Applied(_))
    }

    /// Turn a failure into [`NavError::InteractionFailure`] for callers that cannot continue without it
    pub fn into_result(self, target: &str) -> Result<Technique> {
        match self {
            InteractionOutcome::Applied(technique) => Ok(technique),
            InteractionOutcome::Failed(attempts) => {
                let summary = attempts
                    .iter()
                    .map(|a| format!("{:?}: {:?}", a.technique, a.outcome))
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(NavError::InteractionFailure(format!("{} ({})", target, summary)))
            }
            InteractionOutcome::Aborted(waiting_for) => Err(NavError::DeadlineExceeded(waiting_for)),
        }
    }
}

/// Timing knobs for interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractOptions {
    /// Pause between pointer move and click
    pub pointer_pause: Duration,
    /// Pause after hovering so hover-triggered UI can settle
    pub hover_pause: Duration,
    /// How long a click's post-condition may take to hold
    pub settle: Duration,
}

impl Default for InteractOptions {
    fn default() -> Self {
        Self {
            pointer_pause: Duration::from_millis(100),
            hover_pause: Duration::from_millis(200),
            settle: Duration::from_secs(3),
        }
    }
}

/// Applies [`Action`]s through a driver
pub struct Interactor<'a> {
    locator: Locator<'a>,
    options: InteractOptions,
}

impl<'a> Interactor<'a> {
    pub fn new(locator: Locator<'a>, options: InteractOptions) -> Self {
        Self { locator, options }
    }

    pub fn interact(&self, element: &ElementRef, action: &Action) -> InteractionOutcome {
        log::debug!("{:?} on {}", action, element);
        match action {
            Action::Click(post) => self.click(element, post),
            Action::Hover => self.hover(element),
            Action::Type(text) => self.type_text(element, text),
            Action::ScrollIntoView => self.single(element, Technique::Scroll, &DomAction::ScrollIntoView),
        }
    }

    fn click(&self, element: &ElementRef, post: &PostCondition) -> InteractionOutcome {
        // Scrolling is preparation; a failure here must not stop the click ladder
        if let Err(e) = self.perform(element, &DomAction::ScrollIntoView) {
            log::debug!("Scroll before click on {} failed: {}", element, e);
        }

        let ladder = [
            (Technique::ScriptClick, DomAction::ScriptClick),
            (Technique::PointerClick, DomAction::PointerClick { pause: self.options.pointer_pause }),
            (Technique::DispatchClick, DomAction::Dispatch { event: "click".to_string() }),
        ];

        let mut attempts = Vec::new();
        for (technique, dom_action) in ladder {
            if self.locator.deadline().is_expired() {
                return InteractionOutcome::Aborted(format!("{:?} on {}", technique, element));
            }

            let outcome = match self.perform(element, &dom_action).map(|()| self.holds(post)) {
                Err(e) => AttemptOutcome::Raised(e.to_string()),
                Ok(Ok(true)) => AttemptOutcome::Applied,
                Ok(Ok(false)) => AttemptOutcome::NoEffect,
                Ok(Err(NavError::DeadlineExceeded(waiting_for))) => return InteractionOutcome::Aborted(waiting_for),
                Ok(Err(e)) => AttemptOutcome::Raised(e.to_string()),
            };

            if outcome == AttemptOutcome::Applied {
                return InteractionOutcome::Applied(technique);
            }
            log::debug!("{:?} on {} did not apply: {:?}", technique, element, outcome);
            attempts.push(Attempt { technique, outcome });
        }
        InteractionOutcome::Failed(attempts)
    }

    fn hover(&self, element: &ElementRef) -> InteractionOutcome {
        let ladder = [
            (Technique::PointerHover, DomAction::Hover { pause: self.options.hover_pause }),
            (Technique::DispatchHover, DomAction::Dispatch { event: "mouseover".to_string() }),
        ];

        let mut attempts = Vec::new();
        for (technique, dom_action) in ladder {
            match self.perform(element, &dom_action) {
                Ok(()) => return InteractionOutcome::Applied(technique),
                Err(e) => attempts.push(Attempt { technique, outcome: AttemptOutcome::Raised(e.to_string()) }),
            }
        }
        InteractionOutcome::Failed(attempts)
    }

    fn type_text(&self, element: &ElementRef, text: &str) -> InteractionOutcome {
        let typed = self
            .perform(element, &DomAction::Clear)
            .and_then(|()| self.perform(element, &DomAction::TypeText(text.to_string())));

        match typed {
            Ok(()) => InteractionOutcome::Applied(Technique::Type),
            Err(e) => InteractionOutcome::Failed(vec![Attempt {
                technique: Technique::Type,
                outcome: AttemptOutcome::Raised(e.to_string()),
            }]),
        }
    }

    fn single(&self, element: &ElementRef, technique: Technique, dom_action: &DomAction) -> InteractionOutcome {
        match self.perform(element, dom_action) {
            Ok(()) => InteractionOutcome::Applied(technique),
            Err(e) => InteractionOutcome::Failed(vec![Attempt { technique, outcome: AttemptOutcome::Raised(e.to_string()) }]),
        }
    }

    fn perform(&self, element: &ElementRef, dom_action: &DomAction) -> Result<()> {
        self.locator.driver().perform(element, dom_action)
    }

    /// Whether the post-condition held within the settle time. Only deadline expiry is an error.
    fn holds(&self, post: &PostCondition) -> Result<bool> {
        let waited = match post {
            PostCondition::None => return Ok(true),
            PostCondition::Url(pattern) => wait_for_url(&self.locator, pattern, self.options.settle).map(drop),
            PostCondition::Element(spec) => {
                let spec = spec.clone().budget(self.options.settle);
                self.locator.locate(&spec, None).map(drop)
            }
        };

        match waited {
            Ok(()) => Ok(true),
            Err(e) if e.is_deadline() => Err(e),
            Err(_) => Ok(false),
        }
    }
}
