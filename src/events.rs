use crate::browser::Driver;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One navigation event of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub message: String,

    /// Page URL when the event was recorded, if it could be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Ordered record of what a session did, mirrored to the `log` facade
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventLog {
    events: Vec<LogEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` together with the driver's current URL.
    ///
    /// A URL read failure never fails the caller; the event is kept without a URL.
    pub fn record(&mut self, driver: &dyn Driver, message: impl Into<String>) {
        let url = match driver.current_url() {
            Ok(url) => Some(url),
            Err(e) => {
                log::debug!("Could not read URL for event: {}", e);
                None
            }
        };
        self.push(message.into(), url);
    }

    /// Record a swallowed failure at warn level
    pub fn record_warning(&mut self, driver: &dyn Driver, message: impl Into<String>) {
        let message = message.into();
        let url = driver.current_url().ok();
        log::warn!("{} | url={}", message, url.as_deref().unwrap_or("<unknown>"));
        self.events.push(LogEvent { timestamp: Utc::now(), message, url });
    }

    fn push(&mut self, message: String, url: Option<String>) {
        log::info!("{} | url={}", message, url.as_deref().unwrap_or("<unknown>"));
        self.events.push(LogEvent { timestamp: Utc::now(), message, url });
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<LogEvent> {
        self.events
    }

    /// Whether any event message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.events.iter().any(|e| e.message.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::MockDriver;

    #[test]
    fn test_record_captures_url_in_order() {
        let driver = MockDriver::new("https://site/user/login");
        let mut log = EventLog::new();

        log.record(&driver, "Opened login page");
        driver.navigate("https://site/home", std::time::Duration::from_secs(1)).unwrap();
        log.record(&driver, "After login redirect");

        let events = log.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].url.as_deref(), Some("https://site/user/login"));
        assert_eq!(events[1].message, "After login redirect");
        assert!(events[0].timestamp <= events[1].timestamp);
    }

    #[test]
    fn test_event_serialization() {
        let event = LogEvent { timestamp: Utc::now(), message: "Selected tab".to_string(), url: None };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["message"], "Selected tab");
        assert!(json.get("url").is_none());
    }
}
