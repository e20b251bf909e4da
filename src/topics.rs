//! Topic filter module
//!
//! Validates MQTT topic filters and publish topics before they are handed to
//! the broker. Actual topic matching is owned by the broker; this module only
//! enforces the syntactic rules of the filter language so that malformed
//! patterns fail at startup instead of being silently rejected mid-session.
//!
//! # MQTT Wildcards
//!
//! - `+` matches a single level and must occupy a whole level
//!   (e.g., `game/+/response` is valid, `game/a+` is not)
//! - `#` matches any number of levels and must be the final level
//!   (e.g., `game/#` is valid, `game/#/response` is not)

use crate::error::RelayError;
use std::fmt;

/// A validated MQTT topic filter for subscriptions.
///
/// Construction fails on patterns a broker would reject, so a `TopicFilter`
/// value can always be passed straight to `subscribe`.
///
/// # Examples
///
/// ```rust,ignore
/// use mqtt_relay::topics::TopicFilter;
///
/// let filter = TopicFilter::new("game/#")?;
/// assert_eq!(filter.as_str(), "game/#");
/// assert!(filter.is_wildcard());
///
/// assert!(TopicFilter::new("game/#/response").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    filter: String,
}

impl TopicFilter {
    /// Create a validated topic filter.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidArgument`] if the filter is empty, uses
    /// `#` anywhere but as the last level, or mixes a wildcard with other
    /// characters inside a single level.
    pub fn new(filter: impl Into<String>) -> Result<Self, RelayError> {
        let filter = filter.into();
        Self::validate(&filter)?;
        Ok(Self { filter })
    }

    /// Get the filter pattern as a string slice.
    pub fn as_str(&self) -> &str {
        &self.filter
    }

    /// Returns true if the filter contains any wildcard level.
    pub fn is_wildcard(&self) -> bool {
        self.filter
            .split('/')
            .any(|level| level == "+" || level == "#")
    }

    fn validate(filter: &str) -> Result<(), RelayError> {
        if filter.is_empty() {
            return Err(RelayError::InvalidArgument(
                "topic filter must not be empty".to_string(),
            ));
        }

        let levels: Vec<&str> = filter.split('/').collect();
        let last = levels.len() - 1;
        for (i, level) in levels.iter().enumerate() {
            if level.contains('#') {
                if *level != "#" || i != last {
                    return Err(RelayError::InvalidArgument(format!(
                        "'#' must be the final level of the filter: {}",
                        filter
                    )));
                }
            } else if level.contains('+') && *level != "+" {
                return Err(RelayError::InvalidArgument(format!(
                    "'+' must occupy a whole level of the filter: {}",
                    filter
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filter)
    }
}

/// Validate a publish destination topic.
///
/// Publish topics are exact names; wildcards are only meaningful in
/// subscriptions and brokers reject publishes that carry them.
///
/// # Errors
///
/// Returns [`RelayError::InvalidArgument`] if the topic is empty or contains
/// `+` or `#`.
pub fn validate_publish_topic(topic: &str) -> Result<(), RelayError> {
    if topic.is_empty() {
        return Err(RelayError::InvalidArgument(
            "publish topic must not be empty".to_string(),
        ));
    }
    if topic.contains('+') || topic.contains('#') {
        return Err(RelayError::InvalidArgument(format!(
            "publish topic must not contain wildcards: {}",
            topic
        )));
    }
    Ok(())
}
