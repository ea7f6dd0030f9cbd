use thiserror::Error;

use crate::types::{SegmentId, SiteId};

pub type InsightResult<T> = Result<T, InsightError>;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Permission denied: {0}")]
    Permission(#[from] PermissionError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl InsightError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission(_))
    }
}

/// Rejected input. Raised before anything is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} '{value}' is not in the allowed set: {allowed}")]
    NotWhitelisted {
        field: &'static str,
        value: String,
        allowed: String,
    },

    #[error("'{pattern}' is no valid regex: {reason}")]
    NoValidRegex { pattern: String, reason: String },

    #[error("invalid matching string '{pattern}' for match attribute '{match_attribute}' with pattern type '{pattern_type}': {hint}")]
    InvalidMatchingString {
        match_attribute: String,
        pattern_type: String,
        pattern: String,
        hint: &'static str,
    },

    #[error("{0} must not be empty")]
    Required(&'static str),

    #[error("invalid segment definition '{definition}': {reason}")]
    InvalidSegmentDefinition { definition: String, reason: String },

    #[error("real-time segments are disabled; segments must be pre-processed (auto_archive=1)")]
    RealtimeSegmentsDisabled,

    #[error("invalid site list '{0}'")]
    InvalidSiteList(String),
}

/// Missing privilege for the requested operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("user '{login}' needs view access on site {site}")]
    ViewAccessRequired { login: String, site: SiteId },

    #[error("user '{login}' needs write access on site {site}")]
    WriteAccessRequired { login: String, site: SiteId },

    #[error("user '{login}' needs view access on at least one site")]
    SomeViewAccessRequired { login: String },

    #[error("{operation} requires Super User access")]
    SuperUserRequired { operation: &'static str },

    #[error("enabledAllUsers=1 requires Super User access")]
    SharedSegmentRequiresSuperUser,

    #[error("updating a segment applied to all websites requires Super User access")]
    AllSitesSegmentRequiresSuperUser,

    #[error("user '{login}' can only edit and delete the segments they created")]
    NotSegmentOwner { login: String },

    #[error("user '{login}' cannot view segment {idsegment}")]
    SegmentNotVisible { login: String, idsegment: SegmentId },

    #[error("anonymous users cannot manage segments")]
    AnonymousUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_segment_message_names_the_rule() {
        let err: InsightError = PermissionError::SharedSegmentRequiresSuperUser.into();
        assert!(err.is_permission());
        assert!(err
            .to_string()
            .contains("enabledAllUsers=1 requires Super User access"));
    }

    #[test]
    fn test_not_whitelisted_lists_allowed_values() {
        let err: InsightError = ValidationError::NotWhitelisted {
            field: "patternType",
            value: "invalid".into(),
            allowed: "exact, contains".into(),
        }
        .into();
        assert!(err.is_validation());
        let msg = err.to_string();
        assert!(msg.contains("'invalid' is not in the allowed set"));
        assert!(msg.contains("exact, contains"));
    }
}
