//! Goal types and the raw definitions callers submit.

use std::fmt;
use std::str::FromStr;

use insight_core::{GoalId, SiteId, ValidationError};
use serde::{Deserialize, Serialize};

/// What part of a visit a goal is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchAttribute {
    Url,
    Title,
    File,
    ExternalWebsite,
    Manually,
    EventAction,
    EventCategory,
    EventName,
    VisitDuration,
}

/// How a match attribute's value is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// A URL-valued attribute: url, file, external_website.
    Url,
    /// Free text, e.g. the page title.
    Text,
    Event,
    /// Measured quantity; only comparisons make sense.
    Numeric,
    /// Converted through the API, no pattern involved.
    Manual,
}

impl MatchAttribute {
    pub const ALL: [MatchAttribute; 9] = [
        Self::Url,
        Self::Title,
        Self::File,
        Self::ExternalWebsite,
        Self::Manually,
        Self::EventAction,
        Self::EventCategory,
        Self::EventName,
        Self::VisitDuration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Title => "title",
            Self::File => "file",
            Self::ExternalWebsite => "external_website",
            Self::Manually => "manually",
            Self::EventAction => "event_action",
            Self::EventCategory => "event_category",
            Self::EventName => "event_name",
            Self::VisitDuration => "visit_duration",
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Url | Self::File | Self::ExternalWebsite => AttributeKind::Url,
            Self::Title => AttributeKind::Text,
            Self::Manually => AttributeKind::Manual,
            Self::EventAction | Self::EventCategory | Self::EventName => AttributeKind::Event,
            Self::VisitDuration => AttributeKind::Numeric,
        }
    }
}

impl fmt::Display for MatchAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchAttribute {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| not_whitelisted("matchAttribute", s, Self::ALL.map(|a| a.as_str())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Exact,
    Contains,
    Regex,
    GreaterThan,
}

impl PatternType {
    pub const ALL: [PatternType; 4] = [Self::Exact, Self::Contains, Self::Regex, Self::GreaterThan];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
            Self::Regex => "regex",
            Self::GreaterThan => "greater_than",
        }
    }

    /// Numeric comparison rather than string matching.
    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::GreaterThan)
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| not_whitelisted("patternType", s, Self::ALL.map(|p| p.as_str())))
    }
}

fn not_whitelisted<const N: usize>(
    field: &'static str,
    value: &str,
    allowed: [&str; N],
) -> ValidationError {
    ValidationError::NotWhitelisted {
        field,
        value: value.to_string(),
        allowed: allowed.join(", "),
    }
}

/// A stored goal. Serialises with the column names of the goal table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(rename = "idsite")]
    pub site: SiteId,
    #[serde(rename = "idgoal")]
    pub id: GoalId,
    pub name: String,
    pub description: String,
    pub match_attribute: MatchAttribute,
    pub pattern: String,
    pub pattern_type: PatternType,
    pub case_sensitive: bool,
    pub allow_multiple: bool,
    pub revenue: u64,
    pub deleted: bool,
    pub event_value_as_revenue: bool,
}

impl Goal {
    pub fn from_fields(site: SiteId, id: GoalId, fields: GoalFields) -> Self {
        Self {
            site,
            id,
            name: fields.name,
            description: fields.description,
            match_attribute: fields.match_attribute,
            pattern: fields.pattern,
            pattern_type: fields.pattern_type,
            case_sensitive: fields.case_sensitive,
            allow_multiple: fields.allow_multiple,
            revenue: fields.revenue,
            deleted: false,
            event_value_as_revenue: fields.event_value_as_revenue,
        }
    }

    pub fn apply(&mut self, fields: GoalFields) {
        self.name = fields.name;
        self.description = fields.description;
        self.match_attribute = fields.match_attribute;
        self.pattern = fields.pattern;
        self.pattern_type = fields.pattern_type;
        self.case_sensitive = fields.case_sensitive;
        self.allow_multiple = fields.allow_multiple;
        self.revenue = fields.revenue;
        self.event_value_as_revenue = fields.event_value_as_revenue;
    }
}

/// Validated, typed goal fields ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalFields {
    pub name: String,
    pub description: String,
    pub match_attribute: MatchAttribute,
    pub pattern: String,
    pub pattern_type: PatternType,
    pub case_sensitive: bool,
    pub allow_multiple: bool,
    pub revenue: u64,
    pub event_value_as_revenue: bool,
}

/// A goal as submitted by a caller; match attribute and pattern type are
/// still raw strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDefinition {
    pub name: String,
    pub match_attribute: String,
    pub pattern: String,
    pub pattern_type: String,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    #[serde(default)]
    pub revenue: Option<u64>,
    #[serde(default)]
    pub allow_multiple: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_value_as_revenue: Option<bool>,
}

impl GoalDefinition {
    pub fn new(
        name: impl Into<String>,
        match_attribute: impl Into<String>,
        pattern: impl Into<String>,
        pattern_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            match_attribute: match_attribute.into(),
            pattern: pattern.into(),
            pattern_type: pattern_type.into(),
            case_sensitive: None,
            revenue: None,
            allow_multiple: None,
            description: None,
            event_value_as_revenue: None,
        }
    }

    pub fn case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = Some(value);
        self
    }

    pub fn revenue(mut self, value: u64) -> Self {
        self.revenue = Some(value);
        self
    }

    pub fn allow_multiple(mut self, value: bool) -> Self {
        self.allow_multiple = Some(value);
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn event_value_as_revenue(mut self, value: bool) -> Self {
        self.event_value_as_revenue = Some(value);
        self
    }
}

impl From<&Goal> for GoalDefinition {
    fn from(goal: &Goal) -> Self {
        Self {
            name: goal.name.clone(),
            match_attribute: goal.match_attribute.as_str().to_string(),
            pattern: goal.pattern.clone(),
            pattern_type: goal.pattern_type.as_str().to_string(),
            case_sensitive: Some(goal.case_sensitive),
            revenue: Some(goal.revenue),
            allow_multiple: Some(goal.allow_multiple),
            description: Some(goal.description.clone()),
            event_value_as_revenue: Some(goal.event_value_as_revenue),
        }
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalChanges {
    pub name: Option<String>,
    pub match_attribute: Option<String>,
    pub pattern: Option<String>,
    pub pattern_type: Option<String>,
    pub case_sensitive: Option<bool>,
    pub revenue: Option<u64>,
    pub allow_multiple: Option<bool>,
    pub description: Option<String>,
    pub event_value_as_revenue: Option<bool>,
}

impl GoalChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    pub fn match_attribute(mut self, value: impl Into<String>) -> Self {
        self.match_attribute = Some(value.into());
        self
    }

    pub fn pattern(mut self, value: impl Into<String>) -> Self {
        self.pattern = Some(value.into());
        self
    }

    pub fn pattern_type(mut self, value: impl Into<String>) -> Self {
        self.pattern_type = Some(value.into());
        self
    }

    pub fn revenue(mut self, value: u64) -> Self {
        self.revenue = Some(value);
        self
    }

    /// Overlay these changes on `base`.
    pub fn merge_into(self, base: GoalDefinition) -> GoalDefinition {
        GoalDefinition {
            name: self.name.unwrap_or(base.name),
            match_attribute: self.match_attribute.unwrap_or(base.match_attribute),
            pattern: self.pattern.unwrap_or(base.pattern),
            pattern_type: self.pattern_type.unwrap_or(base.pattern_type),
            case_sensitive: self.case_sensitive.or(base.case_sensitive),
            revenue: self.revenue.or(base.revenue),
            allow_multiple: self.allow_multiple.or(base.allow_multiple),
            description: self.description.or(base.description),
            event_value_as_revenue: self.event_value_as_revenue.or(base.event_value_as_revenue),
        }
    }
}

impl From<GoalDefinition> for GoalChanges {
    fn from(def: GoalDefinition) -> Self {
        Self {
            name: Some(def.name),
            match_attribute: Some(def.match_attribute),
            pattern: Some(def.pattern),
            pattern_type: Some(def.pattern_type),
            case_sensitive: def.case_sensitive,
            revenue: def.revenue,
            allow_multiple: def.allow_multiple,
            description: def.description,
            event_value_as_revenue: def.event_value_as_revenue,
        }
    }
}
