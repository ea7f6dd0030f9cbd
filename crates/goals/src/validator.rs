//! Validation of submitted goal definitions.
//!
//! The rules are driven by the match attribute's [`AttributeKind`] and
//! whether the pattern type is a comparison:
//!
//! | kind    | exact                | contains / regex | greater_than        |
//! |---------|----------------------|------------------|---------------------|
//! | url     | pattern must be URL  | yes              | no                  |
//! | text    | yes                  | yes              | no                  |
//! | event   | yes                  | yes              | no                  |
//! | numeric | no                   | no               | non-negative number |
//! | manual  | pattern ignored      | pattern ignored  | no                  |
//!
//! Regex patterns use the `regex` crate dialect, so lookaround and
//! backreferences are rejected as invalid.

use insight_core::config::GoalsConfig;
use insight_core::ValidationError;
use regex::RegexBuilder;

use crate::model::{AttributeKind, GoalDefinition, GoalFields, MatchAttribute, PatternType};

pub struct GoalValidator {
    exact_match_requires_url: bool,
}

impl Default for GoalValidator {
    fn default() -> Self {
        Self::new(&GoalsConfig::default())
    }
}

impl GoalValidator {
    pub fn new(config: &GoalsConfig) -> Self {
        Self {
            exact_match_requires_url: config.exact_match_requires_url,
        }
    }

    /// Check every rule and return the typed fields, with defaults filled in
    /// for omitted optional values.
    pub fn validate(&self, def: &GoalDefinition) -> Result<GoalFields, ValidationError> {
        let match_attribute: MatchAttribute = def.match_attribute.parse()?;
        let pattern_type: PatternType = def.pattern_type.parse()?;

        let name = def.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required("name"));
        }

        let case_sensitive = def.case_sensitive.unwrap_or(false);
        let pattern = def.pattern.trim();
        self.check_pattern(match_attribute, pattern_type, pattern, case_sensitive)?;

        Ok(GoalFields {
            name: name.to_string(),
            description: def.description.as_deref().unwrap_or("").trim().to_string(),
            match_attribute,
            pattern: pattern.to_string(),
            pattern_type,
            case_sensitive,
            allow_multiple: def.allow_multiple.unwrap_or(false),
            revenue: def.revenue.unwrap_or(0),
            event_value_as_revenue: def.event_value_as_revenue.unwrap_or(false),
        })
    }

    fn check_pattern(
        &self,
        attribute: MatchAttribute,
        pattern_type: PatternType,
        pattern: &str,
        case_sensitive: bool,
    ) -> Result<(), ValidationError> {
        let invalid = |hint: &'static str| ValidationError::InvalidMatchingString {
            match_attribute: attribute.as_str().to_string(),
            pattern_type: pattern_type.as_str().to_string(),
            pattern: pattern.to_string(),
            hint,
        };

        match attribute.kind() {
            AttributeKind::Numeric => {
                if !pattern_type.is_comparison() {
                    return Err(invalid("numeric attributes only support greater_than"));
                }
                match pattern.parse::<f64>() {
                    Ok(value) if value.is_finite() && value >= 0.0 => return Ok(()),
                    _ => return Err(invalid("expected a non-negative number")),
                }
            }
            _ if pattern_type.is_comparison() => {
                return Err(invalid("greater_than only applies to numeric attributes"));
            }
            AttributeKind::Manual => return Ok(()),
            AttributeKind::Url
                if pattern_type == PatternType::Exact
                    && self.exact_match_requires_url
                    && !pattern.starts_with("http") =>
            {
                return Err(invalid(
                    "exact URL matches must start with http:// or https://, \
                     e.g. http://www.yourwebsite.com/newsletter/subscribed.html",
                ));
            }
            AttributeKind::Url | AttributeKind::Text | AttributeKind::Event => {}
        }

        if pattern.is_empty() {
            return Err(ValidationError::Required("pattern"));
        }

        if pattern_type == PatternType::Regex {
            RegexBuilder::new(pattern)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|e| ValidationError::NoValidRegex {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(attribute: &str, pattern: &str, pattern_type: &str) -> Result<GoalFields, ValidationError> {
        GoalValidator::default().validate(&GoalDefinition::new("goal", attribute, pattern, pattern_type))
    }

    fn is_invalid_matching(res: Result<GoalFields, ValidationError>) -> bool {
        matches!(res, Err(ValidationError::InvalidMatchingString { .. }))
    }

    #[test]
    fn test_numeric_attribute_accepts_only_comparisons() {
        assert!(check("visit_duration", "2", "greater_than").is_ok());
        assert!(is_invalid_matching(check("visit_duration", "2", "exact")));
        assert!(is_invalid_matching(check("visit_duration", "2", "contains")));
        assert!(matches!(
            check("visit_duration", "2", ">="),
            Err(ValidationError::NotWhitelisted { .. })
        ));
    }

    #[test]
    fn test_numeric_pattern_must_be_a_number() {
        assert!(is_invalid_matching(check("visit_duration", "two", "greater_than")));
        assert!(is_invalid_matching(check("visit_duration", "-1", "greater_than")));
        assert!(check("visit_duration", "0.5", "greater_than").is_ok());
    }

    #[test]
    fn test_comparison_rejected_for_text_attributes() {
        assert!(is_invalid_matching(check("title", "5", "greater_than")));
        assert!(is_invalid_matching(check("event_name", "5", "greater_than")));
    }

    #[test]
    fn test_exact_url_needs_full_url() {
        assert!(is_invalid_matching(check("url", "www.test.de", "exact")));
        assert!(is_invalid_matching(check("external_website", "www.test.de", "exact")));
        assert!(check("url", "http://www.test.de/?pk_campaign=1", "exact").is_ok());
        assert!(check("url", "www.test.de", "contains").is_ok());
    }

    #[test]
    fn test_exact_url_rule_can_be_disabled() {
        let validator = GoalValidator::new(&GoalsConfig {
            exact_match_requires_url: false,
        });
        let def = GoalDefinition::new("goal", "url", "www.test.de", "exact");
        assert!(validator.validate(&def).is_ok());
    }

    #[test]
    fn test_exact_allowed_for_title_and_events() {
        assert!(check("title", "normal title", "exact").is_ok());
        assert!(check("event_action", "test", "exact").is_ok());
        assert!(check("event_category", "test", "exact").is_ok());
        assert!(check("event_name", "test", "exact").is_ok());
    }

    #[test]
    fn test_regex_is_compiled() {
        assert!(check("title", "rere(.*)", "regex").is_ok());
        assert!(matches!(
            check("url", "/(%$f", "regex"),
            Err(ValidationError::NoValidRegex { .. })
        ));
    }

    #[test]
    fn test_regex_lookaround_is_rejected() {
        assert!(matches!(
            check("url", "(?<=shop/)checkout", "regex"),
            Err(ValidationError::NoValidRegex { .. })
        ));
        assert!(matches!(
            check("title", r"(a)\1", "regex"),
            Err(ValidationError::NoValidRegex { .. })
        ));
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let fields = check("event_action", "test", "exact").unwrap();
        assert!(!fields.case_sensitive);
        assert!(!fields.allow_multiple);
        assert!(!fields.event_value_as_revenue);
        assert_eq!(fields.revenue, 0);
        assert_eq!(fields.description, "");
    }

    #[test]
    fn test_name_and_pattern_required() {
        assert_eq!(
            check("url", "x", "contains").map(|f| f.name),
            Ok("goal".to_string())
        );
        let def = GoalDefinition::new("  ", "url", "x", "contains");
        assert_eq!(
            GoalValidator::default().validate(&def),
            Err(ValidationError::Required("name"))
        );
        assert_eq!(
            check("title", "", "contains").unwrap_err(),
            ValidationError::Required("pattern")
        );
        assert!(check("manually", "", "exact").is_ok());
    }
}
