//! Goals API scenarios: validation rules, defaults, permission checks and
//! delete scoping.

use std::sync::Arc;

use insight_core::config::GoalsConfig;
use insight_core::{
    AccessLevel, GoalId, Identity, InsightError, PermissionError, PermissionTable, SiteId,
    SiteSelector, ValidationError,
};
use insight_goals::{Goal, GoalChanges, GoalDefinition, GoalsApi, MatchAttribute, MemoryGoalStore, PatternType};

const SITE: SiteId = SiteId(1);
const SITE_TWO: SiteId = SiteId(2);

struct Fixture {
    api: GoalsApi,
    access: Arc<PermissionTable>,
    root: Identity,
}

impl Fixture {
    fn new() -> Self {
        let access = Arc::new(PermissionTable::new());
        access.add_site(SITE);
        access.add_site(SITE_TWO);
        access.add_super_user("superUserLogin");
        let api = GoalsApi::new(
            Arc::new(MemoryGoalStore::new()),
            access.clone(),
            &GoalsConfig::default(),
        );
        Self {
            api,
            access,
            root: Identity::new("superUserLogin"),
        }
    }

    fn create_any_goal(&self) -> GoalId {
        self.api
            .add_goal(&self.root, SITE, GoalDefinition::new("MyName1", "event_action", "test", "exact"))
            .unwrap()
    }

    fn non_admin_user(&self) -> Identity {
        self.access.grant("aUser", AccessLevel::View, &[SiteId(99)]);
        Identity::new("aUser")
    }

    fn goals(&self) -> Vec<Goal> {
        self.api.get_goals(&self.root, SITE).unwrap()
    }

    fn assert_single_goal(&self, expected: Goal) {
        assert_eq!(self.goals(), vec![expected]);
    }
}

fn goal(id: u32, name: &str, description: &str, attr: MatchAttribute, pattern: &str, pattern_type: PatternType) -> Goal {
    Goal {
        site: SITE,
        id: GoalId(id),
        name: name.into(),
        description: description.into(),
        match_attribute: attr,
        pattern: pattern.into(),
        pattern_type,
        case_sensitive: false,
        allow_multiple: false,
        revenue: 0,
        deleted: false,
        event_value_as_revenue: false,
    }
}

fn assert_invalid_matching_string(err: InsightError) {
    assert!(
        matches!(err, InsightError::Validation(ValidationError::InvalidMatchingString { .. })),
        "unexpected error: {err:?}"
    );
}

#[test]
fn add_goal_handles_pattern_types_for_numeric_attributes() {
    let fx = Fixture::new();
    let cases = [
        ("greater_than", true),
        (">=", false),
        ("exact", false),
    ];
    for (pattern_type, ok) in cases {
        let res = fx.api.add_goal(
            &fx.root,
            SITE,
            GoalDefinition::new("test goal", "visit_duration", "2", pattern_type),
        );
        assert_eq!(res.is_ok(), ok, "pattern type {pattern_type}");
    }
}

#[test]
fn add_goal_returns_first_id() {
    let fx = Fixture::new();
    assert_eq!(fx.create_any_goal(), GoalId(1));
}

#[test]
fn add_goal_with_minimum_fields_uses_defaults() {
    let fx = Fixture::new();
    let id = fx
        .api
        .add_goal(
            &fx.root,
            SITE,
            GoalDefinition::new("MyName", "url", "http://www.test.de/?pk_campaign=1", "exact")
                .case_sensitive(false)
                .allow_multiple(false)
                .description("test description"),
        )
        .unwrap();

    fx.assert_single_goal(goal(
        id.0,
        "MyName",
        "test description",
        MatchAttribute::Url,
        "http://www.test.de/?pk_campaign=1",
        PatternType::Exact,
    ));
}

#[test]
fn add_goal_with_all_fields() {
    let fx = Fixture::new();
    let id = fx
        .api
        .add_goal(
            &fx.root,
            SITE,
            GoalDefinition::new("MyName", "url", "http://www.test.de", "exact")
                .case_sensitive(true)
                .revenue(50)
                .allow_multiple(true)
                .description("desc")
                .event_value_as_revenue(true),
        )
        .unwrap();

    let mut expected = goal(id.0, "MyName", "desc", MatchAttribute::Url, "http://www.test.de", PatternType::Exact);
    expected.case_sensitive = true;
    expected.revenue = 50;
    expected.allow_multiple = true;
    expected.event_value_as_revenue = true;
    fx.assert_single_goal(expected);
}

#[test]
fn add_goal_with_exact_and_regex_page_title() {
    let fx = Fixture::new();
    let def = |pattern: &str, pattern_type: &str| {
        GoalDefinition::new("MyName", "title", pattern, pattern_type)
            .case_sensitive(true)
            .revenue(50)
            .allow_multiple(true)
    };
    assert!(fx.api.add_goal(&fx.root, SITE, def("normal title", "exact")).is_ok());
    let id = fx.api.add_goal(&fx.root, SITE, def("rere(.*)", "regex")).unwrap();

    let stored = fx.api.get_goal(&fx.root, SITE, id).unwrap().unwrap();
    assert_eq!(stored.pattern, "rere(.*)");
    assert_eq!(stored.pattern_type, PatternType::Regex);
    assert_eq!(stored.description, "");
    assert_eq!(stored.revenue, 50);
}

#[test]
fn add_goal_rejects_unknown_pattern_type() {
    let fx = Fixture::new();
    let err = fx
        .api
        .add_goal(&fx.root, SITE, GoalDefinition::new("MyName", "external_website", "www.test.de", "invalid"))
        .unwrap_err();
    assert!(matches!(
        err,
        InsightError::Validation(ValidationError::NotWhitelisted { field: "patternType", .. })
    ));
    assert!(err.to_string().contains("not in the allowed set"));
}

#[test]
fn add_goal_rejects_invalid_regex() {
    let fx = Fixture::new();
    let err = fx
        .api
        .add_goal(&fx.root, SITE, GoalDefinition::new("MyName", "url", "/(%$f", "regex"))
        .unwrap_err();
    assert!(matches!(err, InsightError::Validation(ValidationError::NoValidRegex { .. })));
    assert!(err.to_string().contains("no valid regex"));
}

#[test]
fn add_goal_rejects_exact_for_non_event_attributes() {
    let fx = Fixture::new();
    for attr in ["url", "external_website"] {
        let err = fx
            .api
            .add_goal(&fx.root, SITE, GoalDefinition::new("MyName", attr, "www.test.de", "exact"))
            .unwrap_err();
        assert_invalid_matching_string(err);
    }
    assert!(fx.goals().is_empty());
}

#[test]
fn add_goal_accepts_exact_for_event_attributes() {
    let fx = Fixture::new();
    fx.api
        .add_goal(&fx.root, SITE, GoalDefinition::new("MyName1", "event_action", "test", "exact"))
        .unwrap();
    fx.api
        .add_goal(&fx.root, SITE, GoalDefinition::new("MyName2", "event_name", "test", "exact"))
        .unwrap();
    let id = fx
        .api
        .add_goal(&fx.root, SITE, GoalDefinition::new("MyName3", "event_category", "test", "exact"))
        .unwrap();
    assert_eq!(id, GoalId(3));
}

#[test]
fn add_goal_requires_write_access() {
    let fx = Fixture::new();
    let user = fx.non_admin_user();
    let err = fx
        .api
        .add_goal(&user, SITE, GoalDefinition::new("MyName1", "event_action", "test", "exact"))
        .unwrap_err();
    assert!(matches!(
        err,
        InsightError::Permission(PermissionError::WriteAccessRequired { site: SITE, .. })
    ));
    assert!(fx.goals().is_empty());
}

#[test]
fn permission_is_checked_before_validation() {
    let fx = Fixture::new();
    let user = fx.non_admin_user();
    let err = fx
        .api
        .add_goal(&user, SITE, GoalDefinition::new("x", "url", "x", "invalid"))
        .unwrap_err();
    assert!(err.is_permission());
}

#[test]
fn update_goal_requires_write_access() {
    let fx = Fixture::new();
    let id = fx.create_any_goal();
    assert_eq!(id, GoalId(1));
    let user = fx.non_admin_user();
    let err = fx
        .api
        .update_goal(&user, SITE, id, GoalDefinition::new("MyName", "url", "www.test.de", "exact").into())
        .unwrap_err();
    assert!(matches!(
        err,
        InsightError::Permission(PermissionError::WriteAccessRequired { .. })
    ));
}

#[test]
fn update_goal_rejects_exact_for_non_event_attribute() {
    let fx = Fixture::new();
    let id = fx.create_any_goal();
    let err = fx
        .api
        .update_goal(&fx.root, SITE, id, GoalDefinition::new("MyName", "url", "www.test.de", "exact").into())
        .unwrap_err();
    assert_invalid_matching_string(err);

    // Rejected updates leave the goal untouched.
    let stored = fx.api.get_goal(&fx.root, SITE, id).unwrap().unwrap();
    assert_eq!(stored.match_attribute, MatchAttribute::EventAction);
}

#[test]
fn update_goal_accepts_exact_for_event_attributes() {
    let fx = Fixture::new();
    let id = fx.create_any_goal();
    for attr in ["event_action", "event_category", "event_name"] {
        fx.api
            .update_goal(&fx.root, SITE, id, GoalDefinition::new("MyName", attr, "www.test.de", "exact").into())
            .unwrap();
    }
    assert_eq!(id, GoalId(1));
}

#[test]
fn update_goal_updates_all_given_fields() {
    let fx = Fixture::new();
    let id = fx.create_any_goal();
    fx.api
        .update_goal(
            &fx.root,
            SITE,
            id,
            GoalDefinition::new("UpdatedName", "file", "http://www.updatetest.de", "contains")
                .case_sensitive(true)
                .revenue(999)
                .allow_multiple(true)
                .into(),
        )
        .unwrap();

    let mut expected = goal(id.0, "UpdatedName", "", MatchAttribute::File, "http://www.updatetest.de", PatternType::Contains);
    expected.case_sensitive = true;
    expected.revenue = 999;
    expected.allow_multiple = true;
    fx.assert_single_goal(expected);
}

#[test]
fn update_goal_with_minimal_fields_leaves_others_untouched() {
    let fx = Fixture::new();
    let id = fx
        .api
        .add_goal(
            &fx.root,
            SITE,
            GoalDefinition::new("MyName1", "event_action", "test", "exact")
                .revenue(12)
                .description("kept"),
        )
        .unwrap();
    fx.api
        .update_goal(
            &fx.root,
            SITE,
            id,
            GoalChanges::new()
                .name("UpdatedName")
                .match_attribute("file")
                .pattern("http://www.updatetest.de")
                .pattern_type("contains"),
        )
        .unwrap();

    let mut expected = goal(id.0, "UpdatedName", "kept", MatchAttribute::File, "http://www.updatetest.de", PatternType::Contains);
    expected.revenue = 12;
    fx.assert_single_goal(expected);
}

#[test]
fn update_of_missing_goal_is_not_found() {
    let fx = Fixture::new();
    let err = fx
        .api
        .update_goal(&fx.root, SITE, GoalId(42), GoalChanges::new().name("x"))
        .unwrap_err();
    assert!(matches!(err, InsightError::NotFound(_)));
}

#[test]
fn delete_goal_ignores_unknown_id() {
    let fx = Fixture::new();
    assert!(fx.goals().is_empty());
    fx.create_any_goal();
    fx.api.delete_goal(&fx.root, SITE, GoalId(999)).unwrap();
    assert_eq!(fx.goals().len(), 1);
}

#[test]
fn delete_goal_ignores_mismatched_site() {
    let fx = Fixture::new();
    let id = fx.create_any_goal();
    fx.api.delete_goal(&fx.root, SITE_TWO, id).unwrap();
    assert_eq!(fx.goals().len(), 1);
}

#[test]
fn delete_goal_removes_matching_goal() {
    let fx = Fixture::new();
    let id = fx.create_any_goal();
    fx.api.delete_goal(&fx.root, SITE, id).unwrap();
    assert!(fx.goals().is_empty());
    assert!(fx.api.get_goal(&fx.root, SITE, id).unwrap().is_none());

    // Deleted ids are never handed out again.
    assert_eq!(fx.create_any_goal(), GoalId(2));
}

#[test]
fn get_goal_requires_view_access() {
    let fx = Fixture::new();
    let id = fx.create_any_goal();
    let user = fx.non_admin_user();
    let err = fx.api.get_goal(&user, SITE, id).unwrap_err();
    assert!(matches!(
        err,
        InsightError::Permission(PermissionError::ViewAccessRequired { .. })
    ));
}

#[test]
fn get_goal_returns_none_when_missing() {
    let fx = Fixture::new();
    assert!(fx.api.get_goal(&fx.root, SITE, GoalId(99)).unwrap().is_none());
}

#[test]
fn get_goal_returns_stored_fields() {
    let fx = Fixture::new();
    let id = fx.create_any_goal();
    let stored = fx.api.get_goal(&fx.root, SITE, id).unwrap().unwrap();
    assert_eq!(
        serde_json::to_value(&stored).unwrap(),
        serde_json::json!({
            "idsite": 1,
            "idgoal": 1,
            "name": "MyName1",
            "description": "",
            "match_attribute": "event_action",
            "pattern": "test",
            "pattern_type": "exact",
            "case_sensitive": false,
            "allow_multiple": false,
            "revenue": 0,
            "deleted": false,
            "event_value_as_revenue": false,
        })
    );
}

#[test]
fn get_goals_for_multiple_sites() {
    let fx = Fixture::new();
    let one = fx
        .api
        .add_goal(&fx.root, SITE, GoalDefinition::new("Goal Site One", "url", "http://site.one", "exact"))
        .unwrap();
    let two = fx
        .api
        .add_goal(&fx.root, SITE_TWO, GoalDefinition::new("Goal Site Two", "url", "http://site.two", "exact"))
        .unwrap();
    let expected = vec![
        fx.api.get_goal(&fx.root, SITE, one).unwrap().unwrap(),
        fx.api.get_goal(&fx.root, SITE_TWO, two).unwrap().unwrap(),
    ];

    let selectors: [SiteSelector; 3] = [
        "1,2".parse().unwrap(),
        SiteSelector::from(vec![2, 1]),
        SiteSelector::All,
    ];
    for selector in selectors {
        assert_eq!(fx.api.get_goals(&fx.root, selector).unwrap(), expected);
    }
}

#[test]
fn get_goals_checks_every_listed_site() {
    let fx = Fixture::new();
    fx.access.grant("viewer", AccessLevel::View, &[SITE]);
    let viewer = Identity::new("viewer");
    assert!(fx.api.get_goals(&viewer, SITE).is_ok());
    let err = fx
        .api
        .get_goals(&viewer, SiteSelector::from(vec![1, 2]))
        .unwrap_err();
    assert!(err.is_permission());
}
