//! Goals API: permission checks, validation, then persistence.

use std::sync::Arc;

use insight_core::config::GoalsConfig;
use insight_core::{Access, GoalId, Identity, InsightError, InsightResult, SiteId, SiteSelector};
use tracing::{debug, info};

use crate::model::{Goal, GoalChanges, GoalDefinition};
use crate::store::GoalStore;
use crate::validator::GoalValidator;

/// Entry point for goal management. Every check runs before the store is
/// touched, so a rejected call never leaves a partial write.
pub struct GoalsApi {
    store: Arc<dyn GoalStore>,
    access: Arc<dyn Access>,
    validator: GoalValidator,
}

impl GoalsApi {
    pub fn new(store: Arc<dyn GoalStore>, access: Arc<dyn Access>, config: &GoalsConfig) -> Self {
        Self {
            store,
            access,
            validator: GoalValidator::new(config),
        }
    }

    /// Create a goal and return its id, the next one for `site`.
    pub fn add_goal(&self, who: &Identity, site: SiteId, def: GoalDefinition) -> InsightResult<GoalId> {
        self.access.check_write_access(who, site)?;
        let fields = self.validator.validate(&def)?;

        let goal = self.store.insert(site, fields);
        info!(
            idsite = %site,
            idgoal = %goal.id,
            login = %who,
            match_attribute = %goal.match_attribute,
            pattern_type = %goal.pattern_type,
            "goal added"
        );
        Ok(goal.id)
    }

    /// Merge `changes` over the stored goal, re-validate, and persist.
    pub fn update_goal(
        &self,
        who: &Identity,
        site: SiteId,
        id: GoalId,
        changes: GoalChanges,
    ) -> InsightResult<Goal> {
        self.access.check_write_access(who, site)?;
        let existing = self
            .live_goal(site, id)
            .ok_or_else(|| InsightError::NotFound(format!("goal {id} on site {site}")))?;

        let merged = changes.merge_into(GoalDefinition::from(&existing));
        let fields = self.validator.validate(&merged)?;

        let goal = self
            .store
            .update(site, id, fields)
            .ok_or_else(|| InsightError::NotFound(format!("goal {id} on site {site}")))?;
        info!(idsite = %site, idgoal = %id, login = %who, "goal updated");
        Ok(goal)
    }

    /// Soft-delete the goal matching both `site` and `id`. Anything else is
    /// a silent no-op.
    pub fn delete_goal(&self, who: &Identity, site: SiteId, id: GoalId) -> InsightResult<()> {
        self.access.check_write_access(who, site)?;
        if self.store.soft_delete(site, id) {
            info!(idsite = %site, idgoal = %id, login = %who, "goal deleted");
        } else {
            debug!(idsite = %site, idgoal = %id, "no live goal to delete");
        }
        Ok(())
    }

    pub fn get_goal(&self, who: &Identity, site: SiteId, id: GoalId) -> InsightResult<Option<Goal>> {
        self.access.check_view_access(who, site)?;
        Ok(self.live_goal(site, id))
    }

    /// Live goals for every selected site, ordered by site then goal id.
    pub fn get_goals(
        &self,
        who: &Identity,
        sites: impl Into<SiteSelector>,
    ) -> InsightResult<Vec<Goal>> {
        let mut sites = match sites.into() {
            SiteSelector::All => self.access.viewable_sites(who),
            SiteSelector::Sites(sites) => {
                for site in &sites {
                    self.access.check_view_access(who, *site)?;
                }
                sites
            }
        };
        sites.sort();

        let goals: Vec<Goal> = sites
            .into_iter()
            .flat_map(|site| self.store.list(site))
            .collect();
        debug!(login = %who, count = goals.len(), "goals listed");
        Ok(goals)
    }

    fn live_goal(&self, site: SiteId, id: GoalId) -> Option<Goal> {
        self.store.get(site, id).filter(|g| !g.deleted)
    }
}
