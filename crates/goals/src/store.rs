//! Goal persistence collaborator and its in-memory implementation.

use std::collections::BTreeMap;

use dashmap::DashMap;
use insight_core::{GoalId, SiteId};
use tracing::debug;

use crate::model::{Goal, GoalFields};

/// Storage for goals keyed by (site, goal id). Ids are assigned by the store,
/// sequentially per site from 1, and never reused: deletion only sets the
/// `deleted` flag.
pub trait GoalStore: Send + Sync {
    /// Persist a new goal under the next id for `site`.
    fn insert(&self, site: SiteId, fields: GoalFields) -> Goal;

    /// Look up a goal, deleted or not.
    fn get(&self, site: SiteId, id: GoalId) -> Option<Goal>;

    /// Live goals of `site` in id order.
    fn list(&self, site: SiteId) -> Vec<Goal>;

    /// Replace the fields of a live goal.
    fn update(&self, site: SiteId, id: GoalId, fields: GoalFields) -> Option<Goal>;

    /// Flag a live goal as deleted. Returns false when nothing matched.
    fn soft_delete(&self, site: SiteId, id: GoalId) -> bool;
}

#[derive(Default)]
struct SiteGoals {
    last_id: u32,
    goals: BTreeMap<GoalId, Goal>,
}

/// Thread-safe in-memory goal store. The per-site entry lock makes id
/// assignment atomic.
#[derive(Default)]
pub struct MemoryGoalStore {
    sites: DashMap<SiteId, SiteGoals>,
}

impl MemoryGoalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GoalStore for MemoryGoalStore {
    fn insert(&self, site: SiteId, fields: GoalFields) -> Goal {
        let mut entry = self.sites.entry(site).or_default();
        entry.last_id += 1;
        let id = GoalId(entry.last_id);
        let goal = Goal::from_fields(site, id, fields);
        entry.goals.insert(id, goal.clone());
        debug!(idsite = %site, idgoal = %id, "goal row inserted");
        goal
    }

    fn get(&self, site: SiteId, id: GoalId) -> Option<Goal> {
        self.sites
            .get(&site)
            .and_then(|entry| entry.goals.get(&id).cloned())
    }

    fn list(&self, site: SiteId) -> Vec<Goal> {
        self.sites
            .get(&site)
            .map(|entry| {
                entry
                    .goals
                    .values()
                    .filter(|g| !g.deleted)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn update(&self, site: SiteId, id: GoalId, fields: GoalFields) -> Option<Goal> {
        let mut entry = self.sites.get_mut(&site)?;
        let goal = entry.goals.get_mut(&id).filter(|g| !g.deleted)?;
        goal.apply(fields);
        Some(goal.clone())
    }

    fn soft_delete(&self, site: SiteId, id: GoalId) -> bool {
        let Some(mut entry) = self.sites.get_mut(&site) else {
            return false;
        };
        match entry.goals.get_mut(&id) {
            Some(goal) if !goal.deleted => {
                goal.deleted = true;
                true
            }
            _ => false,
        }
    }
}
