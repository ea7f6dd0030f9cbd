//! Fluent builder for the fields a caller submits on add/update.

use insight_core::{SiteId, SiteScope};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDraft {
    pub name: String,
    pub definition: String,
    pub scope: SiteScope,
    pub auto_archive: bool,
    pub enable_all_users: bool,
}

impl SegmentDraft {
    /// A real-time, unshared segment applying to all sites.
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
            scope: SiteScope::AllSites,
            auto_archive: false,
            enable_all_users: false,
        }
    }

    pub fn site(mut self, site: SiteId) -> Self {
        self.scope = SiteScope::Site(site);
        self
    }

    pub fn scope(mut self, scope: impl Into<SiteScope>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn all_sites(mut self) -> Self {
        self.scope = SiteScope::AllSites;
        self
    }

    pub fn auto_archive(mut self, value: bool) -> Self {
        self.auto_archive = value;
        self
    }

    pub fn shared(mut self, value: bool) -> Self {
        self.enable_all_users = value;
        self
    }
}
