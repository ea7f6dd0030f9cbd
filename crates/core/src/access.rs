//! Identities and the access collaborator.
//!
//! Every engine call receives the acting [`Identity`] explicitly and asks an
//! [`Access`] implementation what that identity may do. [`PermissionTable`]
//! is the in-memory implementation used by tests and embedders without an
//! external user directory.

use std::collections::BTreeMap;
use std::fmt;

use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PermissionError;
use crate::types::SiteId;

const ANONYMOUS_LOGIN: &str = "anonymous";

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    login: String,
}

impl Identity {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_LOGIN)
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn is_anonymous(&self) -> bool {
        self.login == ANONYMOUS_LOGIN
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.login)
    }
}

/// Per-site privilege, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    View,
    Write,
    Admin,
}

/// Access collaborator. Super users pass every per-site check.
pub trait Access: Send + Sync {
    fn is_super_user(&self, who: &Identity) -> bool;

    /// Explicit grant of `who` on `site`, ignoring super user status.
    fn access_level(&self, who: &Identity, site: SiteId) -> Option<AccessLevel>;

    /// Sites on which `who` holds an explicit grant of at least `min`.
    fn sites_with_access(&self, who: &Identity, min: AccessLevel) -> Vec<SiteId>;

    /// Every known site; what a super user can see.
    fn all_sites(&self) -> Vec<SiteId>;

    fn has_access(&self, who: &Identity, site: SiteId, min: AccessLevel) -> bool {
        self.is_super_user(who) || self.access_level(who, site).is_some_and(|l| l >= min)
    }

    fn has_view_access(&self, who: &Identity, site: SiteId) -> bool {
        self.has_access(who, site, AccessLevel::View)
    }

    fn has_write_access(&self, who: &Identity, site: SiteId) -> bool {
        self.has_access(who, site, AccessLevel::Write)
    }

    fn has_some_view_access(&self, who: &Identity) -> bool {
        self.is_super_user(who) || !self.sites_with_access(who, AccessLevel::View).is_empty()
    }

    /// Sites `who` may read, super users included.
    fn viewable_sites(&self, who: &Identity) -> Vec<SiteId> {
        if self.is_super_user(who) {
            self.all_sites()
        } else {
            self.sites_with_access(who, AccessLevel::View)
        }
    }

    fn check_view_access(&self, who: &Identity, site: SiteId) -> Result<(), PermissionError> {
        if self.has_view_access(who, site) {
            return Ok(());
        }
        warn!(login = %who, idsite = %site, "view access denied");
        Err(PermissionError::ViewAccessRequired {
            login: who.login().to_string(),
            site,
        })
    }

    fn check_write_access(&self, who: &Identity, site: SiteId) -> Result<(), PermissionError> {
        if self.has_write_access(who, site) {
            return Ok(());
        }
        warn!(login = %who, idsite = %site, "write access denied");
        Err(PermissionError::WriteAccessRequired {
            login: who.login().to_string(),
            site,
        })
    }

    fn check_some_view_access(&self, who: &Identity) -> Result<(), PermissionError> {
        if self.has_some_view_access(who) {
            return Ok(());
        }
        warn!(login = %who, "no view access on any site");
        Err(PermissionError::SomeViewAccessRequired {
            login: who.login().to_string(),
        })
    }

    fn check_super_user(
        &self,
        who: &Identity,
        operation: &'static str,
    ) -> Result<(), PermissionError> {
        if self.is_super_user(who) {
            return Ok(());
        }
        warn!(login = %who, operation, "super user access denied");
        Err(PermissionError::SuperUserRequired { operation })
    }
}

/// In-memory grants keyed by login.
pub struct PermissionTable {
    sites: DashSet<SiteId>,
    super_users: DashSet<String>,
    grants: DashMap<String, BTreeMap<SiteId, AccessLevel>>,
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionTable {
    pub fn new() -> Self {
        Self {
            sites: DashSet::new(),
            super_users: DashSet::new(),
            grants: DashMap::new(),
        }
    }

    pub fn add_site(&self, site: SiteId) {
        self.sites.insert(site);
    }

    pub fn add_super_user(&self, login: impl Into<String>) {
        let login = login.into();
        info!(login = %login, "granted super user access");
        self.super_users.insert(login);
    }

    pub fn remove_super_user(&self, login: &str) {
        self.super_users.remove(login);
    }

    /// Grant `level` on each of `sites`, replacing any previous grant there.
    pub fn grant(&self, login: impl Into<String>, level: AccessLevel, sites: &[SiteId]) {
        let login = login.into();
        let mut entry = self.grants.entry(login.clone()).or_default();
        for site in sites {
            self.sites.insert(*site);
            entry.insert(*site, level);
        }
        info!(login = %login, ?level, sites = sites.len(), "granted site access");
    }

    /// Drop every grant held by `login`.
    pub fn revoke_all(&self, login: &str) {
        self.grants.remove(login);
    }
}

impl Access for PermissionTable {
    fn is_super_user(&self, who: &Identity) -> bool {
        !who.is_anonymous() && self.super_users.contains(who.login())
    }

    fn access_level(&self, who: &Identity, site: SiteId) -> Option<AccessLevel> {
        self.grants
            .get(who.login())
            .and_then(|g| g.get(&site).copied())
    }

    fn sites_with_access(&self, who: &Identity, min: AccessLevel) -> Vec<SiteId> {
        self.grants
            .get(who.login())
            .map(|g| {
                g.iter()
                    .filter(|(_, level)| **level >= min)
                    .map(|(site, _)| *site)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn all_sites(&self) -> Vec<SiteId> {
        let mut sites: Vec<SiteId> = self.sites.iter().map(|s| *s).collect();
        sites.sort();
        sites
    }
}
