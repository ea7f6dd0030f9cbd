use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Numeric id of a tracked website.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub u32);

/// Goal id, sequential within one site starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(pub u32);

/// Segment id, global and sequential starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u32);

macro_rules! id_impls {
    ($($ty:ident),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $ty {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }
    )*};
}

id_impls!(SiteId, GoalId, SegmentId);

/// Where a segment applies. Serialised as the stored `enable_only_idsite`
/// column: `0` means every site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteScope {
    AllSites,
    Site(SiteId),
}

impl SiteScope {
    pub fn is_all_sites(&self) -> bool {
        matches!(self, Self::AllSites)
    }

    pub fn site(&self) -> Option<SiteId> {
        match self {
            Self::AllSites => None,
            Self::Site(id) => Some(*id),
        }
    }

    /// True when a segment with this scope applies to `site`.
    pub fn covers(&self, site: SiteId) -> bool {
        match self {
            Self::AllSites => true,
            Self::Site(id) => *id == site,
        }
    }
}

impl From<Option<SiteId>> for SiteScope {
    fn from(site: Option<SiteId>) -> Self {
        match site {
            Some(SiteId(0)) | None => Self::AllSites,
            Some(id) => Self::Site(id),
        }
    }
}

impl From<u32> for SiteScope {
    fn from(raw: u32) -> Self {
        Self::from(Some(SiteId(raw)))
    }
}

impl fmt::Display for SiteScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllSites => write!(f, "all"),
            Self::Site(id) => write!(f, "{id}"),
        }
    }
}

impl Serialize for SiteScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.site().map_or(0, |s| s.0))
    }
}

impl<'de> Deserialize<'de> for SiteScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<u32>::deserialize(deserializer)?;
        Ok(raw.map_or(Self::AllSites, Self::from))
    }
}

/// One or more sites named in a read request, e.g. `"1,2"` or `[1, 2]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteSelector {
    /// Every site the caller can view.
    All,
    Sites(Vec<SiteId>),
}

impl From<SiteId> for SiteSelector {
    fn from(site: SiteId) -> Self {
        Self::Sites(vec![site])
    }
}

impl From<Vec<u32>> for SiteSelector {
    fn from(ids: Vec<u32>) -> Self {
        Self::Sites(ids.into_iter().map(SiteId).collect())
    }
}

impl FromStr for SiteSelector {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let mut sites = Vec::new();
        for part in trimmed.split(',') {
            let id: u32 = part
                .trim()
                .parse()
                .map_err(|_| ValidationError::InvalidSiteList(s.to_string()))?;
            if id == 0 {
                return Err(ValidationError::InvalidSiteList(s.to_string()));
            }
            let id = SiteId(id);
            if !sites.contains(&id) {
                sites.push(id);
            }
        }
        Ok(Self::Sites(sites))
    }
}
