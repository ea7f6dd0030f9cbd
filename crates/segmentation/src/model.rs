use chrono::{DateTime, Utc};
use insight_core::{SegmentId, SiteScope};
use serde::{Deserialize, Serialize};

/// A saved segment. Serialises with the column names of the segment table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "idsegment")]
    pub id: SegmentId,
    pub name: String,
    pub definition: String,
    /// Site the segment is restricted to; `0` when it applies to all sites.
    #[serde(rename = "enable_only_idsite")]
    pub scope: SiteScope,
    /// Owner.
    pub login: String,
    pub auto_archive: bool,
    /// Shared with every user.
    pub enable_all_users: bool,
    pub deleted: bool,
    pub ts_created: DateTime<Utc>,
    pub ts_last_edit: Option<DateTime<Utc>>,
    /// Set when a super user moved the segment to the all-sites scope; from
    /// then on only super users may edit it.
    #[serde(default)]
    pub all_sites_locked: bool,
}

impl Segment {
    pub fn is_owned_by(&self, login: &str) -> bool {
        self.login == login
    }
}
