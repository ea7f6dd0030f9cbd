//! Segment editor API: ownership and privilege rules around the segment
//! store, plus the visibility-ordered listing.

use std::sync::Arc;

use insight_core::config::SegmentsConfig;
use insight_core::{
    Access, Identity, InsightError, InsightResult, PermissionError, SegmentId, SiteId, SiteScope,
    ValidationError,
};
use tracing::{debug, info, warn};

use crate::builder::SegmentDraft;
use crate::definition::SegmentExpression;
use crate::model::Segment;
use crate::store::SegmentStore;
use crate::visibility::Viewer;

pub struct SegmentEditorApi {
    store: Arc<dyn SegmentStore>,
    access: Arc<dyn Access>,
    config: SegmentsConfig,
}

impl SegmentEditorApi {
    pub fn new(
        store: Arc<dyn SegmentStore>,
        access: Arc<dyn Access>,
        config: &SegmentsConfig,
    ) -> Self {
        Self {
            store,
            access,
            config: config.clone(),
        }
    }

    /// Create a segment owned by `who` and return its id.
    pub fn add(&self, who: &Identity, draft: SegmentDraft) -> InsightResult<SegmentId> {
        check_not_anonymous(who)?;
        let draft = self.validate_draft(who, draft, true)?;

        let locked = self.access.is_super_user(who) && draft.scope.is_all_sites();
        let segment = self.store.insert(draft, who.login(), locked);
        info!(
            idsegment = %segment.id,
            login = %who,
            scope = %segment.scope,
            shared = segment.enable_all_users,
            auto_archive = segment.auto_archive,
            "segment added"
        );
        Ok(segment.id)
    }

    /// Replace the editable fields of a segment. Sharing is only re-checked
    /// when `enable_all_users` changes, so owners keep editing segments a
    /// super user shared for them.
    pub fn update(
        &self,
        who: &Identity,
        id: SegmentId,
        draft: SegmentDraft,
    ) -> InsightResult<Segment> {
        check_not_anonymous(who)?;
        let existing = self
            .live_segment(id)
            .ok_or_else(|| InsightError::NotFound(format!("segment {id}")))?;
        self.check_can_edit(who, &existing)?;

        let sharing_changed = existing.enable_all_users != draft.enable_all_users;
        let draft = self.validate_draft(who, draft, sharing_changed)?;

        let locked = if self.access.is_super_user(who) {
            draft.scope.is_all_sites()
        } else {
            existing.all_sites_locked
        };
        let segment = self
            .store
            .update(id, draft, locked)
            .ok_or_else(|| InsightError::NotFound(format!("segment {id}")))?;
        info!(
            idsegment = %id,
            login = %who,
            scope = %segment.scope,
            shared = segment.enable_all_users,
            "segment updated"
        );
        Ok(segment)
    }

    /// Soft-delete a segment. Missing or already deleted segments are a
    /// silent no-op.
    pub fn delete(&self, who: &Identity, id: SegmentId) -> InsightResult<()> {
        check_not_anonymous(who)?;
        let Some(existing) = self.live_segment(id) else {
            debug!(idsegment = %id, "no live segment to delete");
            return Ok(());
        };
        self.check_can_edit(who, &existing)?;

        if self.store.soft_delete(id) {
            info!(idsegment = %id, login = %who, "segment deleted");
        }
        Ok(())
    }

    pub fn get(&self, who: &Identity, id: SegmentId) -> InsightResult<Option<Segment>> {
        let Some(segment) = self.live_segment(id) else {
            return Ok(None);
        };
        let viewer = Viewer::new(who.login(), self.access.is_super_user(who));
        if !viewer.can_see(&segment) {
            warn!(idsegment = %id, login = %who, "segment not visible");
            return Err(PermissionError::SegmentNotVisible {
                login: who.login().to_string(),
                idsegment: id,
            }
            .into());
        }
        Ok(Some(segment))
    }

    /// Segments visible to `who`, own first, then shared, then (super users
    /// only) everyone else's. With a site, only segments for that site or
    /// for all sites are listed.
    pub fn get_all(&self, who: &Identity, site: Option<SiteId>) -> InsightResult<Vec<Segment>> {
        let is_super_user = self.access.is_super_user(who);

        let candidates: Vec<Segment> = match site {
            Some(site) => {
                self.access.check_view_access(who, site)?;
                self.store
                    .list()
                    .into_iter()
                    .filter(|s| s.scope.covers(site))
                    .collect()
            }
            None => {
                let viewable = self.access.viewable_sites(who);
                self.store
                    .list()
                    .into_iter()
                    .filter(|s| match s.scope {
                        SiteScope::AllSites => true,
                        SiteScope::Site(site) => is_super_user || viewable.contains(&site),
                    })
                    .collect()
            }
        };

        let segments = Viewer::new(who.login(), is_super_user).arrange(candidates);
        debug!(login = %who, site = ?site, count = segments.len(), "segments listed");
        Ok(segments)
    }

    fn live_segment(&self, id: SegmentId) -> Option<Segment> {
        self.store.get(id).filter(|s| !s.deleted)
    }

    fn check_can_edit(&self, who: &Identity, segment: &Segment) -> Result<(), PermissionError> {
        if self.access.is_super_user(who) {
            return Ok(());
        }
        if !segment.is_owned_by(who.login()) {
            warn!(idsegment = %segment.id, login = %who, owner = %segment.login, "edit of foreign segment denied");
            return Err(PermissionError::NotSegmentOwner {
                login: who.login().to_string(),
            });
        }
        if segment.all_sites_locked {
            warn!(idsegment = %segment.id, login = %who, "edit of all-sites segment denied");
            return Err(PermissionError::AllSitesSegmentRequiresSuperUser);
        }
        Ok(())
    }

    fn validate_draft(
        &self,
        who: &Identity,
        mut draft: SegmentDraft,
        check_sharing: bool,
    ) -> InsightResult<SegmentDraft> {
        match draft.scope {
            SiteScope::Site(site) => self.access.check_view_access(who, site)?,
            SiteScope::AllSites => self.access.check_some_view_access(who)?,
        }

        draft.name = draft.name.trim().to_string();
        if draft.name.is_empty() {
            return Err(ValidationError::Required("segment name").into());
        }
        draft.definition = draft.definition.trim().to_string();
        SegmentExpression::parse(&draft.definition)?;

        if check_sharing && draft.enable_all_users && !self.access.is_super_user(who) {
            warn!(login = %who, "sharing a segment requires super user access");
            return Err(PermissionError::SharedSegmentRequiresSuperUser.into());
        }

        if draft.auto_archive {
            if draft.scope.is_all_sites() {
                self.access
                    .check_super_user(who, "pre-processing a segment for all websites")?;
            }
        } else if !self.config.enable_create_realtime_segments {
            return Err(ValidationError::RealtimeSegmentsDisabled.into());
        }

        Ok(draft)
    }
}

fn check_not_anonymous(who: &Identity) -> Result<(), PermissionError> {
    if who.is_anonymous() {
        return Err(PermissionError::AnonymousUser);
    }
    Ok(())
}
