//! Which segments a user sees, and in what order.

use crate::model::Segment;

/// The user a segment list is resolved for.
#[derive(Debug, Clone, Copy)]
pub struct Viewer<'a> {
    pub login: &'a str,
    pub is_super_user: bool,
}

/// Listing tier; lower tiers are listed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VisibilityTier {
    /// Created by the viewer.
    Own,
    /// Shared with all users. Only super users can share, so these come from
    /// a super user.
    Shared,
    /// Anybody else's private segment; only super users see these.
    Other,
}

impl<'a> Viewer<'a> {
    pub fn new(login: &'a str, is_super_user: bool) -> Self {
        Self {
            login,
            is_super_user,
        }
    }

    /// `None` when the segment is hidden from this viewer.
    pub fn tier(&self, segment: &Segment) -> Option<VisibilityTier> {
        if segment.is_owned_by(self.login) {
            Some(VisibilityTier::Own)
        } else if segment.enable_all_users {
            Some(VisibilityTier::Shared)
        } else if self.is_super_user {
            Some(VisibilityTier::Other)
        } else {
            None
        }
    }

    pub fn can_see(&self, segment: &Segment) -> bool {
        self.tier(segment).is_some()
    }

    /// Drop hidden segments and order the rest by tier, then name (ignoring
    /// case), then id.
    pub fn arrange(&self, segments: impl IntoIterator<Item = Segment>) -> Vec<Segment> {
        let mut visible: Vec<(VisibilityTier, Segment)> = segments
            .into_iter()
            .filter_map(|s| self.tier(&s).map(|tier| (tier, s)))
            .collect();
        visible.sort_by(|(ta, a), (tb, b)| {
            ta.cmp(tb)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.id.cmp(&b.id))
        });
        visible.into_iter().map(|(_, s)| s).collect()
    }
}
