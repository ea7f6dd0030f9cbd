//! Segment persistence collaborator and its in-memory implementation.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use insight_core::SegmentId;
use tracing::debug;

use crate::builder::SegmentDraft;
use crate::model::Segment;

/// Storage for segments. Ids are assigned by the store, sequentially from 1,
/// and never reused: deletion only sets the `deleted` flag.
pub trait SegmentStore: Send + Sync {
    fn insert(&self, draft: SegmentDraft, login: &str, all_sites_locked: bool) -> Segment;

    /// Look up a segment, deleted or not.
    fn get(&self, id: SegmentId) -> Option<Segment>;

    /// Overwrite the editable fields of a live segment and stamp the edit
    /// time.
    fn update(&self, id: SegmentId, draft: SegmentDraft, all_sites_locked: bool) -> Option<Segment>;

    /// Flag a live segment as deleted. Returns false when nothing matched.
    fn soft_delete(&self, id: SegmentId) -> bool;

    /// Every live segment, in id order.
    fn list(&self) -> Vec<Segment>;
}

/// Thread-safe in-memory segment store backed by DashMap.
pub struct MemorySegmentStore {
    segments: DashMap<SegmentId, Segment>,
    last_id: AtomicU32,
}

impl Default for MemorySegmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySegmentStore {
    pub fn new() -> Self {
        Self {
            segments: DashMap::new(),
            last_id: AtomicU32::new(0),
        }
    }
}

impl SegmentStore for MemorySegmentStore {
    fn insert(&self, draft: SegmentDraft, login: &str, all_sites_locked: bool) -> Segment {
        let id = SegmentId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1);
        let segment = Segment {
            id,
            name: draft.name,
            definition: draft.definition,
            scope: draft.scope,
            login: login.to_string(),
            auto_archive: draft.auto_archive,
            enable_all_users: draft.enable_all_users,
            deleted: false,
            ts_created: Utc::now(),
            ts_last_edit: None,
            all_sites_locked,
        };
        self.segments.insert(id, segment.clone());
        debug!(idsegment = %id, "segment row inserted");
        segment
    }

    fn get(&self, id: SegmentId) -> Option<Segment> {
        self.segments.get(&id).map(|s| s.value().clone())
    }

    fn update(&self, id: SegmentId, draft: SegmentDraft, all_sites_locked: bool) -> Option<Segment> {
        let mut entry = self.segments.get_mut(&id)?;
        let segment = entry.value_mut();
        if segment.deleted {
            return None;
        }
        segment.name = draft.name;
        segment.definition = draft.definition;
        segment.scope = draft.scope;
        segment.auto_archive = draft.auto_archive;
        segment.enable_all_users = draft.enable_all_users;
        segment.all_sites_locked = all_sites_locked;
        segment.ts_last_edit = Some(Utc::now());
        Some(segment.clone())
    }

    fn soft_delete(&self, id: SegmentId) -> bool {
        match self.segments.get_mut(&id) {
            Some(mut entry) if !entry.deleted => {
                entry.deleted = true;
                entry.ts_last_edit = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    fn list(&self) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self
            .segments
            .iter()
            .filter(|r| !r.value().deleted)
            .map(|r| r.value().clone())
            .collect();
        segments.sort_by_key(|s| s.id);
        segments
    }
}
