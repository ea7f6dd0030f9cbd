//! Saved segments: definition parsing, ownership and sharing rules, and the
//! visibility-ordered listing.

pub mod api;
pub mod builder;
pub mod definition;
pub mod model;
pub mod store;
pub mod visibility;

pub use api::SegmentEditorApi;
pub use builder::SegmentDraft;
pub use definition::{Condition, MatchOperator, SegmentExpression};
pub use model::Segment;
pub use store::{MemorySegmentStore, SegmentStore};
pub use visibility::{Viewer, VisibilityTier};
