//! Shared building blocks for the goal and segment rule engines: identifiers,
//! identities and the access collaborator, error types, configuration and
//! tracing setup.

pub mod access;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use access::{Access, AccessLevel, Identity, PermissionTable};
pub use config::AppConfig;
pub use error::{InsightError, InsightResult, PermissionError, ValidationError};
pub use types::{GoalId, SegmentId, SiteId, SiteScope, SiteSelector};
