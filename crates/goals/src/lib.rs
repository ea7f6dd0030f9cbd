//! Goal definitions: validation of match attribute / pattern combinations,
//! sequential per-site ids and the Goals API.

pub mod api;
pub mod model;
pub mod store;
pub mod validator;

pub use api::GoalsApi;
pub use model::{Goal, GoalChanges, GoalDefinition, MatchAttribute, PatternType};
pub use store::{GoalStore, MemoryGoalStore};
