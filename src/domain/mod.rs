//! Domain layer: entities and hierarchy logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod search;
pub mod store;

pub use arena::{NodeData, TreeArena, TreeNode, DEFAULT_ROOT_LABEL};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use search::{AttrFilter, MatchType, SearchQuery};
pub use store::HierarchyStore;
