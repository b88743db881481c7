//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::GroupKey;

/// Domain errors represent hierarchy invariant violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("group already exists: {0}")]
    DuplicateEntity(GroupKey),

    #[error("no such super set for {child}: {parent}")]
    MissingParent { child: GroupKey, parent: String },

    #[error("group not found: {0}")]
    NotFound(GroupKey),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DomainError {
    pub(crate) fn missing_parent(child: &GroupKey, parent: Option<&GroupKey>) -> Self {
        Self::MissingParent {
            child: child.clone(),
            parent: parent
                .map(|p| p.to_string())
                .unwrap_or_else(|| "<none>".to_string()),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
