use std::fmt;

use crate::page_id::PageId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    LockPoisoned(&'static str),
    /// A page was queried before being assigned to any dictionary group.
    UnassignedPage(PageId),
    /// A page's index entry points at a group that does not exist.
    MissingGroup { page: PageId, group_id: String },
    /// The external encoder reported a failure for this page.
    Encode { page: PageId, message: String },
    /// The external encoder was interrupted before completion.
    Interrupted(PageId),
    /// Persisted project data could not be decoded.
    Malformed(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::LockPoisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
            StoreError::UnassignedPage(page) => {
                write!(f, "page {} has no dictionary group assigned", page)
            }
            StoreError::MissingGroup { page, group_id } => write!(
                f,
                "page {} is indexed under group {} which does not exist",
                page, group_id
            ),
            StoreError::Encode { page, message } => {
                write!(f, "encoding page {} failed: {}", page, message)
            }
            StoreError::Interrupted(page) => {
                write!(f, "encoding page {} was interrupted", page)
            }
            StoreError::Malformed(message) => write!(f, "malformed project data: {}", message),
        }
    }
}

impl std::error::Error for StoreError {}
