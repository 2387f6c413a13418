pub mod backup;
pub mod fetch;
pub mod paginator;
pub mod report;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{AttachmentRef, Project, WikiPageFull, WikiPageSummary};
pub use crate::domain::ports::{RedmineApi, Storage};
pub use crate::utils::error::Result;
