use async_trait::async_trait;

use crate::{
    Result,
    domain::{Poll, PollId},
};

/// Durable store of polls and their options.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PollsRepository: Send + Sync {
    /// Persist the poll together with all of its options in one atomic write.
    async fn create_poll(&self, poll: &Poll) -> Result<()>;
    /// Point lookup including options in position order.
    async fn get_poll(&self, id: &PollId) -> Result<Option<Poll>>;
    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<()>;
}
