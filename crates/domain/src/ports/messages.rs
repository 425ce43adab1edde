use crate::DomainResult;
use crate::ports::BoxFuture;
use crate::requests::{RequestMessage, SenderRole};

#[allow(clippy::needless_pass_by_value)]
pub trait MessageRepository: Send + Sync {
    fn append(&self, message: &RequestMessage) -> BoxFuture<'_, DomainResult<RequestMessage>>;

    fn latest_from_sender_role(
        &self,
        request_id: i64,
        sender_role: SenderRole,
    ) -> BoxFuture<'_, DomainResult<Option<RequestMessage>>>;

    /// Full exchange for a request, ordered by creation time.
    fn list_thread(&self, request_id: i64) -> BoxFuture<'_, DomainResult<Vec<RequestMessage>>>;
}
