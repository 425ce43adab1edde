use crate::DomainResult;
use crate::dispatch::{EmailQueueEntry, Notification};
use crate::ports::BoxFuture;

#[allow(clippy::needless_pass_by_value)]
pub trait EmailQueueRepository: Send + Sync {
    fn enqueue(&self, entry: &EmailQueueEntry) -> BoxFuture<'_, DomainResult<EmailQueueEntry>>;
}

#[allow(clippy::needless_pass_by_value)]
pub trait NotificationRepository: Send + Sync {
    fn create(&self, notification: &Notification) -> BoxFuture<'_, DomainResult<Notification>>;

    fn list_for_user(
        &self,
        user_id: &str,
        include_read: bool,
    ) -> BoxFuture<'_, DomainResult<Vec<Notification>>>;

    fn mark_read(
        &self,
        user_id: &str,
        notification_id: &str,
        read_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<Notification>>;
}

/// Fallback contact lookup for adopters whose profile snapshot carries no
/// email yet.
pub trait AdopterDirectory: Send + Sync {
    fn email_for_user(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<String>>>;
}
