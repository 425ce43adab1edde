use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::identity::Membership;
use crate::ports::notify::{EmailQueueRepository, NotificationRepository};
use crate::requests::RequestStatus;
use crate::util::{now_ms, uuid_v7_without_dashes};

pub const NOTIF_TYPE_INFO_REQUEST: &str = "adoption_info_request";
pub const NOTIF_TYPE_INFO_RESPONSE: &str = "adoption_info_response";
pub const NOTIF_TYPE_STATUS: &str = "adoption_status";

pub const EMAIL_TEMPLATE_INFO_REQUEST: &str = "adoption_info_request";

/// Durable queue row picked up by the external delivery worker. Delivery
/// status, attempts and timestamps default on the store side.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmailQueueEntry {
    pub entry_id: String,
    pub user_id: Option<String>,
    pub to_email: String,
    pub template: String,
    pub payload: serde_json::Value,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub notification_id: String,
    pub user_id: String,
    pub actor_user_id: Option<String>,
    pub title: String,
    pub body: Option<String>,
    pub notification_type: String,
    pub data: serde_json::Value,
    pub read_at_ms: Option<i64>,
    pub created_at_ms: i64,
}

/// Announce phase of every transition. Both channels are best-effort: a
/// failure is logged and swallowed so it can never unwind a status change
/// that already committed. Callers that must know whether anyone was reached
/// check the returned booleans.
#[derive(Clone)]
pub struct SideEffectDispatcher {
    emails: Arc<dyn EmailQueueRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

impl SideEffectDispatcher {
    pub fn new(
        emails: Arc<dyn EmailQueueRepository>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            emails,
            notifications,
        }
    }

    /// Deep-link payload every notification carries: enough ids for the
    /// recipient UI to land back on the request.
    pub fn status_payload(
        request_id: i64,
        foundation_id: i64,
        status: RequestStatus,
    ) -> serde_json::Value {
        serde_json::json!({
            "request_id": request_id,
            "foundation_id": foundation_id,
            "status": status.as_str(),
        })
    }

    pub async fn queue_email(
        &self,
        user_id: Option<&str>,
        to_email: &str,
        template: &str,
        payload: serde_json::Value,
    ) -> bool {
        let entry = EmailQueueEntry {
            entry_id: uuid_v7_without_dashes(),
            user_id: user_id.map(str::to_string),
            to_email: to_email.to_string(),
            template: template.to_string(),
            payload,
            created_at_ms: now_ms(),
        };
        match self.emails.enqueue(&entry).await {
            Ok(_) => true,
            Err(err) => {
                warn!(template, to_email, error = %err, "email enqueue failed");
                false
            }
        }
    }

    pub async fn notify(
        &self,
        recipient_id: &str,
        actor_user_id: Option<&str>,
        notification_type: &str,
        title: &str,
        body: Option<&str>,
        data: serde_json::Value,
    ) -> bool {
        let notification = Notification {
            notification_id: uuid_v7_without_dashes(),
            user_id: recipient_id.to_string(),
            actor_user_id: actor_user_id.map(str::to_string),
            title: title.to_string(),
            body: body.map(str::to_string),
            notification_type: notification_type.to_string(),
            data,
            read_at_ms: None,
            created_at_ms: now_ms(),
        };
        match self.notifications.create(&notification).await {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    recipient_id,
                    notification_type,
                    error = %err,
                    "notification insert failed"
                );
                false
            }
        }
    }

    /// One insert per member; each is independent, so one failure does not
    /// stop the rest. Returns how many recipients were reached.
    pub async fn notify_members(
        &self,
        members: &[Membership],
        actor_user_id: Option<&str>,
        notification_type: &str,
        title: &str,
        body: Option<&str>,
        data: serde_json::Value,
    ) -> usize {
        let mut delivered = 0;
        for member in members {
            if self
                .notify(
                    &member.user_id,
                    actor_user_id,
                    notification_type,
                    title,
                    body,
                    data.clone(),
                )
                .await
            {
                delivered += 1;
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DomainResult;
    use crate::error::DomainError;
    use crate::identity::MemberRole;
    use crate::ports::BoxFuture;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct RecordingEmailQueue {
        entries: RwLock<Vec<EmailQueueEntry>>,
        fail: bool,
    }

    impl EmailQueueRepository for RecordingEmailQueue {
        fn enqueue(&self, entry: &EmailQueueEntry) -> BoxFuture<'_, DomainResult<EmailQueueEntry>> {
            let entry = entry.clone();
            Box::pin(async move {
                if self.fail {
                    return Err(DomainError::Validation("queue offline".into()));
                }
                self.entries.write().await.push(entry.clone());
                Ok(entry)
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifications {
        notifications: RwLock<Vec<Notification>>,
        fail_for: Option<String>,
    }

    impl NotificationRepository for RecordingNotifications {
        fn create(&self, notification: &Notification) -> BoxFuture<'_, DomainResult<Notification>> {
            let notification = notification.clone();
            Box::pin(async move {
                if self.fail_for.as_deref() == Some(notification.user_id.as_str()) {
                    return Err(DomainError::Validation("store offline".into()));
                }
                self.notifications.write().await.push(notification.clone());
                Ok(notification)
            })
        }

        fn list_for_user(
            &self,
            user_id: &str,
            include_read: bool,
        ) -> BoxFuture<'_, DomainResult<Vec<Notification>>> {
            let user_id = user_id.to_string();
            Box::pin(async move {
                Ok(self
                    .notifications
                    .read()
                    .await
                    .iter()
                    .filter(|notification| {
                        notification.user_id == user_id
                            && (include_read || notification.read_at_ms.is_none())
                    })
                    .cloned()
                    .collect())
            })
        }

        fn mark_read(
            &self,
            user_id: &str,
            notification_id: &str,
            read_at_ms: i64,
        ) -> BoxFuture<'_, DomainResult<Notification>> {
            let user_id = user_id.to_string();
            let notification_id = notification_id.to_string();
            Box::pin(async move {
                let mut notifications = self.notifications.write().await;
                let notification = notifications
                    .iter_mut()
                    .find(|notification| {
                        notification.notification_id == notification_id
                            && notification.user_id == user_id
                    })
                    .ok_or(DomainError::NotFound)?;
                notification.read_at_ms = Some(read_at_ms);
                Ok(notification.clone())
            })
        }
    }

    fn member(user_id: &str) -> Membership {
        Membership {
            user_id: user_id.to_string(),
            foundation_id: 7,
            member_role: MemberRole::Editor,
        }
    }

    #[tokio::test]
    async fn email_failure_is_swallowed() {
        let emails = Arc::new(RecordingEmailQueue {
            fail: true,
            ..Default::default()
        });
        let notifications = Arc::new(RecordingNotifications::default());
        let dispatcher = SideEffectDispatcher::new(emails.clone(), notifications);

        let queued = dispatcher
            .queue_email(
                Some("adopter-1"),
                "adopter@example.test",
                EMAIL_TEMPLATE_INFO_REQUEST,
                serde_json::json!({"subject": "x"}),
            )
            .await;
        assert!(!queued);
        assert!(emails.entries.read().await.is_empty());
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_stop_the_fan_out() {
        let emails = Arc::new(RecordingEmailQueue::default());
        let notifications = Arc::new(RecordingNotifications {
            fail_for: Some("staff-2".to_string()),
            ..Default::default()
        });
        let dispatcher = SideEffectDispatcher::new(emails, notifications.clone());

        let delivered = dispatcher
            .notify_members(
                &[member("staff-1"), member("staff-2"), member("staff-3")],
                Some("adopter-1"),
                NOTIF_TYPE_INFO_RESPONSE,
                "Adopter responded",
                None,
                SideEffectDispatcher::status_payload(1, 7, RequestStatus::InReview),
            )
            .await;

        assert_eq!(delivered, 2);
        let stored = notifications.notifications.read().await;
        let recipients: Vec<_> = stored
            .iter()
            .map(|notification| notification.user_id.as_str())
            .collect();
        assert_eq!(recipients, vec!["staff-1", "staff-3"]);
    }

    #[tokio::test]
    async fn status_payload_carries_deep_link_ids() {
        let payload = SideEffectDispatcher::status_payload(1, 7, RequestStatus::InReview);
        assert_eq!(payload["request_id"], 1);
        assert_eq!(payload["foundation_id"], 7);
        assert_eq!(payload["status"], "in_review");
    }
}
