use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use rehome_domain::DomainResult;
use rehome_domain::access::AccessInfo;
use rehome_domain::dispatch::{EmailQueueEntry, Notification};
use rehome_domain::error::DomainError;
use rehome_domain::identity::Membership;
use rehome_domain::ports::BoxFuture;
use rehome_domain::ports::blob::BlobStore;
use rehome_domain::ports::membership::MembershipRepository;
use rehome_domain::ports::messages::MessageRepository;
use rehome_domain::ports::notify::{
    AdopterDirectory, EmailQueueRepository, NotificationRepository,
};
use rehome_domain::ports::requests::AdoptionRequestRepository;
use rehome_domain::requests::{
    AdopterProfile, AdoptionRequest, AdoptionRequestDetail, AnimalSnapshot, RequestDocument,
    RequestMessage, RequestStatus, SenderRole,
};
use rehome_domain::util::now_ms;

#[derive(Default)]
pub struct InMemoryAdoptionRequestRepository {
    requests: Arc<RwLock<HashMap<i64, AdoptionRequest>>>,
    profiles: Arc<RwLock<HashMap<String, AdopterProfile>>>,
    animals: Arc<RwLock<HashMap<i64, AnimalSnapshot>>>,
    documents: Arc<RwLock<Vec<RequestDocument>>>,
}

impl InMemoryAdoptionRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_request(&self, request: AdoptionRequest) {
        self.requests
            .write()
            .await
            .insert(request.request_id, request);
    }

    pub async fn upsert_profile(&self, user_id: impl Into<String>, profile: AdopterProfile) {
        self.profiles.write().await.insert(user_id.into(), profile);
    }

    pub async fn upsert_animal(&self, animal: AnimalSnapshot) {
        self.animals.write().await.insert(animal.animal_id, animal);
    }

    pub async fn documents_for(&self, request_id: i64) -> Vec<RequestDocument> {
        self.documents
            .read()
            .await
            .iter()
            .filter(|document| document.request_id == request_id)
            .cloned()
            .collect()
    }
}

impl AdoptionRequestRepository for InMemoryAdoptionRequestRepository {
    fn get(&self, request_id: i64) -> BoxFuture<'_, DomainResult<Option<AdoptionRequest>>> {
        let requests = self.requests.clone();
        Box::pin(async move { Ok(requests.read().await.get(&request_id).cloned()) })
    }

    fn get_detail(
        &self,
        request_id: i64,
    ) -> BoxFuture<'_, DomainResult<Option<AdoptionRequestDetail>>> {
        let requests = self.requests.clone();
        let profiles = self.profiles.clone();
        let animals = self.animals.clone();
        let documents = self.documents.clone();
        Box::pin(async move {
            let Some(request) = requests.read().await.get(&request_id).cloned() else {
                return Ok(None);
            };
            let adopter = profiles
                .read()
                .await
                .get(&request.adopter_user_id)
                .cloned()
                .unwrap_or_default();
            let animal = animals
                .read()
                .await
                .get(&request.animal_id)
                .cloned()
                .unwrap_or(AnimalSnapshot {
                    animal_id: request.animal_id,
                    name: "unknown".to_string(),
                    species: None,
                    photo_url: None,
                });
            let documents = documents
                .read()
                .await
                .iter()
                .filter(|document| document.request_id == request_id)
                .cloned()
                .collect();
            Ok(Some(AdoptionRequestDetail {
                request,
                adopter,
                animal,
                documents,
            }))
        })
    }

    fn access_info(&self, request_id: i64) -> BoxFuture<'_, DomainResult<Option<AccessInfo>>> {
        let requests = self.requests.clone();
        Box::pin(async move {
            Ok(requests
                .read()
                .await
                .get(&request_id)
                .map(|request| AccessInfo {
                    request_id: request.request_id,
                    foundation_id: request.foundation_id,
                    adopter_user_id: request.adopter_user_id.clone(),
                }))
        })
    }

    fn update_status_if(
        &self,
        request_id: i64,
        expected: RequestStatus,
        new_status: RequestStatus,
        rejection_reason: Option<String>,
    ) -> BoxFuture<'_, DomainResult<AdoptionRequest>> {
        let requests = self.requests.clone();
        Box::pin(async move {
            let mut requests = requests.write().await;
            let request = requests.get_mut(&request_id).ok_or(DomainError::NotFound)?;
            if request.status != expected {
                return Err(DomainError::Conflict);
            }
            request.status = new_status;
            if let Some(reason) = rejection_reason {
                request.rejection_reason = Some(reason);
            }
            request.updated_at_ms = now_ms();
            Ok(request.clone())
        })
    }

    fn append_document(
        &self,
        document: &RequestDocument,
    ) -> BoxFuture<'_, DomainResult<RequestDocument>> {
        let document = document.clone();
        let documents = self.documents.clone();
        Box::pin(async move {
            documents.write().await.push(document.clone());
            Ok(document)
        })
    }
}

#[derive(Default)]
pub struct InMemoryMembershipRepository {
    memberships: Arc<RwLock<Vec<Membership>>>,
}

impl InMemoryMembershipRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, membership: Membership) {
        self.memberships.write().await.push(membership);
    }
}

impl MembershipRepository for InMemoryMembershipRepository {
    fn membership_for_user(
        &self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Membership>>> {
        let user_id = user_id.to_string();
        let memberships = self.memberships.clone();
        Box::pin(async move {
            Ok(memberships
                .read()
                .await
                .iter()
                .find(|membership| membership.user_id == user_id)
                .cloned())
        })
    }

    fn list_foundation_members(
        &self,
        foundation_id: i64,
    ) -> BoxFuture<'_, DomainResult<Vec<Membership>>> {
        let memberships = self.memberships.clone();
        Box::pin(async move {
            Ok(memberships
                .read()
                .await
                .iter()
                .filter(|membership| membership.foundation_id == foundation_id)
                .cloned()
                .collect())
        })
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<Vec<RequestMessage>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageRepository for InMemoryMessageRepository {
    fn append(&self, message: &RequestMessage) -> BoxFuture<'_, DomainResult<RequestMessage>> {
        let message = message.clone();
        let messages = self.messages.clone();
        Box::pin(async move {
            messages.write().await.push(message.clone());
            Ok(message)
        })
    }

    fn latest_from_sender_role(
        &self,
        request_id: i64,
        sender_role: SenderRole,
    ) -> BoxFuture<'_, DomainResult<Option<RequestMessage>>> {
        let messages = self.messages.clone();
        Box::pin(async move {
            let messages = messages.read().await;
            let mut latest: Option<RequestMessage> = None;
            for message in messages.iter() {
                if message.request_id != request_id || message.sender_role != sender_role {
                    continue;
                }
                let newer = match latest.as_ref() {
                    Some(current) => message.created_at_ms >= current.created_at_ms,
                    None => true,
                };
                if newer {
                    latest = Some(message.clone());
                }
            }
            Ok(latest)
        })
    }

    fn list_thread(&self, request_id: i64) -> BoxFuture<'_, DomainResult<Vec<RequestMessage>>> {
        let messages = self.messages.clone();
        Box::pin(async move {
            let mut thread: Vec<_> = messages
                .read()
                .await
                .iter()
                .filter(|message| message.request_id == request_id)
                .cloned()
                .collect();
            thread.sort_by(|left, right| {
                left.created_at_ms
                    .cmp(&right.created_at_ms)
                    .then_with(|| left.message_id.cmp(&right.message_id))
            });
            Ok(thread)
        })
    }
}

/// Blob stand-in: objects live in a map, signed URLs only resolve for paths
/// that were actually written.
#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn upload(&self, path: &str, bytes: &[u8]) -> BoxFuture<'_, DomainResult<String>> {
        let path = path.to_string();
        let bytes = bytes.to_vec();
        let objects = self.objects.clone();
        Box::pin(async move {
            objects.write().await.insert(path.clone(), bytes);
            Ok(path)
        })
    }

    fn signed_url(
        &self,
        path: &str,
        expires_in_secs: u64,
    ) -> BoxFuture<'_, DomainResult<String>> {
        let path = path.to_string();
        let objects = self.objects.clone();
        Box::pin(async move {
            if !objects.read().await.contains_key(&path) {
                return Err(DomainError::NotFound);
            }
            Ok(format!("memory://{path}?expires_in={expires_in_secs}"))
        })
    }
}

#[derive(Default)]
pub struct InMemoryAdopterDirectory {
    emails: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryAdopterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_email(&self, user_id: impl Into<String>, email: impl Into<String>) {
        self.emails
            .write()
            .await
            .insert(user_id.into(), email.into());
    }
}

impl AdopterDirectory for InMemoryAdopterDirectory {
    fn email_for_user(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<String>>> {
        let user_id = user_id.to_string();
        let emails = self.emails.clone();
        Box::pin(async move { Ok(emails.read().await.get(&user_id).cloned()) })
    }
}

#[derive(Default)]
pub struct InMemoryEmailQueue {
    entries: Arc<RwLock<Vec<EmailQueueEntry>>>,
}

impl InMemoryEmailQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<EmailQueueEntry> {
        self.entries.read().await.clone()
    }
}

impl EmailQueueRepository for InMemoryEmailQueue {
    fn enqueue(&self, entry: &EmailQueueEntry) -> BoxFuture<'_, DomainResult<EmailQueueEntry>> {
        let entry = entry.clone();
        let entries = self.entries.clone();
        Box::pin(async move {
            entries.write().await.push(entry.clone());
            Ok(entry)
        })
    }
}

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Notification> {
        self.notifications.read().await.clone()
    }
}

impl NotificationRepository for InMemoryNotificationRepository {
    fn create(&self, notification: &Notification) -> BoxFuture<'_, DomainResult<Notification>> {
        let notification = notification.clone();
        let notifications = self.notifications.clone();
        Box::pin(async move {
            notifications.write().await.push(notification.clone());
            Ok(notification)
        })
    }

    fn list_for_user(
        &self,
        user_id: &str,
        include_read: bool,
    ) -> BoxFuture<'_, DomainResult<Vec<Notification>>> {
        let user_id = user_id.to_string();
        let notifications = self.notifications.clone();
        Box::pin(async move {
            let mut rows: Vec<_> = notifications
                .read()
                .await
                .iter()
                .filter(|notification| {
                    notification.user_id == user_id
                        && (include_read || notification.read_at_ms.is_none())
                })
                .cloned()
                .collect();
            rows.sort_by(|left, right| {
                left.created_at_ms
                    .cmp(&right.created_at_ms)
                    .then_with(|| left.notification_id.cmp(&right.notification_id))
            });
            Ok(rows)
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
        let notifications = self.notifications.clone();
        Box::pin(async move {
            let mut notifications = notifications.write().await;
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
