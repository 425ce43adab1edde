use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::DomainResult;
use crate::access::{AccessResolver, authorize_storage_path};
use crate::dispatch::{NOTIF_TYPE_STATUS, SideEffectDispatcher};
use crate::error::DomainError;
use crate::identity::Principal;
use crate::lifecycle::{self, ActorSide};
use crate::ports::blob::BlobStore;
use crate::ports::membership::MembershipRepository;
use crate::ports::requests::AdoptionRequestRepository;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InReview,
    InfoRequested,
    Preapproved,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::InfoRequested => "info_requested",
            Self::Preapproved => "preapproved",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Fully terminal statuses. `approved` is excluded: it still moves to
    /// `completed` once the handover happens.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled | Self::Completed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "in_review" => Ok(Self::InReview),
            "info_requested" => Ok(Self::InfoRequested),
            "preapproved" => Ok(Self::Preapproved),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err("unknown request status"),
        }
    }
}

/// Assigned by the foundation's triage, never changed by a transition.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestPriority {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdoptionRequest {
    pub request_id: i64,
    pub animal_id: i64,
    pub foundation_id: i64,
    pub adopter_user_id: String,
    pub status: RequestStatus,
    pub priority: RequestPriority,
    pub rejection_reason: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// Contact and housing questionnaire answers; everything stays optional until
/// the adopter fills it in.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AdopterProfile {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub housing_type: Option<String>,
    pub has_other_pets: Option<bool>,
    pub household_size: Option<i32>,
}

/// Denormalized at read time so the request stays displayable even if the
/// animal record changes later.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnimalSnapshot {
    pub animal_id: i64,
    pub name: String,
    pub species: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    IdentityDocument,
    HomePhotos,
    VaccinationCard,
    Response,
    Other,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityDocument => "identity_document",
            Self::HomePhotos => "home_photos",
            Self::VaccinationCard => "vaccination_card",
            Self::Response => "response",
            Self::Other => "other",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RequestDocument {
    pub document_id: String,
    pub request_id: i64,
    pub doc_type: DocType,
    pub storage_path: String,
    pub notes: Option<String>,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdoptionRequestDetail {
    pub request: AdoptionRequest,
    pub adopter: AdopterProfile,
    pub animal: AnimalSnapshot,
    pub documents: Vec<RequestDocument>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    Foundation,
    Adopter,
}

impl SenderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Foundation => "foundation",
            Self::Adopter => "adopter",
        }
    }
}

/// One entry of the info-request exchange thread. Append-only.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RequestMessage {
    pub message_id: String,
    pub request_id: i64,
    pub sender_user_id: String,
    pub sender_role: SenderRole,
    pub message_text: String,
    pub file_urls: Vec<String>,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct UpdateStatusInput {
    pub new_status: RequestStatus,
    pub rejection_reason: Option<String>,
}

#[derive(Clone)]
pub struct RequestService {
    access: AccessResolver,
    requests: Arc<dyn AdoptionRequestRepository>,
    memberships: Arc<dyn MembershipRepository>,
    blobs: Arc<dyn BlobStore>,
    dispatcher: SideEffectDispatcher,
}

impl RequestService {
    pub fn new(
        access: AccessResolver,
        requests: Arc<dyn AdoptionRequestRepository>,
        memberships: Arc<dyn MembershipRepository>,
        blobs: Arc<dyn BlobStore>,
        dispatcher: SideEffectDispatcher,
    ) -> Self {
        Self {
            access,
            requests,
            memberships,
            blobs,
            dispatcher,
        }
    }

    /// Guarded status change. The guard and the write are a single
    /// compare-and-swap against the stored status; a concurrent writer makes
    /// the swap fail and the caller sees the fresh status instead.
    pub async fn update_status(
        &self,
        principal: Option<&Principal>,
        request_id: i64,
        input: UpdateStatusInput,
    ) -> DomainResult<AdoptionRequest> {
        let grant = self.access.resolve(principal, request_id).await?;
        let request = self
            .requests
            .get(request_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        let side = grant.side();
        lifecycle::transition(request.status, input.new_status, side)?;
        if side == ActorSide::Adopter && input.new_status == RequestStatus::InReview {
            // Legal in the table, but only the response subflow may take it:
            // a reply needs its message and attachments.
            return Err(DomainError::Validation(
                "responding to an info request goes through the reply flow".into(),
            ));
        }
        let rejection_reason = validate_rejection_reason(input.new_status, input.rejection_reason)?;

        let updated = match self
            .requests
            .update_status_if(request_id, request.status, input.new_status, rejection_reason)
            .await
        {
            Ok(updated) => updated,
            Err(DomainError::Conflict) => {
                let current = self
                    .requests
                    .get(request_id)
                    .await?
                    .ok_or(DomainError::NotFound)?;
                return Err(DomainError::InvalidStatus {
                    current: current.status,
                });
            }
            Err(err) => return Err(err),
        };

        self.announce_status_change(principal, &updated, side).await;
        Ok(updated)
    }

    pub async fn detail(
        &self,
        principal: Option<&Principal>,
        request_id: i64,
    ) -> DomainResult<AdoptionRequestDetail> {
        self.access.resolve(principal, request_id).await?;
        self.requests
            .get_detail(request_id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    /// Signed URL for a stored document. The path is parsed back into its
    /// foundation/request ids and must match the request it is fetched
    /// through, keeping read access aligned with the upload path convention.
    pub async fn document_url(
        &self,
        principal: Option<&Principal>,
        request_id: i64,
        storage_path: &str,
        expires_in_secs: u64,
    ) -> DomainResult<String> {
        self.access.resolve(principal, request_id).await?;
        let request = self
            .requests
            .get(request_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        authorize_storage_path(&request, storage_path)?;
        self.blobs.signed_url(storage_path, expires_in_secs).await
    }

    async fn announce_status_change(
        &self,
        principal: Option<&Principal>,
        request: &AdoptionRequest,
        side: ActorSide,
    ) {
        let actor = principal.map(|principal| principal.user_id.as_str());
        let data = SideEffectDispatcher::status_payload(
            request.request_id,
            request.foundation_id,
            request.status,
        );
        match side {
            ActorSide::Foundation => {
                let body = format!(
                    "Request #{} is now {}",
                    request.request_id, request.status
                );
                self.dispatcher
                    .notify(
                        &request.adopter_user_id,
                        actor,
                        NOTIF_TYPE_STATUS,
                        "Adoption request updated",
                        Some(&body),
                        data,
                    )
                    .await;
            }
            ActorSide::Adopter => {
                let members = match self
                    .memberships
                    .list_foundation_members(request.foundation_id)
                    .await
                {
                    Ok(members) => members,
                    Err(err) => {
                        warn!(
                            request_id = request.request_id,
                            foundation_id = request.foundation_id,
                            error = %err,
                            "skipping withdrawal fan-out, member lookup failed"
                        );
                        return;
                    }
                };
                let body = format!(
                    "Request #{} was withdrawn by the adopter",
                    request.request_id
                );
                self.dispatcher
                    .notify_members(
                        &members,
                        actor,
                        NOTIF_TYPE_STATUS,
                        "Adoption request withdrawn",
                        Some(&body),
                        data,
                    )
                    .await;
            }
        }
    }
}

fn validate_rejection_reason(
    new_status: RequestStatus,
    rejection_reason: Option<String>,
) -> DomainResult<Option<String>> {
    if new_status == RequestStatus::Rejected {
        let reason = rejection_reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty())
            .ok_or_else(|| {
                DomainError::Validation("rejection_reason is required when rejecting".into())
            })?;
        return Ok(Some(reason));
    }
    if rejection_reason.is_some() {
        return Err(DomainError::Validation(
            "rejection_reason is only valid when rejecting".into(),
        ));
    }
    Ok(None)
}
