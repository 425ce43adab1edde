use std::sync::Arc;

use tracing::warn;

use crate::DomainResult;
use crate::access::{AccessGrant, AccessResolver};
use crate::dispatch::{
    EMAIL_TEMPLATE_INFO_REQUEST, NOTIF_TYPE_INFO_REQUEST, NOTIF_TYPE_INFO_RESPONSE,
    SideEffectDispatcher,
};
use crate::error::DomainError;
use crate::files::{FileGate, UploadFile, storage_path};
use crate::identity::Principal;
use crate::lifecycle::{self, ActorSide};
use crate::ports::blob::BlobStore;
use crate::ports::membership::MembershipRepository;
use crate::ports::messages::MessageRepository;
use crate::ports::notify::AdopterDirectory;
use crate::ports::requests::AdoptionRequestRepository;
use crate::requests::{
    AdoptionRequest, DocType, RequestDocument, RequestMessage, RequestStatus, SenderRole,
};
use crate::util::{format_ms_rfc3339, now_ms, uuid_v7_without_dashes};

const MAX_SUBJECT_LENGTH: usize = 200;
const MAX_MESSAGE_LENGTH: usize = 4_000;

#[derive(Clone, Debug)]
pub struct RequestInfoInput {
    pub subject: String,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct RespondInput {
    pub message_text: String,
    pub files: Vec<UploadFile>,
}

#[derive(Clone, Debug)]
pub struct RespondOutcome {
    pub request: AdoptionRequest,
    pub message: RequestMessage,
}

/// The bounded two-party exchange: the foundation asks for more information,
/// the adopter answers once with text and optional documents, and the request
/// lands back in review.
#[derive(Clone)]
pub struct InfoRequestService {
    access: AccessResolver,
    requests: Arc<dyn AdoptionRequestRepository>,
    messages: Arc<dyn MessageRepository>,
    memberships: Arc<dyn MembershipRepository>,
    blobs: Arc<dyn BlobStore>,
    directory: Arc<dyn AdopterDirectory>,
    dispatcher: SideEffectDispatcher,
    gate: FileGate,
}

impl InfoRequestService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        access: AccessResolver,
        requests: Arc<dyn AdoptionRequestRepository>,
        messages: Arc<dyn MessageRepository>,
        memberships: Arc<dyn MembershipRepository>,
        blobs: Arc<dyn BlobStore>,
        directory: Arc<dyn AdopterDirectory>,
        dispatcher: SideEffectDispatcher,
        gate: FileGate,
    ) -> Self {
        Self {
            access,
            requests,
            messages,
            memberships,
            blobs,
            directory,
            dispatcher,
            gate,
        }
    }

    /// Foundation asks the adopter for more information. The status write is
    /// the commit point; the email and in-app notification follow it. If
    /// neither channel reaches the adopter the status is put back, so a
    /// request never sits in `info_requested` unannounced.
    pub async fn request_info(
        &self,
        principal: Option<&Principal>,
        request_id: i64,
        input: RequestInfoInput,
    ) -> DomainResult<AdoptionRequest> {
        let Some(principal) = principal else {
            return Err(DomainError::Unauthenticated);
        };
        let input = validate_request_info(input)?;
        let grant = self.access.resolve(Some(principal), request_id).await?;
        require_foundation(&grant)?;

        let detail = self
            .requests
            .get_detail(request_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        let adopter_email = match normalized(detail.adopter.email.clone()) {
            Some(email) => email,
            None => normalized(
                self.directory
                    .email_for_user(&detail.request.adopter_user_id)
                    .await?,
            )
            .ok_or(DomainError::AdopterEmailNotFound)?,
        };

        let previous = detail.request.status;
        lifecycle::transition(previous, RequestStatus::InfoRequested, ActorSide::Foundation)?;

        // The prompt the adopter will answer; persisted before the status
        // flips so the exchange is never empty while it awaits a response.
        let prompt = RequestMessage {
            message_id: uuid_v7_without_dashes(),
            request_id,
            sender_user_id: principal.user_id.clone(),
            sender_role: SenderRole::Foundation,
            message_text: input.message.clone(),
            file_urls: vec![],
            created_at_ms: now_ms(),
        };
        self.messages.append(&prompt).await?;

        let updated = self
            .cas_status(request_id, previous, RequestStatus::InfoRequested)
            .await?;

        let payload = serde_json::json!({
            "subject": input.subject,
            "message": input.message,
            "animal_id": detail.animal.animal_id,
            "animal_name": detail.animal.name,
            "foundation_id": updated.foundation_id,
            "adopter_user_id": updated.adopter_user_id,
            "request_id": request_id,
            "requested_at": format_ms_rfc3339(now_ms()),
        });
        let emailed = self
            .dispatcher
            .queue_email(
                Some(&updated.adopter_user_id),
                &adopter_email,
                EMAIL_TEMPLATE_INFO_REQUEST,
                payload,
            )
            .await;

        let mut data = SideEffectDispatcher::status_payload(
            request_id,
            updated.foundation_id,
            updated.status,
        );
        data["subject"] = serde_json::Value::String(input.subject.clone());
        let notified = self
            .dispatcher
            .notify(
                &updated.adopter_user_id,
                Some(&principal.user_id),
                NOTIF_TYPE_INFO_REQUEST,
                "More information requested",
                Some(&input.subject),
                data,
            )
            .await;

        if !emailed && !notified {
            // The adopter heard nothing; put the request back where it was.
            if let Err(err) = self
                .requests
                .update_status_if(request_id, RequestStatus::InfoRequested, previous, None)
                .await
            {
                warn!(request_id, error = %err, "failed to revert unannounced info request");
            }
            return Err(DomainError::SideEffect(
                "adopter could not be notified of the info request".into(),
            ));
        }

        Ok(updated)
    }

    /// Adopter answers the pending info request. Files pass the gate before
    /// any upload; the message row and document rows are written before the
    /// status swaps back to `in_review`. A concurrent responder loses the
    /// swap and sees the fresh status.
    pub async fn respond(
        &self,
        principal: Option<&Principal>,
        request_id: i64,
        input: RespondInput,
    ) -> DomainResult<RespondOutcome> {
        let Some(principal) = principal else {
            return Err(DomainError::Unauthenticated);
        };
        let grant = self.access.resolve(Some(principal), request_id).await?;
        require_adopter(&grant)?;

        let request = self
            .requests
            .get(request_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if request.status != RequestStatus::InfoRequested {
            return Err(DomainError::InvalidStatus {
                current: request.status,
            });
        }

        let message_text = input.message_text.trim().to_string();
        if message_text.is_empty() {
            return Err(DomainError::MessageRequired);
        }

        self.gate.validate_all(&input.files)?;

        let mut file_urls = Vec::with_capacity(input.files.len());
        for file in &input.files {
            let path = storage_path(
                request.foundation_id,
                request_id,
                DocType::Response,
                now_ms(),
                &file.file_name,
            );
            let stored = self.blobs.upload(&path, &file.bytes).await?;
            let document = RequestDocument {
                document_id: uuid_v7_without_dashes(),
                request_id,
                doc_type: DocType::Response,
                storage_path: stored.clone(),
                notes: None,
                created_at_ms: now_ms(),
            };
            self.requests.append_document(&document).await?;
            file_urls.push(stored);
        }

        let message = RequestMessage {
            message_id: uuid_v7_without_dashes(),
            request_id,
            sender_user_id: principal.user_id.clone(),
            sender_role: SenderRole::Adopter,
            message_text,
            file_urls,
            created_at_ms: now_ms(),
        };
        let message = self.messages.append(&message).await?;

        let updated = self
            .cas_status(request_id, RequestStatus::InfoRequested, RequestStatus::InReview)
            .await?;

        match self
            .memberships
            .list_foundation_members(updated.foundation_id)
            .await
        {
            Ok(members) => {
                let data = SideEffectDispatcher::status_payload(
                    request_id,
                    updated.foundation_id,
                    updated.status,
                );
                let body = format!("Request #{request_id} has a new response");
                self.dispatcher
                    .notify_members(
                        &members,
                        Some(&principal.user_id),
                        NOTIF_TYPE_INFO_RESPONSE,
                        "Adopter responded",
                        Some(&body),
                        data,
                    )
                    .await;
            }
            Err(err) => {
                warn!(
                    request_id,
                    foundation_id = updated.foundation_id,
                    error = %err,
                    "skipping response fan-out, member lookup failed"
                );
            }
        }

        Ok(RespondOutcome {
            request: updated,
            message,
        })
    }

    /// The prompt the adopter is being shown. Only available while the
    /// request actually awaits a response; anything else would surface a
    /// stale prompt.
    pub async fn current_prompt(
        &self,
        principal: Option<&Principal>,
        request_id: i64,
    ) -> DomainResult<RequestMessage> {
        self.access.resolve(principal, request_id).await?;
        let request = self
            .requests
            .get(request_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if request.status != RequestStatus::InfoRequested {
            return Err(DomainError::InvalidStatus {
                current: request.status,
            });
        }
        self.messages
            .latest_from_sender_role(request_id, SenderRole::Foundation)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn thread(
        &self,
        principal: Option<&Principal>,
        request_id: i64,
    ) -> DomainResult<Vec<RequestMessage>> {
        self.access.resolve(principal, request_id).await?;
        self.messages.list_thread(request_id).await
    }

    async fn cas_status(
        &self,
        request_id: i64,
        expected: RequestStatus,
        new_status: RequestStatus,
    ) -> DomainResult<AdoptionRequest> {
        match self
            .requests
            .update_status_if(request_id, expected, new_status, None)
            .await
        {
            Ok(updated) => Ok(updated),
            Err(DomainError::Conflict) => {
                let current = self
                    .requests
                    .get(request_id)
                    .await?
                    .ok_or(DomainError::NotFound)?;
                Err(DomainError::InvalidStatus {
                    current: current.status,
                })
            }
            Err(err) => Err(err),
        }
    }
}

fn require_foundation(grant: &AccessGrant) -> DomainResult<()> {
    if grant.side() != ActorSide::Foundation {
        return Err(DomainError::Forbidden(
            "only foundation staff can request information".into(),
        ));
    }
    Ok(())
}

fn require_adopter(grant: &AccessGrant) -> DomainResult<()> {
    if grant.side() != ActorSide::Adopter {
        return Err(DomainError::Forbidden(
            "only the adopter can respond to an info request".into(),
        ));
    }
    Ok(())
}

fn normalized(value: Option<String>) -> Option<String> {
    let value = value?.trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

fn validate_request_info(mut input: RequestInfoInput) -> DomainResult<RequestInfoInput> {
    input.subject = input.subject.trim().to_string();
    input.message = input.message.trim().to_string();
    if input.subject.is_empty() {
        return Err(DomainError::Validation("subject is required".into()));
    }
    if input.subject.chars().count() > MAX_SUBJECT_LENGTH {
        return Err(DomainError::Validation(format!(
            "subject exceeds max length of {MAX_SUBJECT_LENGTH}"
        )));
    }
    if input.message.is_empty() {
        return Err(DomainError::Validation("message is required".into()));
    }
    if input.message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(DomainError::Validation(format!(
            "message exceeds max length of {MAX_MESSAGE_LENGTH}"
        )));
    }
    Ok(input)
}
