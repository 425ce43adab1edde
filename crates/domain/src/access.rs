use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::files::parse_storage_path;
use crate::identity::{Principal, Role};
use crate::lifecycle::ActorSide;
use crate::ports::membership::MembershipRepository;
use crate::ports::requests::AdoptionRequestRepository;
use crate::requests::AdoptionRequest;

/// Minimal projection used for authorization checks only. It stays inside
/// this module: callers receive an [`AccessGrant`], never the raw row.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AccessInfo {
    pub request_id: i64,
    pub foundation_id: i64,
    pub adopter_user_id: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AccessGrant {
    /// The principal is the adopter who owns the request.
    Adopter { user_id: String },
    /// The principal holds an owner/editor membership for the request's
    /// foundation.
    Foundation { foundation_id: i64 },
}

impl AccessGrant {
    pub fn side(&self) -> ActorSide {
        match self {
            AccessGrant::Adopter { .. } => ActorSide::Adopter,
            AccessGrant::Foundation { .. } => ActorSide::Foundation,
        }
    }
}

#[derive(Clone)]
pub struct AccessResolver {
    requests: Arc<dyn AdoptionRequestRepository>,
    memberships: Arc<dyn MembershipRepository>,
}

impl AccessResolver {
    pub fn new(
        requests: Arc<dyn AdoptionRequestRepository>,
        memberships: Arc<dyn MembershipRepository>,
    ) -> Self {
        Self {
            requests,
            memberships,
        }
    }

    /// Authorize a principal against a request before any mutation or
    /// detail read. Runs on the cheap [`AccessInfo`] projection; the full
    /// aggregate is only loaded after a grant is issued.
    pub async fn resolve(
        &self,
        principal: Option<&Principal>,
        request_id: i64,
    ) -> DomainResult<AccessGrant> {
        let principal = principal.ok_or(DomainError::Unauthenticated)?;
        let access = self
            .requests
            .access_info(request_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        match principal.role {
            Role::External => {
                if access.adopter_user_id == principal.user_id {
                    Ok(AccessGrant::Adopter {
                        user_id: principal.user_id.clone(),
                    })
                } else {
                    Err(DomainError::Forbidden(
                        "request belongs to another adopter".into(),
                    ))
                }
            }
            Role::FoundationUser | Role::Admin => {
                let membership = self
                    .memberships
                    .membership_for_user(&principal.user_id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::Forbidden("no foundation membership".into())
                    })?;
                if !membership.member_role.can_write() {
                    return Err(DomainError::Forbidden(
                        "membership role cannot act on requests".into(),
                    ));
                }
                if membership.foundation_id != access.foundation_id {
                    return Err(DomainError::Forbidden(
                        "request belongs to another foundation".into(),
                    ));
                }
                Ok(AccessGrant::Foundation {
                    foundation_id: membership.foundation_id,
                })
            }
        }
    }
}

/// A stored document path must parse back to the foundation/request pair of
/// the request it is fetched through. Keeps signed-URL reads consistent with
/// the write-path convention.
pub fn authorize_storage_path(request: &AdoptionRequest, path: &str) -> DomainResult<()> {
    let Some((foundation_id, request_id)) = parse_storage_path(path) else {
        return Err(DomainError::Forbidden(
            "document path is not recognised".into(),
        ));
    };
    if foundation_id != request.foundation_id || request_id != request.request_id {
        return Err(DomainError::Forbidden(
            "document path belongs to another request".into(),
        ));
    }
    Ok(())
}
