use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::requests::RequestStatus;

/// Which side of the adoption exchange an authorized actor is acting for.
/// Foundation covers owner/editor staff of the request's foundation; Adopter
/// is the single external user who submitted the request.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActorSide {
    Foundation,
    Adopter,
}

impl ActorSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorSide::Foundation => "foundation",
            ActorSide::Adopter => "adopter",
        }
    }
}

/// The single transition table for adoption requests. Use cases never make a
/// status reachable that this table does not list for their actor side.
pub fn allowed_targets(from: RequestStatus, side: ActorSide) -> &'static [RequestStatus] {
    use crate::requests::RequestStatus::*;

    match (from, side) {
        (Pending, ActorSide::Foundation) => {
            &[InReview, InfoRequested, Preapproved, Approved, Rejected]
        }
        (InReview, ActorSide::Foundation) => &[InfoRequested, Preapproved, Approved, Rejected],
        // A stalled info request can still be rejected; approval requires the
        // adopter's response to land the request back in review first.
        (InfoRequested, ActorSide::Foundation) => &[Rejected],
        (Preapproved, ActorSide::Foundation) => &[InfoRequested, Approved, Rejected],
        (Approved, ActorSide::Foundation) => &[Completed],
        (InfoRequested, ActorSide::Adopter) => &[InReview, Cancelled],
        (Pending | InReview | Preapproved, ActorSide::Adopter) => &[Cancelled],
        (Approved, ActorSide::Adopter) => &[],
        (Rejected | Cancelled | Completed, _) => &[],
    }
}

pub fn transition(
    current: RequestStatus,
    requested: RequestStatus,
    side: ActorSide,
) -> DomainResult<RequestStatus> {
    if current.is_terminal() {
        return Err(DomainError::IllegalState { current });
    }
    if allowed_targets(current, side).contains(&requested) {
        Ok(requested)
    } else {
        Err(DomainError::InvalidTransition {
            from: current,
            to: requested,
        })
    }
}
