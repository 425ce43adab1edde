use crate::DomainResult;
use crate::access::AccessInfo;
use crate::ports::BoxFuture;
use crate::requests::{AdoptionRequest, AdoptionRequestDetail, RequestDocument, RequestStatus};

#[allow(clippy::needless_pass_by_value)]
pub trait AdoptionRequestRepository: Send + Sync {
    fn get(&self, request_id: i64) -> BoxFuture<'_, DomainResult<Option<AdoptionRequest>>>;

    fn get_detail(
        &self,
        request_id: i64,
    ) -> BoxFuture<'_, DomainResult<Option<AdoptionRequestDetail>>>;

    fn access_info(&self, request_id: i64) -> BoxFuture<'_, DomainResult<Option<AccessInfo>>>;

    /// Compare-and-swap status write: succeeds only while the stored status
    /// still equals `expected`, otherwise fails with `Conflict`. The guard
    /// check and the write are one atomic step on the store side.
    fn update_status_if(
        &self,
        request_id: i64,
        expected: RequestStatus,
        new_status: RequestStatus,
        rejection_reason: Option<String>,
    ) -> BoxFuture<'_, DomainResult<AdoptionRequest>>;

    fn append_document(
        &self,
        document: &RequestDocument,
    ) -> BoxFuture<'_, DomainResult<RequestDocument>>;
}
