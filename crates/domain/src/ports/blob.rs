use crate::DomainResult;
use crate::ports::BoxFuture;

pub trait BlobStore: Send + Sync {
    fn upload(&self, path: &str, bytes: &[u8]) -> BoxFuture<'_, DomainResult<String>>;

    fn signed_url(&self, path: &str, expires_in_secs: u64)
    -> BoxFuture<'_, DomainResult<String>>;
}
