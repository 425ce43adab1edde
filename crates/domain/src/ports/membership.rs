use crate::DomainResult;
use crate::identity::Membership;
use crate::ports::BoxFuture;

pub trait MembershipRepository: Send + Sync {
    fn membership_for_user(&self, user_id: &str)
    -> BoxFuture<'_, DomainResult<Option<Membership>>>;

    fn list_foundation_members(
        &self,
        foundation_id: i64,
    ) -> BoxFuture<'_, DomainResult<Vec<Membership>>>;
}
