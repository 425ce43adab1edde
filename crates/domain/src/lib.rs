pub mod access;
pub mod dispatch;
pub mod error;
pub mod files;
pub mod identity;
pub mod info_request;
pub mod lifecycle;
pub mod ports;
pub mod requests;
pub mod util;

pub type DomainResult<T> = Result<T, error::DomainError>;
