use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub mod blob;
pub mod membership;
pub mod messages;
pub mod notify;
pub mod requests;
