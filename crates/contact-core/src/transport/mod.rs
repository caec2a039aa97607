//! Request transport
//!
//! The controller never talks to the network itself; the runtime hands its
//! effects to a [`FormTransport`]. `UreqTransport` is the production
//! implementation, tests substitute scripted ones.

mod http;

pub use http::UreqTransport;

use async_trait::async_trait;

use crate::error::Result;

/// Performs the two contact requests and returns the raw response body
#[async_trait]
pub trait FormTransport: Send + Sync {
    /// GET `url` expecting JSON
    async fn get(&self, url: &str) -> Result<String>;

    /// POST a URL-encoded `body` to `url` expecting JSON
    async fn post_form(&self, url: &str, body: String) -> Result<String>;
}
