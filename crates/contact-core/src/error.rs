//! Contact modal error types

use thiserror::Error;

/// Errors that can occur while loading or submitting the contact form
#[derive(Error, Debug)]
pub enum ContactError {
    #[error("Request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No element matches {0}")]
    MissingElement(String),

    #[error("Invalid URL {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Background request task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, ContactError>;
