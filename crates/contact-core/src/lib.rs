//! Contact Core - headless contact-form modal
//!
//! Clicking an opener link fetches a form fragment and shows it in a modal;
//! clicking the submit control posts the serialized form and shows either a
//! thank-you message (dismissed after a delay) or the re-rendered form.
//!
//! The browser is replaced by [`dom::Document`], clicks arrive through
//! [`delegate::EventDelegator`], and [`runtime::ContactRuntime`] runs the
//! requests on tokio through an injected [`transport::FormTransport`].

pub mod config;
pub mod controller;
pub mod delegate;
pub mod dom;
pub mod error;
pub mod modal;
pub mod page;
pub mod protocol;
pub mod runtime;
pub mod transport;

pub use config::ContactConfig;
pub use error::{ContactError, Result};
pub use page::Page;
pub use runtime::{ClickOutcome, ContactRuntime};
