//! Contact modal controller
//!
//! Pure state transitions: clicks and request completions go in, page
//! mutations happen immediately, and the asynchronous work that follows is
//! returned as [`Effect`]s for a driver to run (see [`crate::runtime`]).
//!
//! ## Request ordering
//!
//! Every request is stamped with a sequence number. A completion is applied
//! only when it belongs to the latest issued request, so the content area
//! always shows the newest fragment even when responses arrive out of order.
//! Auto-dismiss timers carry a token that opening or closing the modal
//! invalidates.

use std::time::Duration;

use crate::config::{ContactConfig, MessageConfig, SelectorConfig};
use crate::delegate::EventDelegator;
use crate::dom::{serialize_form, NodeId, Selector};
use crate::error::Result;
use crate::page::Page;
use crate::protocol::{FormFragment, SubmitOutcome};

/// Handlers the delegator dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactAction {
    /// Opener clicked: show the modal and fetch its `href`
    LoadForm,
    /// Submit control clicked: post the serialized form
    SubmitForm,
    /// Close control clicked: hide the modal
    Dismiss,
}

pub type RequestId = u64;

/// Completions fed back to the controller
#[derive(Debug)]
pub enum Message {
    FormLoaded {
        request: RequestId,
        result: Result<FormFragment>,
    },
    FormSubmitted {
        request: RequestId,
        result: Result<SubmitOutcome>,
    },
    DismissElapsed {
        token: u64,
    },
}

/// Asynchronous work requested by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchForm {
        request: RequestId,
        url: String,
    },
    PostForm {
        request: RequestId,
        url: String,
        body: String,
    },
    DismissAfter {
        token: u64,
        delay: Duration,
    },
}

/// Bind the contact handlers at the configured scope
pub fn bind_handlers(page: &Page, selectors: &SelectorConfig) -> Result<EventDelegator<ContactAction>> {
    let scope = page.find(&selectors.scope)?;
    let mut delegator = EventDelegator::new(scope);
    delegator
        .on(Selector::parse(&selectors.opener)?, ContactAction::LoadForm)
        .on(Selector::parse(&selectors.submit)?, ContactAction::SubmitForm)
        .on(Selector::parse(&selectors.dismiss)?, ContactAction::Dismiss);
    Ok(delegator)
}

/// State of the load/submit cycle
#[derive(Debug)]
pub struct ContactController {
    submit_url: String,
    form: Selector,
    dismiss_delay: Duration,
    messages: MessageConfig,
    /// Sequence number of the newest request issued
    latest_request: RequestId,
    /// Submit control disabled by the in-flight submission
    pending_submit: Option<(RequestId, NodeId)>,
    dismiss_token: u64,
}

impl ContactController {
    pub fn new(config: &ContactConfig) -> Result<Self> {
        Ok(Self {
            submit_url: config.submit_path.clone(),
            form: Selector::parse(&config.selectors.form)?,
            dismiss_delay: config.dismiss_delay(),
            messages: config.messages.clone(),
            latest_request: 0,
            pending_submit: None,
            dismiss_token: 0,
        })
    }

    /// Whether a submission is waiting for its response
    pub fn is_submitting(&self) -> bool {
        self.pending_submit.is_some()
    }

    /// Run one delegated click handler
    ///
    /// Page mutations (showing the modal, disabling the submit control)
    /// happen before this returns.
    pub fn handle_click(
        &mut self,
        page: &mut Page,
        action: ContactAction,
        current_target: NodeId,
    ) -> Vec<Effect> {
        match action {
            ContactAction::LoadForm => self.handle_load_form(page, current_target),
            ContactAction::SubmitForm => self.handle_submit_form(page, current_target),
            ContactAction::Dismiss => {
                self.handle_dismiss(page);
                Vec::new()
            }
        }
    }

    fn next_request(&mut self) -> RequestId {
        self.latest_request += 1;
        self.latest_request
    }

    fn handle_load_form(&mut self, page: &mut Page, opener: NodeId) -> Vec<Effect> {
        // Cancel any pending auto-dismiss from a previous submission
        self.dismiss_token += 1;
        page.modal.show(&mut page.document);
        let request = self.next_request();

        let href = page
            .document
            .element(opener)
            .and_then(|el| el.attr("href"))
            .map(str::to_string);
        match href {
            Some(url) => {
                log::info!("Loading contact form #{} from {}", request, url);
                vec![Effect::FetchForm { request, url }]
            }
            None => {
                log::warn!("Form opener has no href, nothing to load");
                page.modal.replace_content(&mut page.document, &self.messages.load_failed);
                Vec::new()
            }
        }
    }

    fn handle_submit_form(&mut self, page: &mut Page, submit: NodeId) -> Vec<Effect> {
        let Some(form) = page.document.query_selector(&self.form) else {
            log::warn!("Submit clicked but no form matches {}", self.form);
            page.modal.set_alert(self.messages.submit_failed.clone());
            return Vec::new();
        };

        let body = serialize_form(&page.document, form);
        page.document.set_disabled(submit, true);
        let request = self.next_request();
        self.pending_submit = Some((request, submit));

        log::info!("Submitting contact form #{} to {}", request, self.submit_url);
        vec![Effect::PostForm {
            request,
            url: self.submit_url.clone(),
            body,
        }]
    }

    fn handle_dismiss(&mut self, page: &mut Page) {
        self.dismiss_token += 1;
        page.modal.hide(&mut page.document);
    }

    /// Apply a completion
    pub fn update(&mut self, page: &mut Page, message: Message) -> Vec<Effect> {
        match message {
            Message::FormLoaded { request, result } => {
                if request != self.latest_request {
                    log::debug!("Discarding stale form load #{}", request);
                    return Vec::new();
                }
                match result {
                    Ok(fragment) => {
                        page.modal.replace_content(&mut page.document, &fragment.html_form);
                    }
                    Err(e) => {
                        log::warn!("Contact form load failed: {}", e);
                        page.modal.replace_content(&mut page.document, &self.messages.load_failed);
                    }
                }
                Vec::new()
            }
            Message::FormSubmitted { request, result } => {
                let submit = match self.pending_submit {
                    Some((pending, submit)) if pending == request => {
                        self.pending_submit = None;
                        Some(submit)
                    }
                    _ => None,
                };
                if request != self.latest_request {
                    log::debug!("Discarding stale submission #{}", request);
                    if let Some(submit) = submit {
                        page.document.set_disabled(submit, false);
                    }
                    return Vec::new();
                }
                match result {
                    Ok(SubmitOutcome::Accepted) => {
                        log::info!("Contact form accepted");
                        page.modal.replace_content(&mut page.document, &self.messages.thank_you);
                        self.dismiss_token += 1;
                        vec![Effect::DismissAfter {
                            token: self.dismiss_token,
                            delay: self.dismiss_delay,
                        }]
                    }
                    Ok(SubmitOutcome::Rejected { html_form }) => {
                        log::info!("Contact form rejected, showing errors");
                        page.modal.replace_content(&mut page.document, &html_form);
                        Vec::new()
                    }
                    Err(e) => {
                        log::warn!("Contact form submission failed: {}", e);
                        if let Some(submit) = submit {
                            page.document.set_disabled(submit, false);
                        }
                        page.modal.set_alert(self.messages.submit_failed.clone());
                        Vec::new()
                    }
                }
            }
            Message::DismissElapsed { token } => {
                if token == self.dismiss_token && page.modal.is_visible() {
                    page.modal.hide(&mut page.document);
                }
                Vec::new()
            }
        }
    }
}
