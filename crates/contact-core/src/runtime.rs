//! Async driver for the contact controller
//!
//! Owns the page, the delegated bindings and the controller. Clicks are
//! handled synchronously; the effects they produce run as tokio tasks whose
//! completions are applied one at a time by [`ContactRuntime::step`]. All
//! page mutation therefore happens on the caller's task. A task that dies
//! before producing its completion is reported to the controller as a failed
//! request, so a crashed submission still releases its control.
//!
//! ```text
//!  click ──▶ EventDelegator ──▶ ContactController ──▶ Effect
//!                                      ▲                 │
//!                                      │            JoinSet task
//!                                   Message ◀── transport / timer
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::{Id, JoinSet};

use crate::config::ContactConfig;
use crate::controller::{
    bind_handlers, ContactAction, ContactController, Effect, Message, RequestId,
};
use crate::delegate::EventDelegator;
use crate::dom::NodeId;
use crate::error::{ContactError, Result};
use crate::page::Page;
use crate::protocol::{decode_fragment, decode_submit};
use crate::transport::FormTransport;

/// Result of delivering a click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOutcome {
    /// The element's default action (navigation, form submission) was suppressed
    pub default_prevented: bool,
    /// Number of delegated handlers that ran
    pub handled: usize,
}

/// What an outstanding task will complete
#[derive(Debug, Clone, Copy)]
enum Pending {
    Load(RequestId),
    Submit(RequestId),
    Dismiss,
}

impl Pending {
    /// Completion standing in for a task that never produced one
    fn failed(self, error: ContactError) -> Option<Message> {
        match self {
            Pending::Load(request) => Some(Message::FormLoaded {
                request,
                result: Err(error),
            }),
            Pending::Submit(request) => Some(Message::FormSubmitted {
                request,
                result: Err(error),
            }),
            Pending::Dismiss => None,
        }
    }
}

pub struct ContactRuntime {
    page: Page,
    delegator: EventDelegator<ContactAction>,
    controller: ContactController,
    transport: Arc<dyn FormTransport>,
    tasks: JoinSet<Message>,
    pending: HashMap<Id, Pending>,
}

impl ContactRuntime {
    pub fn new(page: Page, config: &ContactConfig, transport: Arc<dyn FormTransport>) -> Result<Self> {
        let delegator = bind_handlers(&page, &config.selectors)?;
        let controller = ContactController::new(config)?;
        Ok(Self {
            page,
            delegator,
            controller,
            transport,
            tasks: JoinSet::new(),
            pending: HashMap::new(),
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Mutable page access for the host (typing into fields, etc.)
    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    /// No request or timer is outstanding
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Deliver a click on `target`
    ///
    /// Must be called from within a tokio runtime: resulting requests are
    /// spawned before this returns.
    pub fn click(&mut self, target: NodeId) -> ClickOutcome {
        let matched = self.delegator.dispatch_click(&self.page.document, target);
        for delegated in &matched {
            let effects =
                self.controller
                    .handle_click(&mut self.page, delegated.action, delegated.current_target);
            self.spawn_all(effects);
        }
        ClickOutcome {
            default_prevented: !matched.is_empty(),
            handled: matched.len(),
        }
    }

    /// Wait for the next completion and apply it
    ///
    /// Returns false when nothing is outstanding.
    pub async fn step(&mut self) -> bool {
        let message = match self.tasks.join_next_with_id().await {
            None => return false,
            Some(Ok((id, message))) => {
                self.pending.remove(&id);
                message
            }
            Some(Err(e)) => {
                log::error!("Contact task failed: {}", e);
                let failed = self
                    .pending
                    .remove(&e.id())
                    .and_then(|pending| pending.failed(ContactError::Task(e.to_string())));
                match failed {
                    Some(message) => message,
                    None => return true,
                }
            }
        };
        let effects = self.controller.update(&mut self.page, message);
        self.spawn_all(effects);
        true
    }

    /// Apply completions until no request or timer is outstanding
    pub async fn run_until_idle(&mut self) {
        while self.step().await {}
    }

    fn spawn_all(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.spawn(effect);
        }
    }

    fn spawn(&mut self, effect: Effect) {
        let transport = Arc::clone(&self.transport);
        match effect {
            Effect::FetchForm { request, url } => {
                let handle = self.tasks.spawn(async move {
                    let result = transport.get(&url).await.and_then(|body| decode_fragment(&body));
                    Message::FormLoaded { request, result }
                });
                self.pending.insert(handle.id(), Pending::Load(request));
            }
            Effect::PostForm { request, url, body } => {
                let handle = self.tasks.spawn(async move {
                    let result = transport
                        .post_form(&url, body)
                        .await
                        .and_then(|body| decode_submit(&body));
                    Message::FormSubmitted { request, result }
                });
                self.pending.insert(handle.id(), Pending::Submit(request));
            }
            Effect::DismissAfter { token, delay } => {
                let handle = self.tasks.spawn(async move {
                    tokio::time::sleep(delay).await;
                    Message::DismissElapsed { token }
                });
                self.pending.insert(handle.id(), Pending::Dismiss);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Debug, Clone)]
    enum Reply {
        Body(&'static str),
        Delayed(Duration, &'static str),
        Status(u16),
        Offline,
        Crash,
    }

    /// Transport answering from a script and recording every request
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<HashMap<String, Vec<Reply>>>,
        requests: Mutex<Vec<(String, Option<String>)>>,
    }

    impl ScriptedTransport {
        fn reply(self, url: &str, reply: Reply) -> Self {
            self.replies
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push(reply);
            self
        }

        fn requests(&self) -> Vec<(String, Option<String>)> {
            self.requests.lock().unwrap().clone()
        }

        async fn answer(&self, url: &str, body: Option<String>) -> crate::error::Result<String> {
            self.requests.lock().unwrap().push((url.to_string(), body));
            let reply = {
                let mut replies = self.replies.lock().unwrap();
                let queue = replies.get_mut(url).filter(|q| !q.is_empty());
                queue.map(|q| q.remove(0))
            };
            match reply {
                Some(Reply::Body(body)) => Ok(body.to_string()),
                Some(Reply::Delayed(delay, body)) => {
                    tokio::time::sleep(delay).await;
                    Ok(body.to_string())
                }
                Some(Reply::Status(status)) => Err(ContactError::Status { url: url.to_string(), status }),
                Some(Reply::Crash) => panic!("transport crashed"),
                Some(Reply::Offline) | None => Err(ContactError::Network {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    #[async_trait]
    impl FormTransport for ScriptedTransport {
        async fn get(&self, url: &str) -> crate::error::Result<String> {
            self.answer(url, None).await
        }

        async fn post_form(&self, url: &str, body: String) -> crate::error::Result<String> {
            self.answer(url, Some(body)).await
        }
    }

    const PAGE: &str = r#"<body>
        <a class="js-load-form btn" id="open" href="/forms/contact/">Contact us</a>
        <a class="js-load-form" id="open-footer" href="/forms/contact/?from=footer">Write to us</a>
        <div id="contactModal" class="modal fade" aria-hidden="true">
          <div class="modal-dialog"><div class="modal-content"></div></div>
        </div>
    </body>"#;

    const FORM_JSON: &str = r#"{"html_form": "<form id=\"contact-form\"><input name=\"name\"><input name=\"email\"><textarea name=\"message\"></textarea><button type=\"submit\" id=\"submit-btn\">Send</button></form>"}"#;

    fn runtime(transport: ScriptedTransport) -> (ContactRuntime, Arc<ScriptedTransport>) {
        let config = ContactConfig::default();
        let page = Page::parse(PAGE, &config.selectors).unwrap();
        let transport = Arc::new(transport);
        let runtime = ContactRuntime::new(page, &config, transport.clone()).unwrap();
        (runtime, transport)
    }

    fn click(runtime: &mut ContactRuntime, selector: &str) -> ClickOutcome {
        let target = runtime.page().find(selector).unwrap();
        runtime.click(target)
    }

    async fn open_form(runtime: &mut ContactRuntime) {
        click(runtime, "#open");
        runtime.run_until_idle().await;
        let page = runtime.page_mut();
        page.fill("name", "Ada");
        page.fill("email", "ada@example.com");
        page.fill("message", "Hello there");
    }

    #[tokio::test(start_paused = true)]
    async fn test_opener_scenario() {
        let transport = ScriptedTransport::default().reply(
            "/forms/contact/",
            Reply::Delayed(
                Duration::from_millis(300),
                r#"{"html_form": "<form id=\"contact-form\">...</form>"}"#,
            ),
        );
        let (mut runtime, transport) = runtime(transport);

        let outcome = click(&mut runtime, "#open");

        assert!(outcome.default_prevented);
        assert!(runtime.page().modal.is_visible());
        assert_eq!(runtime.page().modal.content_markup(), "");

        assert!(runtime.step().await);
        assert!(runtime.page().modal.is_visible());
        assert_eq!(
            runtime.page().modal.content_markup(),
            "<form id=\"contact-form\">...</form>"
        );
        assert_eq!(transport.requests(), vec![("/forms/contact/".to_string(), None)]);
        assert!(runtime.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_submission_hides_after_delay() {
        let transport = ScriptedTransport::default()
            .reply("/forms/contact/", Reply::Body(FORM_JSON))
            .reply("/blog/contact_us/", Reply::Body(r#"{"form_is_valid": true}"#));
        let (mut runtime, transport) = runtime(transport);
        open_form(&mut runtime).await;

        let outcome = click(&mut runtime, "#submit-btn");
        assert!(outcome.default_prevented);
        let button = runtime.page().find("#submit-btn").unwrap();
        assert!(runtime.page().document.is_disabled(button));

        assert!(runtime.step().await);
        assert_eq!(
            runtime.page().modal.content_markup(),
            "<p>Thank you for your message!</p>"
        );
        assert!(runtime.page().modal.is_visible());

        let shown_at = Instant::now();
        assert!(runtime.step().await);
        assert_eq!(shown_at.elapsed(), Duration::from_millis(2000));
        assert!(!runtime.page().modal.is_visible());

        let (_, body) = transport.requests().pop().unwrap();
        assert_eq!(body.as_deref(), Some("name=Ada&email=ada%40example.com&message=Hello+there"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_modal_still_visible_just_before_delay() {
        let transport = ScriptedTransport::default()
            .reply("/forms/contact/", Reply::Body(FORM_JSON))
            .reply("/blog/contact_us/", Reply::Body(r#"{"form_is_valid": true}"#));
        let (mut runtime, _) = runtime(transport);
        open_form(&mut runtime).await;
        click(&mut runtime, "#submit-btn");
        runtime.step().await;

        let early = tokio::time::timeout(Duration::from_millis(1999), runtime.step()).await;
        assert!(early.is_err());
        assert!(runtime.page().modal.is_visible());

        runtime.run_until_idle().await;
        assert!(!runtime.page().modal.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_submission_shows_errors() {
        let transport = ScriptedTransport::default()
            .reply("/forms/contact/", Reply::Body(FORM_JSON))
            .reply(
                "/blog/contact_us/",
                Reply::Body(r#"{"form_is_valid": false, "html_form": "<form id=\"contact-form\"><ul class=\"errorlist\"><li>This field is required.</li></ul></form>"}"#),
            );
        let (mut runtime, _) = runtime(transport);
        open_form(&mut runtime).await;

        click(&mut runtime, "#submit-btn");
        runtime.run_until_idle().await;

        let page = runtime.page();
        assert!(page.modal.is_visible());
        assert!(page.modal.content_markup().contains("This field is required."));
        assert!(page.find(".errorlist").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_clicks_while_submitting_are_ignored() {
        let transport = ScriptedTransport::default()
            .reply("/forms/contact/", Reply::Body(FORM_JSON))
            .reply(
                "/blog/contact_us/",
                Reply::Delayed(Duration::from_millis(500), r#"{"form_is_valid": true}"#),
            );
        let (mut runtime, transport) = runtime(transport);
        open_form(&mut runtime).await;

        assert_eq!(click(&mut runtime, "#submit-btn").handled, 1);
        let second = click(&mut runtime, "#submit-btn");
        assert_eq!(second.handled, 0);

        runtime.step().await;
        let posts = transport
            .requests()
            .into_iter()
            .filter(|(_, body)| body.is_some())
            .count();
        assert_eq!(posts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_load_wins() {
        let transport = ScriptedTransport::default()
            .reply(
                "/forms/contact/",
                Reply::Delayed(Duration::from_millis(800), r#"{"html_form": "<p>first</p>"}"#),
            )
            .reply(
                "/forms/contact/?from=footer",
                Reply::Delayed(Duration::from_millis(100), r#"{"html_form": "<p>second</p>"}"#),
            );
        let (mut runtime, _) = runtime(transport);

        click(&mut runtime, "#open");
        click(&mut runtime, "#open-footer");
        runtime.run_until_idle().await;

        assert_eq!(runtime.page().modal.content_markup(), "<p>second</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failures_show_message() {
        let failures = [
            Reply::Status(404),
            Reply::Offline,
            Reply::Body("<html>Server Error</html>"),
            Reply::Body(r#"{"form": "wrong shape"}"#),
        ];
        for reply in failures {
            let transport = ScriptedTransport::default().reply("/forms/contact/", reply.clone());
            let (mut runtime, _) = runtime(transport);

            click(&mut runtime, "#open");
            runtime.run_until_idle().await;

            assert!(runtime.page().modal.is_visible(), "{reply:?}");
            assert_eq!(
                runtime.page().modal.content_markup(),
                ContactConfig::default().messages.load_failed,
                "{reply:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_failure_allows_retry() {
        let transport = ScriptedTransport::default()
            .reply("/forms/contact/", Reply::Body(FORM_JSON))
            .reply("/blog/contact_us/", Reply::Offline)
            .reply("/blog/contact_us/", Reply::Body(r#"{"form_is_valid": true}"#));
        let (mut runtime, _) = runtime(transport);
        open_form(&mut runtime).await;

        click(&mut runtime, "#submit-btn");
        runtime.step().await;
        let button = runtime.page().find("#submit-btn").unwrap();
        assert!(!runtime.page().document.is_disabled(button));
        assert!(runtime.page().modal.alert().is_some());

        assert_eq!(click(&mut runtime, "#submit-btn").handled, 1);
        runtime.step().await;
        assert_eq!(
            runtime.page().modal.content_markup(),
            "<p>Thank you for your message!</p>"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_crashed_submission_releases_control() {
        let transport = ScriptedTransport::default()
            .reply("/forms/contact/", Reply::Body(FORM_JSON))
            .reply("/blog/contact_us/", Reply::Crash)
            .reply("/blog/contact_us/", Reply::Body(r#"{"form_is_valid": true}"#));
        let (mut runtime, _) = runtime(transport);
        open_form(&mut runtime).await;

        click(&mut runtime, "#submit-btn");
        assert!(runtime.step().await);
        assert!(runtime.is_idle());
        let button = runtime.page().find("#submit-btn").unwrap();
        assert!(!runtime.page().document.is_disabled(button));
        assert_eq!(
            runtime.page().modal.alert(),
            Some(ContactConfig::default().messages.submit_failed.as_str())
        );

        assert_eq!(click(&mut runtime, "#submit-btn").handled, 1);
        runtime.step().await;
        assert_eq!(
            runtime.page().modal.content_markup(),
            "<p>Thank you for your message!</p>"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_crashed_load_shows_message() {
        let transport = ScriptedTransport::default().reply("/forms/contact/", Reply::Crash);
        let (mut runtime, _) = runtime(transport);

        click(&mut runtime, "#open");
        runtime.run_until_idle().await;

        assert!(runtime.page().modal.is_visible());
        assert_eq!(
            runtime.page().modal.content_markup(),
            ContactConfig::default().messages.load_failed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_clicks_elsewhere_do_nothing() {
        let (mut runtime, transport) = runtime(ScriptedTransport::default());
        let outcome = click(&mut runtime, ".modal-dialog");
        assert!(!outcome.default_prevented);
        assert!(!runtime.page().modal.is_visible());
        assert!(runtime.is_idle());
        assert!(!runtime.step().await);
        assert!(transport.requests().is_empty());
    }
}
