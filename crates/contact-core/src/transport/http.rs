//! HTTP transport backed by ureq
//!
//! ureq is blocking, so each call runs on tokio's blocking pool. The agent
//! keeps a cookie store: the CSRF cookie set by the form GET is sent back
//! with the POST.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::FormTransport;
use crate::config::ContactConfig;
use crate::error::{ContactError, Result};

const ACCEPT_JSON: &str = "application/json, text/javascript, */*; q=0.01";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

pub struct UreqTransport {
    agent: ureq::Agent,
    base: Url,
}

impl UreqTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|source| ContactError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self { agent, base })
    }

    pub fn from_config(config: &ContactConfig) -> Result<Self> {
        Self::new(&config.base_url, config.request_timeout())
    }

    /// Resolve an href or path against the base URL
    pub fn resolve(&self, url: &str) -> Result<Url> {
        self.base.join(url).map_err(|source| ContactError::InvalidUrl {
            url: url.to_string(),
            source,
        })
    }
}

fn read_body(url: &Url, outcome: std::result::Result<ureq::Response, ureq::Error>) -> Result<String> {
    match outcome {
        Ok(response) => response.into_string().map_err(|e| ContactError::Network {
            url: url.to_string(),
            message: e.to_string(),
        }),
        Err(ureq::Error::Status(status, _)) => Err(ContactError::Status {
            url: url.to_string(),
            status,
        }),
        Err(ureq::Error::Transport(transport)) => Err(ContactError::Network {
            url: url.to_string(),
            message: transport.to_string(),
        }),
    }
}

#[async_trait]
impl FormTransport for UreqTransport {
    async fn get(&self, url: &str) -> Result<String> {
        let url = self.resolve(url)?;
        let agent = self.agent.clone();
        log::info!("GET {}", url);

        tokio::task::spawn_blocking(move || {
            let outcome = agent
                .get(url.as_str())
                .set("Accept", ACCEPT_JSON)
                .set("X-Requested-With", "XMLHttpRequest")
                .call();
            read_body(&url, outcome)
        })
        .await
        .map_err(|e| ContactError::Task(e.to_string()))?
    }

    async fn post_form(&self, url: &str, body: String) -> Result<String> {
        let url = self.resolve(url)?;
        let agent = self.agent.clone();
        let referer = self.base.to_string();
        log::info!("POST {} ({} bytes)", url, body.len());

        tokio::task::spawn_blocking(move || {
            let outcome = agent
                .post(url.as_str())
                .set("Accept", ACCEPT_JSON)
                .set("X-Requested-With", "XMLHttpRequest")
                .set("Content-Type", FORM_CONTENT_TYPE)
                .set("Referer", &referer)
                .send_string(&body);
            read_body(&url, outcome)
        })
        .await
        .map_err(|e| ContactError::Task(e.to_string()))?
    }
}
