//! Modal handle
//!
//! Explicit reference to the modal container and its content area, resolved
//! once when the page is built and then passed to the controller. Visibility
//! is mirrored into the document as the `show` class on the container.

use crate::dom::{Document, NodeId, Selector};
use crate::error::{ContactError, Result};

#[derive(Debug, Clone)]
pub struct Modal {
    container: NodeId,
    content: NodeId,
    visible: bool,
    /// Markup last injected into the content area, verbatim
    content_markup: String,
    /// Transient notice shown alongside the content (submit failures)
    alert: Option<String>,
}

impl Modal {
    /// Locate the container, then the content area inside it
    pub fn locate(doc: &Document, container: &Selector, content: &Selector) -> Result<Self> {
        let container_id = doc
            .query_selector(container)
            .ok_or_else(|| ContactError::MissingElement(container.to_string()))?;
        let content_id = doc
            .query_selector_in(container_id, content)
            .ok_or_else(|| ContactError::MissingElement(content.to_string()))?;
        Ok(Self {
            container: container_id,
            content: content_id,
            visible: false,
            content_markup: String::new(),
            alert: None,
        })
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn content(&self) -> NodeId {
        self.content
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn content_markup(&self) -> &str {
        &self.content_markup
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn show(&mut self, doc: &mut Document) {
        if !self.visible {
            log::info!("Modal shown");
        }
        self.visible = true;
        doc.toggle_class(self.container, "show", true);
        doc.remove_attr(self.container, "aria-hidden");
    }

    pub fn hide(&mut self, doc: &mut Document) {
        if self.visible {
            log::info!("Modal hidden");
        }
        self.visible = false;
        doc.toggle_class(self.container, "show", false);
        doc.set_attr(self.container, "aria-hidden", "true");
    }

    /// Swap the content area for `markup` and clear any alert
    pub fn replace_content(&mut self, doc: &mut Document, markup: &str) {
        doc.replace_children(self.content, markup);
        self.content_markup = markup.to_string();
        self.alert = None;
    }

    pub fn set_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(message.into());
    }
}
