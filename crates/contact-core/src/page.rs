//! The page the contact modal lives on

use crate::config::SelectorConfig;
use crate::dom::{Document, NodeId, Selector};
use crate::error::{ContactError, Result};
use crate::modal::Modal;

/// Document plus the modal handle resolved from it
#[derive(Debug, Clone)]
pub struct Page {
    pub document: Document,
    pub modal: Modal,
}

impl Page {
    pub fn new(document: Document, selectors: &SelectorConfig) -> Result<Self> {
        let modal = Modal::locate(
            &document,
            &Selector::parse(&selectors.modal)?,
            &Selector::parse(&selectors.modal_content)?,
        )?;
        Ok(Self { document, modal })
    }

    pub fn parse(markup: &str, selectors: &SelectorConfig) -> Result<Self> {
        Self::new(Document::parse_page(markup), selectors)
    }

    /// First element matching `selector`
    pub fn find(&self, selector: &str) -> Result<NodeId> {
        let parsed = Selector::parse(selector)?;
        self.document
            .query_selector(&parsed)
            .ok_or_else(|| ContactError::MissingElement(selector.to_string()))
    }

    /// Set the value of the control named `name` inside the modal content
    ///
    /// Checkboxes and radios are checked when `value` matches their own
    /// value. Returns false when no control carries that name.
    pub fn fill(&mut self, name: &str, value: &str) -> bool {
        let controls: Vec<NodeId> = self
            .document
            .descendants(self.modal.content())
            .into_iter()
            .filter(|&id| {
                self.document.element(id).is_some_and(|el| {
                    matches!(el.tag(), "input" | "textarea" | "select") && el.attr("name") == Some(name)
                })
            })
            .collect();

        for &id in &controls {
            let Some(el) = self.document.element(id) else {
                continue;
            };
            let tag = el.tag().to_string();
            let kind = el.input_type();
            let own = el.attr("value").unwrap_or("on").to_string();
            match (tag.as_str(), kind.as_str()) {
                ("input", "checkbox" | "radio") => self.document.set_checked(id, own == value),
                ("select", _) => {
                    for option in self.document.descendants(id) {
                        let is_option = self.document.element(option).is_some_and(|o| o.tag() == "option");
                        if is_option {
                            let selected = self.document.value(option) == value;
                            self.document.set_checked(option, selected);
                        }
                    }
                }
                _ => self.document.set_value(id, value),
            }
        }
        !controls.is_empty()
    }
}
