//! Scope-level click delegation
//!
//! Handlers are bound once to a scope element. When a click lands on a target,
//! the delegator walks from the target up to (but not including) the scope and
//! tests every binding against each element on the way. Elements injected
//! after binding are therefore covered without re-binding.
//!
//! Every contact handler stops propagation, so only the bindings matching the
//! deepest element run. Disabled form controls never receive click
//! delegation; a control counts as disabled through its own flag or a disabled
//! ancestor `fieldset`. `disabled` on any other element is ignored.

use crate::dom::{Document, Element, NodeId, Selector};

/// Elements for which `disabled` suppresses clicks
const DISABLEABLE_TAGS: &[&str] = &[
    "button", "input", "select", "textarea", "option", "optgroup", "fieldset",
];

fn click_blocked(doc: &Document, node: NodeId, el: &Element) -> bool {
    DISABLEABLE_TAGS.contains(&el.tag()) && doc.is_effectively_disabled(node)
}

/// A delegated handler match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegated<A> {
    pub action: A,
    /// The element the binding's selector matched (the handler's `this`)
    pub current_target: NodeId,
}

#[derive(Debug, Clone)]
struct Binding<A> {
    selector: Selector,
    action: A,
}

/// Bindings attached to one scope element
#[derive(Debug, Clone)]
pub struct EventDelegator<A> {
    scope: NodeId,
    bindings: Vec<Binding<A>>,
}

impl<A: Clone> EventDelegator<A> {
    pub fn new(scope: NodeId) -> Self {
        Self {
            scope,
            bindings: Vec::new(),
        }
    }

    pub fn scope(&self) -> NodeId {
        self.scope
    }

    /// Bind `action` to clicks on elements matching `selector`
    pub fn on(&mut self, selector: Selector, action: A) -> &mut Self {
        self.bindings.push(Binding { selector, action });
        self
    }

    /// Resolve a click on `target` into the handlers that should run
    pub fn dispatch_click(&self, doc: &Document, target: NodeId) -> Vec<Delegated<A>> {
        if target == self.scope || !doc.is_inclusive_descendant(target, self.scope) {
            return Vec::new();
        }

        let mut current = Some(target);
        while let Some(node) = current {
            if node == self.scope {
                break;
            }
            if let Some(el) = doc.element(node) {
                if !click_blocked(doc, node, el) {
                    let matched: Vec<Delegated<A>> = self
                        .bindings
                        .iter()
                        .filter(|b| b.selector.matches(el))
                        .map(|b| Delegated {
                            action: b.action.clone(),
                            current_target: node,
                        })
                        .collect();
                    if !matched.is_empty() {
                        log::debug!(
                            "dispatch_click: {} handler(s) matched <{}>",
                            matched.len(),
                            el.tag()
                        );
                        return matched;
                    }
                }
            }
            current = doc.parent(node);
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Act {
        Load,
        Submit,
    }

    fn setup(markup: &str) -> (Document, EventDelegator<Act>) {
        let doc = Document::parse_page(markup);
        let body = doc.query_selector(&Selector::parse("body").unwrap()).unwrap();
        let mut delegator = EventDelegator::new(body);
        delegator
            .on(Selector::parse(".js-load-form").unwrap(), Act::Load)
            .on(Selector::parse("#submit-btn").unwrap(), Act::Submit);
        (doc, delegator)
    }

    #[test]
    fn test_click_on_nested_child_resolves_to_opener() {
        let (doc, delegator) =
            setup(r#"<a class="js-load-form" id="open" href="/c/"><span id="icon">✉</span></a>"#);
        let icon = doc.get_element_by_id("icon").unwrap();
        let open = doc.get_element_by_id("open").unwrap();

        let hits = delegator.dispatch_click(&doc, icon);
        assert_eq!(
            hits,
            vec![Delegated {
                action: Act::Load,
                current_target: open
            }]
        );
    }

    #[test]
    fn test_elements_added_later_are_covered() {
        let (mut doc, delegator) = setup(r#"<div id="slot"></div>"#);
        let slot = doc.get_element_by_id("slot").unwrap();
        doc.replace_children(slot, r#"<button id="submit-btn">Send</button>"#);
        let button = doc.get_element_by_id("submit-btn").unwrap();

        let hits = delegator.dispatch_click(&doc, button);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].action, Act::Submit);
    }

    #[test]
    fn test_disabled_element_receives_nothing() {
        let (doc, delegator) = setup(r#"<button id="submit-btn" disabled>Send</button>"#);
        let button = doc.get_element_by_id("submit-btn").unwrap();
        assert!(delegator.dispatch_click(&doc, button).is_empty());
    }

    #[test]
    fn test_control_in_disabled_fieldset_receives_nothing() {
        let (doc, delegator) = setup(
            r#"<fieldset disabled><span><button id="submit-btn">Send</button></span></fieldset>"#,
        );
        let button = doc.get_element_by_id("submit-btn").unwrap();
        assert!(doc.is_effectively_disabled(button));
        assert!(delegator.dispatch_click(&doc, button).is_empty());
    }

    #[test]
    fn test_disabled_attribute_ignored_on_links() {
        let (doc, delegator) =
            setup(r#"<a class="js-load-form" id="open" href="/c/" disabled>Contact</a>"#);
        let open = doc.get_element_by_id("open").unwrap();

        let hits = delegator.dispatch_click(&doc, open);
        assert_eq!(
            hits,
            vec![Delegated {
                action: Act::Load,
                current_target: open
            }]
        );
    }

    #[test]
    fn test_unmatched_and_out_of_scope_clicks() {
        let (doc, delegator) = setup(r#"<p id="plain">text</p>"#);
        let plain = doc.get_element_by_id("plain").unwrap();
        assert!(delegator.dispatch_click(&doc, plain).is_empty());

        let head = doc.query_selector(&Selector::parse("head").unwrap()).unwrap();
        assert!(delegator.dispatch_click(&doc, head).is_empty());
        assert!(delegator.dispatch_click(&doc, delegator.scope()).is_empty());
    }

    #[test]
    fn test_deepest_match_wins() {
        let (doc, delegator) = setup(
            r#"<div class="js-load-form" href="/outer/"><button id="submit-btn">x</button></div>"#,
        );
        let button = doc.get_element_by_id("submit-btn").unwrap();
        let hits = delegator.dispatch_click(&doc, button);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].action, Act::Submit);
    }
}
