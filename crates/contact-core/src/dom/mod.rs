//! Headless document model
//!
//! A small arena-backed element tree standing in for the browser DOM. It holds
//! exactly what the contact modal needs:
//!
//! - element tags, attributes and classes for selector matching
//! - live form state (current value, checkedness, disabled flag) that starts
//!   from the markup attributes and is mutated by the host
//! - fragment injection, which detaches the previous children of a node and
//!   parses new markup in their place
//!
//! Nodes removed by a content swap are freed and their slots reused. Handles
//! carry a generation, so a [`NodeId`] held across a swap resolves to nothing
//! instead of to whatever node took its slot.

mod form;
mod parse;
mod selector;

pub use form::{form_pairs, serialize_form};
pub use selector::Selector;

/// Handle to a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// What a node holds
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document root
    Document,
    /// An element with tag, attributes and form state
    Element(Element),
    /// Character data
    Text(String),
}

/// Element payload
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    /// Current value once the host edits the control (None = use markup)
    value: Option<String>,
    /// Checkedness for inputs, selectedness for options
    checked: bool,
    disabled: bool,
}

impl Element {
    pub fn new(tag: &str, attrs: Vec<(String, String)>) -> Self {
        let tag = tag.to_ascii_lowercase();
        let flag = |name: &str| attrs.iter().any(|(k, _)| k == name);
        let checked = if tag == "option" { flag("selected") } else { flag("checked") };
        let disabled = flag("disabled");
        Self {
            tag,
            attrs,
            value: None,
            checked,
            disabled,
        }
    }

    /// Lowercase tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// The `type` of an input, lowercased, defaulting to `text`
    pub fn input_type(&self) -> String {
        self.attr("type").unwrap_or("text").to_ascii_lowercase()
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-backed document tree
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    /// Indices of vacant slots
    free: Vec<usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node {
                    parent: None,
                    children: Vec::new(),
                    kind: NodeKind::Document,
                }),
            }],
            free: Vec::new(),
        }
    }

    /// Parse a complete page; `html`, `head` and `body` are always present
    pub fn parse_page(markup: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root();
        parse::import_page(&mut doc, root, markup);
        doc
    }

    pub fn root(&self) -> NodeId {
        NodeId {
            index: 0,
            generation: 0,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Number of live nodes, the root included
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.node_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Append a new node as the last child of `parent`
    ///
    /// Returns None when `parent` is no longer in the arena.
    pub(crate) fn append(&mut self, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.node(parent)?;
        let node = Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        };
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.push(id);
        }
        Some(id)
    }

    /// Vacate `id` and everything below it
    fn release(&mut self, id: NodeId) {
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for node in doomed {
            if let Some(slot) = self.slots.get_mut(node.index) {
                if slot.generation == node.generation && slot.node.is_some() {
                    slot.node = None;
                    slot.generation = slot.generation.wrapping_add(1);
                    self.free.push(node.index);
                }
            }
        }
    }

    /// Whether the node is still reachable from the root
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root() {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Whether `id` is `ancestor` or sits below it
    pub fn is_inclusive_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// All nodes below `id` in document order (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// First element below `scope` matching the selector
    pub fn query_selector_in(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&id| self.element(id).is_some_and(|el| selector.matches(el)))
    }

    pub fn query_selector(&self, selector: &Selector) -> Option<NodeId> {
        self.query_selector_in(self.root(), selector)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&node| self.element(node).and_then(Element::id) == Some(id))
    }

    /// Concatenated text of every text node below `id`
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        if let Some(NodeKind::Text(t)) = self.kind(id) {
            text.push_str(t);
        }
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(t)) = self.kind(node) {
                text.push_str(t);
            }
        }
        text
    }

    /// Free the children of `parent` and parse `markup` in their place
    pub fn replace_children(&mut self, parent: NodeId, markup: &str) {
        let Some(node) = self.node_mut(parent) else {
            return;
        };
        let old = std::mem::take(&mut node.children);
        for child in old {
            self.release(child);
        }
        parse::import_fragment(self, parent, markup);
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.remove_attr(name);
        }
    }

    /// Add or remove a single class on an element
    pub fn toggle_class(&mut self, id: NodeId, class: &str, on: bool) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        let mut classes: Vec<String> = el.classes().map(str::to_string).collect();
        let present = classes.iter().any(|c| c == class);
        if on && !present {
            classes.push(class.to_string());
        } else if !on && present {
            classes.retain(|c| c != class);
        } else {
            return;
        }
        el.set_attr("class", &classes.join(" "));
    }

    /// Current value of a form control
    ///
    /// Inputs fall back to their `value` attribute, textareas to their text,
    /// options to their `value` attribute or collapsed text.
    pub fn value(&self, id: NodeId) -> String {
        let Some(el) = self.element(id) else {
            return String::new();
        };
        if let Some(v) = &el.value {
            return v.clone();
        }
        match el.tag() {
            "textarea" => self.text_content(id),
            "option" => match el.attr("value") {
                Some(v) => v.to_string(),
                None => collapse_whitespace(&self.text_content(id)),
            },
            _ => el.attr("value").unwrap_or_default().to_string(),
        }
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.value = Some(value.to_string());
        }
    }

    pub fn is_checked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(Element::is_checked)
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if let Some(el) = self.element_mut(id) {
            el.checked = checked;
        }
    }

    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(Element::is_disabled)
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) {
        if let Some(el) = self.element_mut(id) {
            el.disabled = disabled;
        }
    }

    /// Disabled itself or through a disabled ancestor `fieldset`
    pub fn is_effectively_disabled(&self, id: NodeId) -> bool {
        if self.is_disabled(id) {
            return true;
        }
        let mut current = self.parent(id);
        while let Some(node) = current {
            if let Some(el) = self.element(node) {
                if el.tag() == "fieldset" && el.is_disabled() {
                    return true;
                }
            }
            current = self.parent(node);
        }
        false
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}
