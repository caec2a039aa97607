//! Markup import via html5ever
//!
//! Both entry points parse into an `RcDom` and copy the result into the
//! arena. Parsing never fails: html5ever recovers from malformed markup the
//! same way a browser does.

use html5ever::tendril::TendrilSink;
use html5ever::{local_name, namespace_url, ns, parse_document, parse_fragment, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::{Document, Element, NodeId, NodeKind};

/// Parse a whole page below `parent`
pub(super) fn import_page(doc: &mut Document, parent: NodeId, markup: &str) {
    let dom = parse_document(RcDom::default(), Default::default()).one(markup);
    for child in dom.document.children.borrow().iter() {
        import_node(doc, parent, child);
    }
}

/// Parse a fragment as the contents of a `div` and append it to `parent`
pub(super) fn import_fragment(doc: &mut Document, parent: NodeId, markup: &str) {
    let context = QualName::new(None, ns!(html), local_name!("div"));
    let dom = parse_fragment(RcDom::default(), Default::default(), context, Vec::new()).one(markup);

    // Fragment parsing wraps the result in a synthetic <html> element
    let document_children = dom.document.children.borrow();
    for child in document_children.iter() {
        match &child.data {
            NodeData::Element { name, .. } if &*name.local == "html" => {
                for inner in child.children.borrow().iter() {
                    import_node(doc, parent, inner);
                }
            }
            _ => import_node(doc, parent, child),
        }
    }
}

fn import_node(doc: &mut Document, parent: NodeId, handle: &Handle) {
    match &handle.data {
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                import_node(doc, parent, child);
            }
        }
        NodeData::Element { name, attrs, .. } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|a| (a.name.local.to_string(), a.value.to_string()))
                .collect();
            let Some(id) = doc.append(parent, NodeKind::Element(Element::new(&name.local, attrs))) else {
                return;
            };
            for child in handle.children.borrow().iter() {
                import_node(doc, id, child);
            }
        }
        NodeData::Text { contents } => {
            doc.append(parent, NodeKind::Text(contents.borrow().to_string()));
        }
        // Comments, doctypes and processing instructions carry nothing we query
        _ => {}
    }
}
