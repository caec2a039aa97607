//! Form serialization
//!
//! Builds the `application/x-www-form-urlencoded` body a browser toolkit
//! would produce for a form's successful controls.

use super::{Document, NodeId};

/// Input types that never contribute a value
const SUBMITTER_TYPES: &[&str] = &["submit", "button", "image", "reset", "file"];

/// Name/value pairs of the successful controls below `form`, in document order
pub fn form_pairs(doc: &Document, form: NodeId) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for id in doc.descendants(form) {
        let Some(el) = doc.element(id) else {
            continue;
        };
        if !matches!(el.tag(), "input" | "select" | "textarea") {
            continue;
        }
        let name = match el.attr("name") {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        if doc.is_effectively_disabled(id) {
            continue;
        }

        match el.tag() {
            "input" => {
                let kind = el.input_type();
                if SUBMITTER_TYPES.contains(&kind.as_str()) {
                    continue;
                }
                let checkable = kind == "checkbox" || kind == "radio";
                if checkable && !el.is_checked() {
                    continue;
                }
                let value = if checkable && !el.has_attr("value") {
                    "on".to_string()
                } else {
                    doc.value(id)
                };
                pairs.push((name, normalize_newlines(&value)));
            }
            "select" => {
                for value in selected_values(doc, id, el.has_attr("multiple")) {
                    pairs.push((name.clone(), normalize_newlines(&value)));
                }
            }
            _ => pairs.push((name, normalize_newlines(&doc.value(id)))),
        }
    }

    pairs
}

/// URL-encoded body for `form` (spaces become `+`)
pub fn serialize_form(doc: &Document, form: NodeId) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form_pairs(doc, form))
        .finish()
}

fn selected_values(doc: &Document, select: NodeId, multiple: bool) -> Vec<String> {
    let options: Vec<NodeId> = doc
        .descendants(select)
        .into_iter()
        .filter(|&id| doc.element(id).is_some_and(|el| el.tag() == "option"))
        .filter(|&id| !doc.is_effectively_disabled(id))
        .collect();

    let selected: Vec<String> = options
        .iter()
        .filter(|&&id| doc.is_checked(id))
        .map(|&id| doc.value(id))
        .collect();

    if multiple {
        return selected;
    }
    match selected.into_iter().last() {
        Some(value) => vec![value],
        // A single select with nothing marked shows its first option
        None => options.first().map(|&id| doc.value(id)).into_iter().collect(),
    }
}

fn normalize_newlines(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\n', "\r\n")
}
