//! JSON bodies exchanged with the contact endpoints

use serde::Deserialize;

use crate::error::{ContactError, Result};

/// Body of the form-loading GET
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormFragment {
    pub html_form: String,
}

/// Decoded body of the submission POST
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// `form_is_valid: true`
    Accepted,
    /// `form_is_valid: false`, carrying the re-rendered form
    Rejected { html_form: String },
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    form_is_valid: bool,
    #[serde(default)]
    html_form: Option<String>,
}

pub fn decode_fragment(body: &str) -> Result<FormFragment> {
    serde_json::from_str(body).map_err(|e| ContactError::MalformedResponse(e.to_string()))
}

pub fn decode_submit(body: &str) -> Result<SubmitOutcome> {
    let parsed: SubmitBody =
        serde_json::from_str(body).map_err(|e| ContactError::MalformedResponse(e.to_string()))?;
    match (parsed.form_is_valid, parsed.html_form) {
        (true, _) => Ok(SubmitOutcome::Accepted),
        (false, Some(html_form)) => Ok(SubmitOutcome::Rejected { html_form }),
        (false, None) => Err(ContactError::MalformedResponse(
            "form_is_valid is false but html_form is missing".to_string(),
        )),
    }
}
