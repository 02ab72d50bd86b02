//! Cross-context message boundary for on-demand extraction.
//!
//! # Responsibility
//! - Decode `{ "action": "extractActivities" }` requests.
//! - Encode `{ "success": true, "activities": [...] }` responses.
//!
//! # Invariants
//! - A well-formed request always succeeds; an empty list is still success.
//! - Malformed or unknown requests produce `success: false`, never a panic.

use crate::extract::{DocumentAccessor, Extractor};
use crate::model::extracted::ExtractedActivity;
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContentRequest {
    ExtractActivities,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<ExtractedActivity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How a caller should present a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Found(usize),
    /// Successful pass that matched nothing.
    Empty,
    Failed(String),
}

impl ContentResponse {
    pub fn ok(activities: Vec<ExtractedActivity>) -> Self {
        Self {
            success: true,
            activities: Some(activities),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            activities: None,
            error: Some(message.into()),
        }
    }

    pub fn outcome(&self) -> SyncOutcome {
        if !self.success {
            return SyncOutcome::Failed(
                self.error
                    .clone()
                    .unwrap_or_else(|| "failed to extract activities".to_string()),
            );
        }
        match self.activities.as_deref() {
            Some(activities) if !activities.is_empty() => SyncOutcome::Found(activities.len()),
            _ => SyncOutcome::Empty,
        }
    }
}

/// Serves one decoded request.
pub fn handle_request<D: DocumentAccessor>(
    request: ContentRequest,
    doc: &D,
    extractor: &Extractor,
) -> ContentResponse {
    match request {
        ContentRequest::ExtractActivities => ContentResponse::ok(extractor.extract(doc)),
    }
}

/// Serves one raw JSON message and returns the JSON reply.
pub fn handle_message<D: DocumentAccessor>(raw: &str, doc: &D, extractor: &Extractor) -> String {
    let response = match serde_json::from_str::<ContentRequest>(raw) {
        Ok(request) => handle_request(request, doc, extractor),
        Err(err) => {
            warn!("event=message module=message status=error error={}", err);
            ContentResponse::failure(format!("unsupported request: {err}"))
        }
    };
    encode_response(&response)
}

fn encode_response(response: &ContentResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|err| {
        format!(r#"{{"success":false,"error":"failed to encode response: {err}"}}"#)
    })
}
