//! Bilingual response envelope.
//!
//! Every response body, success or failure, has the same shape:
//!
//! ```json
//! {
//!   "message": "Đã duyệt yêu cầu thành công",
//!   "message_en": "Request approved successfully",
//!   "status": "success",
//!   "data": { ... },
//!   "violations": [ { "message": { "vi": "...", "en": "..." }, "type": "NotFound", "code": 404 } ]
//! }
//! ```
//!
//! `violations` is omitted on success and holds exactly one entry on failure.
//! Clients should key off `type`/`code` rather than the HTTP status text.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Enable or disable internal error detail in server error responses.
///
/// Called once at startup; production deployments leave it disabled.
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

/// Whether server error responses may carry internal detail.
#[must_use]
pub fn expose_internal_errors() -> bool {
    EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed)
}

/// Machine-readable outcome token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// The operation completed.
    Success,
    /// The operation was refused or failed.
    Error,
    /// The request itself was malformed.
    Fail,
}

/// A message in the primary language (Vietnamese) and English.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedText {
    /// Vietnamese text.
    pub vi: String,
    /// English text.
    pub en: String,
}

impl LocalizedText {
    /// Create a new localized message.
    pub fn new(vi: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            vi: vi.into(),
            en: en.into(),
        }
    }
}

/// A single violation entry: the stable error contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Localized description.
    pub message: LocalizedText,
    /// Error type token, e.g. `DuplicateRequest`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// HTTP status code.
    pub code: u16,
}

/// Response body wrapper.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    /// Primary-language message.
    pub message: String,
    /// English message.
    pub message_en: String,
    /// Outcome token.
    pub status: ResponseStatus,
    /// Optional payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Violations (failures only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

impl<T: Serialize> Envelope<T> {
    /// Build a success envelope.
    pub fn success(message: LocalizedText, data: Option<T>) -> Self {
        Self {
            message: message.vi,
            message_en: message.en,
            status: ResponseStatus::Success,
            data,
            violations: Vec::new(),
        }
    }

    /// Build a failure envelope carrying one violation.
    pub fn failure(
        status: ResponseStatus,
        message: LocalizedText,
        kind: &'static str,
        code: u16,
        data: Option<T>,
    ) -> Self {
        Self {
            message: message.vi.clone(),
            message_en: message.en.clone(),
            status,
            data,
            violations: vec![Violation {
                message,
                kind,
                code,
            }],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_omits_violations() {
        let envelope = Envelope::success(
            LocalizedText::new("Thành công", "Success"),
            Some(json!({ "id": "r1" })),
        );
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["message"], "Thành công");
        assert_eq!(value["message_en"], "Success");
        assert_eq!(value["data"]["id"], "r1");
        assert!(value.get("violations").is_none());
    }

    #[test]
    fn test_failure_envelope_carries_violation_triple() {
        let envelope: Envelope<()> = Envelope::failure(
            ResponseStatus::Error,
            LocalizedText::new("Không tìm thấy yêu cầu", "Request not found"),
            "NotFound",
            404,
            None,
        );
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["status"], "error");
        assert!(value.get("data").is_none());
        let violation = &value["violations"][0];
        assert_eq!(violation["type"], "NotFound");
        assert_eq!(violation["code"], 404);
        assert_eq!(violation["message"]["vi"], "Không tìm thấy yêu cầu");
        assert_eq!(violation["message"]["en"], "Request not found");
    }
}
