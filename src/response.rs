//! Completed submissions and the portable transfer code.
//!
//! A transfer code is the standard base64 encoding of a response's JSON
//! form. It lets a respondent hand their result to an administrator when no
//! shared store is configured. Decoding goes through an explicit schema
//! check so a damaged code is reported as a [`ValidationError`] instead of
//! producing a half-filled response.

use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::quadrant::ScoreSet;
use crate::scoring::{validate_cvcq_scores, validate_cvf_scores};

/// Opaque owner identity. Upserts are idempotent per id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A respondent's finalized submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub user_id: UserId,
    pub username: String,
    pub full_name: String,
    pub position: String,
    pub cvf_scores: ScoreSet,
    pub cvcq_scores: ScoreSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Response {
    /// Check the fields every stored response must carry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.as_str().trim().is_empty() {
            return Err(ValidationError::MissingField("user_id"));
        }
        if self.username.trim().is_empty() {
            return Err(ValidationError::MissingField("username"));
        }
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::MissingField("full_name"));
        }
        if self.position.trim().is_empty() {
            return Err(ValidationError::MissingField("position"));
        }
        validate_cvf_scores(&self.cvf_scores, "cvf_scores")?;
        validate_cvcq_scores(&self.cvcq_scores, "cvcq_scores")
    }

    /// Content hash used to stamp reports.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }
}

/// Lenient decoding target: every field optional so that missing data is
/// reported by name rather than as a generic JSON error. Accepts the
/// camelCase field names used by older codes.
#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    #[serde(default, alias = "userId")]
    user_id: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default, alias = "fullName")]
    full_name: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default, alias = "cvfScores")]
    cvf_scores: Option<ScoreSet>,
    #[serde(default, alias = "cvcqScores")]
    cvcq_scores: Option<ScoreSet>,
    #[serde(default, alias = "submittedAt")]
    submitted_at: Option<DateTime<Utc>>,
}

impl ResponseCandidate {
    fn into_response(self) -> Result<Response, ValidationError> {
        let username = non_blank(self.username).ok_or(ValidationError::MissingField("username"))?;
        let full_name =
            non_blank(self.full_name).ok_or(ValidationError::MissingField("full_name"))?;
        let position = non_blank(self.position).ok_or(ValidationError::MissingField("position"))?;
        let cvf_scores = self
            .cvf_scores
            .ok_or(ValidationError::MissingField("cvf_scores"))?;
        let cvcq_scores = self
            .cvcq_scores
            .ok_or(ValidationError::MissingField("cvcq_scores"))?;
        // Codes from before owner ids existed were keyed by username.
        let user_id = non_blank(self.user_id).unwrap_or_else(|| username.clone());

        let response = Response {
            user_id: UserId(user_id),
            username,
            full_name,
            position,
            cvf_scores,
            cvcq_scores,
            submitted_at: self.submitted_at,
        };
        response.validate()?;
        Ok(response)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Encode a response as a transfer code.
pub fn encode_transfer_code(response: &Response) -> Result<String, ValidationError> {
    let json = serde_json::to_string(response)
        .map_err(|e| ValidationError::TransferCode(format!("cannot serialize response: {e}")))?;
    Ok(general_purpose::STANDARD.encode(json))
}

/// Decode and validate a transfer code. Surrounding whitespace (as left by
/// copy and paste) is ignored.
pub fn decode_transfer_code(code: &str) -> Result<Response, ValidationError> {
    let trimmed: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    if trimmed.is_empty() {
        return Err(ValidationError::TransferCode("code is empty".to_string()));
    }

    let bytes = general_purpose::STANDARD
        .decode(trimmed.as_bytes())
        .map_err(|e| ValidationError::TransferCode(format!("not valid base64: {e}")))?;
    let json = String::from_utf8(bytes)
        .map_err(|_| ValidationError::TransferCode("decoded bytes are not UTF-8".to_string()))?;
    let candidate: ResponseCandidate = serde_json::from_str(&json)
        .map_err(|e| ValidationError::TransferCode(format!("malformed response data: {e}")))?;

    candidate.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadrant::Quadrant;
    use chrono::TimeZone;

    fn sample() -> Response {
        Response {
            user_id: UserId::new("8d3c0a52-7f1e-4c1b-9b7e-2f5a6f0e1d11"),
            username: "ana@example.com".to_string(),
            full_name: "Ana Souza".to_string(),
            position: "Gerente de Operações".to_string(),
            cvf_scores: ScoreSet::new(30.25, 20.5, 25.0, 24.25),
            cvcq_scores: ScoreSet::new(5.0, 4.333333333333333, 6.0, 3.6666666666666665),
            submitted_at: Some(Utc.with_ymd_and_hms(2024, 5, 17, 13, 45, 0).unwrap()),
        }
    }

    #[test]
    fn transfer_code_round_trips() {
        let response = sample();
        let code = encode_transfer_code(&response).unwrap();
        assert_eq!(decode_transfer_code(&code).unwrap(), response);
    }

    #[test]
    fn transfer_code_is_plain_base64_json() {
        let code = encode_transfer_code(&sample()).unwrap();
        let raw = general_purpose::STANDARD.decode(&code).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value["full_name"], "Ana Souza");
        assert_eq!(value["cvf_scores"]["Collaborate"], 30.25);
    }

    #[test]
    fn pasted_code_with_line_breaks_still_decodes() {
        let code = encode_transfer_code(&sample()).unwrap();
        let (a, b) = code.split_at(20);
        let pasted = format!("  {a}\n{b}\n");
        assert_eq!(decode_transfer_code(&pasted).unwrap(), sample());
    }

    #[test]
    fn legacy_camel_case_code_decodes() {
        let json = r#"{
            "username": "joao",
            "fullName": "João Lima",
            "position": "Diretor",
            "cvfScores": {"Clan": 40, "Adhocracy": 20, "Market": 20, "Hierarchy": 20},
            "cvcqScores": {"Clan": 5, "Adhocracy": 4, "Market": 6, "Hierarchy": 3}
        }"#;
        let code = general_purpose::STANDARD.encode(json);
        let response = decode_transfer_code(&code).unwrap();
        assert_eq!(response.user_id, UserId::new("joao"));
        assert_eq!(response.cvf_scores.collaborate, 40.0);
        assert_eq!(response.cvcq_scores.compete, 6.0);
        assert_eq!(response.submitted_at, None);
    }

    #[test]
    fn truncated_code_is_a_validation_error() {
        let code = encode_transfer_code(&sample()).unwrap();
        let truncated = &code[..code.len() / 2];
        assert!(matches!(
            decode_transfer_code(truncated),
            Err(ValidationError::TransferCode(_))
        ));
    }

    #[test]
    fn garbage_and_empty_codes_are_rejected() {
        assert!(matches!(
            decode_transfer_code("   "),
            Err(ValidationError::TransferCode(_))
        ));
        assert!(matches!(
            decode_transfer_code("!!not base64!!"),
            Err(ValidationError::TransferCode(_))
        ));
        let not_json = general_purpose::STANDARD.encode("hello");
        assert!(matches!(
            decode_transfer_code(&not_json),
            Err(ValidationError::TransferCode(_))
        ));
    }

    #[test]
    fn missing_required_field_is_named() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value.as_object_mut().unwrap().remove("position");
        let code = general_purpose::STANDARD.encode(value.to_string());
        assert_eq!(
            decode_transfer_code(&code).unwrap_err(),
            ValidationError::MissingField("position")
        );

        let mut value = serde_json::to_value(sample()).unwrap();
        value["full_name"] = serde_json::json!("  ");
        let code = general_purpose::STANDARD.encode(value.to_string());
        assert_eq!(
            decode_transfer_code(&code).unwrap_err(),
            ValidationError::MissingField("full_name")
        );
    }

    #[test]
    fn incomplete_score_set_is_rejected() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["cvcq_scores"]
            .as_object_mut()
            .unwrap()
            .remove("Control");
        let code = general_purpose::STANDARD.encode(value.to_string());
        assert!(matches!(
            decode_transfer_code(&code),
            Err(ValidationError::TransferCode(_))
        ));
    }

    #[test]
    fn impossible_scores_in_a_code_are_rejected() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["cvf_scores"]["Collaborate"] = serde_json::json!(5000);
        let code = general_purpose::STANDARD.encode(value.to_string());
        assert!(matches!(
            decode_transfer_code(&code),
            Err(ValidationError::ScoreOutOfRange {
                field: "cvf_scores",
                quadrant: Quadrant::Collaborate,
                ..
            })
        ));

        let mut value = serde_json::to_value(sample()).unwrap();
        value["cvcq_scores"]["Create"] = serde_json::json!(900);
        let code = general_purpose::STANDARD.encode(value.to_string());
        assert!(matches!(
            decode_transfer_code(&code),
            Err(ValidationError::ScoreOutOfRange {
                field: "cvcq_scores",
                quadrant: Quadrant::Create,
                ..
            })
        ));

        let mut value = serde_json::to_value(sample()).unwrap();
        value["cvf_scores"]["Control"] = serde_json::json!(0);
        let code = general_purpose::STANDARD.encode(value.to_string());
        assert!(matches!(
            decode_transfer_code(&code),
            Err(ValidationError::ScoreTotal { .. })
        ));
    }

    #[test]
    fn fingerprint_changes_with_content() {
        let a = sample();
        let mut b = sample();
        b.position = "Analista".to_string();
        assert_eq!(a.fingerprint(), sample().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
