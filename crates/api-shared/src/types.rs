//! Request and response bodies shared by the REST layer and the core.
//!
//! Field names follow the JSON the web client already speaks, which is camelCase for the
//! classification and conversation endpoints and snake_case for the stored records.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
}

/// Failure body for endpoints that also report `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FailureRes {
    pub success: bool,
    pub message: String,
}

impl FailureRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Specialist {
    pub name: String,
    pub link: String,
    pub description: String,
    pub specialty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Clinic {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub condition: String,
}

/// Condition details embedded in a classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConditionSummary {
    pub name: String,
    pub description: String,
    pub severity: String,
}

/// Multipart form accepted by `POST /classify`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ClassifyForm {
    /// JPEG, PNG or WebP photo
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
    /// Free-text location used to find nearby specialists and clinics
    pub location: Option<String>,
}

/// Successful classification.
///
/// Fields from the classifier's own payload that are not listed here are passed through
/// alongside these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRes {
    pub success: bool,
    pub classification: String,
    /// Normalised to `0..=1`
    pub confidence: f64,
    /// One decimal place, e.g. `"92.3"`
    pub confidence_percentage: String,
    pub image_url: String,
    pub recommendation: String,
    pub severity: String,
    pub medical_history_added: bool,
    pub condition_found: bool,
    pub condition: Option<ConditionSummary>,
    pub specialists: Vec<Specialist>,
    pub clinics: Vec<Clinic>,
    pub history_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConditionRes {
    pub name: String,
    pub description: String,
    pub severity: String,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConditionListRes {
    pub conditions: Vec<ConditionRes>,
}

/// Condition snapshot stored with a history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryConditionRes {
    pub id: String,
    pub name: String,
    pub description: String,
    pub severity: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistorySummaryRes {
    pub id: String,
    pub diagnosis_date: String,
    pub upload_skin: String,
    pub severity: String,
    pub treatment_recommendation: String,
    pub condition: Option<HistoryConditionRes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryListRes {
    pub history: Vec<HistorySummaryRes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryDetailRes {
    pub id: String,
    pub diagnosis_date: String,
    pub upload_skin: String,
    pub severity: String,
    pub treatment_recommendation: String,
    pub condition: Option<HistoryConditionRes>,
    pub specialists: Vec<Specialist>,
    pub clinics: Vec<Clinic>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeleteHistoryRes {
    pub success: bool,
    pub message: String,
    /// Conversations removed along with the entry
    pub deleted_conversations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationReq {
    pub message: String,
    /// Entry to discuss; the newest entry when absent
    #[serde(default)]
    pub history_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationRes {
    pub success: bool,
    pub conversation_id: String,
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReplyConversationReq {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReplyConversationRes {
    pub success: bool,
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageRes {
    /// `user` or `ai`
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRes {
    pub id: String,
    pub history_id: String,
    #[schema(value_type = Object)]
    pub analysis: serde_json::Value,
    pub messages: Vec<ChatMessageRes>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LatestConversationRes {
    pub success: bool,
    pub conversation: Option<ConversationRes>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LatestConversationQuery {
    /// Restrict to conversations about this entry
    pub history_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_res_uses_camel_case() {
        let res = ClassifyRes {
            success: true,
            classification: "Acne".into(),
            confidence: 0.95,
            confidence_percentage: "95.0".into(),
            image_url: "http://localhost:3002/images/Skins/Acne/1-a.jpg".into(),
            recommendation: "See a dermatologist".into(),
            severity: "Moderate".into(),
            medical_history_added: false,
            condition_found: true,
            condition: None,
            specialists: Vec::new(),
            clinics: Vec::new(),
            history_id: None,
        };
        let value = serde_json::to_value(&res).unwrap();
        assert_eq!(value["confidencePercentage"], "95.0");
        assert_eq!(value["medicalHistoryAdded"], false);
        assert_eq!(value["conditionFound"], true);
        assert_eq!(value["historyId"], serde_json::Value::Null);
    }

    #[test]
    fn test_start_conversation_history_id_is_optional() {
        let req: StartConversationReq =
            serde_json::from_value(json!({ "message": "Is it contagious?" })).unwrap();
        assert_eq!(req.history_id, None);

        let req: StartConversationReq = serde_json::from_value(
            json!({ "message": "hi", "historyId": "550e8400e29b41d4a716446655440000" }),
        )
        .unwrap();
        assert_eq!(
            req.history_id.as_deref(),
            Some("550e8400e29b41d4a716446655440000")
        );
    }
}
