use crate::utils::time::iso;
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

pub const SERVICE_WHATSAPP: &str = "whatsapp";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

/// One outbound message attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageLog {
    pub message_id: String,
    pub phone_number: String,
    pub message: String,
    pub sent_at: BsonDateTime,
    pub status: MessageStatus,
    pub attempts: i32,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageLog {
    pub fn pending(phone_number: &str, message: &str) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            phone_number: phone_number.to_string(),
            message: message.to_string(),
            sent_at: BsonDateTime::now(),
            status: MessageStatus::Pending,
            attempts: 1,
            service: SERVICE_WHATSAPP.to_string(),
            response: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageLogView {
    pub message_id: String,
    pub phone_number: String,
    pub message: String,
    pub sent_at: String,
    pub status: MessageStatus,
    pub attempts: i32,
    pub response: Option<String>,
    pub error: Option<String>,
}

impl From<MessageLog> for MessageLogView {
    fn from(m: MessageLog) -> Self {
        Self {
            message_id: m.message_id,
            phone_number: m.phone_number,
            message: m.message,
            sent_at: iso(m.sent_at),
            status: m.status,
            attempts: m.attempts,
            response: m.response,
            error: m.error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMessageLog {
    pub bulk_id: String,
    pub total_recipients: i64,
    pub sent_count: i64,
    pub failed_count: i64,
    pub created_at: BsonDateTime,
    pub service: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct Recipient {
    pub phone_number: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct SendMessageRequest {
    pub phone_number: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct SendTemplateRequest {
    pub phone_number: String,
    pub template_name: String,
    #[serde(default)]
    pub variables: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct SendBulkRequest {
    pub recipients: Vec<Recipient>,
    #[serde(default = "default_bulk_delay")]
    pub delay_seconds: u64,
}

fn default_bulk_delay() -> u64 {
    2
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct RsvpReminderRequest {
    #[serde(default = "default_deadline_days")]
    pub days_before_deadline: i64,
}

fn default_deadline_days() -> i64 {
    3
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct EventUpdateRequest {
    pub update_message: String,
    #[serde(default = "default_target_group")]
    pub target_group: String,
}

fn default_target_group() -> String {
    "all".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageLogQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub phone_number: Option<String>,
}

/// Result of one send, as reported back to the caller
#[derive(Debug, Clone, Serialize, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetail {
    pub phone_number: Option<String>,
    pub status: MessageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, utoipa::ToSchema)]
pub struct BulkSendReport {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub details: Vec<DeliveryDetail>,
}
