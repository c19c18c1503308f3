use crate::utils::time::{iso, iso_opt};
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, utoipa::ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.as_str() == value)
            }

            pub fn allowed() -> String {
                Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(FeedbackCategory {
    Event => "event",
    Logistics => "logistics",
    Food => "food",
    Accommodation => "accommodation",
    Overall => "overall",
    Suggestion => "suggestion",
});

string_enum!(FeedbackStatus {
    Submitted => "submitted",
    Reviewed => "reviewed",
    Responded => "responded",
    Closed => "closed",
    Escalated => "escalated",
});

string_enum!(FeedbackPriority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

string_enum!(Sentiment {
    Positive => "positive",
    Negative => "negative",
    Neutral => "neutral",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub feedback_id: String,
    pub employee_id: Option<String>,
    pub rating: i32,
    pub category: FeedbackCategory,
    #[serde(default)]
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub anonymous: bool,
    pub submission_timestamp: BsonDateTime,
    pub status: FeedbackStatus,
    #[serde(default)]
    pub admin_response: Option<String>,
    #[serde(default)]
    pub admin_responded_by: Option<String>,
    #[serde(default)]
    pub admin_response_timestamp: Option<BsonDateTime>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub priority: FeedbackPriority,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_timestamp: Option<BsonDateTime>,
}

/// Feedback as shown to users and admins; client IP and user agent never leave the server
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackView {
    pub feedback_id: String,
    pub employee_id: Option<String>,
    pub rating: i32,
    pub category: FeedbackCategory,
    pub subject: String,
    pub message: String,
    pub anonymous: bool,
    pub submission_timestamp: String,
    pub status: FeedbackStatus,
    pub admin_response: Option<String>,
    pub admin_responded_by: Option<String>,
    pub admin_response_timestamp: Option<String>,
    pub tags: Vec<String>,
    pub priority: FeedbackPriority,
    pub is_public: bool,
    pub sentiment: Sentiment,
}

impl From<Feedback> for FeedbackView {
    fn from(f: Feedback) -> Self {
        Self {
            feedback_id: f.feedback_id,
            employee_id: f.employee_id,
            rating: f.rating,
            category: f.category,
            subject: f.subject,
            message: f.message,
            anonymous: f.anonymous,
            submission_timestamp: iso(f.submission_timestamp),
            status: f.status,
            admin_response: f.admin_response,
            admin_responded_by: f.admin_responded_by,
            admin_response_timestamp: iso_opt(f.admin_response_timestamp),
            tags: f.tags,
            priority: f.priority,
            is_public: f.is_public,
            sentiment: f.sentiment,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFeedbackView {
    #[serde(flatten)]
    pub feedback: FeedbackView,
    pub employee_name: Option<String>,
    pub cadre: Option<String>,
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedbackRequest {
    pub rating: i32,
    pub category: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub priority: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct RespondFeedbackRequest {
    pub response: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct UpdateFeedbackStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminFeedbackQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct Testimonial {
    pub rating: i32,
    pub message: String,
    pub category: FeedbackCategory,
    pub author: String,
    pub date: String,
    pub sentiment: Sentiment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_parsing() {
        assert_eq!(FeedbackCategory::parse("food"), Some(FeedbackCategory::Food));
        assert_eq!(FeedbackCategory::parse("venue"), None);
        assert_eq!(FeedbackStatus::parse("escalated"), Some(FeedbackStatus::Escalated));
        assert_eq!(FeedbackPriority::allowed(), "low, medium, high, urgent");
    }

    #[test]
    fn test_enum_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&FeedbackStatus::Responded).unwrap(), "\"responded\"");
        assert_eq!(serde_json::to_string(&Sentiment::Positive).unwrap(), "\"positive\"");
    }
}
