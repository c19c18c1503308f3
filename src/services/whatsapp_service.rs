use crate::{
    database::{MongoDB, BULK_MESSAGE_LOGS, INVITEES, MESSAGE_LOGS, RESPONSES},
    models::{
        BulkMessageLog, BulkSendReport, DeliveryDetail, Invitee, MessageLog, MessageLogQuery, MessageLogView,
        MessageStatus, PageRequest, Paginated, Pagination, Recipient, RsvpResponse, SendOutcome, SERVICE_WHATSAPP,
    },
    utils::{time::to_utc, AppError, AppResult},
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use futures::TryStreamExt;
use lazy_static::lazy_static;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

const STATUS_TIMEOUT: Duration = Duration::from_secs(10);
const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const REMINDER_DELAY_SECS: u64 = 3;
const UPDATE_DELAY_SECS: u64 = 2;
const DAILY_TREND_DAYS: usize = 30;
const MAX_REMINDER_DAYS: i64 = 365;
const MAX_BULK_DELAY_SECS: u64 = 60;

pub const TARGET_GROUPS: [&str; 4] = ["all", "responded", "not_responded", "accommodation"];

pub struct MessageTemplate {
    pub template: &'static str,
    pub variables: &'static [&'static str],
}

pub static MESSAGE_TEMPLATES: [(&str, MessageTemplate); 5] = [
    (
        "rsvp_reminder",
        MessageTemplate {
            template: "🎉 PM Connect 3.0 Reminder\n\nHi {name}!\n\nYou haven't submitted your RSVP yet. Please respond by {deadline}.\n\n✅ Click here to RSVP: {rsvp_link}\n\nFor any queries, contact the admin team.",
            variables: &["name", "deadline", "rsvp_link"],
        },
    ),
    (
        "event_update",
        MessageTemplate {
            template: "📢 PM Connect 3.0 Update\n\nHi {name}!\n\n{update_message}\n\nBest regards,\nPM Connect Team",
            variables: &["name", "update_message"],
        },
    ),
    (
        "accommodation_confirmation",
        MessageTemplate {
            template: "🏨 Accommodation Confirmed\n\nHi {name}!\n\nYour accommodation has been confirmed:\n📅 Arrival: {arrival_date}\n📅 Departure: {departure_date}\n🚗 Flight preferences noted: {flight_preferences}\n\nSee you at PM Connect 3.0!",
            variables: &["name", "arrival_date", "departure_date", "flight_preferences"],
        },
    ),
    (
        "cab_allocation",
        MessageTemplate {
            template: "🚕 Cab Allocation - PM Connect 3.0\n\nHi {name}!\n\nYour cab details:\n🚗 Cab Number: {cab_number}\n📍 Pickup Location: {pickup_location}\n🕐 Pickup Time: {pickup_time}\n👥 Co-passengers: {passengers}\n\nDriver details will be shared separately.",
            variables: &["name", "cab_number", "pickup_location", "pickup_time", "passengers"],
        },
    ),
    (
        "feedback_thank_you",
        MessageTemplate {
            template: "🙏 Thank You for Your Feedback!\n\nHi {name}!\n\nWe received your {rating}-star feedback about PM Connect 3.0. Your input helps us improve future events.\n\n{admin_response}\n\nBest regards,\nPM Connect Team",
            variables: &["name", "rating", "admin_response"],
        },
    ),
];

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([^}]+)\}").expect("placeholder pattern");
}

pub fn template(name: &str) -> Option<&'static MessageTemplate> {
    MESSAGE_TEMPLATES.iter().find(|(n, _)| *n == name).map(|(_, t)| t)
}

/// Substitutes `{var}` placeholders. Unknown variables are left in place.
pub fn fill(template: &str, variables: &HashMap<String, String>) -> String {
    variables
        .iter()
        .fold(template.to_string(), |text, (name, value)| text.replace(&format!("{{{}}}", name), value))
}

pub fn unreplaced_variables(message: &str) -> Vec<String> {
    PLACEHOLDER.captures_iter(message).map(|c| c[1].to_string()).collect()
}

pub fn render_template(name: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let template = template(name).ok_or_else(|| AppError::bad_request(format!("Template '{}' not found", name)))?;
    let message = fill(template.template, variables);

    let missing = unreplaced_variables(&message);
    if !missing.is_empty() {
        log::warn!("⚠️  Unreplaced variables in template {}: {:?}", name, missing);
    }
    Ok(message)
}

#[derive(Debug, Serialize)]
pub struct TemplateInfo {
    pub template: &'static str,
    pub required_variables: &'static [&'static str],
}

pub fn templates() -> BTreeMap<&'static str, TemplateInfo> {
    MESSAGE_TEMPLATES
        .iter()
        .map(|(name, t)| {
            (
                *name,
                TemplateInfo {
                    template: t.template,
                    required_variables: t.variables,
                },
            )
        })
        .collect()
}

/// Gateway verdict for one message
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub status: MessageStatus,
    pub response: Option<String>,
    pub error: Option<String>,
}

impl Delivery {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            status: MessageStatus::Failed,
            response: None,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Connection state as reported by the gateway. Never fails; an
    /// unreachable gateway is reported as `connected: false`.
    async fn status(&self) -> Value;
    async fn qr(&self) -> AppResult<Value>;
    async fn deliver(&self, phone_number: &str, message: &str) -> Delivery;
}

/// HTTP client for the WhatsApp gateway sidecar
#[derive(Clone)]
pub struct WhatsAppClient {
    base_url: String,
    client: reqwest::Client,
}

impl WhatsAppClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Debug, Deserialize)]
struct GatewayReply {
    #[serde(default)]
    success: bool,
}

#[async_trait]
impl MessageGateway for WhatsAppClient {
    async fn status(&self) -> Value {
        match self.client.get(self.url("/status")).timeout(STATUS_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => response
                .json::<Value>()
                .await
                .unwrap_or_else(|e| json!({ "connected": false, "error": e.to_string() })),
            Ok(_) => json!({ "connected": false, "error": "Service unavailable" }),
            Err(e) => {
                log::error!("❌ WhatsApp status check failed: {}", e);
                json!({ "connected": false, "error": e.to_string() })
            }
        }
    }

    async fn qr(&self) -> AppResult<Value> {
        let response = self.client.get(self.url("/qr")).timeout(STATUS_TIMEOUT).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!("QR code unavailable (HTTP {})", response.status().as_u16())));
        }
        Ok(response.json::<Value>().await?)
    }

    async fn deliver(&self, phone_number: &str, message: &str) -> Delivery {
        let request = self
            .client
            .post(self.url("/send"))
            .timeout(SEND_TIMEOUT)
            .json(&json!({ "phone_number": phone_number, "message": message }));

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                log::error!("❌ WhatsApp send to {} failed: {}", phone_number, e);
                return Delivery::failed(e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Delivery::failed(format!("HTTP {}", status.as_u16()));
        }

        let body = response.text().await.unwrap_or_default();
        let accepted = serde_json::from_str::<GatewayReply>(&body).map(|r| r.success).unwrap_or(false);
        Delivery {
            status: if accepted { MessageStatus::Sent } else { MessageStatus::Failed },
            response: Some(body),
            error: None,
        }
    }
}

/// Sends one message and records the attempt in `message_logs`
pub async fn send_message(
    db: &MongoDB,
    gateway: &dyn MessageGateway,
    phone_number: &str,
    message: &str,
) -> AppResult<SendOutcome> {
    let mut entry = MessageLog::pending(phone_number, message);
    let delivery = gateway.deliver(phone_number, message).await;
    entry.status = delivery.status;
    entry.response = delivery.response;
    entry.error = delivery.error;

    db.collection::<MessageLog>(MESSAGE_LOGS).insert_one(&entry).await?;

    match entry.status {
        MessageStatus::Sent => log::info!("📱 WhatsApp message {} sent to {}", entry.message_id, phone_number),
        _ => log::warn!("⚠️  WhatsApp message {} to {} failed", entry.message_id, phone_number),
    }

    Ok(SendOutcome {
        success: entry.status == MessageStatus::Sent,
        message_id: Some(entry.message_id),
        status: Some(entry.status),
        error: entry.error,
    })
}

pub async fn send_template(
    db: &MongoDB,
    gateway: &dyn MessageGateway,
    phone_number: &str,
    template_name: &str,
    variables: &HashMap<String, String>,
) -> AppResult<SendOutcome> {
    let message = render_template(template_name, variables)?;
    send_message(db, gateway, phone_number, &message).await
}

pub async fn send_bulk(
    db: &MongoDB,
    gateway: &dyn MessageGateway,
    recipients: &[Recipient],
    delay_seconds: u64,
) -> AppResult<BulkSendReport> {
    check_bulk_delay(delay_seconds)?;
    let mut report = BulkSendReport {
        total: recipients.len(),
        sent: 0,
        failed: 0,
        details: Vec::with_capacity(recipients.len()),
    };

    for (index, recipient) in recipients.iter().enumerate() {
        let phone = recipient.phone_number.as_deref().map(str::trim).filter(|p| !p.is_empty());
        let message = recipient.message.as_deref().filter(|m| !m.trim().is_empty());

        let detail = match (phone, message) {
            (Some(phone), Some(message)) => {
                let outcome = send_message(db, gateway, phone, message).await?;
                DeliveryDetail {
                    phone_number: Some(phone.to_string()),
                    status: outcome.status.unwrap_or(MessageStatus::Failed),
                    message_id: outcome.message_id,
                    error: outcome.error,
                }
            }
            _ => DeliveryDetail {
                phone_number: recipient.phone_number.clone(),
                status: MessageStatus::Failed,
                message_id: None,
                error: Some("Missing phone number or message".to_string()),
            },
        };

        if detail.status == MessageStatus::Sent {
            report.sent += 1;
        } else {
            report.failed += 1;
        }
        report.details.push(detail);

        if delay_seconds > 0 && index + 1 < recipients.len() {
            tokio::time::sleep(Duration::from_secs(delay_seconds)).await;
        }
    }

    let bulk = BulkMessageLog {
        bulk_id: uuid::Uuid::new_v4().to_string(),
        total_recipients: report.total as i64,
        sent_count: report.sent as i64,
        failed_count: report.failed as i64,
        created_at: BsonDateTime::now(),
        service: SERVICE_WHATSAPP.to_string(),
    };
    db.collection::<BulkMessageLog>(BULK_MESSAGE_LOGS).insert_one(&bulk).await?;

    log::info!(
        "📨 Bulk WhatsApp {}: {} sent, {} failed of {}",
        bulk.bulk_id,
        report.sent,
        report.failed,
        report.total
    );
    Ok(report)
}

#[derive(Debug, Serialize)]
pub struct CampaignOutcome {
    pub message: String,
    pub sent: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<BulkSendReport>,
}

impl CampaignOutcome {
    fn skipped(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sent: 0,
            results: None,
        }
    }

    fn finished(message: impl Into<String>, results: BulkSendReport) -> Self {
        Self {
            message: message.into(),
            sent: results.sent,
            results: Some(results),
        }
    }
}

fn invitee_phone(invitee: &Invitee) -> Option<&str> {
    invitee.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
}

fn display_name(invitee: &Invitee) -> String {
    if invitee.employee_name.trim().is_empty() {
        "Participant".to_string()
    } else {
        invitee.employee_name.clone()
    }
}

pub fn check_bulk_delay(delay_seconds: u64) -> AppResult<()> {
    if delay_seconds > MAX_BULK_DELAY_SECS {
        return Err(AppError::bad_request(format!(
            "delay_seconds must be at most {}",
            MAX_BULK_DELAY_SECS
        )));
    }
    Ok(())
}

fn reminder_deadline(now: DateTime<Utc>, days_before_deadline: i64) -> AppResult<DateTime<Utc>> {
    let out_of_range = || {
        AppError::bad_request(format!(
            "days_before_deadline must be between 0 and {}",
            MAX_REMINDER_DAYS
        ))
    };
    if !(0..=MAX_REMINDER_DAYS).contains(&days_before_deadline) {
        return Err(out_of_range());
    }
    TimeDelta::try_days(days_before_deadline)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(out_of_range)
}

/// Reminder messages for invitees that have a phone number on file
pub fn reminder_recipients(
    invitees: &[Invitee],
    days_before_deadline: i64,
    rsvp_base_url: &str,
    now: DateTime<Utc>,
) -> AppResult<Vec<Recipient>> {
    let deadline = reminder_deadline(now, days_before_deadline)?.format("%B %d, %Y").to_string();
    let template = MESSAGE_TEMPLATES[0].1.template;

    Ok(invitees
        .iter()
        .filter_map(|invitee| {
            let phone = invitee_phone(invitee)?;
            let variables = HashMap::from([
                ("name".to_string(), display_name(invitee)),
                ("deadline".to_string(), deadline.clone()),
                (
                    "rsvp_link".to_string(),
                    format!("{}?id={}", rsvp_base_url, urlencoding::encode(&invitee.employee_id)),
                ),
            ]);
            Some(Recipient {
                phone_number: Some(phone.to_string()),
                message: Some(fill(template, &variables)),
            })
        })
        .collect())
}

pub fn update_recipients(invitees: &[Invitee], update_message: &str) -> Vec<Recipient> {
    let template = MESSAGE_TEMPLATES[1].1.template;
    invitees
        .iter()
        .filter_map(|invitee| {
            let phone = invitee_phone(invitee)?;
            let variables = HashMap::from([
                ("name".to_string(), display_name(invitee)),
                ("update_message".to_string(), update_message.to_string()),
            ]);
            Some(Recipient {
                phone_number: Some(phone.to_string()),
                message: Some(fill(template, &variables)),
            })
        })
        .collect()
}

async fn invitees_matching(db: &MongoDB, filter: Document) -> AppResult<Vec<Invitee>> {
    Ok(db
        .collection::<Invitee>(INVITEES)
        .find(filter)
        .await?
        .try_collect()
        .await?)
}

pub async fn send_rsvp_reminders(
    db: &MongoDB,
    gateway: &dyn MessageGateway,
    days_before_deadline: i64,
    rsvp_base_url: &str,
) -> AppResult<CampaignOutcome> {
    reminder_deadline(Utc::now(), days_before_deadline)?;
    let pending = invitees_matching(db, doc! { "hasResponded": false }).await?;
    if pending.is_empty() {
        return Ok(CampaignOutcome::skipped("No pending RSVPs"));
    }

    let recipients = reminder_recipients(&pending, days_before_deadline, rsvp_base_url, Utc::now())?;
    if recipients.is_empty() {
        return Ok(CampaignOutcome::skipped("No valid phone numbers found"));
    }

    log::info!("⏰ Sending RSVP reminders to {} invitees", recipients.len());
    let results = send_bulk(db, gateway, &recipients, REMINDER_DELAY_SECS).await?;
    Ok(CampaignOutcome::finished("RSVP reminders processed", results))
}

/// Invitee filter for an event update audience
pub async fn target_group_filter(db: &MongoDB, target_group: &str) -> AppResult<Document> {
    match target_group {
        "all" => Ok(doc! {}),
        "responded" => Ok(doc! { "hasResponded": true }),
        "not_responded" => Ok(doc! { "hasResponded": false }),
        "accommodation" => {
            let responses: Vec<RsvpResponse> = db
                .collection::<RsvpResponse>(RESPONSES)
                .find(doc! { "requiresAccommodation": true })
                .await?
                .try_collect()
                .await?;
            let ids: Vec<String> = responses.into_iter().map(|r| r.employee_id).collect();
            Ok(doc! { "employeeId": { "$in": ids } })
        }
        other => Err(AppError::bad_request(format!(
            "Invalid target group '{}'. Must be one of: {}",
            other,
            TARGET_GROUPS.join(", ")
        ))),
    }
}

pub async fn send_event_updates(
    db: &MongoDB,
    gateway: &dyn MessageGateway,
    update_message: &str,
    target_group: &str,
) -> AppResult<CampaignOutcome> {
    if update_message.trim().is_empty() {
        return Err(AppError::bad_request("Update message is required"));
    }

    let filter = target_group_filter(db, target_group).await?;
    let invitees = invitees_matching(db, filter).await?;
    if invitees.is_empty() {
        return Ok(CampaignOutcome::skipped(format!("No invitees found for group: {}", target_group)));
    }

    let recipients = update_recipients(&invitees, update_message);
    log::info!("📢 Sending event update to {} ({} reachable)", target_group, recipients.len());
    let results = send_bulk(db, gateway, &recipients, UPDATE_DELAY_SECS).await?;
    Ok(CampaignOutcome::finished(
        format!("Event updates sent to {} group", target_group),
        results,
    ))
}

pub async fn logs(db: &MongoDB, query: &MessageLogQuery) -> AppResult<Paginated<MessageLogView>> {
    let page = PageRequest::new(query.page, query.limit, 50, 200);
    let mut filter = doc! { "service": SERVICE_WHATSAPP };
    if let Some(phone) = query.phone_number.as_deref().filter(|p| !p.trim().is_empty()) {
        filter.insert("phoneNumber", phone.trim());
    }

    let collection = db.collection::<MessageLog>(MESSAGE_LOGS);
    let total = collection.count_documents(filter.clone()).await?;
    let entries: Vec<MessageLog> = collection
        .find(filter)
        .sort(doc! { "sentAt": -1 })
        .skip(page.skip())
        .limit(page.limit_i64())
        .await?
        .try_collect()
        .await?;

    Ok(Paginated {
        items: entries.into_iter().map(MessageLogView::from).collect(),
        pagination: Pagination::new(page, total),
    })
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MessageOverview {
    pub total_messages: usize,
    pub sent_messages: usize,
    pub success_rate_percent: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DailyVolume {
    pub date: String,
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageAnalytics {
    pub overview: MessageOverview,
    pub distributions: Value,
    pub trends: Value,
}

/// Success rate, status distribution and per-day volume (newest 30 days)
pub fn analyze(entries: &[MessageLog]) -> MessageAnalytics {
    let mut statuses: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut days: BTreeMap<String, DailyVolume> = BTreeMap::new();

    for entry in entries {
        *statuses.entry(entry.status.as_str()).or_insert(0) += 1;

        let date = to_utc(entry.sent_at).format("%Y-%m-%d").to_string();
        let day = days.entry(date.clone()).or_insert_with(|| DailyVolume {
            date,
            total: 0,
            sent: 0,
            failed: 0,
        });
        day.total += 1;
        match entry.status {
            MessageStatus::Sent => day.sent += 1,
            MessageStatus::Failed => day.failed += 1,
            MessageStatus::Pending => {}
        }
    }

    let sent = statuses.get(MessageStatus::Sent.as_str()).copied().unwrap_or(0);
    let success_rate_percent = if entries.is_empty() {
        0.0
    } else {
        (sent as f64 / entries.len() as f64 * 10_000.0).round() / 100.0
    };
    let daily: Vec<DailyVolume> = days.into_values().rev().take(DAILY_TREND_DAYS).collect();

    MessageAnalytics {
        overview: MessageOverview {
            total_messages: entries.len(),
            sent_messages: sent,
            success_rate_percent,
        },
        distributions: json!({ "status": statuses }),
        trends: json!({ "daily": daily }),
    }
}

pub async fn analytics(db: &MongoDB) -> AppResult<MessageAnalytics> {
    let entries: Vec<MessageLog> = db
        .collection::<MessageLog>(MESSAGE_LOGS)
        .find(doc! { "service": SERVICE_WHATSAPP })
        .projection(doc! { "response": 0 })
        .await?
        .try_collect()
        .await?;
    Ok(analyze(&entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::to_bson;
    use chrono::TimeZone;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn invitee(id: &str, phone: Option<&str>) -> Invitee {
        let mut invitee = Invitee::new(id, "Rajesh Kumar", "Manager", "Solar");
        invitee.phone = phone.map(Into::into);
        invitee
    }

    #[test]
    fn test_render_template() {
        let message = render_template(
            "event_update",
            &vars(&[("name", "Priya"), ("update_message", "Venue moved to Hall B")]),
        )
        .unwrap();
        assert!(message.starts_with("📢 PM Connect 3.0 Update\n\nHi Priya!"));
        assert!(message.contains("Venue moved to Hall B"));
        assert!(unreplaced_variables(&message).is_empty());

        let partial = render_template("cab_allocation", &vars(&[("name", "Priya")])).unwrap();
        assert_eq!(
            unreplaced_variables(&partial),
            vec!["cab_number", "pickup_location", "pickup_time", "passengers"]
        );

        let err = render_template("birthday", &HashMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "Template 'birthday' not found");
    }

    #[test]
    fn test_template_catalog() {
        let catalog = templates();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog["rsvp_reminder"].required_variables, ["name", "deadline", "rsvp_link"]);
        for (_, t) in MESSAGE_TEMPLATES.iter() {
            let mut found = unreplaced_variables(t.template);
            found.sort();
            let mut declared: Vec<String> = t.variables.iter().map(|v| v.to_string()).collect();
            declared.sort();
            assert_eq!(found, declared);
        }
    }

    #[test]
    fn test_reminder_recipients_skip_missing_phones() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let invitees = vec![invitee("EMP001", Some("9876543210")), invitee("EMP002", Some("  ")), invitee("EMP003", None)];
        let recipients = reminder_recipients(&invitees, 3, "https://pmconnect.app/rsvp", now).unwrap();

        assert_eq!(recipients.len(), 1);
        let message = recipients[0].message.as_deref().unwrap();
        assert!(message.contains("Please respond by March 17, 2025."));
        assert!(message.contains("https://pmconnect.app/rsvp?id=EMP001"));
        assert_eq!(recipients[0].phone_number.as_deref(), Some("9876543210"));
    }

    #[test]
    fn test_reminder_window_is_bounded() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let invitees = vec![invitee("EMP001", Some("9876543210"))];

        for days in [1_000_000_000_000, 366, -1, i64::MAX, i64::MIN] {
            let err = reminder_recipients(&invitees, days, "http://x", now).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "days = {}", days);
        }
        assert_eq!(reminder_recipients(&invitees, 365, "http://x", now).unwrap().len(), 1);
        assert_eq!(reminder_recipients(&invitees, 0, "http://x", now).unwrap().len(), 1);
    }

    #[test]
    fn test_bulk_delay_is_capped() {
        assert!(check_bulk_delay(0).is_ok());
        assert!(check_bulk_delay(60).is_ok());
        assert!(matches!(check_bulk_delay(61), Err(AppError::BadRequest(_))));
        assert!(matches!(check_bulk_delay(u64::MAX), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_update_recipients() {
        let recipients = update_recipients(&[invitee("EMP001", Some("9876543210"))], "Dinner at 8 PM");
        assert!(recipients[0].message.as_deref().unwrap().contains("Dinner at 8 PM"));
    }

    #[test]
    fn test_analyze_logs() {
        let day = |d: u32| to_bson(Utc.with_ymd_and_hms(2025, 3, d, 10, 0, 0).unwrap());
        let mut entries = Vec::new();
        for (d, status) in [(14, MessageStatus::Sent), (14, MessageStatus::Failed), (15, MessageStatus::Sent)] {
            let mut entry = MessageLog::pending("9876543210", "hi");
            entry.sent_at = day(d);
            entry.status = status;
            entries.push(entry);
        }

        let analytics = analyze(&entries);
        assert_eq!(analytics.overview.total_messages, 3);
        assert_eq!(analytics.overview.sent_messages, 2);
        assert_eq!(analytics.overview.success_rate_percent, 66.67);
        assert_eq!(analytics.distributions["status"]["failed"], 1);
        assert_eq!(analytics.trends["daily"][0]["date"], "2025-03-15");
        assert_eq!(analytics.trends["daily"][1]["failed"], 1);

        assert_eq!(analyze(&[]).overview.success_rate_percent, 0.0);
    }

    #[tokio::test]
    async fn test_deliver_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(body_json(json!({ "phone_number": "9876543210", "message": "hello" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "id": "wa-1" })))
            .mount(&server)
            .await;

        let delivery = WhatsAppClient::new(&server.uri()).deliver("9876543210", "hello").await;
        assert_eq!(delivery.status, MessageStatus::Sent);
        assert!(delivery.response.unwrap().contains("wa-1"));
        assert!(delivery.error.is_none());
    }

    #[tokio::test]
    async fn test_deliver_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let delivery = WhatsAppClient::new(&server.uri()).deliver("9876543210", "hello").await;
        assert_eq!(delivery.status, MessageStatus::Failed);
        assert_eq!(delivery.error.as_deref(), Some("HTTP 500"));

        let rejected = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
            .mount(&rejected)
            .await;
        let delivery = WhatsAppClient::new(&rejected.uri()).deliver("9876543210", "hello").await;
        assert_eq!(delivery.status, MessageStatus::Failed);
        assert!(delivery.response.is_some());
    }

    #[tokio::test]
    async fn test_status_reports_unavailable_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let status = WhatsAppClient::new(&server.uri()).status().await;
        assert_eq!(status, json!({ "connected": false, "error": "Service unavailable" }));
    }
}
