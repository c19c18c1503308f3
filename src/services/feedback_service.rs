use crate::{
    database::{MongoDB, FEEDBACK, USERS},
    middleware::auth::Claims,
    models::{
        AdminFeedbackQuery, AdminFeedbackView, Feedback, FeedbackCategory, FeedbackPriority, FeedbackStatus,
        FeedbackView, PageRequest, Paginated, Pagination, RespondFeedbackRequest, Sentiment,
        SubmitFeedbackRequest, Testimonial,
    },
    services::response_service,
    utils::{
        time::{iso, to_utc},
        AppError, AppResult,
    },
};
use chrono::{DateTime, Datelike, Duration, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use serde::Serialize;
use std::collections::BTreeMap;

const POSITIVE_WORDS: [&str; 18] = [
    "excellent", "amazing", "great", "fantastic", "wonderful", "awesome", "good", "nice", "happy",
    "satisfied", "pleased", "love", "perfect", "outstanding", "brilliant", "superb", "marvelous",
    "impressive",
];

const NEGATIVE_WORDS: [&str; 18] = [
    "terrible", "awful", "bad", "horrible", "worst", "hate", "disappointed", "frustrated", "angry",
    "poor", "disgusting", "unacceptable", "pathetic", "useless", "annoying", "irritating",
    "ridiculous", "inadequate",
];

/// Keyword vote: whichever list has more hits wins, ties are neutral
pub fn classify_sentiment(message: &str) -> Sentiment {
    let text = message.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| text.contains(*w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| text.contains(*w)).count();

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

pub fn build_feedback(
    request: &SubmitFeedbackRequest,
    employee_id: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
) -> AppResult<Feedback> {
    if !(1..=5).contains(&request.rating) {
        return Err(AppError::bad_request("Rating must be between 1 and 5"));
    }
    let category = FeedbackCategory::parse(&request.category).ok_or_else(|| {
        AppError::bad_request(format!("Invalid category. Must be one of: {}", FeedbackCategory::allowed()))
    })?;
    let priority = match request.priority.as_deref() {
        None | Some("") => FeedbackPriority::Medium,
        Some(p) => FeedbackPriority::parse(p).ok_or_else(|| {
            AppError::bad_request(format!("Invalid priority. Must be one of: {}", FeedbackPriority::allowed()))
        })?,
    };
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::bad_request("Feedback message is required"));
    }

    Ok(Feedback {
        feedback_id: uuid::Uuid::new_v4().to_string(),
        employee_id,
        rating: request.rating,
        category,
        subject: request.subject.trim().to_string(),
        message: message.to_string(),
        anonymous: request.anonymous,
        submission_timestamp: BsonDateTime::now(),
        status: FeedbackStatus::Submitted,
        admin_response: None,
        admin_responded_by: None,
        admin_response_timestamp: None,
        tags: request.tags.clone(),
        priority,
        attachments: request.attachments.clone(),
        is_public: request.is_public,
        sentiment: classify_sentiment(message),
        ip_address,
        user_agent,
        last_updated_by: None,
        last_updated_timestamp: None,
    })
}

#[derive(Debug, Serialize)]
pub struct Tracking {
    #[serde(rename = "feedbackId")]
    pub feedback_id: String,
    pub status: FeedbackStatus,
    pub category: FeedbackCategory,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedFeedback {
    pub feedback_id: String,
    pub message: String,
    pub submission_timestamp: String,
    pub tracking: Tracking,
}

pub async fn submit(
    db: &MongoDB,
    request: &SubmitFeedbackRequest,
    employee_id: &str,
    ip_address: Option<String>,
    user_agent: Option<String>,
) -> AppResult<SubmittedFeedback> {
    let feedback = build_feedback(request, Some(employee_id.to_string()), ip_address, user_agent)?;
    db.collection::<Feedback>(FEEDBACK).insert_one(&feedback).await?;

    db.collection::<Document>(USERS)
        .update_one(
            doc! { "employeeId": employee_id },
            doc! {
                "$inc": { "feedbackCount": 1 },
                "$set": { "lastFeedbackDate": feedback.submission_timestamp },
            },
        )
        .await?;

    log::info!(
        "💬 Feedback {} from {} ({}, {})",
        feedback.feedback_id,
        employee_id,
        feedback.category,
        feedback.sentiment
    );

    Ok(SubmittedFeedback {
        message: "Feedback submitted successfully".to_string(),
        submission_timestamp: iso(feedback.submission_timestamp),
        tracking: Tracking {
            feedback_id: feedback.feedback_id.clone(),
            status: feedback.status,
            category: feedback.category,
        },
        feedback_id: feedback.feedback_id,
    })
}

async fn find(db: &MongoDB, feedback_id: &str) -> AppResult<Feedback> {
    db.collection::<Feedback>(FEEDBACK)
        .find_one(doc! { "feedbackId": feedback_id })
        .await?
        .ok_or_else(|| AppError::not_found("Feedback not found"))
}

/// Invitees may only read their own feedback
pub async fn get_for(db: &MongoDB, feedback_id: &str, claims: &Claims) -> AppResult<FeedbackView> {
    let feedback = find(db, feedback_id).await?;
    if !claims.is_admin() && feedback.employee_id.as_deref() != Some(claims.sub.as_str()) {
        return Err(AppError::Forbidden("Access denied to this feedback".to_string()));
    }
    Ok(FeedbackView::from(feedback))
}

pub async fn list_for_user(
    db: &MongoDB,
    employee_id: &str,
    page: Option<u64>,
    limit: Option<u64>,
) -> AppResult<Paginated<FeedbackView>> {
    let page = PageRequest::new(page, limit, 10, 100);
    let filter = doc! { "employeeId": employee_id };
    let collection = db.collection::<Feedback>(FEEDBACK);

    let total = collection.count_documents(filter.clone()).await?;
    let items: Vec<Feedback> = collection
        .find(filter)
        .sort(doc! { "submissionTimestamp": -1 })
        .skip(page.skip())
        .limit(page.limit_i64())
        .await?
        .try_collect()
        .await?;

    Ok(Paginated {
        items: items.into_iter().map(FeedbackView::from).collect(),
        pagination: Pagination::new(page, total),
    })
}

pub fn admin_filter(query: &AdminFeedbackQuery) -> AppResult<Document> {
    let mut filter = Document::new();
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        FeedbackCategory::parse(category).ok_or_else(|| AppError::bad_request("Invalid category filter"))?;
        filter.insert("category", category);
    }
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        FeedbackStatus::parse(status).ok_or_else(|| AppError::bad_request("Invalid status filter"))?;
        filter.insert("status", status);
    }
    if let Some(priority) = query.priority.as_deref().filter(|p| !p.is_empty()) {
        FeedbackPriority::parse(priority).ok_or_else(|| AppError::bad_request("Invalid priority filter"))?;
        filter.insert("priority", priority);
    }
    if let Some(rating) = query.rating {
        filter.insert("rating", rating);
    }
    Ok(filter)
}

pub async fn list_admin(db: &MongoDB, query: &AdminFeedbackQuery) -> AppResult<Paginated<AdminFeedbackView>> {
    let page = PageRequest::new(query.page, query.limit, 20, 100);
    let filter = admin_filter(query)?;
    let collection = db.collection::<Feedback>(FEEDBACK);

    let total = collection.count_documents(filter.clone()).await?;
    let items: Vec<Feedback> = collection
        .find(filter)
        .sort(doc! { "submissionTimestamp": -1 })
        .skip(page.skip())
        .limit(page.limit_i64())
        .await?
        .try_collect()
        .await?;

    let ids: Vec<String> = items.iter().filter_map(|f| f.employee_id.clone()).collect();
    let invitees = response_service::invitee_index(db, &ids).await?;

    let items = items
        .into_iter()
        .map(|f| {
            let invitee = f.employee_id.as_ref().and_then(|id| invitees.get(id));
            AdminFeedbackView {
                employee_name: invitee.map(|i| i.employee_name.clone()),
                cadre: invitee.map(|i| i.cadre.clone()),
                project_name: invitee.map(|i| i.project_name.clone()),
                feedback: FeedbackView::from(f),
            }
        })
        .collect();

    Ok(Paginated {
        items,
        pagination: Pagination::new(page, total),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponded {
    pub message: String,
    pub feedback_id: String,
    pub status: FeedbackStatus,
    pub response_timestamp: String,
}

pub async fn respond(
    db: &MongoDB,
    feedback_id: &str,
    request: &RespondFeedbackRequest,
    admin_id: &str,
) -> AppResult<FeedbackResponded> {
    let response = request.response.trim();
    if response.is_empty() {
        return Err(AppError::bad_request("Response text is required"));
    }
    let status = match request.status.as_deref() {
        None | Some("") => FeedbackStatus::Responded,
        Some(s) => FeedbackStatus::parse(s).ok_or_else(|| {
            AppError::bad_request(format!("Invalid status. Must be one of: {}", FeedbackStatus::allowed()))
        })?,
    };

    let now = BsonDateTime::now();
    let result = db
        .collection::<Feedback>(FEEDBACK)
        .update_one(
            doc! { "feedbackId": feedback_id },
            doc! { "$set": {
                "adminResponse": response,
                "adminRespondedBy": admin_id,
                "adminResponseTimestamp": now,
                "status": status.as_str(),
            }},
        )
        .await?;
    if result.matched_count == 0 {
        return Err(AppError::not_found("Feedback not found"));
    }

    log::info!("📨 Admin {} responded to feedback {}", admin_id, feedback_id);
    Ok(FeedbackResponded {
        message: "Admin response added successfully".to_string(),
        feedback_id: feedback_id.to_string(),
        status,
        response_timestamp: iso(now),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdated {
    pub message: String,
    pub feedback_id: String,
    #[serde(rename = "new_status")]
    pub new_status: FeedbackStatus,
    pub updated_timestamp: String,
}

pub async fn update_status(db: &MongoDB, feedback_id: &str, status: &str, admin_id: &str) -> AppResult<StatusUpdated> {
    let status = FeedbackStatus::parse(status).ok_or_else(|| {
        AppError::bad_request(format!("Invalid status. Must be one of: {}", FeedbackStatus::allowed()))
    })?;

    let now = BsonDateTime::now();
    let result = db
        .collection::<Feedback>(FEEDBACK)
        .update_one(
            doc! { "feedbackId": feedback_id },
            doc! { "$set": {
                "status": status.as_str(),
                "lastUpdatedBy": admin_id,
                "lastUpdatedTimestamp": now,
            }},
        )
        .await?;
    if result.matched_count == 0 {
        return Err(AppError::not_found("Feedback not found"));
    }

    Ok(StatusUpdated {
        message: format!("Feedback status updated to {}", status),
        feedback_id: feedback_id.to_string(),
        new_status: status,
        updated_timestamp: iso(now),
    })
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FeedbackOverview {
    pub total_feedback: usize,
    pub average_rating: f64,
    pub recent_feedback_7_days: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FeedbackDistributions {
    pub ratings: BTreeMap<i32, usize>,
    pub categories: BTreeMap<String, usize>,
    pub statuses: BTreeMap<String, usize>,
    pub priorities: BTreeMap<String, usize>,
    pub sentiments: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MonthlyTrend {
    pub period: String,
    pub count: usize,
    pub avg_rating: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FeedbackTrends {
    pub monthly: Vec<MonthlyTrend>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FeedbackAnalytics {
    pub overview: FeedbackOverview,
    pub distributions: FeedbackDistributions,
    pub trends: FeedbackTrends,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn bump(map: &mut BTreeMap<String, usize>, key: &str) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}

pub fn analyze(feedback: &[Feedback], now: DateTime<Utc>) -> FeedbackAnalytics {
    let week_ago = now - Duration::days(7);
    let mut ratings = BTreeMap::new();
    let mut categories = BTreeMap::new();
    let mut statuses = BTreeMap::new();
    let mut priorities = BTreeMap::new();
    let mut sentiments = BTreeMap::new();
    let mut months: BTreeMap<String, (usize, i64)> = BTreeMap::new();
    let mut recent = 0;

    for f in feedback {
        *ratings.entry(f.rating).or_insert(0) += 1;
        bump(&mut categories, f.category.as_str());
        bump(&mut statuses, f.status.as_str());
        bump(&mut priorities, f.priority.as_str());
        bump(&mut sentiments, f.sentiment.as_str());

        let submitted = to_utc(f.submission_timestamp);
        if submitted >= week_ago {
            recent += 1;
        }
        let month = months
            .entry(format!("{}-{:02}", submitted.year(), submitted.month()))
            .or_insert((0, 0));
        month.0 += 1;
        month.1 += i64::from(f.rating);
    }

    let total_rating: i64 = feedback.iter().map(|f| i64::from(f.rating)).sum();
    let average_rating = if feedback.is_empty() {
        0.0
    } else {
        round2(total_rating as f64 / feedback.len() as f64)
    };

    let monthly = months
        .into_iter()
        .rev()
        .take(12)
        .map(|(period, (count, sum))| MonthlyTrend {
            period,
            count,
            avg_rating: round2(sum as f64 / count as f64),
        })
        .collect();

    FeedbackAnalytics {
        overview: FeedbackOverview {
            total_feedback: feedback.len(),
            average_rating,
            recent_feedback_7_days: recent,
        },
        distributions: FeedbackDistributions {
            ratings,
            categories,
            statuses,
            priorities,
            sentiments,
        },
        trends: FeedbackTrends { monthly },
    }
}

pub async fn analytics(db: &MongoDB) -> AppResult<FeedbackAnalytics> {
    let feedback: Vec<Feedback> = db
        .collection::<Feedback>(FEEDBACK)
        .find(doc! {})
        .await?
        .try_collect()
        .await?;
    Ok(analyze(&feedback, Utc::now()))
}

pub async fn testimonials(db: &MongoDB, limit: Option<i64>) -> AppResult<Vec<Testimonial>> {
    let limit = limit.unwrap_or(10).clamp(1, 50);
    let feedback: Vec<Feedback> = db
        .collection::<Feedback>(FEEDBACK)
        .find(doc! {
            "isPublic": true,
            "rating": { "$gte": 4 },
            "status": { "$in": [FeedbackStatus::Reviewed.as_str(), FeedbackStatus::Responded.as_str()] },
        })
        .sort(doc! { "submissionTimestamp": -1 })
        .limit(limit)
        .await?
        .try_collect()
        .await?;

    let ids: Vec<String> = feedback
        .iter()
        .filter(|f| !f.anonymous)
        .filter_map(|f| f.employee_id.clone())
        .collect();
    let invitees = response_service::invitee_index(db, &ids).await?;

    Ok(feedback
        .into_iter()
        .map(|f| {
            let author = if f.anonymous {
                "Anonymous Participant".to_string()
            } else {
                f.employee_id
                    .as_ref()
                    .and_then(|id| invitees.get(id))
                    .map(|i| i.employee_name.clone())
                    .unwrap_or_else(|| "Anonymous".to_string())
            };
            Testimonial {
                rating: f.rating,
                message: f.message,
                category: f.category,
                author,
                date: iso(f.submission_timestamp),
                sentiment: f.sentiment,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::to_bson;
    use chrono::TimeZone;

    fn request(rating: i32, category: &str, message: &str) -> SubmitFeedbackRequest {
        SubmitFeedbackRequest {
            rating,
            category: category.into(),
            subject: " Venue ".into(),
            message: message.into(),
            anonymous: false,
            tags: vec![],
            priority: None,
            attachments: vec![],
            is_public: true,
        }
    }

    #[test]
    fn test_sentiment_classification() {
        assert_eq!(classify_sentiment("Excellent venue and great food"), Sentiment::Positive);
        assert_eq!(classify_sentiment("Terrible traffic, awful cab"), Sentiment::Negative);
        assert_eq!(classify_sentiment("Good talks but bad coffee"), Sentiment::Neutral);
        assert_eq!(classify_sentiment(""), Sentiment::Neutral);
    }

    #[test]
    fn test_build_feedback_defaults() {
        let feedback = build_feedback(&request(5, "food", " Amazing lunch "), Some("EMP001".into()), None, None).unwrap();
        assert_eq!(feedback.priority, FeedbackPriority::Medium);
        assert_eq!(feedback.status, FeedbackStatus::Submitted);
        assert_eq!(feedback.subject, "Venue");
        assert_eq!(feedback.message, "Amazing lunch");
        assert_eq!(feedback.sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_build_feedback_validation() {
        assert!(build_feedback(&request(0, "food", "ok"), None, None, None).is_err());
        assert!(build_feedback(&request(6, "food", "ok"), None, None, None).is_err());
        assert!(build_feedback(&request(3, "venue", "ok"), None, None, None).is_err());
        assert!(build_feedback(&request(3, "food", "   "), None, None, None).is_err());

        let mut urgent = request(2, "logistics", "late bus");
        urgent.priority = Some("urgent".into());
        assert_eq!(
            build_feedback(&urgent, None, None, None).unwrap().priority,
            FeedbackPriority::Urgent
        );
        urgent.priority = Some("critical".into());
        assert!(build_feedback(&urgent, None, None, None).is_err());
    }

    #[test]
    fn test_analytics() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();
        let mut a = build_feedback(&request(5, "food", "great"), None, None, None).unwrap();
        a.submission_timestamp = to_bson(now - Duration::days(1));
        let mut b = build_feedback(&request(2, "logistics", "bad"), None, None, None).unwrap();
        b.submission_timestamp = to_bson(Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap());
        let mut c = build_feedback(&request(4, "food", "fine"), None, None, None).unwrap();
        c.submission_timestamp = to_bson(now - Duration::days(3));

        let analytics = analyze(&[a, b, c], now);
        assert_eq!(analytics.overview.total_feedback, 3);
        assert_eq!(analytics.overview.average_rating, 3.67);
        assert_eq!(analytics.overview.recent_feedback_7_days, 2);
        assert_eq!(analytics.distributions.categories.get("food"), Some(&2));
        assert_eq!(analytics.distributions.sentiments.get("negative"), Some(&1));
        assert_eq!(analytics.trends.monthly[0].period, "2025-03");
        assert_eq!(analytics.trends.monthly[0].avg_rating, 4.5);
        assert_eq!(analytics.trends.monthly[1].period, "2025-01");
    }

    #[test]
    fn test_admin_filter() {
        let query = AdminFeedbackQuery {
            page: None,
            limit: None,
            category: Some("food".into()),
            status: None,
            priority: Some("".into()),
            rating: Some(5),
        };
        assert_eq!(admin_filter(&query).unwrap(), doc! { "category": "food", "rating": 5 });
    }
}
