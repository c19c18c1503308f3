use crate::{
    database::{is_duplicate_key, MongoDB, INVITEES, RESPONSES},
    models::{
        FoodPreference, Invitee, PageRequest, Paginated, Pagination, ResponseFilter, ResponseView,
        ResponseWithInvitee, RsvpResponse, SubmitResponseRequest,
    },
    services::invitee_service,
    utils::{
        thread_pool::spawn_workbook_blocking,
        time::{file_stamp, to_utc},
        workbook::{self, yes_no},
        AppError, AppResult,
    },
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

fn parse_date(label: &str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::bad_request(format!("{} must be a date in YYYY-MM-DD format", label))),
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Checks the form and turns it into the stored document
pub fn build_response(request: &SubmitResponseRequest) -> AppResult<RsvpResponse> {
    let food_preference = FoodPreference::parse(&request.food_preference).ok_or_else(|| {
        AppError::bad_request("foodPreference must be one of: Veg, Non-Veg, Not Required")
    })?;

    let arrival = parse_date("arrivalDate", request.arrival_date.as_deref())?;
    let departure = parse_date("departureDate", request.departure_date.as_deref())?;
    if let (Some(arrival), Some(departure)) = (arrival, departure) {
        if departure < arrival {
            return Err(AppError::bad_request("Departure date cannot be before arrival date"));
        }
    }

    Ok(RsvpResponse {
        response_id: uuid::Uuid::new_v4().to_string(),
        employee_id: request.employee_id.trim().to_string(),
        mobile_number: request.mobile_number.trim().to_string(),
        requires_accommodation: request.requires_accommodation,
        arrival_date: arrival.map(|d| d.format("%Y-%m-%d").to_string()),
        departure_date: departure.map(|d| d.format("%Y-%m-%d").to_string()),
        food_preference,
        departure_time_preference: non_blank(&request.departure_time_preference),
        arrival_time_preference: non_blank(&request.arrival_time_preference),
        special_flight_requirements: non_blank(&request.special_flight_requirements),
        submission_timestamp: BsonDateTime::now(),
    })
}

pub async fn submit(db: &MongoDB, request: &SubmitResponseRequest) -> AppResult<String> {
    let response = build_response(request)?;
    let employee_id = response.employee_id.as_str();

    if invitee_service::find(db, employee_id).await?.is_none() {
        return Err(AppError::not_found("Invitee not found"));
    }

    let responses = db.collection::<RsvpResponse>(RESPONSES);
    if responses.find_one(doc! { "employeeId": employee_id }).await?.is_some() {
        return Err(AppError::bad_request("Response already submitted"));
    }

    // unique index catches a concurrent duplicate
    if let Err(e) = responses.insert_one(&response).await {
        return Err(if is_duplicate_key(&e) {
            AppError::bad_request("Response already submitted")
        } else {
            e.into()
        });
    }
    db.collection::<Document>(INVITEES)
        .update_one(
            doc! { "employeeId": employee_id },
            doc! { "$set": { "hasResponded": true } },
        )
        .await?;

    log::info!("✅ RSVP stored for {} ({})", employee_id, response.response_id);
    Ok(response.response_id)
}

pub async fn list_all(db: &MongoDB) -> AppResult<Vec<RsvpResponse>> {
    let cursor = db
        .collection::<RsvpResponse>(RESPONSES)
        .find(doc! {})
        .sort(doc! { "submissionTimestamp": 1 })
        .await?;
    Ok(cursor.try_collect().await?)
}

pub async fn find(db: &MongoDB, employee_id: &str) -> AppResult<Option<RsvpResponse>> {
    Ok(db
        .collection::<RsvpResponse>(RESPONSES)
        .find_one(doc! { "employeeId": employee_id })
        .await?)
}

/// Invitees keyed by employee id, for joins
pub async fn invitee_index(db: &MongoDB, employee_ids: &[String]) -> AppResult<HashMap<String, Invitee>> {
    let cursor = db
        .collection::<Invitee>(INVITEES)
        .find(doc! { "employeeId": { "$in": employee_ids.to_vec() } })
        .await?;
    let invitees: Vec<Invitee> = cursor.try_collect().await?;
    Ok(invitees.into_iter().map(|i| (i.employee_id.clone(), i)).collect())
}

pub fn join_with_invitees(
    responses: Vec<RsvpResponse>,
    invitees: &HashMap<String, Invitee>,
) -> Vec<ResponseWithInvitee> {
    responses
        .into_iter()
        .map(|r| {
            let invitee = invitees.get(&r.employee_id);
            ResponseWithInvitee {
                employee_name: invitee.map(|i| i.employee_name.clone()),
                cadre: invitee.map(|i| i.cadre.clone()),
                project_name: invitee.map(|i| i.project_name.clone()),
                response: ResponseView::from(r),
            }
        })
        .collect()
}

pub async fn list_paginated(db: &MongoDB, filter: &ResponseFilter) -> AppResult<Paginated<ResponseWithInvitee>> {
    let page = PageRequest::new(filter.page, filter.limit, 50, 200);

    let mut query = Document::new();
    if let Some(pref) = filter.food_preference.as_deref().filter(|p| !p.is_empty()) {
        let pref = FoodPreference::parse(pref)
            .ok_or_else(|| AppError::bad_request("Invalid foodPreference filter"))?;
        query.insert("foodPreference", pref.as_str());
    }
    if let Some(acc) = filter.requires_accommodation {
        query.insert("requiresAccommodation", acc);
    }

    let collection = db.collection::<RsvpResponse>(RESPONSES);
    let total = collection.count_documents(query.clone()).await?;
    let responses: Vec<RsvpResponse> = collection
        .find(query)
        .sort(doc! { "submissionTimestamp": -1 })
        .skip(page.skip())
        .limit(page.limit_i64())
        .await?
        .try_collect()
        .await?;

    let ids: Vec<String> = responses.iter().map(|r| r.employee_id.clone()).collect();
    let invitees = invitee_index(db, &ids).await?;

    Ok(Paginated {
        items: join_with_invitees(responses, &invitees),
        pagination: Pagination::new(page, total),
    })
}

pub const RESPONSE_EXPORT_COLUMNS: [&str; 7] = [
    "Employee ID",
    "Mobile Number",
    "Requires Accommodation",
    "Arrival Date",
    "Departure Date",
    "Food Preference",
    "Submission Time",
];

pub fn response_export_rows(responses: &[RsvpResponse]) -> Vec<Vec<String>> {
    responses
        .iter()
        .map(|r| {
            vec![
                r.employee_id.clone(),
                r.mobile_number.clone(),
                yes_no(r.requires_accommodation),
                r.arrival_date.clone().unwrap_or_default(),
                r.departure_date.clone().unwrap_or_default(),
                r.food_preference.to_string(),
                to_utc(r.submission_timestamp).format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ResponseExport {
    pub excel_data: String,
    pub filename: String,
}

/// Base64 xlsx of every response, or `None` when nobody has responded yet
pub async fn export_xlsx(db: &MongoDB) -> AppResult<Option<ResponseExport>> {
    let responses = list_all(db).await?;
    if responses.is_empty() {
        return Ok(None);
    }

    let rows = response_export_rows(&responses);
    let bytes = spawn_workbook_blocking(move || {
        workbook::single_sheet("Responses", &RESPONSE_EXPORT_COLUMNS, &rows)
    })
    .await??;

    log::info!("📊 Exported {} responses", responses.len());
    Ok(Some(ResponseExport {
        excel_data: BASE64.encode(bytes),
        filename: format!("PM_Connect_Responses_{}.xlsx", file_stamp()),
    }))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpecialRequirement {
    #[serde(rename = "employeeId")]
    pub employee_id: String,
    pub requirements: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FlightAnalysis {
    pub total_flight_travelers: usize,
    pub special_requirements_count: usize,
    pub departure_preferences: BTreeMap<String, usize>,
    pub arrival_preferences: BTreeMap<String, usize>,
    pub special_requirements: Vec<SpecialRequirement>,
}

/// Travellers are responses that carry a departure or arrival time preference
pub fn analyze_flights(responses: &[RsvpResponse]) -> FlightAnalysis {
    let travelers: Vec<&RsvpResponse> = responses
        .iter()
        .filter(|r| r.departure_time_preference.is_some() || r.arrival_time_preference.is_some())
        .collect();

    let mut departure = BTreeMap::new();
    let mut arrival = BTreeMap::new();
    let mut special = Vec::new();

    for r in &travelers {
        if let Some(pref) = &r.departure_time_preference {
            *departure.entry(pref.clone()).or_insert(0) += 1;
        }
        if let Some(pref) = &r.arrival_time_preference {
            *arrival.entry(pref.clone()).or_insert(0) += 1;
        }
        if let Some(req) = &r.special_flight_requirements {
            special.push(SpecialRequirement {
                employee_id: r.employee_id.clone(),
                requirements: req.clone(),
            });
        }
    }

    FlightAnalysis {
        total_flight_travelers: travelers.len(),
        special_requirements_count: special.len(),
        departure_preferences: departure,
        arrival_preferences: arrival,
        special_requirements: special,
    }
}

pub async fn flight_analysis(db: &MongoDB) -> AppResult<FlightAnalysis> {
    let responses = list_all(db).await?;
    Ok(analyze_flights(&responses))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SubmitResponseRequest {
        SubmitResponseRequest {
            employee_id: " EMP003 ".into(),
            mobile_number: "9876543212".into(),
            requires_accommodation: true,
            arrival_date: Some("2024-03-15".into()),
            departure_date: Some("2024-03-17".into()),
            food_preference: "Veg".into(),
            departure_time_preference: Some("Morning".into()),
            arrival_time_preference: Some("Evening".into()),
            special_flight_requirements: Some("  ".into()),
        }
    }

    fn stored(id: &str, dep: Option<&str>, arr: Option<&str>, special: Option<&str>) -> RsvpResponse {
        RsvpResponse {
            response_id: format!("r-{}", id),
            employee_id: id.into(),
            mobile_number: "1".into(),
            requires_accommodation: false,
            arrival_date: None,
            departure_date: None,
            food_preference: FoodPreference::Veg,
            departure_time_preference: dep.map(Into::into),
            arrival_time_preference: arr.map(Into::into),
            special_flight_requirements: special.map(Into::into),
            submission_timestamp: BsonDateTime::now(),
        }
    }

    #[test]
    fn test_build_response_normalises_fields() {
        let response = build_response(&request()).unwrap();
        assert_eq!(response.employee_id, "EMP003");
        assert_eq!(response.arrival_date.as_deref(), Some("2024-03-15"));
        assert!(response.special_flight_requirements.is_none());
        assert_eq!(response.food_preference, FoodPreference::Veg);
    }

    #[test]
    fn test_invalid_food_preference() {
        let mut req = request();
        req.food_preference = "Vegan".into();
        assert!(matches!(build_response(&req), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_departure_before_arrival() {
        let mut req = request();
        req.departure_date = Some("2024-03-14".into());
        let err = build_response(&req).unwrap_err();
        assert_eq!(err.to_string(), "Departure date cannot be before arrival date");

        req.departure_date = Some("15/03/2024".into());
        assert!(build_response(&req).is_err());
    }

    #[test]
    fn test_flight_analysis() {
        let responses = vec![
            stored("E1", Some("Morning"), Some("Evening"), Some("Wheelchair")),
            stored("E2", Some("Morning"), None, None),
            stored("E3", None, None, Some("ignored without a flight")),
        ];
        let analysis = analyze_flights(&responses);
        assert_eq!(analysis.total_flight_travelers, 2);
        assert_eq!(analysis.departure_preferences.get("Morning"), Some(&2));
        assert_eq!(analysis.arrival_preferences.get("Evening"), Some(&1));
        assert_eq!(analysis.special_requirements_count, 1);
        assert_eq!(analysis.special_requirements[0].employee_id, "E1");
    }

    #[test]
    fn test_export_rows() {
        let mut response = stored("E1", None, None, None);
        response.requires_accommodation = true;
        response.arrival_date = Some("2024-03-15".into());
        let rows = response_export_rows(&[response]);
        assert_eq!(rows[0].len(), RESPONSE_EXPORT_COLUMNS.len());
        assert_eq!(rows[0][2], "Yes");
        assert_eq!(rows[0][3], "2024-03-15");
        assert_eq!(rows[0][4], "");
        assert_eq!(rows[0][5], "Veg");
    }

    #[test]
    fn test_join_with_missing_invitee() {
        let mut invitees = HashMap::new();
        invitees.insert("E1".to_string(), Invitee::new("E1", "Rajesh Kumar", "Manager", "Solar"));
        let joined = join_with_invitees(vec![stored("E1", None, None, None), stored("E9", None, None, None)], &invitees);
        assert_eq!(joined[0].employee_name.as_deref(), Some("Rajesh Kumar"));
        assert!(joined[1].cadre.is_none());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_concurrent_duplicate_submit_is_bad_request() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/pm_connect_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();
        let employee_id = format!("RACE-{}", uuid::Uuid::new_v4());
        db.collection::<Invitee>(INVITEES)
            .insert_one(Invitee::new(&employee_id, "Rajesh Kumar", "Manager", "Solar"))
            .await
            .unwrap();

        let mut req = request();
        req.employee_id = employee_id.clone();
        let (a, b) = tokio::join!(submit(&db, &req), submit(&db, &req));

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let err = results.into_iter().find_map(Result::err).unwrap();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Response already submitted"));

        db.collection::<Document>(RESPONSES).delete_many(doc! { "employeeId": &employee_id }).await.unwrap();
        db.collection::<Document>(INVITEES).delete_many(doc! { "employeeId": &employee_id }).await.unwrap();
    }
}
