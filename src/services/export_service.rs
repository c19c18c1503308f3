use crate::{
    database::MongoDB,
    models::{CabAllocation, Invitee, RsvpResponse},
    services::{cab_service, invitee_service, response_service},
    utils::{
        thread_pool::spawn_workbook_blocking,
        time::{file_stamp, to_utc},
        workbook::{self, yes_no},
        AppError, AppResult,
    },
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rust_xlsxwriter::{Workbook, XlsxError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

pub const ADVANCED_SHEETS: [&str; 4] = [
    "All Responses",
    "Accommodation Analysis",
    "Food Preferences",
    "Project Breakdown",
];

pub const ADVANCED_COLUMNS: [&str; 14] = [
    "Employee ID",
    "Employee Name",
    "Cadre",
    "Project Name",
    "Mobile Number",
    "Requires Accommodation",
    "Arrival Date",
    "Departure Date",
    "Food Preference",
    "Departure Time Preference",
    "Arrival Time Preference",
    "Special Flight Requirements",
    "Submission Date",
    "Submission Time",
];

pub const INVITEE_STATUS_COLUMNS: [&str; 10] = [
    "Employee ID",
    "Employee Name",
    "Cadre",
    "Project Name",
    "Response Status",
    "Mobile Number",
    "Accommodation",
    "Food Preference",
    "Response Date",
    "Cab Number",
];

pub const CAB_EXPORT_COLUMNS: [&str; 7] = [
    "Cab Number",
    "Employee ID",
    "Employee Name",
    "Cadre",
    "Project Name",
    "Pickup Location",
    "Pickup Time",
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    Starting,
    Completed,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportProgress {
    pub status: ExportStatus,
    pub progress: u8,
    pub total_steps: u8,
    pub current_step: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// In-memory progress of running and recently finished exports
#[derive(Debug, Default)]
pub struct ExportTracker {
    tasks: Mutex<HashMap<String, ExportProgress>>,
}

impl ExportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, total_steps: u8, first_step: &str) -> String {
        let export_id = uuid::Uuid::new_v4().to_string();
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.insert(
                export_id.clone(),
                ExportProgress {
                    status: ExportStatus::Starting,
                    progress: 0,
                    total_steps,
                    current_step: first_step.to_string(),
                    start_time: Utc::now(),
                    end_time: None,
                    error: None,
                },
            );
        }
        export_id
    }

    fn update(&self, export_id: &str, apply: impl FnOnce(&mut ExportProgress)) {
        if let Ok(mut tasks) = self.tasks.lock() {
            if let Some(task) = tasks.get_mut(export_id) {
                apply(task);
            }
        }
    }

    /// Marks `progress` steps done and names the step now running
    pub fn step(&self, export_id: &str, progress: u8, next_step: &str) {
        self.update(export_id, |task| {
            task.progress = progress;
            task.current_step = next_step.to_string();
        });
    }

    pub fn complete(&self, export_id: &str) {
        self.update(export_id, |task| {
            task.progress = task.total_steps;
            task.status = ExportStatus::Completed;
            task.end_time = Some(Utc::now());
        });
    }

    pub fn fail(&self, export_id: &str, error: &str) {
        self.update(export_id, |task| {
            task.status = ExportStatus::Error;
            task.error = Some(error.to_string());
            task.end_time = Some(Utc::now());
        });
    }

    pub fn get(&self, export_id: &str) -> Option<ExportProgress> {
        self.tasks.lock().ok().and_then(|tasks| tasks.get(export_id).cloned())
    }

    /// Drops finished exports that ended before `now - max_age_hours`
    pub fn cleanup_at(&self, max_age_hours: i64, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::hours(max_age_hours);
        let Ok(mut tasks) = self.tasks.lock() else {
            return 0;
        };
        let before = tasks.len();
        tasks.retain(|_, task| {
            task.status == ExportStatus::Starting || task.end_time.map_or(true, |end| end >= cutoff)
        });
        before - tasks.len()
    }

    pub fn cleanup(&self, max_age_hours: i64) -> usize {
        self.cleanup_at(max_age_hours, Utc::now())
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().map(|tasks| tasks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Serialize)]
pub struct ExportFile<S: Serialize> {
    pub export_id: String,
    pub excel_data: String,
    pub filename: String,
    pub summary: S,
}

fn percent(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", count as f64 / total as f64 * 100.0)
}

/// Occurrences per value, most frequent first (ties by name)
pub fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

/// One row per response, enriched with the invitee's roster details
pub fn enriched_rows(responses: &[RsvpResponse], invitees: &HashMap<String, Invitee>) -> Vec<Vec<String>> {
    responses
        .iter()
        .map(|r| {
            let invitee = invitees.get(&r.employee_id);
            let submitted = to_utc(r.submission_timestamp);
            vec![
                r.employee_id.clone(),
                invitee.map_or_else(|| "Unknown".to_string(), |i| i.employee_name.clone()),
                invitee.map_or_else(|| "Not Specified".to_string(), |i| i.cadre.clone()),
                invitee.map_or_else(|| "Not Specified".to_string(), |i| i.project_name.clone()),
                r.mobile_number.clone(),
                yes_no(r.requires_accommodation),
                r.arrival_date.clone().unwrap_or_default(),
                r.departure_date.clone().unwrap_or_default(),
                r.food_preference.to_string(),
                r.departure_time_preference.clone().unwrap_or_default(),
                r.arrival_time_preference.clone().unwrap_or_default(),
                r.special_flight_requirements.clone().unwrap_or_default(),
                submitted.format("%Y-%m-%d").to_string(),
                submitted.format("%H:%M:%S").to_string(),
            ]
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponseReportSummary {
    pub total_responses: usize,
    pub accommodation_requests: usize,
    pub food_preferences: Vec<(String, usize)>,
    pub project_breakdown: Vec<(String, usize)>,
    pub sheets_created: Vec<String>,
}

const COL_NAME: usize = 1;
const COL_PROJECT: usize = 3;
const COL_ACCOMMODATION: usize = 5;
const COL_ARRIVAL: usize = 6;
const COL_DEPARTURE: usize = 7;
const COL_FOOD: usize = 8;

pub fn summarize_responses(rows: &[Vec<String>]) -> ResponseReportSummary {
    ResponseReportSummary {
        total_responses: rows.len(),
        accommodation_requests: rows.iter().filter(|r| r[COL_ACCOMMODATION] == "Yes").count(),
        food_preferences: value_counts(rows.iter().map(|r| r[COL_FOOD].as_str())),
        project_breakdown: value_counts(rows.iter().map(|r| r[COL_PROJECT].as_str())),
        sheets_created: ADVANCED_SHEETS.iter().map(|s| s.to_string()).collect(),
    }
}

fn accommodation_rows(rows: &[Vec<String>], summary: &ResponseReportSummary) -> Vec<Vec<String>> {
    let total = summary.total_responses;
    let yes = summary.accommodation_requests;
    let blank = || vec![String::new(); 3];
    let mut sheet = vec![
        vec!["Total Responses".to_string(), total.to_string(), String::new()],
        vec!["Requires Accommodation".to_string(), yes.to_string(), percent(yes, total)],
        vec!["No Accommodation".to_string(), (total - yes).to_string(), percent(total - yes, total)],
        blank(),
        vec!["Accommodation Details".to_string(), String::new(), String::new()],
        ["Employee ID", "Employee Name", "Arrival Date", "Departure Date"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    ];
    sheet.extend(rows.iter().filter(|r| r[COL_ACCOMMODATION] == "Yes").map(|r| {
        vec![
            r[0].clone(),
            r[COL_NAME].clone(),
            r[COL_ARRIVAL].clone(),
            r[COL_DEPARTURE].clone(),
        ]
    }));
    sheet
}

fn breakdown_rows(counts: &[(String, usize)], total: usize, label: &str, with_total: bool) -> Vec<Vec<String>> {
    let mut sheet = vec![vec![label.to_string(), "Count".to_string(), "Percentage".to_string()]];
    sheet.extend(
        counts
            .iter()
            .map(|(name, count)| vec![name.clone(), count.to_string(), percent(*count, total)]),
    );
    if with_total {
        sheet.push(vec![String::new(); 3]);
        sheet.push(vec!["Total Responses".to_string(), total.to_string(), "100%".to_string()]);
    }
    sheet
}

/// Four-sheet report: raw responses plus accommodation, food and project analysis
pub fn build_advanced_workbook(rows: &[Vec<String>], summary: &ResponseReportSummary) -> Result<Vec<u8>, XlsxError> {
    let total = summary.total_responses;
    let mut book = Workbook::new();
    workbook::add_sheet(&mut book, ADVANCED_SHEETS[0], &ADVANCED_COLUMNS, rows)?;
    workbook::add_sheet(
        &mut book,
        ADVANCED_SHEETS[1],
        &["Accommodation Summary", "", ""],
        &accommodation_rows(rows, summary),
    )?;
    workbook::add_sheet(
        &mut book,
        ADVANCED_SHEETS[2],
        &["Food Preference Analysis", "", ""],
        &breakdown_rows(&summary.food_preferences, total, "Food Type", true),
    )?;
    workbook::add_sheet(
        &mut book,
        ADVANCED_SHEETS[3],
        &["Project-wise Response Analysis", "", ""],
        &breakdown_rows(&summary.project_breakdown, total, "Project Name", false),
    )?;
    book.save_to_buffer()
}

async fn run_tracked<T, F>(tracker: &ExportTracker, export_id: &str, work: F) -> AppResult<T>
where
    F: std::future::Future<Output = AppResult<T>>,
{
    let result = work.await;
    match &result {
        Ok(_) => tracker.complete(export_id),
        Err(e) => {
            log::error!("❌ Export {} failed: {}", export_id, e);
            tracker.fail(export_id, &e.to_string());
        }
    }
    result
}

pub async fn export_responses_advanced(
    db: &MongoDB,
    tracker: &ExportTracker,
) -> AppResult<ExportFile<ResponseReportSummary>> {
    let export_id = tracker.start(6, "Fetching responses data");
    log::info!("📊 Starting advanced response export {}", export_id);

    run_tracked(tracker, &export_id, async {
        let responses = response_service::list_all(db).await?;
        if responses.is_empty() {
            return Err(AppError::not_found("No responses to export"));
        }
        tracker.step(&export_id, 1, "Enriching with invitee data");

        let ids: Vec<String> = responses.iter().map(|r| r.employee_id.clone()).collect();
        let invitees = response_service::invitee_index(db, &ids).await?;
        tracker.step(&export_id, 2, "Processing response data");

        let rows = enriched_rows(&responses, &invitees);
        let summary = summarize_responses(&rows);
        tracker.step(&export_id, 3, "Creating Excel workbook");

        let report = summary.clone();
        let bytes = spawn_workbook_blocking(move || build_advanced_workbook(&rows, &report)).await??;
        tracker.step(&export_id, 5, "Generating final file");

        log::info!("✅ Export {} ready: {} responses", export_id, summary.total_responses);
        Ok(ExportFile {
            export_id: export_id.clone(),
            excel_data: BASE64.encode(bytes),
            filename: format!("PM_Connect_Comprehensive_Report_{}.xlsx", file_stamp()),
            summary,
        })
    })
    .await
}

#[derive(Debug, Serialize, PartialEq)]
pub struct InviteeStatusSummary {
    pub total_invitees: usize,
    pub responded: usize,
    pub pending: usize,
}

pub fn invitee_status_rows(
    invitees: &[Invitee],
    responses: &HashMap<String, RsvpResponse>,
    cab_numbers: &HashMap<String, i64>,
) -> Vec<Vec<String>> {
    invitees
        .iter()
        .map(|invitee| {
            let response = responses.get(&invitee.employee_id);
            vec![
                invitee.employee_id.clone(),
                invitee.employee_name.clone(),
                invitee.cadre.clone(),
                invitee.project_name.clone(),
                if response.is_some() { "Responded" } else { "Pending" }.to_string(),
                response.map(|r| r.mobile_number.clone()).unwrap_or_default(),
                response.map(|r| yes_no(r.requires_accommodation)).unwrap_or_default(),
                response.map(|r| r.food_preference.to_string()).unwrap_or_default(),
                response
                    .map(|r| to_utc(r.submission_timestamp).format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                cab_numbers
                    .get(&invitee.employee_id)
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect()
}

pub async fn export_invitees_status(
    db: &MongoDB,
    tracker: &ExportTracker,
) -> AppResult<ExportFile<InviteeStatusSummary>> {
    let export_id = tracker.start(4, "Fetching invitee data");

    run_tracked(tracker, &export_id, async {
        let invitees = invitee_service::list_all(db).await?;
        let responses: HashMap<String, RsvpResponse> = response_service::list_all(db)
            .await?
            .into_iter()
            .map(|r| (r.employee_id.clone(), r))
            .collect();
        let cab_numbers = cab_service::cab_number_index(db).await?;
        tracker.step(&export_id, 2, "Processing invitee data");

        let rows = invitee_status_rows(&invitees, &responses, &cab_numbers);
        let responded = rows.iter().filter(|r| r[4] == "Responded").count();
        let summary = InviteeStatusSummary {
            total_invitees: rows.len(),
            responded,
            pending: rows.len() - responded,
        };
        tracker.step(&export_id, 3, "Creating Excel file");

        let bytes = spawn_workbook_blocking(move || {
            workbook::single_sheet("Invitees with Status", &INVITEE_STATUS_COLUMNS, &rows)
        })
        .await??;

        log::info!("📋 Invitee status export {}: {} invitees", export_id, summary.total_invitees);
        Ok(ExportFile {
            export_id: export_id.clone(),
            excel_data: BASE64.encode(bytes),
            filename: format!("PM_Connect_Invitees_Status_{}.xlsx", file_stamp()),
            summary,
        })
    })
    .await
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CabExportSummary {
    pub total_cabs: usize,
    pub total_members: usize,
}

pub fn cab_export_rows(allocations: &[CabAllocation], invitees: &HashMap<String, Invitee>) -> Vec<Vec<String>> {
    allocations
        .iter()
        .flat_map(|cab| {
            cab.assigned_members.iter().map(move |id| {
                let invitee = invitees.get(id);
                vec![
                    cab.cab_number.to_string(),
                    id.clone(),
                    invitee.map_or_else(|| "Unknown".to_string(), |i| i.employee_name.clone()),
                    invitee.map(|i| i.cadre.clone()).unwrap_or_default(),
                    invitee.map(|i| i.project_name.clone()).unwrap_or_default(),
                    cab.pickup_location.clone(),
                    cab.pickup_time.clone(),
                ]
            })
        })
        .collect()
}

pub async fn export_cab_allocations(db: &MongoDB) -> AppResult<ExportFile<CabExportSummary>> {
    let allocations = cab_service::all(db).await?;
    let members: Vec<String> = allocations
        .iter()
        .flat_map(|a| a.assigned_members.iter().cloned())
        .collect();
    let invitees = response_service::invitee_index(db, &members).await?;

    let rows = cab_export_rows(&allocations, &invitees);
    let summary = CabExportSummary {
        total_cabs: allocations.len(),
        total_members: rows.len(),
    };
    let bytes =
        spawn_workbook_blocking(move || workbook::single_sheet("Cab Allocations", &CAB_EXPORT_COLUMNS, &rows)).await??;

    log::info!("🚕 Cab export: {} cabs, {} members", summary.total_cabs, summary.total_members);
    Ok(ExportFile {
        export_id: uuid::Uuid::new_v4().to_string(),
        excel_data: BASE64.encode(bytes),
        filename: format!("PM_Connect_Cab_Allocations_{}.xlsx", file_stamp()),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FoodPreference;
    use crate::utils::time::to_bson;
    use chrono::TimeZone;

    fn response(id: &str, accommodation: bool, food: FoodPreference) -> RsvpResponse {
        RsvpResponse {
            response_id: format!("r-{}", id),
            employee_id: id.into(),
            mobile_number: "9876543210".into(),
            requires_accommodation: accommodation,
            arrival_date: accommodation.then(|| "2025-03-14".to_string()),
            departure_date: accommodation.then(|| "2025-03-16".to_string()),
            food_preference: food,
            departure_time_preference: None,
            arrival_time_preference: None,
            special_flight_requirements: None,
            submission_timestamp: to_bson(Utc.with_ymd_and_hms(2025, 3, 10, 14, 5, 9).unwrap()),
        }
    }

    fn roster() -> HashMap<String, Invitee> {
        HashMap::from([
            ("EMP001".to_string(), Invitee::new("EMP001", "Rajesh Kumar", "Manager", "Solar")),
            ("EMP002".to_string(), Invitee::new("EMP002", "Priya Sharma", "Engineer", "Solar")),
            ("EMP003".to_string(), Invitee::new("EMP003", "Amit Patel", "Lead", "Wind")),
        ])
    }

    #[test]
    fn test_enriched_rows_and_summary() {
        let responses = vec![
            response("EMP001", true, FoodPreference::Veg),
            response("EMP002", false, FoodPreference::NonVeg),
            response("EMP003", true, FoodPreference::Veg),
            response("EMP404", false, FoodPreference::Veg),
        ];
        let rows = enriched_rows(&responses, &roster());
        assert_eq!(rows[0].len(), ADVANCED_COLUMNS.len());
        assert_eq!(rows[0][12], "2025-03-10");
        assert_eq!(rows[0][13], "14:05:09");
        assert_eq!(rows[3][1], "Unknown");
        assert_eq!(rows[3][3], "Not Specified");

        let summary = summarize_responses(&rows);
        assert_eq!(summary.total_responses, 4);
        assert_eq!(summary.accommodation_requests, 2);
        assert_eq!(summary.food_preferences[0], ("Veg".to_string(), 3));
        assert_eq!(summary.project_breakdown[0], ("Solar".to_string(), 2));
        assert_eq!(summary.sheets_created.len(), 4);

        let accommodation = accommodation_rows(&rows, &summary);
        assert_eq!(accommodation[1], vec!["Requires Accommodation", "2", "50.0%"]);
        assert_eq!(accommodation.len(), 6 + 2);

        let bytes = build_advanced_workbook(&rows, &summary).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_value_counts_order() {
        let counts = value_counts(["b", "a", "b", "c", "a", "b"].into_iter());
        assert_eq!(
            counts,
            vec![("b".to_string(), 3), ("a".to_string(), 2), ("c".to_string(), 1)]
        );
        assert_eq!(percent(1, 3), "33.3%");
        assert_eq!(percent(0, 0), "0.0%");
    }

    #[test]
    fn test_invitee_status_rows() {
        let invitees = vec![
            Invitee::new("EMP001", "Rajesh Kumar", "Manager", "Solar"),
            Invitee::new("EMP002", "Priya Sharma", "Engineer", "Solar"),
        ];
        let responses = HashMap::from([("EMP001".to_string(), response("EMP001", true, FoodPreference::Veg))]);
        let cabs = HashMap::from([("EMP002".to_string(), 4)]);

        let rows = invitee_status_rows(&invitees, &responses, &cabs);
        assert_eq!(rows[0][4], "Responded");
        assert_eq!(rows[0][6], "Yes");
        assert_eq!(rows[0][9], "");
        assert_eq!(rows[1][4], "Pending");
        assert_eq!(rows[1][6], "");
        assert_eq!(rows[1][9], "4");
    }

    #[test]
    fn test_cab_export_rows() {
        let cab = CabAllocation {
            cab_id: "c1".into(),
            cab_number: 2,
            assigned_members: vec!["EMP001".into(), "EMP999".into()],
            pickup_location: "Main Gate".into(),
            pickup_time: "08:00".into(),
        };
        let rows = cab_export_rows(&[cab], &roster());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["2", "EMP001", "Rajesh Kumar", "Manager", "Solar", "Main Gate", "08:00"]);
        assert_eq!(rows[1][2], "Unknown");
    }

    #[test]
    fn test_tracker_lifecycle() {
        let tracker = ExportTracker::new();
        let id = tracker.start(6, "Fetching responses data");
        tracker.step(&id, 3, "Creating Excel workbook");
        let progress = tracker.get(&id).unwrap();
        assert_eq!(progress.progress, 3);
        assert_eq!(progress.status, ExportStatus::Starting);

        tracker.complete(&id);
        assert_eq!(tracker.get(&id).unwrap().progress, 6);

        let failed = tracker.start(4, "Fetching invitee data");
        tracker.fail(&failed, "boom");
        let running = tracker.start(4, "Fetching invitee data");
        assert_eq!(tracker.len(), 3);

        assert_eq!(tracker.cleanup_at(24, Utc::now()), 0);
        assert_eq!(tracker.cleanup_at(24, Utc::now() + Duration::hours(25)), 2);
        assert!(tracker.get(&running).is_some());
        assert!(tracker.get("missing").is_none());
    }
}
