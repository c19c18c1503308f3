use crate::{
    database::{MongoDB, CAB_ALLOCATIONS, RESPONSES},
    models::{
        CabAllocation, CabMemberDetail, CabSummary, EnhancedCabAllocation, Invitee, RsvpResponse,
        UploadResult,
    },
    services::{
        invitee_service::read_table,
        response_service,
        validation_service::{self, CabRow, ValidationReport, CAB_COLUMNS},
    },
    utils::{tabular::Table, upload::UploadedFile, AppError, AppResult},
};
use futures::TryStreamExt;
use mongodb::bson::doc;
use std::collections::{BTreeMap, HashMap};

/// Rows from a table with the cab columns, without the per-row checks
pub fn cab_rows_from_table(table: &Table) -> AppResult<Vec<CabRow>> {
    let missing = table.missing_columns(&CAB_COLUMNS);
    if !missing.is_empty() {
        return Err(AppError::bad_request(format!(
            "CSV must contain columns: {}",
            CAB_COLUMNS.join(", ")
        )));
    }

    table
        .records()
        .enumerate()
        .map(|(index, r)| {
            let cab_number = validation_service::parse_cab_number(r.get("Cab Number")).ok_or_else(|| {
                AppError::bad_request(format!("Invalid Cab Number in row {}", index + 1))
            })?;
            Ok(CabRow {
                cab_number,
                employee_id: r.get("Employee ID").to_string(),
                pickup_location: r.get("Pickup Location").to_string(),
                pickup_time: r.get("Time").to_string(),
                employee_name: r.get("Employee Name").to_string(),
                contact_number: r.get("Contact Number").to_string(),
            })
        })
        .collect()
}

/// One allocation per cab number in ascending order. The first row of each
/// cab decides its pickup location and time.
pub fn group_cab_rows(rows: &[CabRow]) -> Vec<CabAllocation> {
    let mut groups: BTreeMap<i64, CabAllocation> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.cab_number)
            .or_insert_with(|| CabAllocation {
                cab_id: uuid::Uuid::new_v4().to_string(),
                cab_number: row.cab_number,
                assigned_members: Vec::new(),
                pickup_location: row.pickup_location.clone(),
                pickup_time: row.pickup_time.clone(),
            })
            .assigned_members
            .push(row.employee_id.clone());
    }
    groups.into_values().collect()
}

pub async fn replace_all(db: &MongoDB, allocations: &[CabAllocation]) -> AppResult<usize> {
    let collection = db.collection::<CabAllocation>(CAB_ALLOCATIONS);
    collection.delete_many(doc! {}).await?;
    if allocations.is_empty() {
        return Ok(0);
    }
    let result = collection.insert_many(allocations).await?;
    log::info!("🚕 Stored {} cab allocations", result.inserted_ids.len());
    Ok(result.inserted_ids.len())
}

pub async fn upload(db: &MongoDB, file: UploadedFile) -> AppResult<UploadResult> {
    let table = read_table(file).await?;
    let allocations = group_cab_rows(&cab_rows_from_table(&table)?);
    let inserted = replace_all(db, &allocations).await?;

    Ok(UploadResult {
        message: format!("Successfully uploaded {} cab allocations", allocations.len()),
        inserted_count: inserted,
    })
}

pub enum EnhancedCabUpload {
    Rejected(ValidationReport<CabRow>),
    Imported {
        report: ValidationReport<CabRow>,
        cabs_created: usize,
    },
}

pub async fn upload_enhanced(db: &MongoDB, file: UploadedFile) -> AppResult<EnhancedCabUpload> {
    let table = read_table(file).await?;
    let report = validation_service::validate_cab_table(&table);
    if !report.is_valid {
        log::warn!("⚠️  Cab upload rejected: {} validation errors", report.errors.len());
        return Ok(EnhancedCabUpload::Rejected(report));
    }

    let allocations = group_cab_rows(report.processed_data.as_deref().unwrap_or_default());
    let cabs_created = replace_all(db, &allocations).await?;
    Ok(EnhancedCabUpload::Imported { report, cabs_created })
}

pub async fn for_employee(db: &MongoDB, employee_id: &str) -> AppResult<Option<CabAllocation>> {
    Ok(db
        .collection::<CabAllocation>(CAB_ALLOCATIONS)
        .find_one(doc! { "assignedMembers": employee_id })
        .await?)
}

pub async fn all(db: &MongoDB) -> AppResult<Vec<CabAllocation>> {
    validation_service::all_cab_allocations(db).await
}

async fn member_lookups(
    db: &MongoDB,
    members: &[String],
) -> AppResult<(HashMap<String, Invitee>, HashMap<String, String>)> {
    let invitees = response_service::invitee_index(db, members).await?;

    let responses: Vec<_> = db
        .collection::<RsvpResponse>(RESPONSES)
        .find(doc! { "employeeId": { "$in": members.to_vec() } })
        .await?
        .try_collect()
        .await?;
    let mobiles = responses
        .into_iter()
        .map(|r| (r.employee_id, r.mobile_number))
        .collect();

    Ok((invitees, mobiles))
}

pub fn member_details(
    allocation: &CabAllocation,
    invitees: &HashMap<String, Invitee>,
    mobiles: &HashMap<String, String>,
    current_user: Option<&str>,
) -> Vec<CabMemberDetail> {
    allocation
        .assigned_members
        .iter()
        .map(|id| {
            let invitee = invitees.get(id);
            CabMemberDetail {
                employee_id: id.clone(),
                employee_name: invitee.map(|i| i.employee_name.clone()).unwrap_or_else(|| "Unknown".into()),
                cadre: invitee.map(|i| i.cadre.clone()).unwrap_or_default(),
                project_name: invitee.map(|i| i.project_name.clone()).unwrap_or_default(),
                has_responded: invitee.map(|i| i.has_responded).unwrap_or(false),
                mobile_number: mobiles.get(id).cloned(),
                is_current_user: current_user.map(|current| current == id),
            }
        })
        .collect()
}

pub fn enhance(
    allocation: CabAllocation,
    invitees: &HashMap<String, Invitee>,
    mobiles: &HashMap<String, String>,
    current_user: Option<&str>,
) -> EnhancedCabAllocation {
    let details = member_details(&allocation, invitees, mobiles, current_user);
    EnhancedCabAllocation {
        total_members: details.len(),
        responded_members: details.iter().filter(|d| d.has_responded).count(),
        member_details: details,
        allocation,
    }
}

pub fn summarize(allocations: &[EnhancedCabAllocation]) -> CabSummary {
    CabSummary {
        total_cabs: allocations.len(),
        total_members: allocations.iter().map(|a| a.total_members).sum(),
        responded_members: allocations.iter().map(|a| a.responded_members).sum(),
    }
}

pub async fn all_enhanced(db: &MongoDB) -> AppResult<(Vec<EnhancedCabAllocation>, CabSummary)> {
    let allocations = all(db).await?;
    let members: Vec<String> = allocations
        .iter()
        .flat_map(|a| a.assigned_members.iter().cloned())
        .collect();
    let (invitees, mobiles) = member_lookups(db, &members).await?;

    let enhanced: Vec<EnhancedCabAllocation> = allocations
        .into_iter()
        .map(|a| enhance(a, &invitees, &mobiles, None))
        .collect();
    let summary = summarize(&enhanced);
    Ok((enhanced, summary))
}

pub async fn employee_enhanced(db: &MongoDB, employee_id: &str) -> AppResult<Option<EnhancedCabAllocation>> {
    let Some(allocation) = for_employee(db, employee_id).await? else {
        return Ok(None);
    };
    let (invitees, mobiles) = member_lookups(db, &allocation.assigned_members).await?;
    Ok(Some(enhance(allocation, &invitees, &mobiles, Some(employee_id))))
}

/// Cab numbers per employee, used by the invitee status export
pub async fn cab_number_index(db: &MongoDB) -> AppResult<HashMap<String, i64>> {
    let allocations = all(db).await?;
    Ok(allocations
        .iter()
        .flat_map(|a| a.assigned_members.iter().map(move |m| (m.clone(), a.cab_number)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cab: i64, employee: &str, location: &str, time: &str) -> CabRow {
        CabRow {
            cab_number: cab,
            employee_id: employee.into(),
            pickup_location: location.into(),
            pickup_time: time.into(),
            employee_name: String::new(),
            contact_number: String::new(),
        }
    }

    #[test]
    fn test_grouping_is_ascending_and_first_row_wins() {
        let rows = vec![
            row(2, "EMP003", "Metro Station", "08:30"),
            row(1, "EMP001", "Main Gate", "08:00"),
            row(2, "EMP004", "Airport", "09:00"),
            row(1, "EMP002", "Hotel", "07:45"),
        ];
        let cabs = group_cab_rows(&rows);
        assert_eq!(cabs.len(), 2);
        assert_eq!(cabs[0].cab_number, 1);
        assert_eq!(cabs[0].assigned_members, vec!["EMP001", "EMP002"]);
        assert_eq!(cabs[0].pickup_location, "Main Gate");
        assert_eq!(cabs[1].pickup_time, "08:30");
        assert_ne!(cabs[0].cab_id, cabs[1].cab_id);
    }

    #[test]
    fn test_rows_from_table() {
        let table = Table::from_csv(
            b"Cab Number,Employee ID,Pickup Location,Time\n3.0,EMP001,Main Gate,08:00\n",
        )
        .unwrap();
        let rows = cab_rows_from_table(&table).unwrap();
        assert_eq!(rows[0].cab_number, 3);

        let bad = Table::from_csv(b"Cab Number,Employee ID,Pickup Location,Time\nX,EMP001,Gate,08:00\n").unwrap();
        assert_eq!(cab_rows_from_table(&bad).unwrap_err().to_string(), "Invalid Cab Number in row 1");

        let missing = Table::from_csv(b"Cab Number,Employee ID\n1,EMP001\n").unwrap();
        assert!(cab_rows_from_table(&missing).is_err());
    }

    #[test]
    fn test_enhance_marks_current_user() {
        let allocation = group_cab_rows(&[row(1, "EMP001", "Gate", "08:00"), row(1, "EMP009", "Gate", "08:00")])
            .remove(0);
        let mut invitee = Invitee::new("EMP001", "Rajesh Kumar", "Manager", "Solar");
        invitee.has_responded = true;
        let invitees = HashMap::from([("EMP001".to_string(), invitee)]);
        let mobiles = HashMap::from([("EMP001".to_string(), "9876543210".to_string())]);

        let enhanced = enhance(allocation, &invitees, &mobiles, Some("EMP001"));
        assert_eq!(enhanced.total_members, 2);
        assert_eq!(enhanced.responded_members, 1);
        assert_eq!(enhanced.member_details[0].is_current_user, Some(true));
        assert_eq!(enhanced.member_details[1].employee_name, "Unknown");
        assert!(enhanced.member_details[1].mobile_number.is_none());

        let summary = summarize(&[enhanced]);
        assert_eq!(summary.total_members, 2);
    }
}
