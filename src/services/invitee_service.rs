use crate::{
    database::{MongoDB, INVITEES},
    models::{Invitee, InviteeFilter, PageRequest, Paginated, Pagination, UnrespondedInvitee, UploadResult},
    services::validation_service::{self, InviteeRow, ValidationReport, INVITEE_COLUMNS},
    utils::{
        tabular::{Table, SPREADSHEET_EXTENSIONS},
        thread_pool::spawn_workbook_blocking,
        upload::UploadedFile,
        AppError, AppResult,
    },
};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use std::collections::HashSet;

/// Parses an uploaded CSV/XLSX roster off the request workers
pub async fn read_table(file: UploadedFile) -> AppResult<Table> {
    if !file.has_extension(SPREADSHEET_EXTENSIONS) {
        return Err(AppError::bad_request("File must be CSV or Excel format"));
    }
    spawn_workbook_blocking(move || Table::from_upload(&file)).await?
}

/// Roster rows from a table that already has the required columns
pub fn invitees_from_table(table: &Table) -> AppResult<Vec<Invitee>> {
    let missing = table.missing_columns(&INVITEE_COLUMNS);
    if !missing.is_empty() {
        return Err(AppError::bad_request(format!(
            "CSV must contain columns: {}",
            INVITEE_COLUMNS.join(", ")
        )));
    }

    let invitees: Vec<Invitee> = table
        .records()
        .map(|r| {
            Invitee::new(
                r.get("Employee ID"),
                r.get("Employee Name"),
                r.get("Cadre"),
                r.get("Project Name"),
            )
        })
        .collect();

    let mut seen = HashSet::new();
    if let Some(dup) = invitees.iter().find(|i| !seen.insert(i.employee_id.as_str())) {
        return Err(AppError::bad_request(format!(
            "Duplicate Employee ID '{}' in upload",
            dup.employee_id
        )));
    }
    Ok(invitees)
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.is_empty())
}

impl From<InviteeRow> for Invitee {
    fn from(row: InviteeRow) -> Self {
        Self {
            email: non_empty(&row.email),
            department: non_empty(&row.department),
            phone: non_empty(&row.phone),
            ..Invitee::new(&row.employee_id, &row.employee_name, &row.cadre, &row.project_name)
        }
    }
}

/// Swaps the whole roster for `invitees`
pub async fn replace_roster(db: &MongoDB, invitees: &[Invitee]) -> AppResult<usize> {
    let collection = db.collection::<Invitee>(INVITEES);
    let removed = collection.delete_many(doc! {}).await?;
    log::info!("🗑️  Removed {} previous invitees", removed.deleted_count);

    if invitees.is_empty() {
        return Ok(0);
    }
    let result = collection.insert_many(invitees).await?;
    Ok(result.inserted_ids.len())
}

pub async fn bulk_upload(db: &MongoDB, file: UploadedFile) -> AppResult<UploadResult> {
    let table = read_table(file).await?;
    let invitees = invitees_from_table(&table)?;
    let inserted = replace_roster(db, &invitees).await?;

    Ok(UploadResult {
        message: format!("Successfully uploaded {} invitees", invitees.len()),
        inserted_count: inserted,
    })
}

pub enum EnhancedUpload {
    Rejected(ValidationReport<InviteeRow>),
    Imported {
        report: ValidationReport<InviteeRow>,
        inserted: usize,
    },
}

pub async fn bulk_upload_enhanced(db: &MongoDB, file: UploadedFile) -> AppResult<EnhancedUpload> {
    let table = read_table(file).await?;
    let mut report = validation_service::validate_invitee_table(&table);

    let Some(rows) = report.processed_data.take() else {
        log::warn!("⚠️  Roster rejected: {} validation errors", report.errors.len());
        return Ok(EnhancedUpload::Rejected(report));
    };

    let invitees: Vec<Invitee> = rows.iter().cloned().map(Invitee::from).collect();
    let inserted = replace_roster(db, &invitees).await?;
    report.processed_data = Some(rows);

    Ok(EnhancedUpload::Imported { report, inserted })
}

pub async fn list_all(db: &MongoDB) -> AppResult<Vec<Invitee>> {
    let cursor = db.collection::<Invitee>(INVITEES).find(doc! {}).await?;
    Ok(cursor.try_collect().await?)
}

pub async fn list_unresponded(db: &MongoDB) -> AppResult<Vec<UnrespondedInvitee>> {
    let cursor = db
        .collection::<Invitee>(INVITEES)
        .find(doc! { "hasResponded": false })
        .await?;
    let invitees: Vec<Invitee> = cursor.try_collect().await?;
    Ok(invitees.into_iter().map(UnrespondedInvitee::from).collect())
}

pub fn filter_document(filter: &InviteeFilter) -> Document {
    let mut query = Document::new();
    if let Some(cadre) = filter.cadre.as_deref().filter(|c| !c.is_empty()) {
        query.insert("cadre", cadre);
    }
    if let Some(project) = filter.project_name.as_deref().filter(|p| !p.is_empty()) {
        query.insert("projectName", project);
    }
    if let Some(responded) = filter.has_responded {
        query.insert("hasResponded", responded);
    }
    query
}

pub async fn list_paginated(db: &MongoDB, filter: &InviteeFilter) -> AppResult<Paginated<Invitee>> {
    let page = PageRequest::new(filter.page, filter.limit, 50, 200);
    let query = filter_document(filter);
    let collection = db.collection::<Invitee>(INVITEES);

    let total = collection.count_documents(query.clone()).await?;
    let cursor = collection
        .find(query)
        .sort(doc! { "employeeName": 1 })
        .skip(page.skip())
        .limit(page.limit_i64())
        .await?;

    Ok(Paginated {
        items: cursor.try_collect().await?,
        pagination: Pagination::new(page, total),
    })
}

pub async fn find(db: &MongoDB, employee_id: &str) -> AppResult<Option<Invitee>> {
    Ok(db
        .collection::<Invitee>(INVITEES)
        .find_one(doc! { "employeeId": employee_id })
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitees_from_table() {
        let table = Table::from_csv(
            b"Employee ID,Employee Name,Cadre,Project Name\nEMP001,Rajesh Kumar,Manager,Solar\n",
        )
        .unwrap();
        let invitees = invitees_from_table(&table).unwrap();
        assert_eq!(invitees.len(), 1);
        assert_eq!(invitees[0].project_name, "Solar");
        assert!(!invitees[0].has_responded);
    }

    #[test]
    fn test_duplicate_ids_rejected_before_replacing() {
        let table = Table::from_csv(
            b"Employee ID,Employee Name,Cadre,Project Name\n\
              EMP001,Rajesh Kumar,Manager,Solar\n\
              EMP001,Priya Shah,Engineer,Wind\n",
        )
        .unwrap();
        let err = invitees_from_table(&table).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate Employee ID 'EMP001' in upload");
    }

    #[test]
    fn test_missing_column_rejected() {
        let table = Table::from_csv(b"Employee ID,Employee Name\nEMP001,Rajesh\n").unwrap();
        assert!(matches!(invitees_from_table(&table), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_row_conversion_drops_blank_optionals() {
        let invitee = Invitee::from(InviteeRow {
            employee_id: "EMP001".into(),
            employee_name: "Rajesh Kumar".into(),
            cadre: "Manager".into(),
            project_name: "Solar".into(),
            email: "rajesh@corp.com".into(),
            department: String::new(),
            phone: "98765".into(),
        });
        assert_eq!(invitee.email.as_deref(), Some("rajesh@corp.com"));
        assert!(invitee.department.is_none());
        assert_eq!(invitee.phone.as_deref(), Some("98765"));
    }

    #[test]
    fn test_filter_document() {
        let filter = InviteeFilter {
            page: None,
            limit: None,
            cadre: Some("Manager".into()),
            project_name: Some(String::new()),
            has_responded: Some(false),
        };
        assert_eq!(filter_document(&filter), doc! { "cadre": "Manager", "hasResponded": false });
    }

    #[tokio::test]
    async fn test_wrong_extension_rejected() {
        let file = UploadedFile {
            filename: "roster.txt".into(),
            content_type: None,
            bytes: b"x".to_vec(),
        };
        assert!(matches!(read_table(file).await, Err(AppError::BadRequest(_))));
    }
}
