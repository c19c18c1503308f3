use crate::{
    database::{MongoDB, DOCUMENTS, DOWNLOAD_LOGS},
    models::{
        find_category, CategoryQuery, DocumentCategory, DocumentView, DownloadLog, DownloadLogQuery,
        DownloadLogView, PageRequest, Paginated, Pagination, SearchQuery, StoredDocument, DOCUMENT_CATEGORIES,
    },
    utils::{
        crypto::checksum,
        time::{iso, to_utc},
        upload::UploadedFile,
        AppError, AppResult,
    },
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Datelike;
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use serde::Serialize;
use std::collections::BTreeMap;

/// Form fields that accompany a document upload
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub category: String,
    pub event_version: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: bool,
}

pub fn categories() -> BTreeMap<&'static str, DocumentCategory> {
    DOCUMENT_CATEGORIES.iter().map(|c| (c.key, *c)).collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Checks category, extension and size, then builds the stored record
pub fn build_document(upload: &DocumentUpload, file: &UploadedFile, uploaded_by: &str) -> AppResult<StoredDocument> {
    let category = find_category(&upload.category).ok_or_else(|| {
        let keys: Vec<&str> = DOCUMENT_CATEGORIES.iter().map(|c| c.key).collect();
        AppError::bad_request(format!("Invalid category. Must be one of: {}", keys.join(", ")))
    })?;

    let extension = file.extension();
    if !category.file_types.contains(&extension.as_str()) {
        return Err(AppError::bad_request(format!(
            "Invalid file type for {}. Allowed: {}",
            category.key,
            category.file_types.join(", ")
        )));
    }

    let size_mb = file.size_mb();
    if size_mb > category.max_size_mb {
        return Err(AppError::bad_request(format!(
            "File too large. Maximum size for {}: {}MB",
            category.key, category.max_size_mb
        )));
    }

    let non_blank = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    Ok(StoredDocument {
        document_id: uuid::Uuid::new_v4().to_string(),
        filename: file.filename.clone(),
        original_name: file.filename.clone(),
        title: non_blank(&upload.title).unwrap_or_else(|| category.title.to_string()),
        description: non_blank(&upload.description).unwrap_or_else(|| category.description.to_string()),
        category: category.key.to_string(),
        file_type: extension,
        file_size_mb: round2(size_mb),
        event_version: upload.event_version.clone(),
        document_data: BASE64.encode(&file.bytes),
        uploaded_by: uploaded_by.to_string(),
        uploaded_at: BsonDateTime::now(),
        is_public: upload.is_public,
        download_count: 0,
        is_active: true,
        tags: vec![category.key.to_string(), upload.event_version.clone()],
        version: 1,
        checksum: checksum(&file.bytes),
        archived_at: None,
        deleted_by: None,
        deleted_at: None,
        last_downloaded_at: None,
    })
}

/// Stores the document and archives the previous active one for the same category and event
pub async fn upload(
    db: &MongoDB,
    upload: &DocumentUpload,
    file: &UploadedFile,
    uploaded_by: &str,
) -> AppResult<DocumentView> {
    let document = build_document(upload, file, uploaded_by)?;
    let collection = db.collection::<StoredDocument>(DOCUMENTS);

    let archived = collection
        .update_many(
            doc! { "category": &document.category, "eventVersion": &document.event_version, "isActive": true },
            doc! { "$set": { "isActive": false, "archivedAt": BsonDateTime::now() } },
        )
        .await?;
    if archived.modified_count > 0 {
        log::info!("📦 Archived {} previous {} document(s)", archived.modified_count, document.category);
    }

    collection.insert_one(&document).await?;
    log::info!(
        "📄 Document {} uploaded: {} ({} MB)",
        document.document_id,
        document.filename,
        document.file_size_mb
    );
    Ok(DocumentView::summary(document))
}

/// Active document with its payload; counts the download and logs who fetched it
pub async fn download(
    db: &MongoDB,
    document_id: &str,
    ip_address: Option<String>,
    user_agent: Option<String>,
) -> AppResult<DocumentView> {
    let collection = db.collection::<StoredDocument>(DOCUMENTS);
    let mut document = collection
        .find_one(doc! { "documentId": document_id, "isActive": true })
        .await?
        .ok_or_else(|| AppError::not_found("Document not found"))?;

    let now = BsonDateTime::now();
    collection
        .update_one(
            doc! { "documentId": document_id },
            doc! { "$inc": { "downloadCount": 1 }, "$set": { "lastDownloadedAt": now } },
        )
        .await?;

    let entry = DownloadLog {
        download_id: uuid::Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        filename: document.filename.clone(),
        category: document.category.clone(),
        downloaded_at: now,
        user_agent,
        ip_address,
    };
    db.collection::<DownloadLog>(DOWNLOAD_LOGS).insert_one(&entry).await?;

    document.download_count += 1;
    document.last_downloaded_at = Some(now);
    Ok(DocumentView::from(document))
}

async fn list_summaries(db: &MongoDB, filter: Document, limit: i64) -> AppResult<Vec<DocumentView>> {
    let documents: Vec<StoredDocument> = db
        .collection::<StoredDocument>(DOCUMENTS)
        .find(filter)
        .projection(doc! { "documentData": 0 })
        .sort(doc! { "uploadedAt": -1 })
        .limit(limit)
        .await?
        .try_collect()
        .await?;
    Ok(documents.into_iter().map(DocumentView::summary).collect())
}

pub async fn by_category(db: &MongoDB, category: &str, query: &CategoryQuery) -> AppResult<Vec<DocumentView>> {
    let mut filter = doc! { "category": category, "isActive": true };
    if let Some(version) = query.event_version.as_deref().filter(|v| !v.is_empty()) {
        filter.insert("eventVersion", version);
    }
    if let Some(public) = query.is_public {
        filter.insert("isPublic", public);
    }
    list_summaries(db, filter, 50).await
}

pub fn group_by_category(documents: Vec<DocumentView>) -> BTreeMap<String, Vec<DocumentView>> {
    let mut grouped: BTreeMap<String, Vec<DocumentView>> = BTreeMap::new();
    for document in documents {
        grouped.entry(document.category.clone()).or_default().push(document);
    }
    grouped
}

pub async fn public_documents(
    db: &MongoDB,
    event_version: Option<&str>,
) -> AppResult<BTreeMap<String, Vec<DocumentView>>> {
    let mut filter = doc! { "isPublic": true, "isActive": true };
    if let Some(version) = event_version.filter(|v| !v.is_empty()) {
        filter.insert("eventVersion", version);
    }
    Ok(group_by_category(list_summaries(db, filter, 100).await?))
}

pub fn search_filter(query: &SearchQuery) -> Document {
    let mut filter = doc! { "isActive": true, "isPublic": true };
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        filter.insert("category", category);
    }
    if let Some(version) = query.event_version.as_deref().filter(|v| !v.is_empty()) {
        filter.insert("eventVersion", version);
    }
    match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(term) => doc! { "$and": [ { "$text": { "$search": term } }, filter ] },
        None => filter,
    }
}

pub async fn search(db: &MongoDB, query: &SearchQuery) -> AppResult<Vec<DocumentView>> {
    list_summaries(db, search_filter(query), 50).await
}

pub async fn soft_delete(db: &MongoDB, document_id: &str, deleted_by: &str) -> AppResult<String> {
    let now = BsonDateTime::now();
    let result = db
        .collection::<StoredDocument>(DOCUMENTS)
        .update_one(
            doc! { "documentId": document_id, "isActive": true },
            doc! { "$set": { "isActive": false, "deletedBy": deleted_by, "deletedAt": now } },
        )
        .await?;
    if result.matched_count == 0 {
        return Err(AppError::not_found("Document not found"));
    }
    log::info!("🗑️  Document {} deleted by {}", document_id, deleted_by);
    Ok(iso(now))
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CategoryUsage {
    pub count: usize,
    pub downloads: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PeriodCount {
    pub period: String,
    pub count: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DocumentAnalytics {
    pub overview: serde_json::Value,
    pub distributions: serde_json::Value,
    pub trends: serde_json::Value,
}

/// Usage summary over active documents
pub fn analyze(documents: &[StoredDocument]) -> DocumentAnalytics {
    let mut categories: BTreeMap<String, CategoryUsage> = BTreeMap::new();
    let mut versions: BTreeMap<String, usize> = BTreeMap::new();
    let mut file_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut months: BTreeMap<String, usize> = BTreeMap::new();

    for d in documents {
        let usage = categories
            .entry(d.category.clone())
            .or_insert(CategoryUsage { count: 0, downloads: 0 });
        usage.count += 1;
        usage.downloads += d.download_count;
        *versions.entry(d.event_version.clone()).or_insert(0) += 1;
        *file_types.entry(d.file_type.clone()).or_insert(0) += 1;

        let uploaded = to_utc(d.uploaded_at);
        *months
            .entry(format!("{}-{:02}", uploaded.year(), uploaded.month()))
            .or_insert(0) += 1;
    }

    let monthly: Vec<PeriodCount> = months
        .into_iter()
        .rev()
        .take(12)
        .map(|(period, count)| PeriodCount { period, count })
        .collect();

    DocumentAnalytics {
        overview: serde_json::json!({
            "total_documents": documents.len(),
            "total_downloads": documents.iter().map(|d| d.download_count).sum::<i64>(),
            "categories_count": categories.len(),
        }),
        distributions: serde_json::json!({
            "categories": categories,
            "event_versions": versions,
            "file_types": file_types,
        }),
        trends: serde_json::json!({ "monthly_uploads": monthly }),
    }
}

pub async fn analytics(db: &MongoDB) -> AppResult<DocumentAnalytics> {
    let documents: Vec<StoredDocument> = db
        .collection::<StoredDocument>(DOCUMENTS)
        .find(doc! { "isActive": true })
        .projection(doc! { "documentData": 0 })
        .await?
        .try_collect()
        .await?;
    Ok(analyze(&documents))
}

pub async fn download_logs(db: &MongoDB, query: &DownloadLogQuery) -> AppResult<Paginated<DownloadLogView>> {
    let page = PageRequest::new(query.page, query.limit, 50, 200);
    let mut filter = Document::new();
    if let Some(id) = query.document_id.as_deref().filter(|id| !id.is_empty()) {
        filter.insert("documentId", id);
    }

    let collection = db.collection::<DownloadLog>(DOWNLOAD_LOGS);
    let total = collection.count_documents(filter.clone()).await?;
    let logs: Vec<DownloadLog> = collection
        .find(filter)
        .sort(doc! { "downloadedAt": -1 })
        .skip(page.skip())
        .limit(page.limit_i64())
        .await?
        .try_collect()
        .await?;

    Ok(Paginated {
        items: logs.into_iter().map(DownloadLogView::from).collect(),
        pagination: Pagination::new(page, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(category: &str) -> DocumentUpload {
        DocumentUpload {
            category: category.into(),
            event_version: "PM Connect 3.0".into(),
            title: None,
            description: Some("  ".into()),
            is_public: true,
        }
    }

    fn file(name: &str, size: usize) -> UploadedFile {
        UploadedFile {
            filename: name.into(),
            content_type: Some("application/pdf".into()),
            bytes: vec![b'x'; size],
        }
    }

    #[test]
    fn test_build_document_defaults() {
        let document = build_document(&upload("safety_booklet"), &file("Safety.PDF", 1024), "ADMIN001").unwrap();
        assert_eq!(document.title, "Safety Guidelines");
        assert_eq!(document.description, "Comprehensive safety guidelines and protocols");
        assert_eq!(document.file_type, ".pdf");
        assert_eq!(document.tags, vec!["safety_booklet", "PM Connect 3.0"]);
        assert_eq!(document.checksum.len(), 64);
        assert!(document.is_active);
    }

    #[test]
    fn test_build_document_rejections() {
        let err = build_document(&upload("brochure"), &file("a.pdf", 1), "A").unwrap_err();
        assert!(err.to_string().starts_with("Invalid category. Must be one of: agenda"));

        let err = build_document(&upload("certificates"), &file("a.docx", 1), "A").unwrap_err();
        assert_eq!(err.to_string(), "Invalid file type for certificates. Allowed: .pdf");

        let err = build_document(&upload("certificates"), &file("a.pdf", 6 * 1024 * 1024), "A").unwrap_err();
        assert_eq!(err.to_string(), "File too large. Maximum size for certificates: 5MB");
    }

    #[test]
    fn test_search_filter() {
        let query = SearchQuery {
            q: Some("safety".into()),
            category: None,
            event_version: Some("PM Connect 3.0".into()),
        };
        let filter = search_filter(&query);
        let clauses = filter.get_array("$and").unwrap();
        assert_eq!(clauses.len(), 2);

        let plain = search_filter(&SearchQuery { q: None, category: None, event_version: None });
        assert_eq!(plain, doc! { "isActive": true, "isPublic": true });
    }

    #[test]
    fn test_analytics_and_grouping() {
        let mut a = build_document(&upload("agenda"), &file("a.pdf", 10), "A").unwrap();
        a.download_count = 3;
        let b = build_document(&upload("agenda"), &file("b.docx", 10), "A").unwrap();
        let c = build_document(&upload("certificates"), &file("c.pdf", 10), "A").unwrap();

        let analytics = analyze(&[a.clone(), b, c.clone()]);
        assert_eq!(analytics.overview["total_documents"], 3);
        assert_eq!(analytics.overview["total_downloads"], 3);
        assert_eq!(analytics.distributions["categories"]["agenda"]["count"], 2);
        assert_eq!(analytics.distributions["file_types"][".pdf"], 2);

        let grouped = group_by_category(vec![DocumentView::summary(a), DocumentView::summary(c)]);
        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["agenda", "certificates"]);
        assert!(grouped["agenda"][0].document_data.is_none());
    }
}
