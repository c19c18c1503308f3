use crate::utils::time::{iso, iso_opt};
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

/// Upload rules for a document category
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DocumentCategory {
    #[serde(skip)]
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub file_types: &'static [&'static str],
    pub max_size_mb: f64,
}

pub const DOCUMENT_CATEGORIES: [DocumentCategory; 6] = [
    DocumentCategory {
        key: "agenda",
        title: "Event Agenda",
        description: "Complete agenda for PM Connect events",
        file_types: &[".pdf", ".docx"],
        max_size_mb: 10.0,
    },
    DocumentCategory {
        key: "safety_booklet",
        title: "Safety Guidelines",
        description: "Comprehensive safety guidelines and protocols",
        file_types: &[".pdf", ".docx"],
        max_size_mb: 15.0,
    },
    DocumentCategory {
        key: "quality_booklet",
        title: "Quality Standards",
        description: "Quality management standards and procedures",
        file_types: &[".pdf", ".docx"],
        max_size_mb: 15.0,
    },
    DocumentCategory {
        key: "travel_info",
        title: "Travel Information",
        description: "Travel guidelines and accommodation details",
        file_types: &[".pdf", ".docx"],
        max_size_mb: 8.0,
    },
    DocumentCategory {
        key: "event_presentation",
        title: "Event Presentations",
        description: "Presentations and materials from the event",
        file_types: &[".pdf", ".pptx", ".docx"],
        max_size_mb: 25.0,
    },
    DocumentCategory {
        key: "certificates",
        title: "Certificates",
        description: "Participation and achievement certificates",
        file_types: &[".pdf"],
        max_size_mb: 5.0,
    },
];

pub fn find_category(key: &str) -> Option<&'static DocumentCategory> {
    DOCUMENT_CATEGORIES.iter().find(|c| c.key == key)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub document_id: String,
    pub filename: String,
    pub original_name: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub file_type: String,
    #[serde(rename = "fileSizeMB")]
    pub file_size_mb: f64,
    pub event_version: String,
    /// Base64 payload; left out by list queries
    #[serde(default)]
    pub document_data: String,
    pub uploaded_by: String,
    pub uploaded_at: BsonDateTime,
    pub is_public: bool,
    #[serde(default)]
    pub download_count: i64,
    pub is_active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_version")]
    pub version: i32,
    pub checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<BsonDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<BsonDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_downloaded_at: Option<BsonDateTime>,
}

fn default_version() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub document_id: String,
    pub filename: String,
    pub original_name: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub file_type: String,
    #[serde(rename = "fileSizeMB")]
    pub file_size_mb: f64,
    pub event_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_data: Option<String>,
    pub uploaded_by: String,
    pub uploaded_at: String,
    pub is_public: bool,
    pub download_count: i64,
    pub tags: Vec<String>,
    pub version: i32,
    pub checksum: String,
    pub last_downloaded_at: Option<String>,
}

impl DocumentView {
    /// Metadata-only view used by listings
    pub fn summary(doc: StoredDocument) -> Self {
        let mut view = Self::from(doc);
        view.document_data = None;
        view
    }
}

impl From<StoredDocument> for DocumentView {
    fn from(d: StoredDocument) -> Self {
        Self {
            document_id: d.document_id,
            filename: d.filename,
            original_name: d.original_name,
            title: d.title,
            description: d.description,
            category: d.category,
            file_type: d.file_type,
            file_size_mb: d.file_size_mb,
            event_version: d.event_version,
            document_data: Some(d.document_data).filter(|s| !s.is_empty()),
            uploaded_by: d.uploaded_by,
            uploaded_at: iso(d.uploaded_at),
            is_public: d.is_public,
            download_count: d.download_count,
            tags: d.tags,
            version: d.version,
            checksum: d.checksum,
            last_downloaded_at: iso_opt(d.last_downloaded_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLog {
    pub download_id: String,
    pub document_id: String,
    pub filename: String,
    pub category: String,
    pub downloaded_at: BsonDateTime,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLogView {
    pub download_id: String,
    pub document_id: String,
    pub filename: String,
    pub category: String,
    pub downloaded_at: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl From<DownloadLog> for DownloadLogView {
    fn from(l: DownloadLog) -> Self {
        Self {
            download_id: l.download_id,
            document_id: l.document_id,
            filename: l.filename,
            category: l.category,
            downloaded_at: iso(l.downloaded_at),
            user_agent: l.user_agent,
            ip_address: l.ip_address,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    pub event_version: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub event_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLogQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub document_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_lookup() {
        let c = find_category("certificates").unwrap();
        assert_eq!(c.file_types, &[".pdf"]);
        assert_eq!(c.max_size_mb, 5.0);
        assert!(find_category("brochure").is_none());
    }
}
