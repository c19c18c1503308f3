use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;

pub const INVITEES: &str = "invitees";
pub const RESPONSES: &str = "responses";
pub const USERS: &str = "users";
pub const GALLERY_PHOTOS: &str = "gallery_photos";
pub const AGENDAS: &str = "agendas";
pub const CAB_ALLOCATIONS: &str = "cab_allocations";
pub const AUDIT_LOGS: &str = "audit_logs";
pub const FEEDBACK: &str = "feedback";
pub const DOCUMENTS: &str = "documents";
pub const DOWNLOAD_LOGS: &str = "download_logs";
pub const MESSAGE_LOGS: &str = "message_logs";
pub const BULK_MESSAGE_LOGS: &str = "bulk_message_logs";

const DEFAULT_DB_NAME: &str = "pm_connect_db";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// True when a write was rejected by a unique index (E11000)
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::InsertMany(e) => e
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|w| w.code == DUPLICATE_KEY_CODE)),
        _ => false,
    }
}

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

/// Database name from the URI path, e.g. `mongodb://host:27017/pm_connect_db?x=y`
pub fn database_name_from_uri(uri: &str) -> &str {
    let without_scheme = uri.split("://").nth(1).unwrap_or(uri);
    without_scheme
        .split_once('/')
        .map(|(_, rest)| rest.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DB_NAME)
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.app_name = Some("pm-connect-service".to_string());
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));
        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(database_name_from_uri(uri));

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };
        mongodb.ensure_indexes().await;

        Ok(mongodb)
    }

    /// Creates the indexes used by the request paths. Failures are logged
    /// and skipped so a pre-existing conflicting index never blocks startup.
    /// Returns the names of the indexes that were created or confirmed.
    pub async fn ensure_indexes(&self) -> Vec<String> {
        log::info!("🔧 Creating database indexes...");

        let unique = |keys: Document| {
            IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build()
        };
        let plain = |keys: Document| IndexModel::builder().keys(keys).build();

        let plan: Vec<(&str, IndexModel)> = vec![
            (INVITEES, unique(doc! { "employeeId": 1 })),
            (INVITEES, plain(doc! { "hasResponded": 1 })),
            (INVITEES, plain(doc! { "cadre": 1 })),
            (INVITEES, plain(doc! { "projectName": 1 })),
            (INVITEES, plain(doc! { "employeeName": 1 })),
            (RESPONSES, unique(doc! { "employeeId": 1 })),
            (RESPONSES, plain(doc! { "submissionTimestamp": 1 })),
            (RESPONSES, plain(doc! { "requiresAccommodation": 1 })),
            (RESPONSES, plain(doc! { "foodPreference": 1 })),
            (USERS, unique(doc! { "employeeId": 1 })),
            (USERS, plain(doc! { "role": 1 })),
            (USERS, plain(doc! { "isActive": 1 })),
            (USERS, plain(doc! { "lastLogin": 1 })),
            (GALLERY_PHOTOS, plain(doc! { "employeeId": 1, "eventVersion": 1 })),
            (GALLERY_PHOTOS, plain(doc! { "uploadTimestamp": 1 })),
            (CAB_ALLOCATIONS, plain(doc! { "cabNumber": 1 })),
            (CAB_ALLOCATIONS, plain(doc! { "assignedMembers": 1 })),
            (AUDIT_LOGS, plain(doc! { "employeeId": 1 })),
            (AUDIT_LOGS, plain(doc! { "action": 1 })),
            (AUDIT_LOGS, plain(doc! { "timestamp": 1 })),
            (FEEDBACK, unique(doc! { "feedbackId": 1 })),
            (FEEDBACK, plain(doc! { "employeeId": 1 })),
            (FEEDBACK, plain(doc! { "status": 1 })),
            (FEEDBACK, plain(doc! { "submissionTimestamp": -1 })),
            (DOCUMENTS, unique(doc! { "documentId": 1 })),
            (DOCUMENTS, plain(doc! { "category": 1, "eventVersion": 1, "isActive": 1 })),
            (DOCUMENTS, plain(doc! { "isPublic": 1 })),
            (DOCUMENTS, plain(doc! { "uploadedAt": -1 })),
            (
                DOCUMENTS,
                plain(doc! { "title": "text", "description": "text", "filename": "text" }),
            ),
            (DOWNLOAD_LOGS, plain(doc! { "documentId": 1 })),
            (DOWNLOAD_LOGS, plain(doc! { "downloadedAt": -1 })),
            (MESSAGE_LOGS, plain(doc! { "phoneNumber": 1 })),
            (MESSAGE_LOGS, plain(doc! { "sentAt": -1 })),
        ];

        let mut created = Vec::new();
        for (collection, model) in plan {
            let label = format!("{}({})", collection, model.keys.keys().cloned().collect::<Vec<_>>().join(", "));
            match self.collection::<Document>(collection).create_index(model).await {
                Ok(_) => {
                    log::debug!("   ✅ Index ready: {}", label);
                    created.push(label);
                }
                Err(e) => log::warn!("   ⚠️  Index {} skipped: {}", label, e),
            }
        }

        log::info!("✅ Database indexes ready ({} total)", created.len());
        created
    }

    pub async fn ping(&self) -> bool {
        self.db.run_command(doc! { "ping": 1 }).await.is_ok()
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_name_from_uri() {
        assert_eq!(database_name_from_uri("mongodb://localhost:27017/events"), "events");
        assert_eq!(
            database_name_from_uri("mongodb+srv://u:p@cluster.net/pmc?retryWrites=true"),
            "pmc"
        );
        assert_eq!(database_name_from_uri("mongodb://localhost:27017"), DEFAULT_DB_NAME);
        assert_eq!(database_name_from_uri("mongodb://localhost:27017/?w=1"), DEFAULT_DB_NAME);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/pm_connect_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();
        assert!(db.ping().await);
    }
}
