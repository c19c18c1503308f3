use crate::utils::time::iso;
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

pub const CURRENT_EVENT: &str = "PM Connect 3.0";
pub const EVENT_VERSIONS: [&str; 3] = ["PM Connect 1.0", "PM Connect 2.0", CURRENT_EVENT];
pub const MAX_PHOTOS_PER_EMPLOYEE: u64 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPhoto {
    pub photo_id: String,
    pub employee_id: String,
    pub image_base64: String,
    pub event_version: String,
    pub upload_timestamp: BsonDateTime,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPhotoView {
    pub photo_id: String,
    pub employee_id: String,
    pub image_base64: String,
    pub event_version: String,
    pub upload_timestamp: String,
}

impl From<GalleryPhoto> for GalleryPhotoView {
    fn from(p: GalleryPhoto) -> Self {
        Self {
            photo_id: p.photo_id,
            employee_id: p.employee_id,
            image_base64: p.image_base64,
            event_version: p.event_version,
            upload_timestamp: iso(p.upload_timestamp),
        }
    }
}
