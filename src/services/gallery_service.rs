use crate::{
    database::{MongoDB, GALLERY_PHOTOS},
    models::{GalleryPhoto, CURRENT_EVENT, EVENT_VERSIONS, MAX_PHOTOS_PER_EMPLOYEE},
    utils::{upload::UploadedFile, AppError, AppResult},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime};

pub fn check_upload(event_version: &str, file: &UploadedFile, existing: u64) -> AppResult<()> {
    if !file.content_type_starts_with("image/") {
        return Err(AppError::bad_request("File must be an image"));
    }
    if !EVENT_VERSIONS.contains(&event_version) {
        return Err(AppError::bad_request(format!(
            "Invalid event version. Must be one of: {}",
            EVENT_VERSIONS.join(", ")
        )));
    }
    if event_version == CURRENT_EVENT && existing >= MAX_PHOTOS_PER_EMPLOYEE {
        return Err(AppError::bad_request(format!(
            "Maximum {} photos allowed for {}",
            MAX_PHOTOS_PER_EMPLOYEE, CURRENT_EVENT
        )));
    }
    Ok(())
}

pub async fn upload(
    db: &MongoDB,
    employee_id: &str,
    event_version: &str,
    file: &UploadedFile,
) -> AppResult<String> {
    let collection = db.collection::<GalleryPhoto>(GALLERY_PHOTOS);
    let existing = if event_version == CURRENT_EVENT {
        collection
            .count_documents(doc! { "employeeId": employee_id, "eventVersion": CURRENT_EVENT })
            .await?
    } else {
        0
    };
    check_upload(event_version, file, existing)?;

    let photo = GalleryPhoto {
        photo_id: uuid::Uuid::new_v4().to_string(),
        employee_id: employee_id.to_string(),
        image_base64: BASE64.encode(&file.bytes),
        event_version: event_version.to_string(),
        upload_timestamp: BsonDateTime::now(),
    };
    collection.insert_one(&photo).await?;

    log::info!("🖼️  Photo {} uploaded by {} for {}", photo.photo_id, employee_id, event_version);
    Ok(photo.photo_id)
}

pub async fn by_event(db: &MongoDB, event_version: &str) -> AppResult<Vec<GalleryPhoto>> {
    let cursor = db
        .collection::<GalleryPhoto>(GALLERY_PHOTOS)
        .find(doc! { "eventVersion": event_version })
        .sort(doc! { "uploadTimestamp": -1 })
        .limit(1000)
        .await?;
    Ok(cursor.try_collect().await?)
}

pub async fn delete(db: &MongoDB, photo_id: &str) -> AppResult<()> {
    let result = db
        .collection::<GalleryPhoto>(GALLERY_PHOTOS)
        .delete_one(doc! { "photoId": photo_id })
        .await?;
    if result.deleted_count == 0 {
        return Err(AppError::not_found("Photo not found"));
    }
    log::info!("🗑️  Photo {} deleted", photo_id);
    Ok(())
}
