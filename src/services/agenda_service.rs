use crate::{
    database::{MongoDB, AGENDAS},
    models::Agenda,
    utils::{upload::UploadedFile, AppError, AppResult},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use mongodb::bson::{doc, DateTime as BsonDateTime};

pub fn agenda_from_upload(title: &str, file: &UploadedFile) -> AppResult<Agenda> {
    if !file.has_extension(&[".pdf"]) {
        return Err(AppError::bad_request("File must be PDF format"));
    }
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("Agenda title is required"));
    }

    Ok(Agenda {
        agenda_id: uuid::Uuid::new_v4().to_string(),
        agenda_title: title.to_string(),
        pdf_base64: BASE64.encode(&file.bytes),
        upload_timestamp: BsonDateTime::now(),
    })
}

/// Stores a new agenda; only one agenda exists at a time
pub async fn replace(db: &MongoDB, title: &str, file: &UploadedFile) -> AppResult<String> {
    let agenda = agenda_from_upload(title, file)?;
    let collection = db.collection::<Agenda>(AGENDAS);

    collection.delete_many(doc! {}).await?;
    collection.insert_one(&agenda).await?;

    log::info!("📄 Agenda '{}' uploaded ({:.2} MB)", agenda.agenda_title, file.size_mb());
    Ok(agenda.agenda_id)
}

pub async fn current(db: &MongoDB) -> AppResult<Option<Agenda>> {
    Ok(db.collection::<Agenda>(AGENDAS).find_one(doc! {}).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            filename: name.into(),
            content_type: Some("application/pdf".into()),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    #[test]
    fn test_pdf_is_encoded() {
        let agenda = agenda_from_upload(" Day 1 ", &file("Agenda.PDF")).unwrap();
        assert_eq!(agenda.agenda_title, "Day 1");
        assert_eq!(agenda.pdf_base64, "JVBERi0xLjQ=");
    }

    #[test]
    fn test_non_pdf_rejected() {
        let err = agenda_from_upload("Day 1", &file("agenda.docx")).unwrap_err();
        assert_eq!(err.to_string(), "File must be PDF format");
    }
}
