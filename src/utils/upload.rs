use crate::utils::error::{AppError, AppResult};
use actix_multipart::Multipart;
use futures::TryStreamExt;
use std::collections::HashMap;

/// Upper bound for a single multipart request (largest document category is 25 MB)
pub const MAX_UPLOAD_BYTES: usize = 30 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Lower-cased extension including the dot, e.g. `.csv`
    pub fn extension(&self) -> String {
        self.filename
            .rfind('.')
            .map(|idx| self.filename[idx..].to_lowercase())
            .unwrap_or_default()
    }

    pub fn has_extension(&self, allowed: &[&str]) -> bool {
        let ext = self.extension();
        allowed.iter().any(|a| *a == ext)
    }

    pub fn content_type_starts_with(&self, prefix: &str) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.starts_with(prefix))
            .unwrap_or(false)
    }

    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / (1024.0 * 1024.0)
    }
}

/// A multipart form split into its text fields and its (single) file part.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    pub async fn from_multipart(mut payload: Multipart) -> AppResult<Self> {
        let mut form = UploadForm::default();
        let mut total = 0usize;

        while let Some(mut field) = payload
            .try_next()
            .await
            .map_err(|e| AppError::bad_request(format!("Invalid multipart payload: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(|f| f.to_string());
            let content_type = field.content_type().map(|m| m.to_string());

            let mut bytes = Vec::new();
            while let Some(chunk) = field
                .try_next()
                .await
                .map_err(|e| AppError::bad_request(format!("Failed to read upload: {}", e)))?
            {
                total += chunk.len();
                if total > MAX_UPLOAD_BYTES {
                    return Err(AppError::bad_request("Upload exceeds the maximum request size"));
                }
                bytes.extend_from_slice(&chunk);
            }

            match filename {
                Some(filename) => {
                    form.file = Some(UploadedFile {
                        filename,
                        content_type,
                        bytes,
                    });
                }
                None => {
                    let value = String::from_utf8_lossy(&bytes).trim().to_string();
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn require_field(&self, name: &str) -> AppResult<String> {
        self.field(name)
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::bad_request(format!("Field '{}' is required", name)))
    }

    pub fn take_file(&mut self) -> AppResult<UploadedFile> {
        self.file
            .take()
            .ok_or_else(|| AppError::bad_request("Field 'file' is required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, ct: Option<&str>) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            content_type: ct.map(|s| s.to_string()),
            bytes: vec![0; 1024 * 1024],
        }
    }

    #[test]
    fn test_extension_checks() {
        let f = file("Roster.XLSX", None);
        assert_eq!(f.extension(), ".xlsx");
        assert!(f.has_extension(&[".csv", ".xlsx"]));
        assert!(!file("notes", None).has_extension(&[".csv"]));
    }

    #[test]
    fn test_content_type_and_size() {
        let f = file("p.png", Some("image/png"));
        assert!(f.content_type_starts_with("image/"));
        assert!(!file("p.png", None).content_type_starts_with("image/"));
        assert_eq!(f.size_mb(), 1.0);
    }

    #[test]
    fn test_require_field_rejects_blank() {
        let mut form = UploadForm::default();
        form.fields.insert("title".into(), String::new());
        assert!(form.require_field("title").is_err());
        form.fields.insert("title".into(), "Day 1".into());
        assert_eq!(form.require_field("title").unwrap(), "Day 1");
    }
}
