use crate::{
    config::CloudinaryConfig,
    utils::{crypto::sign_params, upload::UploadedFile, AppError, AppResult},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DELETABLE_RESOURCE_TYPES: [&str; 3] = ["image", "video", "raw"];
const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const CLOUDINARY_DELIVERY_BASE: &str = "https://res.cloudinary.com";

pub const DEFAULT_IMAGE_FOLDER: &str = "pm_connect";
pub const DEFAULT_VIDEO_FOLDER: &str = "pm_connect/videos";

/// Raw upload answer from Cloudinary; only the fields we pass on
#[derive(Debug, Deserialize)]
struct CloudinaryUpload {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    format: String,
    #[serde(default)]
    bytes: u64,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    version: u64,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CloudinaryError {
    error: CloudinaryErrorBody,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    message: String,
}

#[derive(Debug, Serialize, PartialEq, utoipa::ToSchema)]
pub struct ImageUpload {
    pub public_id: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub bytes: u64,
    pub created_at: String,
    pub version: u64,
}

#[derive(Debug, Serialize, PartialEq, utoipa::ToSchema)]
pub struct StreamingUrls {
    pub hls_hd: String,
    pub hls_sd: String,
    pub mp4_fallback: String,
}

#[derive(Debug, Serialize, PartialEq, utoipa::ToSchema)]
pub struct VideoUpload {
    pub public_id: String,
    pub url: String,
    pub duration: Option<f64>,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub bytes: u64,
    pub streaming_urls: StreamingUrls,
    pub created_at: String,
}

#[derive(Debug, Serialize, PartialEq, utoipa::ToSchema)]
pub struct DeleteResult {
    pub success: bool,
    pub public_id: String,
    pub result: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageUrlQuery {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop: Option<String>,
    pub quality: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignedParamsRequest {
    #[serde(default = "default_folder")]
    pub folder: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
}

fn default_folder() -> String {
    DEFAULT_IMAGE_FOLDER.to_string()
}

fn default_resource_type() -> String {
    "auto".to_string()
}

/// Signed client-side upload parameters
#[derive(Debug, Serialize, PartialEq, utoipa::ToSchema)]
pub struct SignedUploadParams {
    pub timestamp: i64,
    pub folder: String,
    pub tags: String,
    pub resource_type: String,
    pub quality: String,
    pub format: String,
    pub signature: String,
    pub api_key: String,
    pub cloud_name: String,
}

/// Tags from a comma separated form field, falling back to `defaults`
pub fn parse_tags(raw: Option<&str>, defaults: &[&str]) -> Vec<String> {
    let tags: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if tags.is_empty() {
        defaults.iter().map(|t| t.to_string()).collect()
    } else {
        tags
    }
}

/// Cloudinary REST client (signed uploads, deletes, delivery URLs)
#[derive(Clone)]
pub struct CloudinaryClient {
    config: CloudinaryConfig,
    api_base: String,
    client: reqwest::Client,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self::with_api_base(config, CLOUDINARY_API_BASE)
    }

    pub fn with_api_base(config: CloudinaryConfig, api_base: &str) -> Self {
        Self {
            config,
            api_base: api_base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn ensure_configured(&self) -> AppResult<()> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(AppError::Upstream("Cloudinary credentials are not configured".to_string()))
        }
    }

    /// Adds api_key, timestamp and signature to a parameter set. The file
    /// payload is never part of the signature.
    pub fn signed(&self, mut params: BTreeMap<String, String>, timestamp: i64) -> BTreeMap<String, String> {
        params.insert("timestamp".to_string(), timestamp.to_string());
        let file = params.remove("file");
        let signature = sign_params(&params, &self.config.api_secret, self.config.signature_algorithm);
        if let Some(file) = file {
            params.insert("file".to_string(), file);
        }
        params.insert("signature".to_string(), signature);
        params.insert("api_key".to_string(), self.config.api_key.clone());
        params
    }

    async fn post_signed<T: for<'de> Deserialize<'de>>(
        &self,
        resource_type: &str,
        action: &str,
        params: BTreeMap<String, String>,
    ) -> AppResult<T> {
        self.ensure_configured()?;
        let url = format!("{}/{}/{}/{}", self.api_base, self.config.cloud_name, resource_type, action);
        let body = self.signed(params, Utc::now().timestamp());

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<CloudinaryError>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| status.to_string());
            log::error!("❌ Cloudinary {} {} failed: {}", resource_type, action, message);
            return Err(AppError::Upstream(format!("Cloudinary error: {}", message)));
        }
        Ok(response.json::<T>().await?)
    }

    fn data_uri(file: &UploadedFile, fallback_type: &str) -> String {
        format!(
            "data:{};base64,{}",
            file.content_type.as_deref().unwrap_or(fallback_type),
            BASE64.encode(&file.bytes)
        )
    }

    pub async fn upload_image(&self, file: &UploadedFile, folder: &str, tags: &[String]) -> AppResult<ImageUpload> {
        if !file.content_type_starts_with("image/") {
            return Err(AppError::bad_request("Only image files are allowed"));
        }
        log::info!("☁️  Uploading image {} to {}", file.filename, folder);

        let mut params = BTreeMap::new();
        params.insert("folder".to_string(), folder.to_string());
        params.insert("tags".to_string(), tags.join(","));
        params.insert("transformation".to_string(), "q_auto:good/f_auto".to_string());
        params.insert("overwrite".to_string(), "false".to_string());
        params.insert("unique_filename".to_string(), "true".to_string());
        params.insert("file".to_string(), Self::data_uri(file, "image/jpeg"));

        let uploaded: CloudinaryUpload = self.post_signed("image", "upload", params).await?;
        Ok(ImageUpload {
            public_id: uploaded.public_id,
            url: uploaded.secure_url,
            width: uploaded.width,
            height: uploaded.height,
            format: uploaded.format,
            bytes: uploaded.bytes,
            created_at: uploaded.created_at,
            version: uploaded.version.max(1),
        })
    }

    pub fn streaming_urls(&self, public_id: &str, fallback: &str) -> StreamingUrls {
        let base = format!("{}/{}/video/upload", CLOUDINARY_DELIVERY_BASE, self.config.cloud_name);
        StreamingUrls {
            hls_hd: format!("{}/sp_hd/{}.m3u8", base, public_id),
            hls_sd: format!("{}/sp_sd/{}.m3u8", base, public_id),
            mp4_fallback: fallback.to_string(),
        }
    }

    /// Video upload with eager HLS renditions (hd and sd)
    pub async fn upload_video(&self, file: &UploadedFile, folder: &str, tags: &[String]) -> AppResult<VideoUpload> {
        if !file.content_type_starts_with("video/") {
            return Err(AppError::bad_request("Only video files are allowed"));
        }
        log::info!("🎬 Uploading video {} to {} ({:.1} MB)", file.filename, folder, file.size_mb());

        let mut params = BTreeMap::new();
        params.insert("folder".to_string(), folder.to_string());
        params.insert("tags".to_string(), tags.join(","));
        params.insert("overwrite".to_string(), "false".to_string());
        params.insert("unique_filename".to_string(), "true".to_string());
        params.insert("eager".to_string(), "sp_hd/m3u8|sp_sd/m3u8".to_string());
        params.insert("eager_async".to_string(), "true".to_string());
        params.insert("file".to_string(), Self::data_uri(file, "video/mp4"));

        let uploaded: CloudinaryUpload = self.post_signed("video", "upload", params).await?;
        Ok(VideoUpload {
            streaming_urls: self.streaming_urls(&uploaded.public_id, &uploaded.secure_url),
            public_id: uploaded.public_id,
            url: uploaded.secure_url,
            duration: uploaded.duration,
            width: uploaded.width,
            height: uploaded.height,
            format: uploaded.format,
            bytes: uploaded.bytes,
            created_at: uploaded.created_at,
        })
    }

    pub async fn delete(&self, public_id: &str, resource_type: &str) -> AppResult<DeleteResult> {
        if !DELETABLE_RESOURCE_TYPES.contains(&resource_type) {
            return Err(AppError::bad_request(format!(
                "resource_type must be one of: {}",
                DELETABLE_RESOURCE_TYPES.join(", ")
            )));
        }

        #[derive(Deserialize)]
        struct Destroyed {
            result: String,
        }

        let mut params = BTreeMap::new();
        params.insert("public_id".to_string(), public_id.to_string());
        let destroyed: Destroyed = self.post_signed(resource_type, "destroy", params).await?;

        log::info!("🗑️  Cloudinary {} {}: {}", resource_type, public_id, destroyed.result);
        Ok(DeleteResult {
            success: destroyed.result == "ok",
            public_id: public_id.to_string(),
            result: destroyed.result,
        })
    }

    /// Delivery URL with resize (optional), quality and format transformations
    pub fn image_url(&self, public_id: &str, query: &ImageUrlQuery) -> String {
        let mut steps = Vec::new();
        if query.width.is_some() || query.height.is_some() {
            let mut resize = vec![format!("c_{}", query.crop.as_deref().unwrap_or("fill"))];
            if let Some(w) = query.width {
                resize.push(format!("w_{}", w));
            }
            if let Some(h) = query.height {
                resize.push(format!("h_{}", h));
            }
            steps.push(resize.join(","));
        }
        steps.push(format!("q_{}", query.quality.as_deref().unwrap_or("auto:good")));
        steps.push(format!("f_{}", query.format.as_deref().unwrap_or("auto")));

        format!(
            "{}/{}/image/upload/{}/{}",
            CLOUDINARY_DELIVERY_BASE,
            self.config.cloud_name,
            steps.join("/"),
            public_id
        )
    }

    pub fn signed_upload_params(&self, request: &SignedParamsRequest, timestamp: i64) -> SignedUploadParams {
        let tags = request.tags.join(",");
        let mut params = BTreeMap::new();
        params.insert("timestamp".to_string(), timestamp.to_string());
        params.insert("folder".to_string(), request.folder.clone());
        params.insert("tags".to_string(), tags.clone());
        params.insert("resource_type".to_string(), request.resource_type.clone());
        params.insert("quality".to_string(), "auto:good".to_string());
        params.insert("format".to_string(), "auto".to_string());

        SignedUploadParams {
            timestamp,
            folder: request.folder.clone(),
            tags,
            resource_type: request.resource_type.clone(),
            quality: "auto:good".to_string(),
            format: "auto".to_string(),
            signature: sign_params(&params, &self.config.api_secret, self.config.signature_algorithm),
            api_key: self.config.api_key.clone(),
            cloud_name: self.config.cloud_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> CloudinaryClient {
        CloudinaryClient::with_api_base(AppConfig::for_tests().cloudinary, base)
    }

    fn image() -> UploadedFile {
        UploadedFile {
            filename: "stage.png".into(),
            content_type: Some("image/png".into()),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_image_url_transformations() {
        let c = client(CLOUDINARY_API_BASE);
        let plain = c.image_url("pm_connect/stage", &ImageUrlQuery::default());
        assert_eq!(plain, "https://res.cloudinary.com/demo/image/upload/q_auto:good/f_auto/pm_connect/stage");

        let resized = c.image_url(
            "stage",
            &ImageUrlQuery {
                width: Some(300),
                height: Some(200),
                crop: Some("thumb".into()),
                ..Default::default()
            },
        );
        assert_eq!(resized, "https://res.cloudinary.com/demo/image/upload/c_thumb,w_300,h_200/q_auto:good/f_auto/stage");
    }

    #[test]
    fn test_signed_params_are_deterministic() {
        let c = client(CLOUDINARY_API_BASE);
        let request = SignedParamsRequest {
            folder: "pm_connect".into(),
            tags: vec!["gallery".into(), "day1".into()],
            resource_type: "image".into(),
        };
        let a = c.signed_upload_params(&request, 1_700_000_000);
        let b = c.signed_upload_params(&request, 1_700_000_000);
        assert_eq!(a, b);
        assert_eq!(a.tags, "gallery,day1");
        assert_eq!(a.signature.len(), 40);
        assert_ne!(a.signature, c.signed_upload_params(&request, 1_700_000_001).signature);
    }

    #[test]
    fn test_file_payload_is_not_signed() {
        let c = client(CLOUDINARY_API_BASE);
        let mut with_file = BTreeMap::new();
        with_file.insert("folder".to_string(), "pm_connect".to_string());
        with_file.insert("file".to_string(), "data:image/png;base64,AQID".to_string());
        let mut without = with_file.clone();
        without.remove("file");

        let a = c.signed(with_file, 42);
        let b = c.signed(without, 42);
        assert_eq!(a["signature"], b["signature"]);
        assert_eq!(a["api_key"], "key");
        assert!(a.contains_key("file"));
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(Some(" a, ,b "), &["x"]), vec!["a", "b"]);
        assert_eq!(parse_tags(None, &["pm_connect", "auto_upload"]), vec!["pm_connect", "auto_upload"]);
    }

    #[tokio::test]
    async fn test_upload_image_against_mock() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "pm_connect/stage",
                "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/pm_connect/stage.png",
                "width": 640,
                "height": 480,
                "format": "png",
                "bytes": 3,
                "created_at": "2025-03-14T09:15:00Z",
                "version": 1
            })))
            .mount(&server)
            .await;

        let uploaded = client(&server.uri())
            .upload_image(&image(), DEFAULT_IMAGE_FOLDER, &["pm_connect".to_string()])
            .await
            .unwrap();
        assert_eq!(uploaded.public_id, "pm_connect/stage");
        assert_eq!(uploaded.width, 640);
    }

    #[tokio::test]
    async fn test_upstream_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/destroy"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(serde_json::json!({ "error": { "message": "Invalid Signature" } })),
            )
            .mount(&server)
            .await;

        let err = client(&server.uri()).delete("stage", "image").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(ref m) if m.contains("Invalid Signature")));
    }

    #[tokio::test]
    async fn test_delete_rejects_unknown_resource_type() {
        let server = MockServer::start().await;
        let c = client(&server.uri());

        for resource_type in ["../admin", "image/upload", "authenticated"] {
            let err = c.delete("pm_connect/stage", resource_type).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{}", resource_type);
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_image_rejected_before_upload() {
        let mut file = image();
        file.content_type = Some("video/mp4".into());
        let err = client("http://127.0.0.1:9").upload_image(&file, "f", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
