use crate::middleware::Claims;
use crate::services::media_service::{
    parse_tags, ImageUpload, ImageUrlQuery, SignedParamsRequest, SignedUploadParams, VideoUpload,
    DEFAULT_IMAGE_FOLDER, DEFAULT_VIDEO_FOLDER,
};
use crate::services::CloudinaryClient;
use crate::utils::{upload::UploadForm, AppResult};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
}

fn default_resource_type() -> String {
    "image".to_string()
}

#[utoipa::path(
    post,
    path = "/api/media/images",
    tag = "Media",
    request_body(content_type = "multipart/form-data", description = "Image `file`, optional `folder` and comma separated `tags`"),
    responses(
        (status = 200, description = "Image uploaded", body = ImageUpload),
        (status = 400, description = "Not an image"),
        (status = 403, description = "Admin access required"),
        (status = 502, description = "Cloudinary rejected the upload")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_image(
    cloudinary: web::Data<CloudinaryClient>,
    claims: web::ReqData<Claims>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let mut form = UploadForm::from_multipart(payload).await?;
    let file = form.take_file()?;
    let folder = form.field("folder").unwrap_or(DEFAULT_IMAGE_FOLDER).to_string();
    let tags = parse_tags(form.field("tags"), &["pm_connect", "event"]);

    let image = cloudinary.upload_image(&file, &folder, &tags).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "image": image })))
}

#[utoipa::path(
    post,
    path = "/api/media/videos",
    tag = "Media",
    request_body(content_type = "multipart/form-data", description = "Video `file`, optional `folder` and comma separated `tags`"),
    responses(
        (status = 200, description = "Video uploaded with HLS renditions", body = VideoUpload),
        (status = 400, description = "Not a video"),
        (status = 403, description = "Admin access required"),
        (status = 502, description = "Cloudinary rejected the upload")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    cloudinary: web::Data<CloudinaryClient>,
    claims: web::ReqData<Claims>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let mut form = UploadForm::from_multipart(payload).await?;
    let file = form.take_file()?;
    let folder = form.field("folder").unwrap_or(DEFAULT_VIDEO_FOLDER).to_string();
    let tags = parse_tags(form.field("tags"), &["pm_connect", "event", "video"]);

    let video = cloudinary.upload_video(&file, &folder, &tags).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "video": video })))
}

#[utoipa::path(
    get,
    path = "/api/media/url/{public_id}",
    tag = "Media",
    params(
        ("public_id" = String, Path, description = "Cloudinary public id, may contain folders"),
        ("width" = Option<u32>, Query, description = "Target width"),
        ("height" = Option<u32>, Query, description = "Target height"),
        ("crop" = Option<String>, Query, description = "Crop mode, default fill"),
        ("quality" = Option<String>, Query, description = "Default auto:good"),
        ("format" = Option<String>, Query, description = "Default auto")
    ),
    responses((status = 200, description = "Transformation URL"))
)]
pub async fn image_url(
    cloudinary: web::Data<CloudinaryClient>,
    path: web::Path<String>,
    query: web::Query<ImageUrlQuery>,
) -> HttpResponse {
    let public_id = path.into_inner();
    let url = cloudinary.image_url(&public_id, &query);
    HttpResponse::Ok().json(json!({
        "success": true,
        "public_id": public_id,
        "url": url
    }))
}

#[utoipa::path(
    delete,
    path = "/api/media/{public_id}",
    tag = "Media",
    params(
        ("public_id" = String, Path, description = "Cloudinary public id"),
        ("resource_type" = Option<String>, Query, description = "image (default) or video")
    ),
    responses(
        (status = 200, description = "Destroy result"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete(
    cloudinary: web::Data<CloudinaryClient>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    query: web::Query<DeleteQuery>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let result = cloudinary.delete(&path, &query.resource_type).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[utoipa::path(
    post,
    path = "/api/media/signed-params",
    tag = "Media",
    request_body = SignedParamsRequest,
    responses((status = 200, description = "Parameters for a direct client upload", body = SignedUploadParams)),
    security(("bearer_auth" = []))
)]
pub async fn signed_params(
    cloudinary: web::Data<CloudinaryClient>,
    claims: web::ReqData<Claims>,
    request: web::Json<SignedParamsRequest>,
) -> HttpResponse {
    log::info!("✍️  Signed upload params issued to {}", claims.sub);
    let params = cloudinary.signed_upload_params(&request, chrono::Utc::now().timestamp());
    HttpResponse::Ok().json(json!({ "success": true, "upload_params": params }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_image_url_keeps_folder_in_public_id() {
        let client = CloudinaryClient::new(AppConfig::for_tests().cloudinary);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(client))
                .route("/api/media/url/{public_id:.*}", web::get().to(image_url)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/media/url/pm_connect/stage?width=400&height=300")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["public_id"], json!("pm_connect/stage"));
        assert_eq!(
            body["url"],
            json!("https://res.cloudinary.com/demo/image/upload/c_fill,w_400,h_300/q_auto:good/f_auto/pm_connect/stage")
        );
    }
}
