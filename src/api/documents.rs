use crate::api::client_info;
use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::models::{CategoryQuery, DocumentView, DownloadLogQuery, SearchQuery, CURRENT_EVENT};
use crate::services::document_service::{self, DocumentUpload};
use crate::utils::{upload::UploadForm, AppResult};
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuery {
    pub event_version: Option<String>,
}

fn form_flag(value: Option<&str>) -> bool {
    matches!(value.map(str::to_ascii_lowercase).as_deref(), Some("true" | "1" | "yes" | "on"))
}

#[utoipa::path(
    get,
    path = "/api/documents/categories",
    tag = "Documents",
    responses((status = 200, description = "Upload rules per category"))
)]
pub async fn categories() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "categories": document_service::categories()
    }))
}

#[utoipa::path(
    post,
    path = "/api/documents/upload",
    tag = "Documents",
    request_body(
        content_type = "multipart/form-data",
        description = "`file`, `category`, `eventVersion`, optional `title`, `description`, `isPublic`"
    ),
    responses(
        (status = 200, description = "Document stored", body = DocumentView),
        (status = 400, description = "Invalid category, file type or size"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let mut form = UploadForm::from_multipart(payload).await?;
    let file = form.take_file()?;
    let upload = DocumentUpload {
        category: form.require_field("category")?,
        event_version: form.field("eventVersion").unwrap_or(CURRENT_EVENT).to_string(),
        title: form.field("title").map(str::to_string),
        description: form.field("description").map(str::to_string),
        is_public: form.field("isPublic").map_or(true, |v| form_flag(Some(v))),
    };

    let document = document_service::upload(&db, &upload, &file, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Document uploaded successfully",
        "document": document
    })))
}

#[utoipa::path(
    get,
    path = "/api/documents/{document_id}",
    tag = "Documents",
    params(("document_id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document with its base64 payload", body = DocumentView),
        (status = 404, description = "Document not found")
    )
)]
pub async fn download(req: HttpRequest, db: web::Data<MongoDB>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let (ip_address, user_agent) = client_info(&req);
    let document = document_service::download(&db, &path, ip_address, user_agent).await?;
    log::info!("⬇️  Document {} downloaded", document.document_id);
    Ok(HttpResponse::Ok().json(json!({ "success": true, "document": document })))
}

#[utoipa::path(
    get,
    path = "/api/documents/category/{category}",
    tag = "Documents",
    params(
        ("category" = String, Path, description = "Category key"),
        ("eventVersion" = Option<String>, Query, description = "Event filter"),
        ("isPublic" = Option<bool>, Query, description = "Visibility filter")
    ),
    responses((status = 200, description = "Active documents of the category, without payload"))
)]
pub async fn by_category(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    query: web::Query<CategoryQuery>,
) -> AppResult<HttpResponse> {
    let category = path.into_inner();
    let documents = document_service::by_category(&db, &category, &query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "category": category,
        "documents": documents,
        "count": documents.len()
    })))
}

#[utoipa::path(
    get,
    path = "/api/documents/public",
    tag = "Documents",
    params(("eventVersion" = Option<String>, Query, description = "Event filter")),
    responses((status = 200, description = "Public documents grouped by category"))
)]
pub async fn public(db: web::Data<MongoDB>, query: web::Query<PublicQuery>) -> AppResult<HttpResponse> {
    let grouped = document_service::public_documents(&db, query.event_version.as_deref()).await?;
    let total: usize = grouped.values().map(Vec::len).sum();
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "documents": grouped,
        "total_count": total
    })))
}

#[utoipa::path(
    get,
    path = "/api/documents/search",
    tag = "Documents",
    params(
        ("q" = Option<String>, Query, description = "Text search over title, description and filename"),
        ("category" = Option<String>, Query, description = "Category filter"),
        ("eventVersion" = Option<String>, Query, description = "Event filter")
    ),
    responses((status = 200, description = "Matching public documents"))
)]
pub async fn search(db: web::Data<MongoDB>, query: web::Query<SearchQuery>) -> AppResult<HttpResponse> {
    let documents = document_service::search(&db, &query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "query": query.q,
        "documents": documents,
        "count": documents.len()
    })))
}

#[utoipa::path(
    delete,
    path = "/api/documents/{document_id}",
    tag = "Documents",
    params(("document_id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document deactivated"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Document not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let document_id = path.into_inner();
    let deleted_at = document_service::soft_delete(&db, &document_id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Document deleted successfully",
        "document_id": document_id,
        "deleted_at": deleted_at
    })))
}

#[utoipa::path(
    get,
    path = "/api/documents/admin/analytics",
    tag = "Documents",
    responses(
        (status = 200, description = "Usage overview, distributions and monthly uploads"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn analytics(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let analytics = document_service::analytics(&db).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "analytics": analytics })))
}

#[utoipa::path(
    get,
    path = "/api/documents/admin/download-logs",
    tag = "Documents",
    params(
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("limit" = Option<u64>, Query, description = "Page size"),
        ("documentId" = Option<String>, Query, description = "Only this document")
    ),
    responses(
        (status = 200, description = "Download log page"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_logs(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    query: web::Query<DownloadLogQuery>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let page = document_service::download_logs(&db, &query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "logs": page.items,
        "pagination": page.pagination
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, App};

    #[test]
    fn test_form_flag() {
        assert!(form_flag(Some("true")));
        assert!(form_flag(Some("ON")));
        assert!(!form_flag(Some("false")));
        assert!(!form_flag(None));
    }

    #[actix_web::test]
    async fn test_categories_endpoint() {
        let app = actix_test::init_service(App::new().route("/api/documents/categories", web::get().to(categories))).await;
        let req = actix_test::TestRequest::get().uri("/api/documents/categories").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["categories"]["certificates"]["max_size_mb"], json!(5.0));
        assert_eq!(body["categories"].as_object().unwrap().len(), 6);
    }
}
