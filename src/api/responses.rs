use crate::database::MongoDB;
use crate::models::{ResponseFilter, ResponseView, SubmitResponseRequest, FLIGHT_TIME_OPTIONS};
use crate::services::{dashboard_service, response_service};
use crate::utils::{cache::TtlCache, AppResult};
use actix_web::{web, HttpResponse};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/responses",
    tag = "Responses",
    request_body = SubmitResponseRequest,
    responses(
        (status = 200, description = "RSVP stored"),
        (status = 400, description = "Duplicate response or invalid fields"),
        (status = 404, description = "Employee not found in invitee list")
    )
)]
pub async fn submit(
    db: web::Data<MongoDB>,
    cache: web::Data<TtlCache>,
    request: web::Json<SubmitResponseRequest>,
) -> AppResult<HttpResponse> {
    log::info!("📝 POST /responses - employee: {}", request.employee_id);
    let response_id = response_service::submit(&db, &request).await?;
    dashboard_service::invalidate(&cache);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Response submitted successfully",
        "responseId": response_id
    })))
}

#[utoipa::path(
    get,
    path = "/api/responses",
    tag = "Responses",
    responses((status = 200, description = "Every RSVP", body = [ResponseView]))
)]
pub async fn list(db: web::Data<MongoDB>) -> AppResult<HttpResponse> {
    let responses: Vec<ResponseView> = response_service::list_all(&db)
        .await?
        .into_iter()
        .map(ResponseView::from)
        .collect();
    Ok(HttpResponse::Ok().json(responses))
}

#[utoipa::path(
    get,
    path = "/api/responses/paginated",
    tag = "Responses",
    params(
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("limit" = Option<u64>, Query, description = "Page size"),
        ("foodPreference" = Option<String>, Query, description = "Veg, Non-Veg or Not Required"),
        ("requiresAccommodation" = Option<bool>, Query, description = "Accommodation flag")
    ),
    responses((status = 200, description = "One page of responses joined with the roster"))
)]
pub async fn paginated(db: web::Data<MongoDB>, query: web::Query<ResponseFilter>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(response_service::list_paginated(&db, &query).await?))
}

#[utoipa::path(
    get,
    path = "/api/responses/export",
    tag = "Responses",
    responses((status = 200, description = "Base64 xlsx, or a message when there is nothing to export"))
)]
pub async fn export(db: web::Data<MongoDB>) -> AppResult<HttpResponse> {
    match response_service::export_xlsx(&db).await? {
        Some(export) => Ok(HttpResponse::Ok().json(export)),
        None => Ok(HttpResponse::Ok().json(json!({ "message": "No responses to export" }))),
    }
}

#[utoipa::path(
    get,
    path = "/api/flight/preferences/options",
    tag = "Responses",
    responses((status = 200, description = "Selectable flight windows"))
)]
pub async fn flight_options() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "departure_time_options": FLIGHT_TIME_OPTIONS,
        "arrival_time_options": FLIGHT_TIME_OPTIONS
    }))
}

#[utoipa::path(
    get,
    path = "/api/responses/flight-analysis",
    tag = "Responses",
    responses((status = 200, description = "Flight preference breakdown"))
)]
pub async fn flight_analysis(db: web::Data<MongoDB>) -> AppResult<HttpResponse> {
    let analysis = response_service::flight_analysis(&db).await?;
    Ok(HttpResponse::Ok().json(json!({ "analysis": analysis })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_flight_options_lists_every_window() {
        let app = test::init_service(
            App::new().route("/api/flight/preferences/options", web::get().to(flight_options)),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/flight/preferences/options").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let departures = body["departure_time_options"].as_array().unwrap();
        assert_eq!(departures.len(), 6);
        assert_eq!(departures[0]["value"], json!("Early Morning"));
        assert_eq!(departures[0]["time_range"], json!("5:00 AM - 8:00 AM"));
        assert_eq!(body["arrival_time_options"], body["departure_time_options"]);
    }
}
