use crate::services::RequestMetrics;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub http_errors_total: u64,
}

pub fn prometheus_text(requests: u64, errors: u64) -> String {
    format!(
        "# HELP http_requests_total Total number of HTTP requests\n\
         # TYPE http_requests_total counter\n\
         http_requests_total {}\n\
         \n\
         # HELP http_errors_total Total number of HTTP errors\n\
         # TYPE http_errors_total counter\n\
         http_errors_total {}\n",
        requests, errors
    )
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus text exposition", body = MetricsResponse)
    )
)]
pub async fn get_metrics(metrics: web::Data<RequestMetrics>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(prometheus_text(metrics.requests_total(), metrics.errors_total()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use std::time::Duration;

    #[actix_web::test]
    async fn test_metrics_exposition() {
        let metrics = web::Data::new(RequestMetrics::new());
        metrics.record("GET /api/invitees", Duration::from_millis(20), 200);
        metrics.record("POST /api/responses", Duration::from_millis(20), 404);

        let app = test::init_service(
            App::new()
                .app_data(metrics.clone())
                .route("/metrics", web::get().to(get_metrics)),
        )
        .await;
        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = std::str::from_utf8(&body).unwrap();

        assert!(text.contains("http_requests_total 2\n"));
        assert!(text.contains("http_errors_total 1\n"));
        assert!(text.contains("# TYPE http_errors_total counter"));
    }
}
