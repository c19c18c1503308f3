pub mod agenda;
pub mod auth;
pub mod cabs;
pub mod dashboard;
pub mod documents;
pub mod exports;
pub mod feedback;
pub mod gallery;
pub mod health;
pub mod invitees;
pub mod media;
pub mod metrics;
pub mod performance;
pub mod profile;
pub mod responses;
pub mod swagger;
pub mod whatsapp;

use crate::middleware::AuthMiddleware;
use actix_web::{web, HttpRequest};

/// Client IP (proxy aware) and user agent, for audit and download logs
pub fn client_info(req: &HttpRequest) -> (Option<String>, Option<String>) {
    let ip_address = req.connection_info().realip_remote_addr().map(str::to_string);
    let user_agent = req
        .headers()
        .get("User-Agent")
        .and_then(|ua| ua.to_str().ok())
        .map(str::to_string);
    (ip_address, user_agent)
}

/// Every `/api` route. Static segments are registered before `{param}`
/// siblings so they are matched first.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Auth
            .route("/auth/status", web::get().to(auth::status))
            .route("/auth/login", web::post().to(auth::login))
            .service(
                web::scope("/auth")
                    .wrap(AuthMiddleware)
                    .route("/me", web::get().to(auth::me))
                    .route("/change-password", web::post().to(auth::change_password))
                    .route("/office-type", web::post().to(auth::set_office_type))
                    .route("/permissions", web::get().to(auth::permissions)),
            )
            // Invitees
            .service(
                web::scope("/invitees")
                    .service(
                        web::resource("/bulk-upload")
                            .wrap(AuthMiddleware)
                            .route(web::post().to(invitees::bulk_upload)),
                    )
                    .service(
                        web::resource("/bulk-upload-enhanced")
                            .wrap(AuthMiddleware)
                            .route(web::post().to(invitees::bulk_upload_enhanced)),
                    )
                    .route("/unresponded", web::get().to(invitees::unresponded))
                    .route("/paginated", web::get().to(invitees::paginated))
                    .route("", web::get().to(invitees::list)),
            )
            // Responses
            .route("/flight/preferences/options", web::get().to(responses::flight_options))
            .service(
                web::scope("/responses")
                    .route("/paginated", web::get().to(responses::paginated))
                    .route("/export", web::get().to(responses::export))
                    .route("/flight-analysis", web::get().to(responses::flight_analysis))
                    .route("", web::post().to(responses::submit))
                    .route("", web::get().to(responses::list)),
            )
            // Dashboard & data
            .route("/dashboard/stats", web::get().to(dashboard::stats))
            .service(
                web::scope("/data")
                    .route("/refresh-totals", web::post().to(dashboard::refresh_totals))
                    .service(
                        web::resource("/integrity-check")
                            .wrap(AuthMiddleware)
                            .route(web::get().to(dashboard::integrity_check)),
                    )
                    .service(
                        web::resource("/fix-integrity")
                            .wrap(AuthMiddleware)
                            .route(web::post().to(dashboard::fix_integrity)),
                    ),
            )
            // Agenda & gallery
            .route("/agenda", web::get().to(agenda::current))
            .service(
                web::resource("/agenda")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(agenda::upload)),
            )
            .service(
                web::scope("/gallery")
                    .route("/upload", web::post().to(gallery::upload))
                    .route("/{event_version}", web::get().to(gallery::by_event))
                    .service(
                        web::resource("/{photo_id}")
                            .wrap(AuthMiddleware)
                            .route(web::delete().to(gallery::delete)),
                    ),
            )
            // Cab allocations
            .service(
                web::scope("/cab-allocations")
                    .service(
                        web::resource("/upload")
                            .wrap(AuthMiddleware)
                            .route(web::post().to(cabs::upload)),
                    )
                    .service(
                        web::resource("/upload-enhanced")
                            .wrap(AuthMiddleware)
                            .route(web::post().to(cabs::upload_enhanced)),
                    )
                    .route("/enhanced", web::get().to(cabs::list_enhanced))
                    .route("/employee/{employee_id}/enhanced", web::get().to(cabs::employee_enhanced))
                    .route("/{employee_id}", web::get().to(cabs::for_employee))
                    .route("", web::get().to(cabs::list)),
            )
            // Profile
            .route("/profile/{employee_id}", web::get().to(profile::get))
            .service(
                web::resource("/profile/{employee_id}")
                    .wrap(AuthMiddleware)
                    .route(web::put().to(profile::update)),
            )
            // Feedback
            .service(
                web::scope("/feedback")
                    .route("/testimonials", web::get().to(feedback::testimonials))
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware)
                            .route("", web::post().to(feedback::submit))
                            .route("/my", web::get().to(feedback::my_feedback))
                            .route("/admin/all", web::get().to(feedback::admin_all))
                            .route("/admin/analytics", web::get().to(feedback::analytics))
                            .route("/{feedback_id}/respond", web::post().to(feedback::respond))
                            .route("/{feedback_id}/status", web::put().to(feedback::update_status))
                            .route("/{feedback_id}", web::get().to(feedback::get)),
                    ),
            )
            // Documents
            .service(
                web::scope("/documents")
                    .route("/categories", web::get().to(documents::categories))
                    .route("/public", web::get().to(documents::public))
                    .route("/search", web::get().to(documents::search))
                    .route("/category/{category}", web::get().to(documents::by_category))
                    .service(
                        web::resource("/upload")
                            .wrap(AuthMiddleware)
                            .route(web::post().to(documents::upload)),
                    )
                    .service(
                        web::resource("/admin/analytics")
                            .wrap(AuthMiddleware)
                            .route(web::get().to(documents::analytics)),
                    )
                    .service(
                        web::resource("/admin/download-logs")
                            .wrap(AuthMiddleware)
                            .route(web::get().to(documents::download_logs)),
                    )
                    .route("/{document_id}", web::get().to(documents::download))
                    .service(
                        web::resource("/{document_id}")
                            .wrap(AuthMiddleware)
                            .route(web::delete().to(documents::delete)),
                    ),
            )
            // Media
            .service(
                web::scope("/media")
                    .route("/url/{public_id:.*}", web::get().to(media::image_url))
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware)
                            .route("/images", web::post().to(media::upload_image))
                            .route("/videos", web::post().to(media::upload_video))
                            .route("/signed-params", web::post().to(media::signed_params))
                            .route("/{public_id:.*}", web::delete().to(media::delete)),
                    ),
            )
            // WhatsApp
            .service(
                web::scope("/whatsapp")
                    .wrap(AuthMiddleware)
                    .route("/status", web::get().to(whatsapp::status))
                    .route("/qr", web::get().to(whatsapp::qr))
                    .route("/templates", web::get().to(whatsapp::templates))
                    .route("/send", web::post().to(whatsapp::send))
                    .route("/send-template", web::post().to(whatsapp::send_template))
                    .route("/send-bulk", web::post().to(whatsapp::send_bulk))
                    .route("/rsvp-reminders", web::post().to(whatsapp::rsvp_reminders))
                    .route("/event-updates", web::post().to(whatsapp::event_updates))
                    .route("/logs", web::get().to(whatsapp::logs))
                    .route("/analytics", web::get().to(whatsapp::analytics)),
            )
            // Exports
            .service(
                web::scope("/exports")
                    .wrap(AuthMiddleware)
                    .route("/responses/advanced", web::post().to(exports::responses_advanced))
                    .route("/invitees/status", web::post().to(exports::invitees_status))
                    .route("/cab-allocations", web::post().to(exports::cab_allocations))
                    .route("/progress/{export_id}", web::get().to(exports::progress)),
            )
            // Performance
            .service(
                web::scope("/performance")
                    .wrap(AuthMiddleware)
                    .route("/metrics", web::get().to(performance::metrics))
                    .route("/recommendations", web::get().to(performance::recommendations))
                    .route("/cache/clear", web::post().to(performance::clear_cache))
                    .route("/indexes", web::post().to(performance::rebuild_indexes)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_client_info_reads_forwarded_headers() {
        let req = test::TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7"))
            .insert_header(("User-Agent", "pm-connect-tests"))
            .to_http_request();
        let (ip, ua) = client_info(&req);
        assert_eq!(ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(ua.as_deref(), Some("pm-connect-tests"));
    }

    #[actix_web::test]
    async fn test_public_routes_skip_auth() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppConfig::for_tests()))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/auth/status").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/flight/preferences/options").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/documents/categories").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_protected_routes_need_a_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppConfig::for_tests()))
                .configure(routes),
        )
        .await;

        for (method, uri) in [
            ("GET", "/api/auth/me"),
            ("GET", "/api/feedback/my"),
            ("GET", "/api/whatsapp/templates"),
            ("GET", "/api/performance/metrics"),
            ("POST", "/api/exports/cab-allocations"),
            ("POST", "/api/invitees/bulk-upload"),
            ("POST", "/api/invitees/bulk-upload-enhanced"),
            ("POST", "/api/cab-allocations/upload"),
            ("POST", "/api/agenda"),
            ("DELETE", "/api/gallery/photo-1"),
            ("PUT", "/api/profile/EMP001"),
        ] {
            let req = match method {
                "POST" => test::TestRequest::post(),
                "PUT" => test::TestRequest::put(),
                "DELETE" => test::TestRequest::delete(),
                _ => test::TestRequest::get(),
            }
            .uri(uri)
            .to_request();
            let err = test::try_call_service(&app, req).await.err().unwrap();
            assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }
}
