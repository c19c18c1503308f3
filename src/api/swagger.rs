use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PM Connect Service API",
        version = "1.0.0",
        description = "Event management backend for PM Connect. \n\n**Authentication:** Admin and account endpoints require a JWT Bearer token from `/api/auth/login`.\n\n**Features:**\n- Invitee roster and RSVP collection\n- Agenda, gallery and document library\n- Cab allocations\n- Feedback and testimonials\n- WhatsApp notifications and Cloudinary media\n- Excel exports, performance and health monitoring",
        contact(
            name = "PM Connect Team",
            email = "support@pmconnect.app"
        )
    ),
    paths(
        // Auth
        crate::api::auth::status,
        crate::api::auth::login,
        crate::api::auth::me,
        crate::api::auth::change_password,
        crate::api::auth::set_office_type,
        crate::api::auth::permissions,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        // Invitees
        crate::api::invitees::bulk_upload,
        crate::api::invitees::bulk_upload_enhanced,
        crate::api::invitees::list,
        crate::api::invitees::unresponded,
        crate::api::invitees::paginated,

        // Responses
        crate::api::responses::submit,
        crate::api::responses::list,
        crate::api::responses::paginated,
        crate::api::responses::export,
        crate::api::responses::flight_options,
        crate::api::responses::flight_analysis,

        // Dashboard & data
        crate::api::dashboard::stats,
        crate::api::dashboard::refresh_totals,
        crate::api::dashboard::integrity_check,
        crate::api::dashboard::fix_integrity,

        // Agenda & gallery
        crate::api::agenda::upload,
        crate::api::agenda::current,
        crate::api::gallery::upload,
        crate::api::gallery::by_event,
        crate::api::gallery::delete,

        // Cabs & profile
        crate::api::cabs::upload,
        crate::api::cabs::upload_enhanced,
        crate::api::cabs::list,
        crate::api::cabs::list_enhanced,
        crate::api::cabs::for_employee,
        crate::api::cabs::employee_enhanced,
        crate::api::profile::get,
        crate::api::profile::update,

        // Feedback
        crate::api::feedback::submit,
        crate::api::feedback::my_feedback,
        crate::api::feedback::get,
        crate::api::feedback::admin_all,
        crate::api::feedback::respond,
        crate::api::feedback::update_status,
        crate::api::feedback::analytics,
        crate::api::feedback::testimonials,

        // Documents
        crate::api::documents::categories,
        crate::api::documents::upload,
        crate::api::documents::download,
        crate::api::documents::by_category,
        crate::api::documents::public,
        crate::api::documents::search,
        crate::api::documents::delete,
        crate::api::documents::analytics,
        crate::api::documents::download_logs,

        // Media
        crate::api::media::upload_image,
        crate::api::media::upload_video,
        crate::api::media::image_url,
        crate::api::media::delete,
        crate::api::media::signed_params,

        // WhatsApp
        crate::api::whatsapp::status,
        crate::api::whatsapp::qr,
        crate::api::whatsapp::templates,
        crate::api::whatsapp::send,
        crate::api::whatsapp::send_template,
        crate::api::whatsapp::send_bulk,
        crate::api::whatsapp::rsvp_reminders,
        crate::api::whatsapp::event_updates,
        crate::api::whatsapp::logs,
        crate::api::whatsapp::analytics,

        // Exports & performance
        crate::api::exports::responses_advanced,
        crate::api::exports::invitees_status,
        crate::api::exports::cab_allocations,
        crate::api::exports::progress,
        crate::api::performance::metrics,
        crate::api::performance::recommendations,
        crate::api::performance::clear_cache,
        crate::api::performance::rebuild_indexes,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
            crate::models::EnhancedCabAllocation,
            crate::models::CabSummary,
            crate::models::Pagination,
        )
    ),
    tags(
        (name = "Auth", description = "Employee-code login, JWT issuance and account settings."),
        (name = "Health", description = "Health check and Prometheus metrics."),
        (name = "Invitees", description = "Roster upload and listing."),
        (name = "Responses", description = "RSVP submission, listing, export and flight preferences."),
        (name = "Dashboard", description = "RSVP counters and data integrity tools."),
        (name = "Agenda", description = "Current event agenda (PDF)."),
        (name = "Gallery", description = "Event photos per PM Connect edition."),
        (name = "Cab Allocations", description = "Cab assignment upload and lookup."),
        (name = "Profile", description = "Combined roster, account, RSVP and cab view of an employee."),
        (name = "Feedback", description = "Participant feedback, admin responses, analytics and testimonials."),
        (name = "Documents", description = "Categorised document library with download tracking."),
        (name = "Media", description = "Cloudinary image and video management."),
        (name = "WhatsApp", description = "Notifications through the WhatsApp gateway."),
        (name = "Exports", description = "Styled Excel reports with progress tracking."),
        (name = "Performance", description = "Runtime metrics, recommendations and cache control."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_lists_routes_and_security() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/auth/login"));
        assert!(doc.paths.paths.contains_key("/api/exports/progress/{export_id}"));
        assert!(doc.paths.paths.contains_key("/health"));
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
