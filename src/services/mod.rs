pub mod agenda_service;
pub mod auth_service;
pub mod cab_service;
pub mod dashboard_service;
pub mod document_service;
pub mod export_service;
pub mod feedback_service;
pub mod gallery_service;
pub mod invitee_service;
pub mod media_service;
pub mod performance_service;
pub mod profile_service;
pub mod response_service;
pub mod validation_service;
pub mod whatsapp_service;

pub use export_service::ExportTracker;
pub use media_service::CloudinaryClient;
pub use performance_service::RequestMetrics;
pub use whatsapp_service::{MessageGateway, WhatsAppClient};
