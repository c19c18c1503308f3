use crate::services::ExportTracker;
use actix_web::web;
use tokio::time::{interval, Duration};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Drops finished export progress entries older than `retention_hours`, once an hour.
pub fn start_export_cleanup(tracker: web::Data<ExportTracker>, retention_hours: i64) {
    log::info!("🧹 Starting export cleanup job (hourly, retention {}h)", retention_hours);

    tokio::spawn(async move {
        let mut interval = interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = tracker.cleanup(retention_hours);
            if removed > 0 {
                log::info!("🧹 Removed {} finished export entries", removed);
            } else {
                log::debug!("⏰ Export cleanup: nothing to remove ({} tracked)", tracker.len());
            }
        }
    });
}
