/// Dedicated pool for CPU-bound spreadsheet work (xlsx parsing and export
/// generation), kept off the actix workers.
use lazy_static::lazy_static;
use std::sync::Arc;
use tokio::runtime::Runtime;

lazy_static! {
    pub static ref WORKBOOK_POOL: Arc<Runtime> = Arc::new(
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("workbook-worker")
            .enable_all()
            .build()
            .expect("Failed to create workbook thread pool")
    );
}

/// Runs a blocking closure on the workbook pool
///
/// # Example
/// ```ignore
/// let bytes = spawn_workbook_blocking(move || build_report(&rows)).await??;
/// ```
pub async fn spawn_workbook_blocking<F, R>(f: F) -> Result<R, tokio::task::JoinError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    WORKBOOK_POOL.spawn_blocking(f).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_workbook_pool_works() {
        let result = spawn_workbook_blocking(|| {
            std::thread::sleep(std::time::Duration::from_millis(10));
            42
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }
}
