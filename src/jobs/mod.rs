pub mod export_cleanup;
