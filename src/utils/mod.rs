// Utility functions
pub mod cache;
pub mod crypto;
pub mod error;
pub mod tabular;
pub mod thread_pool;
pub mod time;
pub mod upload;
pub mod workbook;

pub use error::*;
